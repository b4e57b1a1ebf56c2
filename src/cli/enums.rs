//! CLI enum types.

use clap::ValueEnum;

use crate::gemini::AspectRatio;

/// Video aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Aspect {
    #[default]
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
}

impl From<Aspect> for AspectRatio {
    fn from(a: Aspect) -> Self {
        match a {
            Aspect::Landscape => AspectRatio::Landscape,
            Aspect::Portrait => AspectRatio::Portrait,
        }
    }
}
