//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::Aspect;

/// Edit images and generate videos with Gemini
#[derive(Parser, Debug)]
#[command(name = "nano-bananary")]
#[command(version, about = "Gemini image editing and video generation", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the stored Gemini API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Edit an image following a text instruction
    Edit {
        /// Image to edit
        image: PathBuf,

        /// What to change
        #[arg(long, short)]
        prompt: String,

        /// PNG mask limiting the edit to its painted area
        #[arg(long)]
        mask: Option<PathBuf>,

        /// Reference image, e.g. an object to insert
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Where to write the edited image (default: <image>-edited.<ext>)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Generate a video from a prompt and optional seed image
    Video {
        /// What the video should show
        #[arg(long, short)]
        prompt: String,

        /// Seed image to animate
        #[arg(long)]
        image: Option<PathBuf>,

        /// Aspect ratio
        #[arg(long, default_value = "16:9")]
        aspect: Aspect,

        /// Download the video here instead of printing its URL
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum KeyAction {
    /// Save a key (read from stdin when omitted)
    Set { key: Option<String> },
    /// Show the stored key, masked unless --reveal is given
    Show {
        #[arg(long)]
        reveal: bool,
    },
    /// Report whether a key is stored
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit_command() {
        let args = Args::try_parse_from([
            "nano-bananary",
            "edit",
            "cat.png",
            "--prompt",
            "add a hat",
            "--mask",
            "mask.png",
        ])
        .unwrap();

        match args.command {
            Command::Edit {
                image,
                prompt,
                mask,
                reference,
                output,
            } => {
                assert_eq!(image, PathBuf::from("cat.png"));
                assert_eq!(prompt, "add a hat");
                assert_eq!(mask, Some(PathBuf::from("mask.png")));
                assert!(reference.is_none());
                assert!(output.is_none());
            }
            other => panic!("Expected Edit, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_video_defaults_to_landscape() {
        let args = Args::try_parse_from(["nano-bananary", "video", "-p", "waves"]).unwrap();
        match args.command {
            Command::Video { aspect, image, .. } => {
                assert_eq!(aspect, Aspect::Landscape);
                assert!(image.is_none());
            }
            other => panic!("Expected Video, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_video_portrait() {
        let args = Args::try_parse_from([
            "nano-bananary",
            "video",
            "-p",
            "x",
            "--aspect",
            "9:16",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Video {
                aspect: Aspect::Portrait,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_key_set_without_value() {
        let args = Args::try_parse_from(["nano-bananary", "key", "set"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Key {
                action: KeyAction::Set { key: None }
            }
        ));
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args = Args::try_parse_from([
            "nano-bananary",
            "key",
            "status",
            "--config",
            "/tmp/c.toml",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_edit_requires_prompt() {
        assert!(Args::try_parse_from(["nano-bananary", "edit", "cat.png"]).is_err());
    }
}
