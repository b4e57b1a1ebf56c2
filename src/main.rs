use clap::Parser;
use env_logger::Env;

use nano_bananary::cli::{self, Args, Command};
use nano_bananary::config::Config;

fn init_logging() {
    // Load .env file, don't override existing env vars
    let _ = dotenv::dotenv();

    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
}

fn run(args: Args) -> Result<(), String> {
    let config = Config::load(args.config.as_deref()).map_err(|e| e.to_string())?;

    match args.command {
        Command::Key { action } => cli::handle_key_action(action, &config),
        Command::Edit {
            image,
            prompt,
            mask,
            reference,
            output,
        } => cli::run_edit(
            &config,
            &image,
            &prompt,
            mask.as_deref(),
            reference.as_deref(),
            output.as_deref(),
        ),
        Command::Video {
            prompt,
            image,
            aspect,
            output,
        } => cli::run_video(&config, &prompt, image.as_deref(), aspect, output.as_deref()),
    }
}

fn main() {
    init_logging();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
