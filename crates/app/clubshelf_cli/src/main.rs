// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::Cli;

use clubshelf_core::config::ClubConfig;

mod cli;
mod commands;
mod logging;

fn main() -> Result<()> {
    let args = Cli::parse();
    if let Err(e) = run(args) {
        // No logger is installed when setup itself failed.
        if log::max_level() == log::LevelFilter::Off {
            eprintln!("ERROR {e}");
        } else {
            log::error!("{}", e);
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run(args: Cli) -> Result<()> {
    let mut config = match ClubConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init(logging::FALLBACK_SPEC)?;
            return Err(e.into());
        }
    };
    logging::init(&config.log_spec)?;

    if let Some(state) = &args.state {
        config.state_path = state.clone();
    }

    commands::dispatch(&args.command, &config)
}
