mod blur;
mod cli;
mod commands;
mod config;
mod grouping;
mod logging;
mod model;
mod onboarding;
mod speech;
mod state;
mod storage;
mod timer;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let settings = config::resolve(args.data_dir, args.log_level, args.config.as_deref())?;
    let _logger = match logging::init_logging(settings.log_level.as_deref(), &settings.log_dir()) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: logging disabled: {:#}", err);
            None
        }
    };

    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Add { content } => commands::add(&settings, content),
        cli::Command::List { reveal } => commands::list(&settings, reveal),
        cli::Command::Edit { id, content } => commands::edit(&settings, id, content),
        cli::Command::Delete { id } => commands::delete(&settings, id),
        cli::Command::Clear { yes } => commands::clear(&settings, yes),
        cli::Command::Timer { hours, minutes } => commands::timer(hours, minutes),
        cli::Command::Prefs {
            blur,
            focus,
            reset_onboarding,
        } => commands::prefs(&settings, blur, focus, reset_onboarding),
        cli::Command::Tui => commands::tui(&settings),
    }
}
