mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use sunwise_core::AppError;

use cli::{Cli, Command, ProfileAction};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    sunwise_core::init()?;
    let app = sunwise_core::App::new()?;

    tracing::info!("Sunwise started");

    match cli.command.unwrap_or_default() {
        Command::Home { run } => commands::home(&app, run).await,
        Command::Map => commands::map(&app).await,
        Command::Music { vibe } => commands::music(&app, &vibe.join(" ")).await,
        Command::Profile { action } => {
            commands::profile(&app, action.unwrap_or(ProfileAction::Show))
        }
    }
}
