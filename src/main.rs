// src/main.rs
use clap::Parser;
use mood_journal::cli::{self, CliOutcome, Session};
use mood_journal::{error, tui};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    env_logger::init(); // Initialize logger
    log::info!("Starting Mood Journal");

    let cli_args = cli::Cli::parse();

    let session = Session::open(cli_args.data_dir.as_deref()).map_err(|e| {
        log::error!("Failed to open journal: {:#?}", e);
        eprintln!("Error: {}", e);
        e
    })?;

    match cli::handle_cli_command(&session, cli_args.command).await {
        Ok(CliOutcome::LaunchTui { entry_id }) => {
            log::info!("Launching TUI.");
            let repo = session.repository();
            let classifier = session.classifier()?;
            let app = tui::App::new(repo, classifier, session.config.clipboard, entry_id.as_deref());
            // The TUI loop blocks; background classification runs on the worker threads.
            if let Err(e) = tokio::task::block_in_place(|| tui::run_tui(app)) {
                log::error!("Application TUI error: {:#?}", e);
                eprintln!("Error: {}", e);
                return Err(e);
            }
        }
        Ok(CliOutcome::Handled) => {
            log::info!("CLI command processed.");
        }
        Err(e) => {
            log::error!("Application failed: {:#?}", e);
            eprintln!("Error: {}", e);
            return Err(e);
        }
    }

    log::info!("Mood Journal finished successfully.");
    Ok(())
}
