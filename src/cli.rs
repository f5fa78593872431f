// src/cli.rs
use crate::classifier::EmotionClient;
use crate::config::{self, Config};
use crate::editor::Editor;
use crate::error::{AppError, AppResult, RepoError, StoreError};
use crate::images;
use crate::models::{Entry, EntryId};
use crate::repository::Repository;
use crate::store::{EntryStorage, FileKvStore};
use crate::theme::{self, Theme};
use clap::{Parser, Subcommand};
use log;
use std::io::{self, Write}; // For stdout flush
use std::path::{Path, PathBuf};

/// A mood journal: write entries, get their emotions detected, search them later.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(arg_required_else_help = false)] // Allow no subcommand to default to TUI
pub struct Cli {
    /// Directory holding the journal data (overrides the config file)
    #[clap(long, global = true, value_parser)]
    pub data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the Terminal User Interface (TUI)
    Tui {
        /// Open this entry instead of the newest one
        #[clap(long)]
        entry_id: Option<String>,
    },
    /// Write a new entry and detect its emotions
    Add {
        text: String,
        /// Image file to attach (repeatable)
        #[clap(short, long = "image", value_parser)]
        images: Vec<PathBuf>,
    },
    /// Replace the text of an existing entry and re-detect its emotions
    Edit {
        id: EntryId,
        text: String,
        /// Image file to attach; replaces the entry's images (repeatable)
        #[clap(short, long = "image", value_parser)]
        images: Vec<PathBuf>,
        /// Drop all images from the entry
        #[clap(long, conflicts_with = "images")]
        clear_images: bool,
    },
    /// List all entries, newest first
    List,
    /// List entries whose text contains the query (case-insensitive)
    Search { query: String },
    /// Print one entry in full
    Show { id: EntryId },
    /// Delete one entry
    Remove { id: EntryId },
    /// Delete every entry
    Clear {
        /// Do not ask for confirmation
        #[clap(long)]
        yes: bool,
    },
    /// Show or set the theme preference
    Theme { value: Option<Theme> },
}

/// What `main` should do after a command was handled.
#[derive(Debug, PartialEq, Eq)]
pub enum CliOutcome {
    Handled,
    LaunchTui { entry_id: Option<String> },
}

/// Configuration plus the storage it points at.
pub struct Session {
    pub config: Config,
    pub kv: FileKvStore,
}

impl Session {
    pub fn open(data_dir: Option<&Path>) -> AppResult<Self> {
        let config = config::load_config();
        Self::with_config(config, data_dir)
    }

    pub fn with_config(config: Config, data_dir: Option<&Path>) -> AppResult<Self> {
        let dir = config.resolve_data_dir(data_dir).ok_or_else(|| {
            log::error!("No data directory configured and none could be determined.");
            StoreError::Location("could not determine a data directory; pass --data-dir".to_string())
        })?;
        log::info!("Using data directory {:?}", dir);
        Ok(Session {
            config,
            kv: FileKvStore::new(dir),
        })
    }

    pub fn repository(&self) -> Repository<FileKvStore> {
        Repository::open(EntryStorage::new(self.kv.clone()))
    }

    pub fn classifier(&self) -> AppResult<EmotionClient> {
        Ok(EmotionClient::new(&self.config.classifier)?)
    }
}

fn print_summary(entry: &Entry) {
    let emotions = if entry.emotions.is_empty() {
        String::new()
    } else {
        format!(" [{}]", entry.emotions.join(", "))
    };
    println!("{}  {}  {}{}", entry.id, entry.date, entry.preview(), emotions);
}

fn print_entry(entry: &Entry) {
    println!("Id:       {}", entry.id);
    println!("Date:     {}", entry.date);
    println!("Emotions: {}", entry.emotions.join(", "));
    println!("Images:   {}", entry.images.len());
    println!();
    println!("{}", entry.text);
}

async fn attach(editor: &mut Editor, paths: Vec<PathBuf>) -> AppResult<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let mut encoded = images::encode_images(paths).await;
    if !encoded.failures.is_empty() {
        let first = encoded.failures.remove(0);
        log::error!("Image attachment failed: {}", first);
        return Err(first.into());
    }
    editor.attach_images(encoded.payloads);
    Ok(())
}

fn confirm(prompt: &str) -> AppResult<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush().map_err(|e| {
        log::error!("Failed to flush stdout for confirmation: {}", e);
        AppError::Cli(format!("Failed to flush stdout: {}", e))
    })?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer).map_err(|e| {
        log::error!("Failed to read confirmation: {}", e);
        AppError::Cli(format!("Failed to read confirmation: {}", e))
    })?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Handles the parsed CLI command.
/// Returns `LaunchTui` if the TUI should run, `Handled` if a CLI command did all the work.
pub async fn handle_cli_command(session: &Session, command: Option<Commands>) -> AppResult<CliOutcome> {
    log::debug!("Handling CLI command: {:?}", command);
    match command {
        None => {
            log::info!("No CLI command given, preparing to launch TUI by default.");
            Ok(CliOutcome::LaunchTui { entry_id: None })
        }
        Some(Commands::Tui { entry_id }) => {
            log::info!("'tui' command given, preparing to launch TUI.");
            Ok(CliOutcome::LaunchTui { entry_id })
        }
        Some(Commands::Add { text, images }) => {
            let mut repo = session.repository();
            let client = session.classifier()?;
            let mut editor = Editor::new();
            editor.set_text(text);
            attach(&mut editor, images).await?;

            let entry = editor.submit(&mut repo, &client).await?;
            println!("Saved entry {}. Detected: {}", entry.id, entry.emotions.join(", "));
            Ok(CliOutcome::Handled)
        }
        Some(Commands::Edit { id, text, images, clear_images }) => {
            let mut repo = session.repository();
            let client = session.classifier()?;
            let mut editor = Editor::new();
            editor.select_entry(&repo, id)?;
            editor.set_text(text);
            if clear_images || !images.is_empty() {
                editor.clear_images();
            }
            attach(&mut editor, images).await?;

            let entry = editor.submit(&mut repo, &client).await?;
            println!("Updated entry {}. Detected: {}", entry.id, entry.emotions.join(", "));
            Ok(CliOutcome::Handled)
        }
        Some(Commands::List) => {
            let repo = session.repository();
            if repo.is_empty() {
                println!("No journal entries yet.");
            }
            for entry in repo.load_all() {
                print_summary(entry);
            }
            log::info!("Listed {} entries.", repo.len());
            Ok(CliOutcome::Handled)
        }
        Some(Commands::Search { query }) => {
            let repo = session.repository();
            let hits = repo.filter_by_text(&query);
            if hits.is_empty() {
                println!("No matching journal entries found.");
            }
            for entry in hits {
                print_summary(entry);
            }
            Ok(CliOutcome::Handled)
        }
        Some(Commands::Show { id }) => {
            let repo = session.repository();
            let entry = repo.find_by_id(id).ok_or(RepoError::NotFound(id))?;
            print_entry(entry);
            Ok(CliOutcome::Handled)
        }
        Some(Commands::Remove { id }) => {
            let mut repo = session.repository();
            repo.remove(id)?;
            println!("Removed entry {}.", id);
            Ok(CliOutcome::Handled)
        }
        Some(Commands::Clear { yes }) => {
            let mut repo = session.repository();
            if !yes && !confirm("Are you sure you want to clear all journal entries?")? {
                println!("Clear cancelled.");
                log::info!("Clear cancelled by user.");
                return Ok(CliOutcome::Handled);
            }
            repo.clear_all()?;
            println!("All journal entries have been cleared.");
            Ok(CliOutcome::Handled)
        }
        Some(Commands::Theme { value }) => {
            match value {
                Some(theme) => {
                    theme::save_theme(&session.kv, theme)?;
                    println!("Theme set to {}.", theme);
                }
                None => println!("{}", theme::load_theme(&session.kv)),
            }
            Ok(CliOutcome::Handled)
        }
    }
}
