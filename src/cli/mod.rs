use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::ConfigLoader;
use crate::storage;

pub mod commands;

use self::commands::{
    AddArgs, CompleteArgs, DeleteArgs, EditArgs, GetArgs, ListArgs, OutputMode, ShowArgs,
};

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Personal todo manager for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over TODOTUI_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over TODOTUI_DATA)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Print machine-readable JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    /// Print tab-separated rows without decoration
    #[arg(long, global = true, conflicts_with = "json")]
    pub plain: bool,

    /// Suppress success messages
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// List todos with 1-based indices usable as ids in later commands
    Show(ShowArgs),
    /// Show today's agenda: overdue, due today, this week, high priority
    Today,
    /// Show one todo in full
    Get(GetArgs),
    /// Add a todo
    Add(AddArgs),
    /// Edit a todo's fields
    Edit(EditArgs),
    /// Mark a todo completed (or reopen it)
    Complete(CompleteArgs),
    /// Delete a todo
    Delete(DeleteArgs),
    /// Show or manage lists
    List(ListArgs),
    /// Print database totals
    Status,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("TODOTUI_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("TODOTUI_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let storage = storage::init(&paths, &config.storage, &config.default_list)?;

    // piped output defaults to the undecorated form
    let output = OutputMode {
        json: cli.json,
        plain: cli.plain || (!cli.json && !atty::is(atty::Stream::Stdout)),
        quiet: cli.quiet,
    };

    let config = Arc::new(config);
    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, storage)?;
            app.run()
        }
        Commands::Show(args) => commands::show(&storage, &output, args),
        Commands::Today => commands::today(&storage, &output),
        Commands::Get(args) => commands::get(&storage, &output, args),
        Commands::Add(args) => commands::add(&config, &storage, &output, args),
        Commands::Edit(args) => commands::edit(&storage, &output, args),
        Commands::Complete(args) => commands::complete(&storage, &output, args),
        Commands::Delete(args) => commands::delete(&storage, &output, args),
        Commands::List(args) => commands::list(&storage, &output, args),
        Commands::Status => commands::status(&storage, &output),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
