mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use flashdeck_lib::study_events::MAX_HEATMAP_COLUMNS;

#[derive(Parser)]
#[command(name = "flashdeck-cli", about = "Spaced-repetition flashcards in the terminal", version)]
struct Cli {
    /// Data directory (default: from config, then the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Manage card sets
    #[command(subcommand)]
    Sets(SetsCommand),

    /// Manage cards
    #[command(subcommand)]
    Cards(CardsCommand),

    /// List cards due today
    Due {
        /// Set name (case-insensitive prefix match); all sets if omitted
        #[arg(long)]
        set: Option<String>,
    },

    /// Review due cards interactively
    Study {
        /// Set name (case-insensitive prefix match); all sets if omitted
        #[arg(long)]
        set: Option<String>,
        /// Study every card in scope, due or not
        #[arg(long)]
        all: bool,
    },

    /// Show study streak and activity heatmap
    Stats {
        /// Heatmap width in weeks (default: from config)
        #[arg(long)]
        columns: Option<usize>,
    },
}

#[derive(Subcommand)]
enum SetsCommand {
    /// List sets with card counts
    List,
    /// Create a set
    Create { name: String },
    /// Rename a set
    Rename { set: String, name: String },
    /// Delete a set and all of its cards
    Delete { set: String },
}

#[derive(Subcommand)]
enum CardsCommand {
    /// List cards in a set
    List { set: String },
    /// Add a card to a set
    Add {
        set: String,
        front: String,
        back: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Edit a card's content (front, id or id prefix)
    Edit {
        set: String,
        card: String,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        /// New note ("" clears it)
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete a card
    Delete { set: String, card: String },
    /// Move a card to another set
    Move { set: String, card: String, target: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config.clone(), cli.data_dir.clone())?;

    match cli.command {
        Command::Sets(subcmd) => match subcmd {
            SetsCommand::List => commands::sets::run_list(&app, &cli.format, use_color)?,
            SetsCommand::Create { name } => commands::sets::run_create(&app, name, &cli.format)?,
            SetsCommand::Rename { set, name } => commands::sets::run_rename(&app, &set, name, &cli.format)?,
            SetsCommand::Delete { set } => commands::sets::run_delete(&app, &set)?,
        },
        Command::Cards(subcmd) => match subcmd {
            CardsCommand::List { set } => commands::cards::run_list(&app, &set, &cli.format, use_color)?,
            CardsCommand::Add { set, front, back, note } => {
                commands::cards::run_add(&app, &set, front, back, note, &cli.format)?
            }
            CardsCommand::Edit { set, card, front, back, note } => {
                commands::cards::run_edit(&app, &set, &card, front, back, note, &cli.format)?
            }
            CardsCommand::Delete { set, card } => commands::cards::run_delete(&app, &set, &card)?,
            CardsCommand::Move { set, card, target } => {
                commands::cards::run_move(&app, &set, &card, &target, &cli.format)?
            }
        },
        Command::Due { set } => {
            commands::due::run(&app, set.as_deref(), &cli.format, use_color)?;
        }
        Command::Study { set, all } => {
            commands::study::run(&app, set.as_deref(), all, use_color).await?;
        }
        Command::Stats { columns } => {
            let columns = columns
                .unwrap_or(app.config.heatmap.columns)
                .clamp(1, MAX_HEATMAP_COLUMNS);
            commands::stats::run(&app, columns, &cli.format, use_color)?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}
