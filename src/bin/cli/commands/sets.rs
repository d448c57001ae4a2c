use anyhow::{Context, Result};

use flashdeck_lib::flashcards::{CardSet, Scope};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let sets = app.storage.list_sets().context("Failed to list sets")?;
    let today = app.today();

    let mut rows = Vec::new();
    for set in &sets {
        let stats = app
            .storage
            .get_review_stats(Scope::Set { set_id: set.id }, today)
            .context("Failed to read set statistics")?;
        rows.push((set, stats));
    }

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(set, stats)| {
                    serde_json::json!({
                        "id": set.id.to_string(),
                        "name": set.name,
                        "updatedAt": set.updated_at.to_rfc3339(),
                        "stats": stats,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if rows.is_empty() {
                println!("No sets yet. Create one with `flashdeck-cli sets create <name>`.");
                return Ok(());
            }

            let name_width = rows.iter().map(|(s, _)| s.name.chars().count()).max().unwrap_or(4).clamp(4, 40);
            println!("{:<nw$} {:>6} {:>6} {:>6}", "Name", "Cards", "New", "Due", nw = name_width);
            println!("{} {} {} {}", terminal::rule(name_width), terminal::rule(6), terminal::rule(6), terminal::rule(6));

            for (set, stats) in &rows {
                let due = format!("{:>6}", stats.due_cards);
                let due = if stats.due_cards > 0 {
                    terminal::paint(&due, Color::YELLOW, use_color)
                } else {
                    due
                };
                println!(
                    "{:<nw$} {:>6} {:>6} {}",
                    terminal::truncate(&set.name, name_width),
                    stats.total_cards,
                    stats.new_cards,
                    due,
                    nw = name_width
                );
            }
        }
    }

    Ok(())
}

fn print_set(set: &CardSet, verb: &str, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(set)?),
        OutputFormat::Plain => {
            println!("{} set \"{}\"", verb, set.name);
            println!("  ID: {}", set.id);
        }
    }
    Ok(())
}

pub fn run_create(app: &App, name: String, format: &OutputFormat) -> Result<()> {
    let set = app.storage.create_set(name).context("Failed to create set")?;
    print_set(&set, "Created", format)
}

pub fn run_rename(app: &App, set_name: &str, name: String, format: &OutputFormat) -> Result<()> {
    let set = app.find_set(set_name)?;
    let renamed = app
        .storage
        .rename_set(set.id, name)
        .context("Failed to rename set")?;
    print_set(&renamed, "Renamed", format)
}

pub fn run_delete(app: &App, set_name: &str) -> Result<()> {
    let set = app.find_set(set_name)?;
    let count = app.storage.list_cards(set.id)?.len();
    app.storage.delete_set(set.id).context("Failed to delete set")?;
    println!("Deleted set \"{}\" and {} cards", set.name, count);
    Ok(())
}
