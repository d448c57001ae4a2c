use anyhow::{Context, Result};

use flashdeck_lib::flashcards::algorithm::{format_interval, preview_intervals};
use flashdeck_lib::flashcards::get_due_cards;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &App, set_name: Option<&str>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let scope = app.scope_for(set_name)?;
    let cards = app
        .storage
        .list_cards_in_scope(scope)
        .context("Failed to list cards")?;
    let due = get_due_cards(&cards, &app.clock.now());
    let params = &app.config.scheduler;

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = due
                .iter()
                .map(|card| {
                    let [again, hard, good, easy] = preview_intervals(card, params);
                    serde_json::json!({
                        "id": card.id.to_string(),
                        "front": card.front,
                        "due": card.due.to_string(),
                        "preview": { "again": again, "hard": hard, "good": good, "easy": easy },
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("No cards due in {}.", scope);
                return Ok(());
            }

            let front_width = 32;
            println!(
                "{:<fw$} {:<10} {:>5} {:>5} {:>5} {:>5}",
                "Front", "Due", "Again", "Hard", "Good", "Easy",
                fw = front_width
            );
            println!("{} {} {}", terminal::rule(front_width), terminal::rule(10), terminal::rule(23));

            for card in &due {
                let [again, hard, good, easy] = preview_intervals(card, params);
                let overdue = card.due < app.today();
                let due_date = format!("{:<10}", card.due.format("%Y-%m-%d"));
                let due_date = if overdue {
                    terminal::paint(&due_date, Color::RED, use_color)
                } else {
                    due_date
                };
                println!(
                    "{:<fw$} {} {:>5} {:>5} {:>5} {:>5}",
                    terminal::truncate(&card.front, front_width),
                    due_date,
                    format_interval(again),
                    format_interval(hard),
                    format_interval(good),
                    format_interval(easy),
                    fw = front_width
                );
            }

            println!("\n{} cards due", due.len());
        }
    }

    Ok(())
}
