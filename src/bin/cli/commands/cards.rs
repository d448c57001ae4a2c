use anyhow::{Context, Result};

use flashdeck_lib::flashcards::Card;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

fn card_json(card: &Card) -> serde_json::Value {
    serde_json::json!({
        "id": card.id.to_string(),
        "setId": card.set_id.to_string(),
        "front": card.front,
        "back": card.back,
        "note": card.note,
        "due": card.due.to_string(),
        "stability": card.stability,
        "difficulty": card.difficulty,
        "reviewCount": card.review_count,
        "lapseCount": card.lapse_count,
    })
}

pub fn run_list(app: &App, set_name: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let set = app.find_set(set_name)?;
    let cards = app.storage.list_cards(set.id).context("Failed to list cards")?;
    let today = app.today();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = cards.iter().map(card_json).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("No cards in \"{}\".", set.name);
                return Ok(());
            }

            let front_width = 28;
            let back_width = 28;
            println!(
                "{:<8} {:<fw$} {:<bw$} {:<10} {:>7}",
                "ID", "Front", "Back", "Due", "Reviews",
                fw = front_width, bw = back_width
            );
            println!(
                "{} {} {} {} {}",
                terminal::rule(8),
                terminal::rule(front_width),
                terminal::rule(back_width),
                terminal::rule(10),
                terminal::rule(7)
            );

            for card in &cards {
                let id = card.id.to_string();
                let due = format!("{:<10}", card.due.format("%Y-%m-%d"));
                let due = if card.is_due(today) {
                    terminal::paint(&due, Color::YELLOW, use_color)
                } else {
                    due
                };
                println!(
                    "{:<8} {:<fw$} {:<bw$} {} {:>7}",
                    &id[..8],
                    terminal::truncate(&card.front, front_width),
                    terminal::truncate(&card.back, back_width),
                    due,
                    card.review_count,
                    fw = front_width, bw = back_width
                );
            }

            println!("\n{} cards total", cards.len());
        }
    }

    Ok(())
}

pub fn run_add(
    app: &App,
    set_name: &str,
    front: String,
    back: String,
    note: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let set = app.find_set(set_name)?;
    let card = app
        .storage
        .create_card(set.id, front, back, note, app.today())
        .context("Failed to add card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card_json(&card))?),
        OutputFormat::Plain => {
            println!("Added \"{}\" to \"{}\"", card.front, set.name);
            println!("  ID: {}", card.id);
        }
    }
    Ok(())
}

pub fn run_edit(
    app: &App,
    set_name: &str,
    query: &str,
    front: Option<String>,
    back: Option<String>,
    note: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let set = app.find_set(set_name)?;
    let card = app.find_card(&set, query)?;
    let note = note.map(|n| if n.trim().is_empty() { None } else { Some(n) });

    let updated = app
        .storage
        .update_card_content(card.id, front, back, note)
        .context("Failed to edit card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card_json(&updated))?),
        OutputFormat::Plain => println!("Updated \"{}\"", updated.front),
    }
    Ok(())
}

pub fn run_delete(app: &App, set_name: &str, query: &str) -> Result<()> {
    let set = app.find_set(set_name)?;
    let card = app.find_card(&set, query)?;
    app.storage.delete_card(card.id).context("Failed to delete card")?;
    println!("Deleted \"{}\" from \"{}\"", card.front, set.name);
    Ok(())
}

pub fn run_move(
    app: &App,
    set_name: &str,
    query: &str,
    target_name: &str,
    format: &OutputFormat,
) -> Result<()> {
    let set = app.find_set(set_name)?;
    let target = app.find_set(target_name)?;
    let card = app.find_card(&set, query)?;

    let moved = app
        .storage
        .move_card(card.id, target.id)
        .context("Failed to move card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card_json(&moved))?),
        OutputFormat::Plain => println!("Moved \"{}\" from \"{}\" to \"{}\"", moved.front, set.name, target.name),
    }
    Ok(())
}
