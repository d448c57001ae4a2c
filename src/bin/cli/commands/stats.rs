use anyhow::{Context, Result};

use flashdeck_lib::flashcards::Scope;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &App, columns: usize, format: &OutputFormat, use_color: bool) -> Result<()> {
    let today = app.today();
    let streak = app
        .study_events
        .current_streak(today)
        .context("Failed to read study events")?;
    let cells = app
        .study_events
        .heatmap(today, columns)
        .context("Failed to read study events")?;
    let stats = app
        .storage
        .get_review_stats(Scope::All, today)
        .context("Failed to read card statistics")?;
    let reviewed_in_range: u32 = cells.iter().map(|c| c.count).sum();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "today": today.to_string(),
                "streak": streak,
                "reviewedInRange": reviewed_in_range,
                "cards": stats,
                "heatmap": cells,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let streak_text = format!("{} day streak", streak);
            println!("{}", terminal::paint(&streak_text, Color::BOLD, use_color));
            println!(
                "{} cards, {} new, {} due today",
                stats.total_cards, stats.new_cards, stats.due_cards
            );
            println!();
            println!("{}", terminal::render_heatmap(&cells, use_color));
            println!();
            println!("{} reviews in the last {} weeks", reviewed_in_range, columns);
        }
    }

    Ok(())
}
