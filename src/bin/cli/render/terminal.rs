use flashdeck_lib::study_events::HeatmapCell;

/// ANSI color codes
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap text in a color code when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Shorten to `width` characters, ending in "..." when cut
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Horizontal rule of box-drawing characters
pub fn rule(width: usize) -> String {
    "\u{2500}".repeat(width)
}

const LEVEL_GLYPHS: [char; 5] = ['\u{00b7}', '\u{2591}', '\u{2592}', '\u{2593}', '\u{2588}'];

/// Render heatmap cells as 7 weekday rows, one column per week, newest on the right
pub fn render_heatmap(cells: &[HeatmapCell], use_color: bool) -> String {
    let columns = (cells.len() + 6) / 7;
    let mut rows = vec![String::new(); 7];

    for (i, cell) in cells.iter().enumerate() {
        let row = i % 7;
        let glyph = LEVEL_GLYPHS[usize::from(cell.level.min(4))].to_string();
        let glyph = if cell.is_today {
            paint(&glyph, Color::CYAN, use_color)
        } else if cell.level > 0 {
            paint(&glyph, Color::GREEN, use_color)
        } else {
            paint(&glyph, Color::GRAY, use_color)
        };
        rows[row].push_str(&glyph);
        if i / 7 + 1 < columns {
            rows[row].push(' ');
        }
    }

    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use flashdeck_lib::study_events::{heatmap, ActivityMap};

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("mañana", 10), "mañana");
        assert_eq!(truncate("buenos días a todos", 10), "buenos ...");
    }

    #[test]
    fn test_render_heatmap_rows() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut events = ActivityMap::new();
        events.insert(today, 9);

        let rendered = render_heatmap(&heatmap(&events, today, 3), false);
        let rows: Vec<&str> = rendered.lines().collect();
        assert_eq!(rows.len(), 7);
        assert!(rows[6].ends_with('\u{2588}'));
        assert_eq!(rows[0].chars().filter(|c| *c != ' ').count(), 3);
    }
}
