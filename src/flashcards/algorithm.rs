//! Stability/difficulty spaced repetition scheduler
//!
//! Each card carries a `stability` (how many days the memory survives, roughly)
//! and a `difficulty` in `[min_difficulty, max_difficulty]`. A rating moves the
//! difficulty by a fixed step, then grows stability multiplicatively, damped by
//! the new difficulty. A lapse ("again") halves stability instead, floored at
//! half the base stability.
//!
//! Ratings map to a quality index:
//! - Again: 0
//! - Hard: 1
//! - Good: 2
//! - Easy: 3
//!
//! Everything here is pure. Callers pass "now" explicitly and persist the
//! returned card themselves.

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Card, ReviewRating, ReviewStats, DEFAULT_DIFFICULTY, DEFAULT_STABILITY};

/// Tuning constants of the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SchedulerParams {
    /// Stability of a new card, in days-equivalent
    pub base_stability: f64,
    /// Difficulty of a new card
    pub base_difficulty: f64,
    /// Difficulty change per rating step
    pub difficulty_step: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    /// Multiplicative stability growth for a successful recall
    pub interval_growth: f64,
    /// Stability multiplier on a lapse
    pub lapse_factor: f64,
    /// How strongly difficulty slows stability growth
    pub difficulty_damping: f64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            base_stability: DEFAULT_STABILITY,
            base_difficulty: DEFAULT_DIFFICULTY,
            difficulty_step: 0.08,
            min_difficulty: 0.05,
            max_difficulty: 0.95,
            interval_growth: 2.2,
            lapse_factor: 0.5,
            difficulty_damping: 0.7,
        }
    }
}

impl SchedulerParams {
    /// Check that the parameters keep the output guarantees
    /// (stability > 0, difficulty within bounds, interval >= 1 day)
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            self.base_stability,
            self.base_difficulty,
            self.difficulty_step,
            self.min_difficulty,
            self.max_difficulty,
            self.interval_growth,
            self.lapse_factor,
            self.difficulty_damping,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err("scheduler parameters must be finite numbers".to_string());
        }
        if self.base_stability <= 0.0 {
            return Err("base_stability must be positive".to_string());
        }
        if self.min_difficulty <= 0.0 || self.min_difficulty > self.max_difficulty {
            return Err("difficulty bounds must satisfy 0 < min_difficulty <= max_difficulty".to_string());
        }
        if self.max_difficulty >= 1.0 {
            return Err("max_difficulty must be below 1".to_string());
        }
        if self.base_difficulty < self.min_difficulty || self.base_difficulty > self.max_difficulty {
            return Err("base_difficulty must lie within the difficulty bounds".to_string());
        }
        if self.interval_growth <= 0.0 || self.lapse_factor <= 0.0 {
            return Err("interval_growth and lapse_factor must be positive".to_string());
        }
        if self.difficulty_damping < 0.0 || self.difficulty_damping * self.max_difficulty >= 1.0 {
            return Err("difficulty_damping * max_difficulty must be in [0, 1)".to_string());
        }
        Ok(())
    }
}

/// Result of scheduling one rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleOutcome {
    pub next_stability: f64,
    pub next_difficulty: f64,
    /// Always >= 1
    pub interval_days: f64,
}

/// Calculate the next stability, difficulty and interval for a rating
pub fn compute_next(card: &Card, rating: ReviewRating, params: &SchedulerParams) -> ScheduleOutcome {
    // Corrupt persisted values would otherwise leak through the formula
    let difficulty = if card.difficulty.is_finite() {
        card.difficulty.clamp(params.min_difficulty, params.max_difficulty)
    } else {
        params.base_difficulty
    };
    let stability = if card.stability.is_finite() && card.stability > 0.0 {
        card.stability
    } else {
        params.base_stability
    };

    let q = f64::from(rating.quality());
    let easy_bonus = if rating == ReviewRating::Easy {
        params.difficulty_step
    } else {
        0.0
    };
    let delta = (1.0 - q / 3.0) * params.difficulty_step - easy_bonus;
    let next_difficulty = (difficulty + delta).clamp(params.min_difficulty, params.max_difficulty);

    let next_stability = match rating {
        ReviewRating::Again => {
            (params.base_stability * params.lapse_factor).max(stability * params.lapse_factor)
        }
        _ => {
            let growth = params.interval_growth * (1.0 - next_difficulty * params.difficulty_damping);
            stability * growth
        }
    };

    ScheduleOutcome {
        next_stability,
        next_difficulty,
        interval_days: next_stability.max(1.0),
    }
}

/// Whole days until the next review, at least one
pub fn interval_to_days(interval_days: f64) -> u64 {
    // `as` saturates, so huge intervals cannot wrap
    interval_days.round().max(1.0) as u64
}

/// Local calendar date `days` after `today`
pub fn due_after(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Apply a rating to a card, returning the updated card
///
/// Only scheduling fields and `updated_at` change; identity and content are
/// carried over untouched.
pub fn review<Tz: TimeZone>(
    card: &Card,
    rating: ReviewRating,
    now: &DateTime<Tz>,
    params: &SchedulerParams,
) -> Card {
    let outcome = compute_next(card, rating, params);
    let today = now.date_naive();
    let reviewed_at = now.with_timezone(&Utc);

    let mut next = card.clone();
    next.stability = outcome.next_stability;
    next.difficulty = outcome.next_difficulty;
    next.due = due_after(today, interval_to_days(outcome.interval_days));
    next.last_reviewed = Some(reviewed_at);
    next.review_count = card.review_count.saturating_add(1);
    if rating == ReviewRating::Again {
        next.lapse_count = card.lapse_count.saturating_add(1);
    }
    next.updated_at = reviewed_at;
    next
}

/// Reset a card's scheduling state to the defaults, due today
pub fn init_card(card: &Card, now: &DateTime<Local>, params: &SchedulerParams) -> Card {
    let mut next = card.clone();
    next.stability = params.base_stability;
    next.difficulty = params.base_difficulty;
    next.due = now.date_naive();
    next.last_reviewed = None;
    next.review_count = 0;
    next.lapse_count = 0;
    next.updated_at = now.with_timezone(&Utc);
    next
}

/// Cards whose due date is on or before today's local date, in input order
pub fn get_due_cards<Tz: TimeZone>(cards: &[Card], now: &DateTime<Tz>) -> Vec<Card> {
    let today = now.date_naive();
    cards.iter().filter(|c| c.is_due(today)).cloned().collect()
}

/// Days until due for each rating: [Again, Hard, Good, Easy]
/// Used to label the rating buttons
pub fn preview_intervals(card: &Card, params: &SchedulerParams) -> [u64; 4] {
    ReviewRating::ALL.map(|rating| interval_to_days(compute_next(card, rating, params).interval_days))
}

/// Summary counts for a set of cards
pub fn review_stats(cards: &[Card], today: NaiveDate) -> ReviewStats {
    let mut stats = ReviewStats {
        total_cards: cards.len(),
        ..ReviewStats::default()
    };
    for card in cards {
        if card.is_new() {
            stats.new_cards += 1;
        }
        if card.is_due(today) {
            stats.due_cards += 1;
        }
        if card.lapse_count > 0 {
            stats.lapsed_cards += 1;
        }
    }
    stats
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u64) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
