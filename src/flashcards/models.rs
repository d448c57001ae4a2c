//! Data models for the flashcard system

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stability given to a freshly created card (days-equivalent)
pub const DEFAULT_STABILITY: f64 = 0.4;

/// Difficulty given to a freshly created card (lower is easier)
pub const DEFAULT_DIFFICULTY: f64 = 0.3;

/// A named collection of cards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CardSet {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A flashcard with its content and spaced repetition state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    pub set_id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Memory strength in days-equivalent, always > 0
    #[serde(default = "default_stability")]
    pub stability: f64,
    /// Item hardness, kept within the scheduler's difficulty bounds
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,
    /// Local calendar date the card becomes reviewable
    pub due: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub lapse_count: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_stability() -> f64 {
    DEFAULT_STABILITY
}

fn default_difficulty() -> f64 {
    DEFAULT_DIFFICULTY
}

impl Card {
    /// Create a card with default scheduling state, due on `today`
    pub fn new(set_id: Uuid, front: String, back: String, today: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            set_id,
            front,
            back,
            note: None,
            stability: DEFAULT_STABILITY,
            difficulty: DEFAULT_DIFFICULTY,
            due: today,
            last_reviewed: None,
            review_count: 0,
            lapse_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.trim().is_empty());
        self
    }

    /// Whether the card is reviewable on `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.due <= today
    }

    /// Never reviewed
    pub fn is_new(&self) -> bool {
        self.review_count == 0
    }
}

/// Normalized form of a card front, used for duplicate detection within a set
pub fn normalize_front(front: &str) -> String {
    front.trim().to_lowercase()
}

/// Recall quality reported after revealing the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewRating {
    /// Forgotten; counts as a lapse
    Again,
    Hard,
    Good,
    Easy,
}

impl ReviewRating {
    pub const ALL: [ReviewRating; 4] = [
        ReviewRating::Again,
        ReviewRating::Hard,
        ReviewRating::Good,
        ReviewRating::Easy,
    ];

    /// Quality index 0..=3
    pub fn quality(self) -> u8 {
        match self {
            ReviewRating::Again => 0,
            ReviewRating::Hard => 1,
            ReviewRating::Good => 2,
            ReviewRating::Easy => 3,
        }
    }

    /// Map a UI button number (1-4: Again, Hard, Good, Easy)
    pub fn from_button(button: u8) -> Option<Self> {
        match button {
            1 => Some(ReviewRating::Again),
            2 => Some(ReviewRating::Hard),
            3 => Some(ReviewRating::Good),
            4 => Some(ReviewRating::Easy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewRating::Again => "Again",
            ReviewRating::Hard => "Hard",
            ReviewRating::Good => "Good",
            ReviewRating::Easy => "Easy",
        }
    }
}

impl fmt::Display for ReviewRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReviewRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "again" | "1" => Ok(ReviewRating::Again),
            "hard" | "2" => Ok(ReviewRating::Hard),
            "good" | "3" => Ok(ReviewRating::Good),
            "easy" | "4" => Ok(ReviewRating::Easy),
            other => Err(format!("unknown rating: {}", other)),
        }
    }
}

/// Which cards a study session draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Scope {
    All,
    Set { set_id: Uuid },
}

impl Scope {
    pub fn contains(&self, card: &Card) -> bool {
        match self {
            Scope::All => true,
            Scope::Set { set_id } => card.set_id == *set_id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all cards"),
            Scope::Set { set_id } => write!(f, "set {}", set_id),
        }
    }
}

/// Deck-level counts for a scope
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub due_cards: usize,
    pub lapsed_cards: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_has_default_state() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let card = Card::new(Uuid::new_v4(), "hola".into(), "hello".into(), today);

        assert_eq!(card.stability, DEFAULT_STABILITY);
        assert_eq!(card.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(card.due, today);
        assert_eq!(card.review_count, 0);
        assert_eq!(card.lapse_count, 0);
        assert!(card.is_new());
        assert!(card.is_due(today));
    }

    #[test]
    fn test_due_serializes_as_iso_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let card = Card::new(Uuid::new_v4(), "hola".into(), "hello".into(), today);
        let json = serde_json::to_value(&card).unwrap();

        assert_eq!(json["due"], "2024-03-10");
        assert_eq!(json["reviewCount"], 0);
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_normalize_front() {
        assert_eq!(normalize_front(" Hola "), "hola");
        assert_eq!(normalize_front("HOLA"), normalize_front("hola"));
    }

    #[test]
    fn test_rating_order_and_parse() {
        assert!(ReviewRating::Again < ReviewRating::Hard);
        assert!(ReviewRating::Good < ReviewRating::Easy);
        assert_eq!(ReviewRating::Easy.quality(), 3);
        assert_eq!("good".parse::<ReviewRating>().unwrap(), ReviewRating::Good);
        assert_eq!(ReviewRating::from_button(1), Some(ReviewRating::Again));
        assert_eq!(ReviewRating::from_button(5), None);
        assert!("meh".parse::<ReviewRating>().is_err());
    }
}
