//! Collaborator seams for review sessions
//!
//! A [`StudySession`](super::session::StudySession) never touches the
//! filesystem or the system clock directly. It reads and writes cards through
//! a [`CardStore`], reports study activity through an [`ActivityRecorder`] and
//! asks a [`Clock`] for the current time.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};

use super::models::{Card, Scope};

/// Error type returned by collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Card persistence used by the review session
#[async_trait]
pub trait CardStore: Send + Sync {
    /// All cards belonging to the scope
    async fn cards_in_scope(&self, scope: Scope) -> Result<Vec<Card>, BoxError>;

    /// Insert or replace a card
    async fn put_card(&self, card: &Card) -> Result<(), BoxError>;
}

/// Daily study counter feeding the activity heatmap
#[async_trait]
pub trait ActivityRecorder: Send + Sync {
    async fn increment_today_count(&self, today: NaiveDate, by: u32) -> Result<(), BoxError>;
}

/// Recorder that drops every event
pub struct NoopRecorder;

#[async_trait]
impl ActivityRecorder for NoopRecorder {
    async fn increment_today_count(&self, _today: NaiveDate, _by: u32) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Source of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
