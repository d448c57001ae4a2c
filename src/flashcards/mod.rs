//! Flashcards and spaced repetition
//!
//! This module provides:
//! - Set and card storage (JSON files, one per card)
//! - The stability/difficulty scheduler
//! - Review sessions (show, reveal, rate, advance)
//! - Collaborator traits sessions are driven through

pub mod algorithm;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;

pub use algorithm::{compute_next, get_due_cards, review, ScheduleOutcome, SchedulerParams};
pub use models::*;
pub use session::{Phase, SessionContext, SessionError, SessionEvent, StudySession};
pub use storage::{FlashcardStorage, FlashcardStorageError};
pub use store::{ActivityRecorder, CardStore, Clock, FixedClock, SystemClock};
