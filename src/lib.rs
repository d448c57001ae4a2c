pub mod config;
pub mod flashcards;
pub mod study_events;
