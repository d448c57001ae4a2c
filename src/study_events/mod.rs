//! Daily study activity: review counts per day, streak and heatmap

pub mod models;
pub mod storage;

pub use models::*;
pub use storage::{StudyEventStorage, StudyEventStorageError};
