//! Study event storage implementation
//!
//! All events live in a single `study_events.json` array, one entry per day.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use super::models::*;
use crate::flashcards::store::{ActivityRecorder, BoxError};

#[derive(Error, Debug)]
pub enum StudyEventStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, StudyEventStorageError>;

/// Storage for daily study counts
pub struct StudyEventStorage {
    events_dir: PathBuf,
    /// Serializes read-modify-write of the events file
    write_lock: Mutex<()>,
}

impl StudyEventStorage {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        let events_dir = data_dir.join("study");
        fs::create_dir_all(&events_dir)?;

        Ok(Self {
            events_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn events_file(&self) -> PathBuf {
        self.events_dir.join("study_events.json")
    }

    pub fn list_events(&self) -> Result<Vec<StudyEvent>> {
        let path = self.events_file();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)?;
        let events: Vec<StudyEvent> = serde_json::from_str(&content)?;
        Ok(events)
    }

    fn save_events(&self, events: &[StudyEvent]) -> Result<()> {
        let path = self.events_file();
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(events)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Add `by` reviews to `date`, creating the day's entry if needed
    pub fn increment(&self, date: NaiveDate, by: u32) -> Result<StudyEvent> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut events = self.list_events()?;

        let event = if let Some(existing) = events.iter_mut().find(|e| e.date == date) {
            existing.count = existing.count.saturating_add(by);
            existing.clone()
        } else {
            let event = StudyEvent::new(date, by);
            events.push(event.clone());
            events.sort_by(|a, b| a.date.cmp(&b.date));
            event
        };

        self.save_events(&events)?;
        Ok(event)
    }

    /// Counts per day between `start` and `end`, inclusive
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> Result<ActivityMap> {
        if start > end {
            return Err(StudyEventStorageError::InvalidRange { start, end });
        }

        Ok(self
            .list_events()?
            .into_iter()
            .filter(|e| e.date >= start && e.date <= end)
            .map(|e| (e.date, e.count))
            .collect())
    }

    /// Consecutive study days ending today
    pub fn current_streak(&self, today: NaiveDate) -> Result<u32> {
        let events: ActivityMap = self
            .list_events()?
            .into_iter()
            .map(|e| (e.date, e.count))
            .collect();
        Ok(compute_streak(&events, today))
    }

    /// Heatmap cells for the `columns` weeks ending today
    pub fn heatmap(&self, today: NaiveDate, columns: usize) -> Result<Vec<HeatmapCell>> {
        let events = self.get_range(heatmap_start(today, columns), today)?;
        Ok(heatmap(&events, today, columns))
    }
}

#[async_trait]
impl ActivityRecorder for StudyEventStorage {
    async fn increment_today_count(&self, today: NaiveDate, by: u32) -> std::result::Result<(), BoxError> {
        self.increment(today, by)?;
        Ok(())
    }
}
