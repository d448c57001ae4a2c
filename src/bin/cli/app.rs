use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use uuid::Uuid;

use flashdeck_lib::config::AppConfig;
use flashdeck_lib::flashcards::{
    normalize_front, Card, CardSet, Clock, FlashcardStorage, Scope, SessionContext, SystemClock,
};
use flashdeck_lib::study_events::StudyEventStorage;

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
    pub storage: Arc<FlashcardStorage>,
    pub study_events: Arc<StudyEventStorage>,
    pub clock: Arc<dyn Clock>,
}

impl App {
    /// Load config and open storage under the data directory
    pub fn new(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => AppConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AppConfig::load_default().context("Failed to load config")?,
        };

        let data_dir = match data_dir {
            Some(dir) => dir,
            None => config.resolve_data_dir().context("Failed to get data directory")?,
        };

        let storage = FlashcardStorage::new(data_dir.clone());
        storage.init().context("Failed to initialize flashcard storage")?;

        let study_events = StudyEventStorage::new(data_dir)
            .context("Failed to initialize study event storage")?;

        Ok(Self {
            config,
            storage: Arc::new(storage),
            study_events: Arc::new(study_events),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Collaborators for a review session backed by this app's storage
    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(
            self.storage.clone(),
            self.study_events.clone(),
            self.clock.clone(),
        )
        .with_params(self.config.scheduler.clone())
    }

    /// Find a set by name (case-insensitive, exact match first, then prefix)
    pub fn find_set(&self, name: &str) -> Result<CardSet> {
        let sets = self.storage.list_sets().context("Failed to list sets")?;
        let name_lower = name.trim().to_lowercase();

        if let Some(set) = sets.iter().find(|s| s.name.to_lowercase() == name_lower) {
            return Ok(set.clone());
        }

        let matches: Vec<&CardSet> = sets
            .iter()
            .filter(|s| s.name.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!(
                "No set matching '{}'. Available sets:\n{}",
                name,
                sets.iter()
                    .map(|s| format!("  - {}", s.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous set name '{}'. Matches:\n{}",
                name,
                matches
                    .iter()
                    .map(|s| format!("  - {}", s.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    /// Scope for an optional set name
    pub fn scope_for(&self, set_name: Option<&str>) -> Result<Scope> {
        match set_name {
            Some(name) => Ok(Scope::Set {
                set_id: self.find_set(name)?.id,
            }),
            None => Ok(Scope::All),
        }
    }

    /// Find a card in a set by id, id prefix or front text
    pub fn find_card(&self, set: &CardSet, query: &str) -> Result<Card> {
        let cards = self
            .storage
            .list_cards(set.id)
            .context("Failed to list cards")?;

        if let Ok(id) = Uuid::parse_str(query) {
            if let Some(card) = cards.iter().find(|c| c.id == id) {
                return Ok(card.clone());
            }
        }

        let normalized = normalize_front(query);
        if let Some(card) = cards.iter().find(|c| normalize_front(&c.front) == normalized) {
            return Ok(card.clone());
        }

        let matches: Vec<&Card> = cards
            .iter()
            .filter(|c| c.id.to_string().starts_with(query.trim()))
            .collect();

        match matches.len() {
            0 => bail!("No card matching '{}' in set '{}'", query, set.name),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous card id prefix '{}'", query),
        }
    }
}
