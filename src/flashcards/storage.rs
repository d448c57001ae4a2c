//! Storage operations for flashcards
//!
//! Directory structure under the data directory:
//! ```text
//! flashcards/
//! ├── sets.json            # Array of all sets
//! └── cards/
//!     └── {card-id}.json   # Individual card files, content and schedule
//! ```

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::review_stats;
use super::models::*;
use super::store::{BoxError, CardStore};

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Set not found: {0}")]
    SetNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("A card with front \"{front}\" already exists in set {set_id}")]
    DuplicateFront { set_id: Uuid, front: String },

    #[error("Set name must not be empty")]
    EmptySetName,
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Storage manager for sets and cards
pub struct FlashcardStorage {
    /// Base path (e.g., ~/.local/share/flashdeck)
    data_dir: PathBuf,
}

impl FlashcardStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn flashcards_dir(&self) -> PathBuf {
        self.data_dir.join("flashcards")
    }

    fn cards_dir(&self) -> PathBuf {
        self.flashcards_dir().join("cards")
    }

    fn sets_path(&self) -> PathBuf {
        self.flashcards_dir().join("sets.json")
    }

    fn card_path(&self, card_id: Uuid) -> PathBuf {
        self.cards_dir().join(format!("{}.json", card_id))
    }

    /// Create the directory layout and an empty sets.json
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.cards_dir())?;

        let sets_path = self.sets_path();
        if !sets_path.exists() {
            let empty_sets: Vec<CardSet> = Vec::new();
            fs::write(&sets_path, serde_json::to_string_pretty(&empty_sets)?)?;
        }

        Ok(())
    }

    // ==================== Set Operations ====================

    fn read_sets(&self) -> Result<Vec<CardSet>> {
        let sets_path = self.sets_path();
        if !sets_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&sets_path)?;
        let sets: Vec<CardSet> = serde_json::from_str(&content)?;
        Ok(sets)
    }

    /// Atomic write: write to .tmp then rename
    fn write_sets(&self, sets: &[CardSet]) -> Result<()> {
        self.init()?;
        let path = self.sets_path();
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(sets)?)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// List all sets, most recently updated first
    pub fn list_sets(&self) -> Result<Vec<CardSet>> {
        let mut sets = self.read_sets()?;
        sets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sets)
    }

    pub fn get_set(&self, set_id: Uuid) -> Result<CardSet> {
        self.read_sets()?
            .into_iter()
            .find(|s| s.id == set_id)
            .ok_or(FlashcardStorageError::SetNotFound(set_id))
    }

    pub fn create_set(&self, name: String) -> Result<CardSet> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(FlashcardStorageError::EmptySetName);
        }

        let set = CardSet::new(name);
        let mut sets = self.read_sets()?;
        sets.push(set.clone());
        self.write_sets(&sets)?;

        log::debug!("Created set {} ({})", set.name, set.id);
        Ok(set)
    }

    pub fn rename_set(&self, set_id: Uuid, name: String) -> Result<CardSet> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(FlashcardStorageError::EmptySetName);
        }

        let mut sets = self.read_sets()?;
        let set = sets
            .iter_mut()
            .find(|s| s.id == set_id)
            .ok_or(FlashcardStorageError::SetNotFound(set_id))?;
        set.name = name;
        set.updated_at = Utc::now();
        let renamed = set.clone();
        self.write_sets(&sets)?;
        Ok(renamed)
    }

    /// Delete a set and all its cards
    pub fn delete_set(&self, set_id: Uuid) -> Result<()> {
        let mut sets = self.read_sets()?;
        let len_before = sets.len();
        sets.retain(|s| s.id != set_id);
        if sets.len() == len_before {
            return Err(FlashcardStorageError::SetNotFound(set_id));
        }

        for card in self.list_cards(set_id)? {
            let card_path = self.card_path(card.id);
            if card_path.exists() {
                fs::remove_file(&card_path)?;
            }
        }

        self.write_sets(&sets)?;
        Ok(())
    }

    fn touch_set(&self, set_id: Uuid) -> Result<()> {
        let mut sets = self.read_sets()?;
        if let Some(set) = sets.iter_mut().find(|s| s.id == set_id) {
            set.updated_at = Utc::now();
            self.write_sets(&sets)?;
        }
        Ok(())
    }

    // ==================== Card Operations ====================

    /// List all cards across all sets
    pub fn list_all_cards(&self) -> Result<Vec<Card>> {
        let cards_dir = self.cards_dir();
        if !cards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut cards = Vec::new();
        for entry in fs::read_dir(&cards_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                match serde_json::from_str::<Card>(&content) {
                    Ok(card) => cards.push(card),
                    Err(e) => log::warn!("Skipping unreadable card {}: {}", path.display(), e),
                }
            }
        }

        // Directory order is arbitrary
        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        log::debug!("Loaded {} cards from {}", cards.len(), cards_dir.display());
        Ok(cards)
    }

    /// List the cards of one set, least recently updated first
    pub fn list_cards(&self, set_id: Uuid) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .list_all_cards()?
            .into_iter()
            .filter(|c| c.set_id == set_id)
            .collect();
        cards.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(cards)
    }

    pub fn list_cards_in_scope(&self, scope: Scope) -> Result<Vec<Card>> {
        match scope {
            Scope::All => self.list_all_cards(),
            Scope::Set { set_id } => self.list_cards(set_id),
        }
    }

    pub fn get_card(&self, card_id: Uuid) -> Result<Card> {
        let card_path = self.card_path(card_id);
        if !card_path.exists() {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }

        let content = fs::read_to_string(&card_path)?;
        let card: Card = serde_json::from_str(&content)?;
        Ok(card)
    }

    /// Whether a set already holds a card with the same normalized front
    pub fn front_exists_in_set(&self, set_id: Uuid, front: &str, except: Option<Uuid>) -> Result<bool> {
        let normalized = normalize_front(front);
        Ok(self
            .list_cards(set_id)?
            .iter()
            .any(|c| Some(c.id) != except && normalize_front(&c.front) == normalized))
    }

    fn ensure_unique_front(&self, set_id: Uuid, front: &str, except: Option<Uuid>) -> Result<()> {
        if self.front_exists_in_set(set_id, front, except)? {
            return Err(FlashcardStorageError::DuplicateFront {
                set_id,
                front: front.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Atomic write: write to .tmp then rename
    fn write_card(&self, card: &Card) -> Result<()> {
        self.init()?;
        let path = self.card_path(card.id);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(card)?)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Create a new card, due on `today`
    pub fn create_card(
        &self,
        set_id: Uuid,
        front: String,
        back: String,
        note: Option<String>,
        today: NaiveDate,
    ) -> Result<Card> {
        self.get_set(set_id)?;
        self.ensure_unique_front(set_id, &front, None)?;

        let card = Card::new(set_id, front, back, today).with_note(note);
        self.write_card(&card)?;
        self.touch_set(set_id)?;

        Ok(card)
    }

    /// Replace the front/back/note of a card, leaving its schedule alone
    pub fn update_card_content(
        &self,
        card_id: Uuid,
        front: Option<String>,
        back: Option<String>,
        note: Option<Option<String>>,
    ) -> Result<Card> {
        let mut card = self.get_card(card_id)?;

        if let Some(front) = front {
            self.ensure_unique_front(card.set_id, &front, Some(card.id))?;
            card.front = front;
        }
        if let Some(back) = back {
            card.back = back;
        }
        if let Some(note) = note {
            card = card.with_note(note);
        }
        card.updated_at = Utc::now();

        self.write_card(&card)?;
        Ok(card)
    }

    /// Save a card as-is (used for review updates)
    pub fn save_card(&self, card: &Card) -> Result<()> {
        self.write_card(card)
    }

    pub fn delete_card(&self, card_id: Uuid) -> Result<()> {
        let card_path = self.card_path(card_id);
        if !card_path.exists() {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }
        fs::remove_file(&card_path)?;
        Ok(())
    }

    /// Move a card to another set
    pub fn move_card(&self, card_id: Uuid, target_set_id: Uuid) -> Result<Card> {
        let mut card = self.get_card(card_id)?;
        self.get_set(target_set_id)?;
        if card.set_id == target_set_id {
            return Ok(card);
        }
        self.ensure_unique_front(target_set_id, &card.front, None)?;

        card.set_id = target_set_id;
        card.updated_at = Utc::now();
        self.write_card(&card)?;
        Ok(card)
    }

    // ==================== Review Operations ====================

    pub fn get_review_stats(&self, scope: Scope, today: NaiveDate) -> Result<ReviewStats> {
        let cards = self.list_cards_in_scope(scope)?;
        Ok(review_stats(&cards, today))
    }
}

#[async_trait]
impl CardStore for FlashcardStorage {
    async fn cards_in_scope(&self, scope: Scope) -> std::result::Result<Vec<Card>, BoxError> {
        Ok(self.list_cards_in_scope(scope)?)
    }

    async fn put_card(&self, card: &Card) -> std::result::Result<(), BoxError> {
        Ok(self.save_card(card)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::algorithm::{review, SchedulerParams};
    use crate::flashcards::session::{SessionContext, StudySession};
    use chrono::{Local, TimeZone};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_storage() -> (FlashcardStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FlashcardStorage::new(temp_dir.path().to_path_buf());
        storage.init().unwrap();
        (storage, temp_dir)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn test_create_and_list_sets() {
        let (storage, _temp) = create_test_storage();

        let a = storage.create_set("Spanish".to_string()).unwrap();
        let b = storage.create_set("  French ".to_string()).unwrap();
        assert_eq!(b.name, "French");

        let sets = storage.list_sets().unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(storage.get_set(a.id).unwrap().name, "Spanish");
        assert!(matches!(
            storage.create_set("   ".to_string()),
            Err(FlashcardStorageError::EmptySetName)
        ));
    }

    #[test]
    fn test_rename_set() {
        let (storage, _temp) = create_test_storage();
        let set = storage.create_set("Spansih".to_string()).unwrap();

        let renamed = storage.rename_set(set.id, "Spanish".to_string()).unwrap();
        assert_eq!(renamed.name, "Spanish");
        assert!(renamed.updated_at >= set.updated_at);
        assert!(matches!(
            storage.rename_set(Uuid::new_v4(), "x".to_string()),
            Err(FlashcardStorageError::SetNotFound(_))
        ));
    }

    #[test]
    fn test_create_card_with_defaults() {
        let (storage, _temp) = create_test_storage();
        let set = storage.create_set("Spanish".to_string()).unwrap();

        let card = storage
            .create_card(set.id, "hola".to_string(), "hello".to_string(), Some("greeting".to_string()), today())
            .unwrap();
        assert_eq!(card.stability, DEFAULT_STABILITY);
        assert_eq!(card.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(card.due, today());
        assert_eq!(card.note.as_deref(), Some("greeting"));

        let loaded = storage.get_card(card.id).unwrap();
        assert_eq!(loaded, card);
        assert_eq!(storage.list_cards(set.id).unwrap().len(), 1);
    }

    #[test]
    fn test_create_card_in_missing_set_fails() {
        let (storage, _temp) = create_test_storage();
        let result = storage.create_card(Uuid::new_v4(), "a".to_string(), "b".to_string(), None, today());
        assert!(matches!(result, Err(FlashcardStorageError::SetNotFound(_))));
    }

    #[test]
    fn test_duplicate_front_rejected_within_set() {
        let (storage, _temp) = create_test_storage();
        let set = storage.create_set("A".to_string()).unwrap();
        let other = storage.create_set("B".to_string()).unwrap();

        storage
            .create_card(set.id, " Hola ".to_string(), "hello".to_string(), None, today())
            .unwrap();
        let dup = storage.create_card(set.id, "hola".to_string(), "hello".to_string(), None, today());
        assert!(matches!(dup, Err(FlashcardStorageError::DuplicateFront { .. })));

        // Same front in a different set is fine
        storage
            .create_card(other.id, "hola".to_string(), "hello again".to_string(), None, today())
            .unwrap();
    }

    #[test]
    fn test_move_into_duplicate_front_rejected() {
        let (storage, _temp) = create_test_storage();
        let s1 = storage.create_set("A".to_string()).unwrap();
        let s2 = storage.create_set("B".to_string()).unwrap();
        let s3 = storage.create_set("C".to_string()).unwrap();

        let c1 = storage
            .create_card(s1.id, "hola".to_string(), "hello".to_string(), None, today())
            .unwrap();
        storage
            .create_card(s2.id, "hola".to_string(), "hello again".to_string(), None, today())
            .unwrap();

        let result = storage.move_card(c1.id, s2.id);
        assert!(matches!(result, Err(FlashcardStorageError::DuplicateFront { .. })));

        let moved = storage.move_card(c1.id, s3.id).unwrap();
        assert_eq!(moved.set_id, s3.id);
        assert!(storage.list_cards(s1.id).unwrap().is_empty());
    }

    #[test]
    fn test_update_card_content_keeps_schedule() {
        let (storage, _temp) = create_test_storage();
        let set = storage.create_set("A".to_string()).unwrap();
        let card = storage
            .create_card(set.id, "hola".to_string(), "hi".to_string(), None, today())
            .unwrap();

        let now = Local.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let reviewed = review(&card, ReviewRating::Good, &now, &SchedulerParams::default());
        storage.save_card(&reviewed).unwrap();

        let updated = storage
            .update_card_content(card.id, None, Some("hello".to_string()), Some(None))
            .unwrap();
        assert_eq!(updated.back, "hello");
        assert_eq!(updated.review_count, 1);
        assert_eq!(updated.due, reviewed.due);

        // Editing a front to itself is not a duplicate
        storage
            .update_card_content(card.id, Some("Hola".to_string()), None, None)
            .unwrap();
    }

    #[test]
    fn test_delete_set_removes_cards() {
        let (storage, _temp) = create_test_storage();
        let set = storage.create_set("A".to_string()).unwrap();
        let keep = storage.create_set("B".to_string()).unwrap();
        storage
            .create_card(set.id, "uno".to_string(), "one".to_string(), None, today())
            .unwrap();
        storage
            .create_card(keep.id, "dos".to_string(), "two".to_string(), None, today())
            .unwrap();

        storage.delete_set(set.id).unwrap();
        assert!(matches!(storage.get_set(set.id), Err(FlashcardStorageError::SetNotFound(_))));
        assert_eq!(storage.list_all_cards().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_card() {
        let (storage, _temp) = create_test_storage();
        let set = storage.create_set("A".to_string()).unwrap();
        let card = storage
            .create_card(set.id, "uno".to_string(), "one".to_string(), None, today())
            .unwrap();

        storage.delete_card(card.id).unwrap();
        assert!(matches!(storage.get_card(card.id), Err(FlashcardStorageError::CardNotFound(_))));
        assert!(matches!(storage.delete_card(card.id), Err(FlashcardStorageError::CardNotFound(_))));
    }

    #[test]
    fn test_review_stats_for_scope() {
        let (storage, _temp) = create_test_storage();
        let set = storage.create_set("A".to_string()).unwrap();
        storage
            .create_card(set.id, "uno".to_string(), "one".to_string(), None, today())
            .unwrap();
        storage
            .create_card(set.id, "dos".to_string(), "two".to_string(), None, today())
            .unwrap();

        let stats = storage.get_review_stats(Scope::Set { set_id: set.id }, today()).unwrap();
        assert_eq!(stats.total_cards, 2);
        assert_eq!(stats.new_cards, 2);
        assert_eq!(stats.due_cards, 2);
    }

    #[tokio::test]
    async fn test_session_over_file_storage() {
        let (storage, _temp) = create_test_storage();
        let set = storage.create_set("A".to_string()).unwrap();
        let card = storage
            .create_card(set.id, "uno".to_string(), "one".to_string(), None, today())
            .unwrap();

        let storage = Arc::new(storage);
        let mut session = StudySession::start(
            SessionContext::with_store(storage.clone()),
            Scope::Set { set_id: set.id },
            true,
        )
        .await
        .unwrap();
        session.reveal().unwrap();
        session.rate(ReviewRating::Again).await.unwrap();

        let saved = storage.get_card(card.id).unwrap();
        assert_eq!(saved.review_count, 1);
        assert_eq!(saved.lapse_count, 1);
        assert!(saved.last_reviewed.is_some());
    }

    #[test]
    fn test_card_writes_leave_no_tmp_files() {
        let (storage, temp) = create_test_storage();
        let set = storage.create_set("A".to_string()).unwrap();
        let mut card = storage
            .create_card(set.id, "uno".to_string(), "one".to_string(), None, today())
            .unwrap();
        card.review_count = 3;
        storage.save_card(&card).unwrap();

        let cards_dir = temp.path().join("flashcards").join("cards");
        let names: Vec<String> = fs::read_dir(&cards_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("{}.json", card.id)]);
        assert!(!temp.path().join("flashcards").join("sets.json.tmp").exists());
        assert_eq!(storage.get_card(card.id).unwrap().review_count, 3);
    }

    #[tokio::test]
    async fn test_interrupted_writes_do_not_hide_the_deck() {
        let (storage, temp) = create_test_storage();
        let set = storage.create_set("A".to_string()).unwrap();
        let kept = storage
            .create_card(set.id, "uno".to_string(), "one".to_string(), None, today())
            .unwrap();
        let torn = storage
            .create_card(set.id, "dos".to_string(), "two".to_string(), None, today())
            .unwrap();

        let cards_dir = temp.path().join("flashcards").join("cards");
        fs::write(cards_dir.join(format!("{}.json.tmp", kept.id)), "{\"id\":").unwrap();
        fs::write(cards_dir.join(format!("{}.json", torn.id)), "{\"id\":").unwrap();

        let cards = storage.list_cards_in_scope(Scope::All).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, kept.id);

        let session = StudySession::start(
            SessionContext::with_store(Arc::new(storage)),
            Scope::Set { set_id: set.id },
            true,
        )
        .await
        .unwrap();
        assert_eq!(session.len(), 1);
    }
}
