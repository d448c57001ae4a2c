//! Review session state machine
//!
//! ```text
//!            reveal              rate (more cards)
//!   Show ────────────▶ Reveal ─────────────────────▶ Show
//!                        │
//!                        │ rate (last card)
//!                        ▼
//!                      Done ──── restart ───▶ Show
//! ```
//!
//! The session works on a snapshot of cards taken at start. A rating is only
//! applied once the store has accepted the updated card; on failure the session
//! stays on the same card in `Reveal` so the rating can be retried.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::{get_due_cards, review, SchedulerParams};
use super::models::{Card, ReviewRating, Scope};
use super::store::{ActivityRecorder, BoxError, CardStore, Clock, NoopRecorder, SystemClock};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No cards due in {0}")]
    EmptyQueue(Scope),

    #[error("Failed to load cards for {scope}: {source}")]
    Load {
        scope: Scope,
        #[source]
        source: BoxError,
    },

    #[error("Failed to save review of card {card_id}: {source}")]
    Persistence {
        card_id: Uuid,
        #[source]
        source: BoxError,
    },

    #[error("Cannot {action} while the session is in {phase}")]
    InvalidTransition { action: &'static str, phase: Phase },

    #[error("Card {0} was already rated in this session")]
    AlreadyRated(Uuid),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Where the session is in the show/reveal/rate cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Front shown, answer hidden
    Show,
    /// Answer shown, waiting for a rating
    Reveal,
    /// Every card in the snapshot has been worked through
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Show => f.write_str("show"),
            Phase::Reveal => f.write_str("reveal"),
            Phase::Done => f.write_str("done"),
        }
    }
}

/// Notifications delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Revealed {
        card_id: Uuid,
    },
    Rated {
        card_id: Uuid,
        rating: ReviewRating,
        due: NaiveDate,
    },
    Completed {
        reviewed: usize,
    },
    Restarted {
        cards: usize,
    },
}

type Observer = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Collaborators a session is driven through
#[derive(Clone)]
pub struct SessionContext {
    pub store: Arc<dyn CardStore>,
    pub recorder: Arc<dyn ActivityRecorder>,
    pub clock: Arc<dyn Clock>,
    pub params: SchedulerParams,
}

impl SessionContext {
    pub fn new(
        store: Arc<dyn CardStore>,
        recorder: Arc<dyn ActivityRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            recorder,
            clock,
            params: SchedulerParams::default(),
        }
    }

    /// Store only; no activity recording, wall clock
    pub fn with_store(store: Arc<dyn CardStore>) -> Self {
        Self::new(store, Arc::new(NoopRecorder), Arc::new(SystemClock))
    }

    pub fn with_params(mut self, params: SchedulerParams) -> Self {
        self.params = params;
        self
    }
}

/// A single review session over a snapshot of cards
pub struct StudySession {
    ctx: SessionContext,
    scope: Scope,
    cards: Vec<Card>,
    index: usize,
    phase: Phase,
    rated: HashSet<Uuid>,
    observers: Vec<Observer>,
}

impl StudySession {
    /// Build the snapshot and enter `Show` on the first card
    ///
    /// With `force_all` every card in scope is studied regardless of its due
    /// date. An empty snapshot is reported as [`SessionError::EmptyQueue`].
    pub async fn start(ctx: SessionContext, scope: Scope, force_all: bool) -> Result<Self> {
        let cards = load_snapshot(&ctx, scope, force_all).await?;
        log::debug!("Study session started for {} with {} cards", scope, cards.len());

        Ok(Self {
            ctx,
            scope,
            cards,
            index: 0,
            phase: Phase::Show,
            rated: HashSet::new(),
            observers: Vec::new(),
        })
    }

    /// Register a callback for session events
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    fn emit(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Cards in the snapshot, including updates from ratings made so far
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// The card being studied, `None` once done
    pub fn current(&self) -> Option<&Card> {
        match self.phase {
            Phase::Done => None,
            _ => self.cards.get(self.index),
        }
    }

    /// Whether the current card was already rated in this session
    pub fn current_is_rated(&self) -> bool {
        self.current().map_or(false, |c| self.rated.contains(&c.id))
    }

    /// Number of cards rated in this session
    pub fn reviewed(&self) -> usize {
        self.rated.len()
    }

    /// (1-based position, total)
    pub fn progress(&self) -> (usize, usize) {
        ((self.index + 1).min(self.cards.len()), self.cards.len())
    }

    /// Show the answer of the current card
    pub fn reveal(&mut self) -> Result<&Card> {
        if self.phase != Phase::Show {
            return Err(SessionError::InvalidTransition {
                action: "reveal",
                phase: self.phase,
            });
        }
        self.phase = Phase::Reveal;
        let card_id = self.cards[self.index].id;
        self.emit(SessionEvent::Revealed { card_id });
        Ok(&self.cards[self.index])
    }

    /// Rate the revealed card, persist it and advance
    ///
    /// Returns the phase entered after advancing. If the store rejects the
    /// write nothing changes and the same rating may be retried.
    pub async fn rate(&mut self, rating: ReviewRating) -> Result<Phase> {
        if self.phase != Phase::Reveal {
            return Err(SessionError::InvalidTransition {
                action: "rate",
                phase: self.phase,
            });
        }

        let card = &self.cards[self.index];
        if self.rated.contains(&card.id) {
            return Err(SessionError::AlreadyRated(card.id));
        }

        let now = self.ctx.clock.now();
        let updated = review(card, rating, &now, &self.ctx.params);

        self.ctx
            .store
            .put_card(&updated)
            .await
            .map_err(|source| SessionError::Persistence {
                card_id: updated.id,
                source,
            })?;

        if let Err(e) = self.ctx.recorder.increment_today_count(now.date_naive(), 1).await {
            log::warn!("Failed to record study activity: {}", e);
        }

        let event = SessionEvent::Rated {
            card_id: updated.id,
            rating,
            due: updated.due,
        };
        self.rated.insert(updated.id);
        self.cards[self.index] = updated;
        self.emit(event);

        self.index += 1;
        if self.index >= self.cards.len() {
            self.index = self.cards.len();
            self.phase = Phase::Done;
            log::info!("Study session complete: {} cards reviewed", self.rated.len());
            self.emit(SessionEvent::Completed {
                reviewed: self.rated.len(),
            });
        } else {
            self.phase = Phase::Show;
        }

        Ok(self.phase)
    }

    /// Move to the next card without rating; stays put on the last card
    pub fn next(&mut self) -> Result<bool> {
        self.navigable("go to the next card")?;
        if self.index + 1 >= self.cards.len() {
            return Ok(false);
        }
        self.index += 1;
        self.phase = Phase::Show;
        Ok(true)
    }

    /// Move to the previous card without rating; stays put on the first card
    pub fn previous(&mut self) -> Result<bool> {
        self.navigable("go to the previous card")?;
        if self.index == 0 {
            return Ok(false);
        }
        self.index -= 1;
        self.phase = Phase::Show;
        Ok(true)
    }

    fn navigable(&self, action: &'static str) -> Result<()> {
        if self.phase == Phase::Done {
            return Err(SessionError::InvalidTransition {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Start over on every card in scope, due or not
    ///
    /// Only valid once the session is done. On failure the session stays done.
    pub async fn restart(&mut self) -> Result<()> {
        if self.phase != Phase::Done {
            return Err(SessionError::InvalidTransition {
                action: "restart",
                phase: self.phase,
            });
        }

        let cards = load_snapshot(&self.ctx, self.scope, true).await?;
        self.cards = cards;
        self.index = 0;
        self.phase = Phase::Show;
        self.rated.clear();
        self.emit(SessionEvent::Restarted {
            cards: self.cards.len(),
        });
        Ok(())
    }
}

async fn load_snapshot(ctx: &SessionContext, scope: Scope, force_all: bool) -> Result<Vec<Card>> {
    let cards = ctx
        .store
        .cards_in_scope(scope)
        .await
        .map_err(|source| SessionError::Load { scope, source })?;

    let snapshot = if force_all {
        cards
    } else {
        get_due_cards(&cards, &ctx.clock.now())
    };

    if snapshot.is_empty() {
        return Err(SessionError::EmptyQueue(scope));
    }
    Ok(snapshot)
}
