//! Shared application state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mythos_core::clock::Clock;
use mythos_core::error::DomainError;
use mythos_core::rng::{DeterministicRng, SeededRng};
use mythos_session::application::controller::{ControllerConfig, TurnController};
use mythos_session::application::narrator::Narrator;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// One live session. The mutex serialises every operation on it.
pub type SessionHandle = Arc<Mutex<TurnController>>;

/// Produces the dice source for a new session.
pub type RngFactory = Arc<dyn Fn() -> Box<dyn DeterministicRng> + Send + Sync>;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live sessions by id. Entries leave the map once their result has
    /// been served.
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
    /// Narrator shared by every session.
    pub narrator: Arc<dyn Narrator>,
    /// Clock for log timestamps.
    pub clock: Arc<dyn Clock>,
    /// Dice source factory, called once per session.
    pub rng_factory: RngFactory,
    /// Controller settings applied to new sessions.
    pub controller_config: ControllerConfig,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        narrator: Arc<dyn Narrator>,
        clock: Arc<dyn Clock>,
        rng_factory: RngFactory,
        controller_config: ControllerConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            narrator,
            clock,
            rng_factory,
            controller_config,
        }
    }

    /// RNG factory for production use. With a seed, session `n` draws from
    /// `seed + n`; without one, every session is entropy-seeded.
    #[must_use]
    pub fn seeded_rng_factory(seed: Option<u64>) -> RngFactory {
        match seed {
            Some(seed) => {
                let counter = AtomicU64::new(0);
                Arc::new(move || -> Box<dyn DeterministicRng> {
                    let n = counter.fetch_add(1, Ordering::Relaxed);
                    Box::new(SeededRng::from_seed(seed.wrapping_add(n)))
                })
            }
            None => Arc::new(|| -> Box<dyn DeterministicRng> {
                Box::new(SeededRng::from_entropy())
            }),
        }
    }

    /// A fresh dice source.
    #[must_use]
    pub fn new_rng(&self) -> Box<dyn DeterministicRng> {
        (self.rng_factory)()
    }

    /// Registers a started session.
    pub async fn insert(&self, controller: TurnController) -> SessionHandle {
        let id = controller.id();
        let handle = Arc::new(Mutex::new(controller));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    /// Drops a session. Returns whether it was registered.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Looks up a session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` for an unknown id.
    pub async fn session(&self, id: Uuid) -> Result<SessionHandle, DomainError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DomainError::SessionNotFound(id))
    }
}
