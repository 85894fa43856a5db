//! Test narrators — scripted `Narrator` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use mythos_session::application::narrator::{
    InitialScenario, Narrator, NarratorError, TurnRequest, TurnResponse,
};

/// A small opening scenario with two starting items.
#[must_use]
pub fn sample_scenario() -> InitialScenario {
    InitialScenario {
        outline: "The host hid a relic in the cellar.".to_owned(),
        guidance: "Relic in cellar; locked door; diary holds the clue.".to_owned(),
        introduction_text: "You stand before an old mansion in the fog.".to_owned(),
        objective: "Enter the mansion and find your host".to_owned(),
        initial_flags: Vec::new(),
        initial_inventory: vec!["invitation".to_owned(), "flashlight".to_owned()],
    }
}

/// A narrator that replays queued responses in order and records every
/// player input it receives. Once the turn queue is empty it answers with
/// a transport error.
#[derive(Debug)]
pub struct QueuedNarrator {
    scenarios: Mutex<VecDeque<Result<InitialScenario, NarratorError>>>,
    turns: Mutex<VecDeque<Result<TurnResponse, NarratorError>>>,
    inputs: Mutex<Vec<String>>,
    player_turns: Mutex<Vec<usize>>,
    scenario_calls: Mutex<usize>,
}

impl Default for QueuedNarrator {
    fn default() -> Self {
        Self::new()
    }
}

impl QueuedNarrator {
    /// Creates a narrator whose opening scenario is [`sample_scenario`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            scenarios: Mutex::new(VecDeque::new()),
            turns: Mutex::new(VecDeque::new()),
            inputs: Mutex::new(Vec::new()),
            player_turns: Mutex::new(Vec::new()),
            scenario_calls: Mutex::new(0),
        }
    }

    /// Queues an initial scenario result. Without one, [`sample_scenario`]
    /// is returned.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_scenario(&self, scenario: Result<InitialScenario, NarratorError>) {
        self.scenarios.lock().unwrap().push_back(scenario);
    }

    /// Queues a successful turn response.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_turn(&self, response: TurnResponse) {
        self.turns.lock().unwrap().push_back(Ok(response));
    }

    /// Queues a failed turn.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_turn_error(&self, error: NarratorError) {
        self.turns.lock().unwrap().push_back(Err(error));
    }

    /// Player inputs received by `request_turn`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    /// Player-turn counts observed by `request_turn`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn observed_turns(&self) -> Vec<usize> {
        self.player_turns.lock().unwrap().clone()
    }

    /// Number of `request_turn` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn turn_calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    /// Number of `request_initial_scenario` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn scenario_calls(&self) -> usize {
        *self.scenario_calls.lock().unwrap()
    }
}

#[async_trait]
impl Narrator for QueuedNarrator {
    async fn request_initial_scenario(
        &self,
        _character_name: &str,
        _theme: &str,
    ) -> Result<InitialScenario, NarratorError> {
        *self.scenario_calls.lock().unwrap() += 1;
        self.scenarios
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_scenario()))
    }

    async fn request_turn(&self, request: &TurnRequest<'_>) -> Result<TurnResponse, NarratorError> {
        self.inputs
            .lock()
            .unwrap()
            .push(request.player_input.to_owned());
        self.player_turns
            .lock()
            .unwrap()
            .push(request.player_turns());
        self.turns.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(NarratorError::Transport(
                "no queued narrator response".to_owned(),
            ))
        })
    }
}

/// A narrator whose turn requests never complete. Used to exercise
/// timeouts and cancelled turns.
#[derive(Debug, Default)]
pub struct PendingNarrator;

#[async_trait]
impl Narrator for PendingNarrator {
    async fn request_initial_scenario(
        &self,
        _character_name: &str,
        _theme: &str,
    ) -> Result<InitialScenario, NarratorError> {
        Ok(sample_scenario())
    }

    async fn request_turn(&self, _request: &TurnRequest<'_>) -> Result<TurnResponse, NarratorError> {
        std::future::pending().await
    }
}
