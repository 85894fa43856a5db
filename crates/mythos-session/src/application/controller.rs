//! Turn progression controller.
//!
//! Sequences one session: the opening scenario, player inputs, narrator
//! beats, skill checks and termination. Each turn is staged on a copy of
//! the session and committed only after the narrator's response has been
//! fully processed, so a failed or cancelled narrator call leaves the
//! committed session untouched.

use std::sync::Arc;
use std::time::Duration;

use mythos_core::clock::Clock;
use mythos_core::error::DomainError;
use mythos_core::rng::DeterministicRng;
use mythos_rules::domain::resolution::{CheckResult, resolve_check};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::log::{LogMessage, MessageKind};
use crate::domain::patch::apply_patch;
use crate::domain::result::{Baseline, SessionResult};
use crate::domain::signals::{CheckRequest, EndSignal};
use crate::domain::state::{SessionPhase, SessionState};

use super::narrator::{InitialScenario, Narrator, NarratorError, TurnRequest, TurnResponse};
use super::retry::{retry_malformed, retry_with_fallback};

/// Name used for the character when the profile leaves it blank.
const DEFAULT_CHARACTER_NAME: &str = "Investigator";

/// Errors returned by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The input was empty or whitespace.
    #[error("input is required")]
    MissingInput,

    /// The session has not been started.
    #[error("session has not been started")]
    NotStarted,

    /// `start` was called twice.
    #[error("session has already been started")]
    AlreadyStarted,

    /// A check must be rolled before more input is accepted.
    #[error("a {0} check must be rolled first")]
    CheckPending(String),

    /// `roll_check` was called without a pending check.
    #[error("no check is pending")]
    NoPendingCheck,

    /// The session has ended.
    #[error("session has ended")]
    SessionEnded,

    /// A result was requested before the session ended.
    #[error("session has not ended yet")]
    NotEnded,

    /// The narrator failed.
    #[error(transparent)]
    Narrator(#[from] NarratorError),
}

impl From<TurnError> for DomainError {
    fn from(err: TurnError) -> Self {
        let message = err.to_string();
        match err {
            TurnError::MissingInput => Self::Validation(message),
            TurnError::Narrator(_) => Self::Narrator(message),
            _ => Self::InvalidState(message),
        }
    }
}

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPhase {
    /// Created, waiting for `start`.
    Created,
    /// Waiting for free-text input.
    AwaitingInput,
    /// A narrator call is in flight.
    NarratorPending,
    /// Choices are on offer; free-text input is still accepted.
    ChoicePresented,
    /// A check must be rolled.
    CheckPending,
    /// The session is over.
    Ended,
}

/// Tunables for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Narrator attempts per call while output is malformed.
    pub max_attempts: u32,
    /// Log messages handed to the narrator as context.
    pub context_window: usize,
    /// Upper bound on one narrator attempt.
    pub narrator_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            context_window: 5,
            narrator_timeout: Duration::from_secs(30),
        }
    }
}

/// What the presentation layer needs after a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    /// Phase after the turn.
    pub phase: ControllerPhase,
    /// Choices on offer.
    pub choices: Vec<String>,
    /// Check awaiting a roll.
    pub pending_check: Option<CheckRequest>,
    /// End signal, once observed.
    pub end_signal: Option<EndSignal>,
    /// Messages appended during the turn.
    pub messages: Vec<LogMessage>,
}

/// Result of [`TurnController::roll_check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollOutcome {
    /// The resolved check.
    pub check: CheckResult,
    /// The turn triggered by reporting the result.
    pub turn: TurnOutcome,
}

/// Turn-scoped state that is staged and committed together with the
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Progress {
    state: SessionState,
    choices: Vec<String>,
    pending_check: Option<CheckRequest>,
    end_signal: Option<EndSignal>,
}

impl Progress {
    fn phase(&self) -> ControllerPhase {
        if self.end_signal.is_some() {
            ControllerPhase::Ended
        } else if self.pending_check.is_some() {
            ControllerPhase::CheckPending
        } else if self.choices.is_empty() {
            ControllerPhase::AwaitingInput
        } else {
            ControllerPhase::ChoicePresented
        }
    }

    fn outcome(&self, log_offset: usize) -> TurnOutcome {
        TurnOutcome {
            phase: self.phase(),
            choices: self.choices.clone(),
            pending_check: self.pending_check.clone(),
            end_signal: self.end_signal.clone(),
            messages: self.state.log.since(log_offset).to_vec(),
        }
    }
}

/// Sets a phase for the duration of a narrator call and restores the
/// previous one unless committed. Dropping the turn future mid-call
/// therefore leaves the controller where it was.
struct PhaseGuard<'a> {
    phase: &'a mut ControllerPhase,
    restore: ControllerPhase,
    armed: bool,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a mut ControllerPhase, pending: ControllerPhase) -> Self {
        let restore = *phase;
        *phase = pending;
        Self {
            phase,
            restore,
            armed: true,
        }
    }

    fn commit(mut self, next: ControllerPhase) {
        *self.phase = next;
        self.armed = false;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.phase = self.restore;
        }
    }
}

/// Applies a narrator beat to staged progress, in order: narration,
/// choices, state patch, check request, end signal.
fn process_response(progress: &mut Progress, response: TurnResponse, clock: &dyn Clock) {
    let TurnResponse {
        player_facing_text,
        choices,
        check_request,
        state_patch,
        end_signal,
    } = response;

    progress
        .state
        .log
        .append(MessageKind::Gm, player_facing_text, clock.now());

    progress.choices = choices;

    if let Some(patch) = state_patch {
        let (next, summaries) = apply_patch(&progress.state, &patch);
        progress.state = next;
        if !summaries.is_empty() {
            progress.state.log.append(
                MessageKind::System,
                format!("State update: {}", summaries.join(" / ")),
                clock.now(),
            );
        }
    }

    if let Some(check) = check_request {
        if let Some(pending) = &progress.pending_check {
            warn!(
                pending = %pending.skill,
                ignored = %check.skill,
                "check already pending, ignoring new check request"
            );
        } else {
            progress.pending_check = Some(check);
        }
    }

    if let Some(end) = end_signal {
        progress.state.log.append(
            MessageKind::System,
            format!("Session ended: {}", end.reason),
            clock.now(),
        );
        progress.state.session.phase = SessionPhase::Ending;
        progress.pending_check = None;
        progress.choices.clear();
        progress.end_signal = Some(end);
    }
}

/// Seeds staged progress from the opening scenario.
fn seed_scenario(progress: &mut Progress, theme: &str, scenario: InitialScenario, clock: &dyn Clock) {
    let InitialScenario {
        outline,
        guidance,
        introduction_text,
        objective,
        initial_flags,
        initial_inventory,
    } = scenario;

    let state = &mut progress.state;
    state.session.theme = theme.to_owned();
    state.session.outline = outline;
    state.session.guidance = guidance;
    state.world.objective = objective;
    for flag in initial_flags {
        if !state.world.has_flag(&flag) {
            state.world.flags.push(flag);
        }
    }
    for item in initial_inventory {
        if state.character.has_inventory_room() {
            state.character.inventory.push(item);
        }
    }
    state.log.append(MessageKind::Gm, introduction_text, clock.now());
}

/// Drives one session from opening scene to end signal.
pub struct TurnController {
    progress: Progress,
    phase: ControllerPhase,
    baseline: Baseline,
    rolled: Option<CheckResult>,
    narrator: Arc<dyn Narrator>,
    rng: Box<dyn DeterministicRng>,
    clock: Arc<dyn Clock>,
    config: ControllerConfig,
}

impl std::fmt::Debug for TurnController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnController")
            .field("session_id", &self.progress.state.session.id)
            .field("phase", &self.phase)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TurnController {
    /// Creates a controller for `state`. Call [`TurnController::start`]
    /// before submitting input.
    #[must_use]
    pub fn new(
        state: SessionState,
        narrator: Arc<dyn Narrator>,
        rng: Box<dyn DeterministicRng>,
        clock: Arc<dyn Clock>,
        config: ControllerConfig,
    ) -> Self {
        let baseline = Baseline::capture(&state);
        Self {
            progress: Progress {
                state,
                choices: Vec::new(),
                pending_check: None,
                end_signal: None,
            },
            phase: ControllerPhase::Created,
            baseline,
            rolled: None,
            narrator,
            rng,
            clock,
            config,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.progress.state.session.id
    }

    /// Committed session state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.progress.state
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Choices currently on offer.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.progress.choices
    }

    /// Check awaiting a roll, if any.
    #[must_use]
    pub fn pending_check(&self) -> Option<&CheckRequest> {
        self.progress.pending_check.as_ref()
    }

    /// End signal, once observed.
    #[must_use]
    pub fn end_signal(&self) -> Option<&EndSignal> {
        self.progress.end_signal.as_ref()
    }

    /// Snapshot of the current phase, choices and pending check, with no
    /// messages attached.
    #[must_use]
    pub fn current(&self) -> TurnOutcome {
        let mut outcome = self.progress.outcome(self.progress.state.log.len());
        outcome.phase = self.phase;
        outcome
    }

    /// Requests the opening scenario and seeds the session with it.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::AlreadyStarted` on a second call, or
    /// `TurnError::Narrator` if no usable scenario could be obtained.
    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub async fn start(&mut self, theme: &str) -> Result<TurnOutcome, TurnError> {
        if self.phase != ControllerPhase::Created {
            return Err(TurnError::AlreadyStarted);
        }

        let guard = PhaseGuard::enter(&mut self.phase, ControllerPhase::NarratorPending);
        let name = match self.progress.state.character.profile.name.trim() {
            "" => DEFAULT_CHARACTER_NAME,
            name => name,
        };
        let narrator = self.narrator.as_ref();

        let scenario = retry_malformed(
            self.config.max_attempts,
            self.config.narrator_timeout,
            move |_| narrator.request_initial_scenario(name, theme),
        )
        .await?;

        let log_offset = self.progress.state.log.len();
        let mut staged = self.progress.clone();
        seed_scenario(&mut staged, theme, scenario, self.clock.as_ref());

        let next = staged.phase();
        self.baseline = Baseline::capture(&staged.state);
        self.progress = staged;
        guard.commit(next);

        info!(objective = %self.progress.state.world.objective, "session started");
        Ok(self.progress.outcome(log_offset))
    }

    /// Submits free-text player input and processes the narrator's beat.
    ///
    /// # Errors
    ///
    /// Rejects empty input, input before `start`, input while a check is
    /// pending and input after the session ended, all without side effects.
    /// Returns `TurnError::Narrator` on narrator transport failure or
    /// timeout, leaving the session untouched.
    #[instrument(skip(self, input), fields(session_id = %self.id()))]
    pub async fn submit_input(&mut self, input: &str) -> Result<TurnOutcome, TurnError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TurnError::MissingInput);
        }
        match self.phase {
            ControllerPhase::Created => return Err(TurnError::NotStarted),
            ControllerPhase::Ended => return Err(TurnError::SessionEnded),
            ControllerPhase::CheckPending => {
                let skill = self
                    .progress
                    .pending_check
                    .as_ref()
                    .map(|c| c.skill.clone())
                    .unwrap_or_default();
                return Err(TurnError::CheckPending(skill));
            }
            ControllerPhase::AwaitingInput
            | ControllerPhase::ChoicePresented
            | ControllerPhase::NarratorPending => {}
        }

        self.run_turn(input, None).await
    }

    /// Rolls the pending check and reports the result to the narrator as
    /// the next player input. The check is cleared and its system message
    /// logged only when the narrator's beat is committed.
    ///
    /// The roll is kept if the narrator call fails or is cancelled, so a
    /// repeated call reports the same result instead of rolling again.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::NoPendingCheck` if no check is pending, or
    /// `TurnError::Narrator` if the follow-up narrator call fails. The
    /// check stays pending in that case.
    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub async fn roll_check(&mut self) -> Result<RollOutcome, TurnError> {
        if self.phase != ControllerPhase::CheckPending {
            return Err(TurnError::NoPendingCheck);
        }
        let Some(check) = self.progress.pending_check.clone() else {
            return Err(TurnError::NoPendingCheck);
        };

        let result = match &self.rolled {
            Some(rolled) => {
                info!(skill = %rolled.skill, roll = rolled.roll, "reporting earlier roll");
                rolled.clone()
            }
            None => {
                let rating = self.progress.state.character.skill_rating(&check.skill);
                let rolled =
                    resolve_check(self.rng.as_mut(), &check.skill, rating, check.difficulty);
                info!(skill = %rolled.skill, roll = rolled.roll, tier = %rolled.tier, "check rolled");
                self.rolled = Some(rolled.clone());
                rolled
            }
        };

        let input = format!("[check result] {}: {}", result.skill, result.tier.label());
        let turn = self.run_turn(&input, Some(&result)).await?;
        self.rolled = None;

        Ok(RollOutcome {
            check: result,
            turn,
        })
    }

    /// Builds the session result once the session has ended.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::NotEnded` while the session is still running.
    pub fn result(&self) -> Result<SessionResult, TurnError> {
        let end = self.progress.end_signal.as_ref().ok_or(TurnError::NotEnded)?;
        Ok(SessionResult::build(&self.progress.state, end, &self.baseline))
    }

    async fn run_turn(
        &mut self,
        input: &str,
        check: Option<&CheckResult>,
    ) -> Result<TurnOutcome, TurnError> {
        let guard = PhaseGuard::enter(&mut self.phase, ControllerPhase::NarratorPending);
        let clock = self.clock.as_ref();
        let log_offset = self.progress.state.log.len();

        let mut staged = self.progress.clone();
        if let Some(result) = check {
            staged.pending_check = None;
            staged.state.log.append(
                MessageKind::System,
                format!(
                    "Check: {} (target {}) -> roll {} -> {}",
                    result.skill,
                    result.target_value,
                    result.roll,
                    result.tier.label()
                ),
                clock.now(),
            );
        }
        staged.state.log.append(MessageKind::Player, input, clock.now());

        let narrator = self.narrator.as_ref();
        let request = TurnRequest::new(&staged.state, input, self.config.context_window);
        let request = &request;
        let response = retry_with_fallback(
            self.config.max_attempts,
            self.config.narrator_timeout,
            move |_| narrator.request_turn(request),
            TurnResponse::fallback,
        )
        .await?;

        process_response(&mut staged, response, clock);

        let next = staged.phase();
        self.progress = staged;
        guard.commit(next);

        if next == ControllerPhase::Ended {
            info!("session ended");
        }
        Ok(self.progress.outcome(log_offset))
    }
}
