//! Narrator contract.
//!
//! The narrator is the external collaborator that writes the story. The
//! engine only sees the structured shapes below; how a narrator produces
//! them (a script, a language model) is up to the implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::log::{LogMessage, MessageKind};
use crate::domain::patch::StatePatch;
use crate::domain::signals::{CheckRequest, EndSignal};
use crate::domain::state::SessionState;

/// Text shown when the narrator keeps returning unusable output.
pub const FALLBACK_TEXT: &str =
    "(The narrator loses the thread for a moment. Try another action or repeat your last one.)";

/// Choices offered alongside [`FALLBACK_TEXT`].
pub const FALLBACK_CHOICES: [&str; 2] = ["Try again", "Look around carefully"];

/// Errors a narrator can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarratorError {
    /// The narrator answered, but not with a usable structured response.
    #[error("malformed narrator output: {0}")]
    Malformed(String),

    /// The narrator could not be reached or refused the request.
    #[error("narrator transport failure: {0}")]
    Transport(String),

    /// The narrator did not answer in time.
    #[error("narrator timed out after {0:?}")]
    Timeout(Duration),
}

impl NarratorError {
    /// Whether another attempt may succeed. Only malformed output is retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Opening of a new scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialScenario {
    /// Full outline, hidden from the player.
    pub outline: String,
    /// Abridged outline for later narrator calls.
    pub guidance: String,
    /// Opening narration.
    pub introduction_text: String,
    /// First objective.
    pub objective: String,
    /// Flags set at the start.
    #[serde(default)]
    pub initial_flags: Vec<String>,
    /// Items the character starts with.
    #[serde(default)]
    pub initial_inventory: Vec<String>,
}

/// One narrative beat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    /// Narration shown to the player.
    pub player_facing_text: String,
    /// Suggested next actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    /// Skill check the player must roll before continuing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_request: Option<CheckRequest>,
    /// State changes caused by this beat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_patch: Option<StatePatch>,
    /// Terminal marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_signal: Option<EndSignal>,
}

impl TurnResponse {
    /// A beat with narration only.
    #[must_use]
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            player_facing_text: text.into(),
            ..Self::default()
        }
    }

    /// Adds choices.
    #[must_use]
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a check request.
    #[must_use]
    pub fn with_check(mut self, check: CheckRequest) -> Self {
        self.check_request = Some(check);
        self
    }

    /// Adds a state patch.
    #[must_use]
    pub fn with_patch(mut self, patch: StatePatch) -> Self {
        self.state_patch = Some(patch);
        self
    }

    /// Adds an end signal.
    #[must_use]
    pub fn with_end(mut self, end: EndSignal) -> Self {
        self.end_signal = Some(end);
        self
    }

    /// Neutral beat used when the narrator's output stays unusable.
    #[must_use]
    pub fn fallback() -> Self {
        Self::narration(FALLBACK_TEXT).with_choices(FALLBACK_CHOICES)
    }
}

/// Everything a narrator needs to produce the next beat.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    /// Session state, including the player input already logged.
    pub state: &'a SessionState,
    /// The latest player input.
    pub player_input: &'a str,
    /// How many recent log messages to expose as context.
    pub context_window: usize,
}

impl<'a> TurnRequest<'a> {
    /// Creates a request.
    #[must_use]
    pub const fn new(state: &'a SessionState, player_input: &'a str, context_window: usize) -> Self {
        Self {
            state,
            player_input,
            context_window,
        }
    }

    /// The last `context_window` log messages.
    #[must_use]
    pub fn recent_messages(&self) -> &'a [LogMessage] {
        self.state.log.recent(self.context_window)
    }

    /// Player inputs logged so far, counting the current one.
    #[must_use]
    pub fn player_turns(&self) -> usize {
        self.state.log.count(MessageKind::Player)
    }
}

/// A source of narrative beats.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Produces the opening of a new scenario.
    async fn request_initial_scenario(
        &self,
        character_name: &str,
        theme: &str,
    ) -> Result<InitialScenario, NarratorError>;

    /// Produces the beat that follows the request's player input.
    async fn request_turn(&self, request: &TurnRequest<'_>) -> Result<TurnResponse, NarratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mythos_rules::domain::resolution::Difficulty;
    use uuid::Uuid;

    #[test]
    fn test_turn_response_parses_full_payload() {
        let json = r#"{
            "playerFacingText": "The door creaks.",
            "choices": ["Enter", "Wait"],
            "checkRequest": {"skill": "Listen", "difficulty": "normal", "purpose": "hear", "failureHint": "miss it"},
            "statePatch": {"flagsAdd": ["door-creaked"]},
            "endSignal": {"type": "fail", "reason": "caught"}
        }"#;

        let response: TurnResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.player_facing_text, "The door creaks.");
        assert_eq!(response.choices, vec!["Enter", "Wait"]);
        assert_eq!(
            response.check_request.map(|c| c.difficulty),
            Some(Difficulty::Normal)
        );
        assert_eq!(response.state_patch.unwrap().flags_add, vec!["door-creaked"]);
        assert_eq!(response.end_signal.unwrap().reason, "caught");
    }

    #[test]
    fn test_turn_response_requires_player_facing_text() {
        let parsed: Result<TurnResponse, _> = serde_json::from_str(r#"{"choices": []}"#);

        assert!(parsed.is_err());
    }

    #[test]
    fn test_fallback_has_two_choices() {
        let fallback = TurnResponse::fallback();

        assert_eq!(fallback.player_facing_text, FALLBACK_TEXT);
        assert_eq!(fallback.choices.len(), 2);
        assert!(fallback.check_request.is_none());
        assert!(fallback.end_signal.is_none());
    }

    #[test]
    fn test_turn_request_context() {
        let mut state = SessionState::new(Uuid::new_v4(), "theme");
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        state.log.append(MessageKind::Gm, "intro", now);
        for i in 0..6 {
            state.log.append(MessageKind::Player, format!("p{i}"), now);
        }

        let request = TurnRequest::new(&state, "p5", 5);

        assert_eq!(request.player_turns(), 6);
        assert_eq!(request.recent_messages().len(), 5);
        assert_eq!(request.recent_messages()[0].text, "p1");
    }

    #[test]
    fn test_only_malformed_is_retryable() {
        assert!(NarratorError::Malformed("x".into()).is_retryable());
        assert!(!NarratorError::Transport("x".into()).is_retryable());
        assert!(!NarratorError::Timeout(Duration::from_secs(1)).is_retryable());
    }
}
