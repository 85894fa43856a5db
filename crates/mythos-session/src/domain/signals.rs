//! Turn-scoped narrator directives: check requests and end signals.

use std::fmt;

use mythos_rules::domain::resolution::Difficulty;
use serde::{Deserialize, Serialize};

/// A request for the player to roll a skill check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// Skill to test.
    pub skill: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// What success would achieve.
    #[serde(default)]
    pub purpose: String,
    /// What failure risks.
    #[serde(default)]
    pub failure_hint: String,
}

impl CheckRequest {
    /// Creates a check request.
    #[must_use]
    pub fn new(skill: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            skill: skill.into(),
            difficulty,
            purpose: String::new(),
            failure_hint: String::new(),
        }
    }

    /// Sets the purpose text.
    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    /// Sets the failure hint.
    #[must_use]
    pub fn with_failure_hint(mut self, hint: impl Into<String>) -> Self {
        self.failure_hint = hint.into();
        self
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndKind {
    /// The objective was reached.
    Success,
    /// The character failed fatally.
    Fail,
    /// The scenario ran out of time.
    TimeUp,
}

impl fmt::Display for EndKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Fail => "fail",
            Self::TimeUp => "time_up",
        })
    }
}

/// Terminal marker issued by the narrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndSignal {
    /// Outcome kind.
    #[serde(rename = "type")]
    pub kind: EndKind,
    /// Narrator-supplied reason.
    #[serde(default)]
    pub reason: String,
}

impl EndSignal {
    /// Creates an end signal.
    #[must_use]
    pub fn new(kind: EndKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_request_parses_camel_case() {
        let json = r#"{"skill":"Locksmith","difficulty":"hard","purpose":"open the cellar","failureHint":"the pick snaps"}"#;

        let request: CheckRequest = serde_json::from_str(json).unwrap();

        assert_eq!(
            request,
            CheckRequest::new("Locksmith", Difficulty::Hard)
                .with_purpose("open the cellar")
                .with_failure_hint("the pick snaps")
        );
    }

    #[test]
    fn test_check_request_with_unknown_difficulty_is_rejected() {
        let json = r#"{"skill":"Locksmith","difficulty":"brutal"}"#;

        let parsed: Result<CheckRequest, _> = serde_json::from_str(json);

        assert!(parsed.is_err());
    }

    #[test]
    fn test_end_signal_uses_type_field() {
        let signal: EndSignal =
            serde_json::from_str(r#"{"type":"time_up","reason":"dawn broke"}"#).unwrap();

        assert_eq!(signal, EndSignal::new(EndKind::TimeUp, "dawn broke"));
        assert_eq!(
            serde_json::to_value(&signal).unwrap()["type"],
            serde_json::json!("time_up")
        );
    }
}
