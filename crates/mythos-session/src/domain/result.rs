//! End-of-session summary.

use serde::{Deserialize, Serialize};

use super::log::MessageKind;
use super::signals::{EndKind, EndSignal};
use super::state::{Resource, Resources, SessionState};

/// What the character started the session with, captured once the opening
/// scene is in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    /// Resources at the start of play.
    pub resources: Resources,
    /// Inventory at the start of play.
    pub inventory: Vec<String>,
}

impl Baseline {
    /// Captures the baseline from `state`.
    #[must_use]
    pub fn capture(state: &SessionState) -> Self {
        Self {
            resources: state.character.resources,
            inventory: state.character.inventory.clone(),
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    /// How the session ended.
    pub end_type: EndKind,
    /// Narrator-supplied reason.
    pub reason: String,
    /// One-sentence recap.
    pub summary: String,
    /// Items acquired during play.
    pub gains: Vec<String>,
    /// Items and resources lost during play.
    pub losses: Vec<String>,
    /// Resources at the end.
    pub final_resources: Resources,
    /// Flags at the end.
    pub final_flags: Vec<String>,
    /// Inventory at the end.
    pub final_inventory: Vec<String>,
    /// Objective at the end.
    pub final_objective: String,
    /// Number of player inputs, including check results.
    pub player_turns: usize,
}

impl SessionResult {
    /// Builds the result for a session that ended with `end`.
    #[must_use]
    pub fn build(state: &SessionState, end: &EndSignal, baseline: &Baseline) -> Self {
        let character = &state.character;

        let gains = character
            .inventory
            .iter()
            .filter(|item| !baseline.inventory.contains(item))
            .cloned()
            .collect();

        let mut losses: Vec<String> = baseline
            .inventory
            .iter()
            .filter(|item| !character.inventory.contains(item))
            .cloned()
            .collect();
        for resource in [Resource::HitPoints, Resource::Sanity, Resource::MagicPoints] {
            let before = baseline.resources.pool(resource).current;
            let after = character.resources.pool(resource).current;
            if after < before {
                losses.push(format!("{} {}", resource.label(), after - before));
            }
        }

        let summary = match end.kind {
            EndKind::Success => format!("The investigation succeeded: {}", end.reason),
            EndKind::Fail => format!("The investigation failed: {}", end.reason),
            EndKind::TimeUp => format!("Time ran out: {}", end.reason),
        };

        Self {
            end_type: end.kind,
            reason: end.reason.clone(),
            summary,
            gains,
            losses,
            final_resources: character.resources,
            final_flags: state.world.flags.clone(),
            final_inventory: character.inventory.clone(),
            final_objective: state.world.objective.clone(),
            player_turns: state.log.count(MessageKind::Player),
        }
    }
}
