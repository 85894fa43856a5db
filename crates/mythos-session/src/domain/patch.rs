//! State patch reducer.
//!
//! A [`StatePatch`] is a declarative diff issued by the narrator. The
//! reducer applies it to a copy of the session state, clamps resources,
//! deduplicates flags, enforces the inventory cap, and reports one summary
//! line per effective change in a fixed order: HP, SAN, MP, flags added,
//! flags removed, items gained, items lost, objective.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::{Resource, SessionState};

/// New absolute values for the current resource pools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePatch {
    /// New current sanity.
    #[serde(rename = "currentSAN", default, skip_serializing_if = "Option::is_none")]
    pub current_san: Option<i32>,
    /// New current hit points.
    #[serde(rename = "currentHP", default, skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<i32>,
    /// New current magic points.
    #[serde(rename = "currentMP", default, skip_serializing_if = "Option::is_none")]
    pub current_mp: Option<i32>,
}

impl ResourcePatch {
    /// The patched value for `resource`, if any.
    #[must_use]
    pub const fn get(&self, resource: Resource) -> Option<i32> {
        match resource {
            Resource::HitPoints => self.current_hp,
            Resource::Sanity => self.current_san,
            Resource::MagicPoints => self.current_mp,
        }
    }
}

/// A narrator-issued diff against the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    /// Resource replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcePatch>,
    /// Flags to set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags_add: Vec<String>,
    /// Flags to clear.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags_remove: Vec<String>,
    /// Items to gain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory_add: Vec<String>,
    /// Items to lose.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory_remove: Vec<String>,
    /// Replacement objective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
}

impl StatePatch {
    /// Whether the patch carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_none()
            && self.flags_add.is_empty()
            && self.flags_remove.is_empty()
            && self.inventory_add.is_empty()
            && self.inventory_remove.is_empty()
            && self.objective.is_none()
    }
}

/// Order in which resource changes are summarized.
const RESOURCE_ORDER: [Resource; 3] = [Resource::HitPoints, Resource::Sanity, Resource::MagicPoints];

/// Applies `patch` to a copy of `state`.
///
/// Returns the new state and the human-readable summaries of every change
/// that took effect. The input state is never modified.
#[must_use]
pub fn apply_patch(state: &SessionState, patch: &StatePatch) -> (SessionState, Vec<String>) {
    let mut next = state.clone();
    let mut summaries = Vec::new();

    if let Some(resources) = &patch.resources {
        for resource in RESOURCE_ORDER {
            let Some(requested) = resources.get(resource) else {
                continue;
            };
            let pool = next.character.resources.pool_mut(resource);
            let previous = pool.current;
            pool.current = pool.clamp(requested);
            let delta = pool.current - previous;
            summaries.push(format!("{} {delta:+}", resource.label()));
        }
    }

    for flag in &patch.flags_add {
        if !next.world.has_flag(flag) {
            next.world.flags.push(flag.clone());
            summaries.push(format!("Flag added: {flag}"));
        }
    }

    for flag in &patch.flags_remove {
        if let Some(index) = next.world.flags.iter().position(|f| f == flag) {
            next.world.flags.remove(index);
            summaries.push(format!("Flag removed: {flag}"));
        }
    }

    for item in &patch.inventory_add {
        if next.character.has_inventory_room() {
            next.character.inventory.push(item.clone());
            summaries.push(format!("Gained: {item}"));
        } else {
            debug!(item = %item, "inventory full, dropping item");
        }
    }

    for item in &patch.inventory_remove {
        if let Some(index) = next.character.inventory.iter().position(|i| i == item) {
            next.character.inventory.remove(index);
            summaries.push(format!("Lost: {item}"));
        }
    }

    if let Some(objective) = &patch.objective {
        next.world.objective.clone_from(objective);
        summaries.push(format!("Objective: {objective}"));
    }

    (next, summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{INVENTORY_CAPACITY, ResourcePool};
    use uuid::Uuid;

    fn state() -> SessionState {
        let mut state = SessionState::new(Uuid::new_v4(), "test");
        state.character.resources.hit_points = ResourcePool::new(5, 10);
        state.character.resources.sanity = ResourcePool::new(50, 99);
        state.character.resources.magic_points = ResourcePool::new(8, 8);
        state
    }

    fn resources(hp: Option<i32>, san: Option<i32>, mp: Option<i32>) -> Option<ResourcePatch> {
        Some(ResourcePatch {
            current_san: san,
            current_hp: hp,
            current_mp: mp,
        })
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let before = state();

        let (after, summaries) = apply_patch(&before, &StatePatch::default());

        assert_eq!(after, before);
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_resource_is_clamped_and_delta_reflects_clamp() {
        let patch = StatePatch {
            resources: resources(Some(-3), None, None),
            ..StatePatch::default()
        };

        let (after, summaries) = apply_patch(&state(), &patch);

        assert_eq!(after.character.resources.hit_points.current, 0);
        assert_eq!(summaries, vec!["HP -5"]);
    }

    #[test]
    fn test_resource_is_clamped_to_max() {
        let patch = StatePatch {
            resources: resources(Some(25), None, None),
            ..StatePatch::default()
        };

        let (after, summaries) = apply_patch(&state(), &patch);

        assert_eq!(after.character.resources.hit_points.current, 10);
        assert_eq!(summaries, vec!["HP +5"]);
    }

    #[test]
    fn test_unchanged_resource_still_reports_zero_delta() {
        let patch = StatePatch {
            resources: resources(None, None, Some(8)),
            ..StatePatch::default()
        };

        let (_, summaries) = apply_patch(&state(), &patch);

        assert_eq!(summaries, vec!["MP +0"]);
    }

    #[test]
    fn test_summaries_follow_field_order() {
        let mut before = state();
        before.world.flags.push("door-open".to_owned());
        before.character.inventory.push("candle".to_owned());
        let patch = StatePatch {
            resources: resources(Some(4), Some(47), Some(6)),
            flags_add: vec!["diary-read".to_owned()],
            flags_remove: vec!["door-open".to_owned()],
            inventory_add: vec!["key".to_owned()],
            inventory_remove: vec!["candle".to_owned()],
            objective: Some("Find the cellar".to_owned()),
        };

        let (after, summaries) = apply_patch(&before, &patch);

        assert_eq!(
            summaries,
            vec![
                "HP -1",
                "SAN -3",
                "MP -2",
                "Flag added: diary-read",
                "Flag removed: door-open",
                "Gained: key",
                "Lost: candle",
                "Objective: Find the cellar",
            ]
        );
        assert_eq!(after.world.flags, vec!["diary-read"]);
        assert_eq!(after.character.inventory, vec!["key"]);
        assert_eq!(after.world.objective, "Find the cellar");
    }

    #[test]
    fn test_duplicate_flags_are_ignored() {
        let mut before = state();
        before.world.flags.push("seen-ghost".to_owned());
        let patch = StatePatch {
            flags_add: vec![
                "seen-ghost".to_owned(),
                "heard-piano".to_owned(),
                "heard-piano".to_owned(),
            ],
            ..StatePatch::default()
        };

        let (after, summaries) = apply_patch(&before, &patch);

        assert_eq!(after.world.flags, vec!["seen-ghost", "heard-piano"]);
        assert_eq!(summaries, vec!["Flag added: heard-piano"]);
    }

    #[test]
    fn test_removing_absent_flag_or_item_is_silent() {
        let patch = StatePatch {
            flags_remove: vec!["never-set".to_owned()],
            inventory_remove: vec!["ghost-lantern".to_owned()],
            ..StatePatch::default()
        };

        let before = state();
        let (after, summaries) = apply_patch(&before, &patch);

        assert_eq!(after, before);
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_inventory_cap_silently_drops_overflow() {
        let mut before = state();
        for i in 0..INVENTORY_CAPACITY - 1 {
            before.character.inventory.push(format!("item-{i}"));
        }
        let patch = StatePatch {
            inventory_add: vec!["rope".to_owned(), "lamp".to_owned()],
            ..StatePatch::default()
        };

        let (after, summaries) = apply_patch(&before, &patch);

        assert_eq!(after.character.inventory.len(), INVENTORY_CAPACITY);
        assert_eq!(after.character.inventory.last().map(String::as_str), Some("rope"));
        assert_eq!(summaries, vec!["Gained: rope"]);
    }

    #[test]
    fn test_inventory_remove_takes_first_match_only() {
        let mut before = state();
        before.character.inventory = vec!["match".to_owned(), "match".to_owned()];
        let patch = StatePatch {
            inventory_remove: vec!["match".to_owned()],
            ..StatePatch::default()
        };

        let (after, _) = apply_patch(&before, &patch);

        assert_eq!(after.character.inventory, vec!["match"]);
    }

    #[test]
    fn test_objective_replaced_even_when_identical() {
        let mut before = state();
        before.world.objective = "Escape".to_owned();
        let patch = StatePatch {
            objective: Some("Escape".to_owned()),
            ..StatePatch::default()
        };

        let (after, summaries) = apply_patch(&before, &patch);

        assert_eq!(after.world.objective, "Escape");
        assert_eq!(summaries, vec!["Objective: Escape"]);
    }

    #[test]
    fn test_input_state_is_not_mutated() {
        let before = state();
        let snapshot = before.clone();
        let patch = StatePatch {
            resources: resources(Some(0), Some(0), Some(0)),
            flags_add: vec!["x".to_owned()],
            ..StatePatch::default()
        };

        let _ = apply_patch(&before, &patch);

        assert_eq!(before, snapshot);
    }

    #[test]
    fn test_patch_parses_narrator_json() {
        let json = r#"{
            "resources": { "currentSAN": 47 },
            "flagsAdd": ["box-opened"],
            "inventoryAdd": ["glowing stone"],
            "objective": "Escape the mansion"
        }"#;

        let patch: StatePatch = serde_json::from_str(json).unwrap();

        assert_eq!(patch.resources.as_ref().and_then(|r| r.current_san), Some(47));
        assert_eq!(patch.flags_add, vec!["box-opened"]);
        assert_eq!(patch.inventory_add, vec!["glowing stone"]);
        assert!(patch.flags_remove.is_empty());
        assert!(!patch.is_empty());
    }
}
