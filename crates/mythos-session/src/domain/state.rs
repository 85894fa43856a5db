//! The session aggregate.
//!
//! A [`SessionState`] bundles the session metadata, the player character,
//! the world and the log. It is mutated only by the state patch reducer and
//! by the turn controller.

use std::collections::BTreeMap;

use mythos_rules::domain::character::{Abilities, DerivedAttributes, MAX_SANITY};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::log::Log;

/// Maximum number of items a character can carry.
pub const INVENTORY_CAPACITY: usize = 10;

/// Narrative phase of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Opening scene.
    #[default]
    Introduction,
    /// Investigation.
    Middle,
    /// Confrontation.
    Climax,
    /// Terminal phase, entered when the narrator ends the session.
    Ending,
}

/// Session metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identifier.
    pub id: Uuid,
    /// Ordinal scene counter maintained by the narrative layer.
    pub scene_index: u32,
    /// Narrative phase.
    pub phase: SessionPhase,
    /// Running summary kept for the narrator.
    pub summary: String,
    /// Player-chosen theme or mood.
    pub theme: String,
    /// Full scenario outline. Never shown to the player.
    pub outline: String,
    /// Abridged outline handed to the narrator. Never shown to the player.
    pub guidance: String,
}

impl Session {
    /// Creates session metadata for a new run.
    #[must_use]
    pub fn new(id: Uuid, theme: impl Into<String>) -> Self {
        Self {
            id,
            scene_index: 0,
            phase: SessionPhase::Introduction,
            summary: String::new(),
            theme: theme.into(),
            outline: String::new(),
            guidance: String::new(),
        }
    }
}

/// Free-text identity of the character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Character name.
    pub name: String,
    /// Occupation.
    pub occupation: String,
    /// Age.
    pub age: String,
    /// Gender.
    pub gender: String,
    /// Personality traits.
    pub traits: String,
}

/// The three depletable pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Hit points.
    HitPoints,
    /// Sanity.
    Sanity,
    /// Magic points.
    MagicPoints,
}

impl Resource {
    /// Short label used in state update summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HitPoints => "HP",
            Self::Sanity => "SAN",
            Self::MagicPoints => "MP",
        }
    }
}

/// Current and maximum value of one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Current value, always within `0..=max`.
    pub current: i32,
    /// Upper bound.
    pub max: i32,
}

impl ResourcePool {
    /// Creates a pool.
    #[must_use]
    pub const fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }

    /// Creates a pool that starts full.
    #[must_use]
    pub const fn full(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Clamps `value` into `0..=max`.
    #[must_use]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(0, self.max.max(0))
    }
}

/// The character's depletable pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    /// Sanity.
    pub sanity: ResourcePool,
    /// Hit points.
    pub hit_points: ResourcePool,
    /// Magic points.
    pub magic_points: ResourcePool,
}

impl Resources {
    /// Starting pools for a freshly created character. Sanity starts at
    /// its derived value but may later be raised up to [`MAX_SANITY`].
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn from_derived(derived: &DerivedAttributes) -> Self {
        Self {
            sanity: ResourcePool::new(derived.sanity as i32, MAX_SANITY as i32),
            hit_points: ResourcePool::full(derived.hit_points as i32),
            magic_points: ResourcePool::full(derived.magic_points as i32),
        }
    }

    /// Returns the pool for `resource`.
    #[must_use]
    pub const fn pool(&self, resource: Resource) -> &ResourcePool {
        match resource {
            Resource::HitPoints => &self.hit_points,
            Resource::Sanity => &self.sanity,
            Resource::MagicPoints => &self.magic_points,
        }
    }

    /// Returns the pool for `resource` mutably.
    pub fn pool_mut(&mut self, resource: Resource) -> &mut ResourcePool {
        match resource {
            Resource::HitPoints => &mut self.hit_points,
            Resource::Sanity => &mut self.sanity,
            Resource::MagicPoints => &mut self.magic_points,
        }
    }
}

/// The player character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Identity.
    pub profile: Profile,
    /// Ability scores.
    pub abilities: Abilities,
    /// Attributes derived from the abilities at creation.
    pub derived: DerivedAttributes,
    /// Skill name to rating.
    pub skills: BTreeMap<String, u32>,
    /// Depletable pools.
    pub resources: Resources,
    /// Carried items, at most [`INVENTORY_CAPACITY`].
    pub inventory: Vec<String>,
}

impl Character {
    /// Builds a character, deriving attributes and starting resources from
    /// `abilities`.
    #[must_use]
    pub fn new(profile: Profile, abilities: Abilities, skills: BTreeMap<String, u32>) -> Self {
        let derived = DerivedAttributes::from_abilities(&abilities);
        Self {
            profile,
            abilities,
            derived,
            skills,
            resources: Resources::from_derived(&derived),
            inventory: Vec::new(),
        }
    }

    /// Rating for `skill`, or zero when the character lacks it.
    #[must_use]
    pub fn skill_rating(&self, skill: &str) -> u32 {
        self.skills.get(skill).copied().unwrap_or(0)
    }

    /// Whether another item fits in the inventory.
    #[must_use]
    pub fn has_inventory_room(&self) -> bool {
        self.inventory.len() < INVENTORY_CAPACITY
    }
}

/// A non-player character. Carried through untouched by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    /// Name.
    pub name: String,
    /// Relationship to the character.
    pub relationship: String,
    /// Free-text status.
    pub status: String,
}

/// World state visible to the narrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// Current goal. Replaced, never accumulated.
    pub objective: String,
    /// Unique flags in insertion order.
    pub flags: Vec<String>,
    /// Known NPCs.
    pub npcs: Vec<Npc>,
}

impl World {
    /// Whether `flag` is set.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Root aggregate of one play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session metadata.
    pub session: Session,
    /// Player character.
    pub character: Character,
    /// World state.
    pub world: World,
    /// Message history.
    pub log: Log,
}

impl SessionState {
    /// Creates a session with an empty character.
    #[must_use]
    pub fn new(id: Uuid, theme: impl Into<String>) -> Self {
        Self {
            session: Session::new(id, theme),
            character: Character::default(),
            world: World::default(),
            log: Log::new(),
        }
    }

    /// Replaces the character.
    #[must_use]
    pub fn with_character(mut self, character: Character) -> Self {
        self.character = character;
        self
    }
}
