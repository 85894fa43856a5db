//! Character creation rules.
//!
//! Ability dice, derived attributes, the skill catalogue and skill-point
//! allocation. The session crate turns the output of these rules into the
//! character stored in a session.

use std::collections::BTreeMap;

use mythos_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dice::{DiceError, DicePool, roll_pool};

/// Highest rating any skill may reach through allocation.
pub const SKILL_MAX: u32 = 80;

/// Upper bound of the sanity pool, independent of the starting value.
pub const MAX_SANITY: u32 = 99;

/// Errors raised while building a character.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharacterError {
    /// A dice roll failed.
    #[error(transparent)]
    Dice(#[from] DiceError),

    /// The allocation names a skill missing from the catalogue.
    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    /// Base value plus allocation would exceed [`SKILL_MAX`].
    #[error("skill {skill} would reach {total}, above the cap of {SKILL_MAX}")]
    SkillAboveCap {
        /// Skill being allocated.
        skill: String,
        /// Resulting rating.
        total: u32,
    },

    /// More points were allocated than the pool holds.
    #[error("allocated {allocated} skill points but only {available} are available")]
    PoolExceeded {
        /// Points requested across all skills.
        allocated: u32,
        /// Points granted by the character's abilities.
        available: u32,
    },
}

/// The eight ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    /// Strength.
    #[serde(rename = "STR")]
    Strength,
    /// Constitution.
    #[serde(rename = "CON")]
    Constitution,
    /// Power.
    #[serde(rename = "POW")]
    Power,
    /// Dexterity.
    #[serde(rename = "DEX")]
    Dexterity,
    /// Appearance.
    #[serde(rename = "APP")]
    Appearance,
    /// Size.
    #[serde(rename = "SIZ")]
    Size,
    /// Intelligence.
    #[serde(rename = "INT")]
    Intelligence,
    /// Education.
    #[serde(rename = "EDU")]
    Education,
}

impl Ability {
    /// All abilities in rolling order.
    pub const ALL: [Self; 8] = [
        Self::Strength,
        Self::Constitution,
        Self::Power,
        Self::Dexterity,
        Self::Appearance,
        Self::Size,
        Self::Intelligence,
        Self::Education,
    ];

    /// Three-letter abbreviation.
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Constitution => "CON",
            Self::Power => "POW",
            Self::Dexterity => "DEX",
            Self::Appearance => "APP",
            Self::Size => "SIZ",
            Self::Intelligence => "INT",
            Self::Education => "EDU",
        }
    }

    /// Dice rolled to generate this ability.
    #[must_use]
    pub const fn dice(self) -> DicePool {
        match self {
            Self::Size | Self::Intelligence => DicePool::new(2, 6, 6),
            Self::Education => DicePool::new(3, 6, 3),
            _ => DicePool::new(3, 6, 0),
        }
    }
}

/// A full set of ability scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abilities {
    /// Strength.
    #[serde(rename = "STR")]
    pub strength: u32,
    /// Constitution.
    #[serde(rename = "CON")]
    pub constitution: u32,
    /// Power.
    #[serde(rename = "POW")]
    pub power: u32,
    /// Dexterity.
    #[serde(rename = "DEX")]
    pub dexterity: u32,
    /// Appearance.
    #[serde(rename = "APP")]
    pub appearance: u32,
    /// Size.
    #[serde(rename = "SIZ")]
    pub size: u32,
    /// Intelligence.
    #[serde(rename = "INT")]
    pub intelligence: u32,
    /// Education.
    #[serde(rename = "EDU")]
    pub education: u32,
}

impl Abilities {
    /// Rolls every ability with its dice pool.
    ///
    /// # Errors
    ///
    /// Returns `CharacterError::Dice` if a pool cannot be rolled.
    pub fn roll(rng: &mut dyn DeterministicRng) -> Result<Self, CharacterError> {
        let mut abilities = Self::default();
        for ability in Ability::ALL {
            let total = roll_pool(rng, ability.dice())?;
            abilities.set(ability, u32::try_from(total).unwrap_or(0));
        }
        Ok(abilities)
    }

    /// Returns the score for `ability`.
    #[must_use]
    pub const fn get(&self, ability: Ability) -> u32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Constitution => self.constitution,
            Ability::Power => self.power,
            Ability::Dexterity => self.dexterity,
            Ability::Appearance => self.appearance,
            Ability::Size => self.size,
            Ability::Intelligence => self.intelligence,
            Ability::Education => self.education,
        }
    }

    /// Sets the score for `ability`.
    pub fn set(&mut self, ability: Ability, value: u32) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Constitution => self.constitution = value,
            Ability::Power => self.power = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Appearance => self.appearance = value,
            Ability::Size => self.size = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Education => self.education = value,
        }
    }

    /// Skill points available for allocation: `EDU × 20 + INT × 10`.
    #[must_use]
    pub const fn skill_point_pool(&self) -> u32 {
        self.education * 20 + self.intelligence * 10
    }
}

/// Attributes computed once from the abilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAttributes {
    /// Starting sanity, `POW × 5`.
    #[serde(rename = "SAN")]
    pub sanity: u32,
    /// Luck, `POW × 5`.
    pub luck: u32,
    /// Idea, `INT × 5`.
    pub idea: u32,
    /// Knowledge, `EDU × 5`.
    pub knowledge: u32,
    /// Hit points, `(CON + SIZ) / 2` rounded down.
    #[serde(rename = "HP")]
    pub hit_points: u32,
    /// Magic points, equal to `POW`.
    #[serde(rename = "MP")]
    pub magic_points: u32,
}

impl DerivedAttributes {
    /// Derives attributes from `abilities`.
    #[must_use]
    pub const fn from_abilities(abilities: &Abilities) -> Self {
        Self {
            sanity: abilities.power * 5,
            luck: abilities.power * 5,
            idea: abilities.intelligence * 5,
            knowledge: abilities.education * 5,
            hit_points: (abilities.constitution + abilities.size) / 2,
            magic_points: abilities.power,
        }
    }
}

/// Broad grouping of skills for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    /// Searching and perceiving.
    Exploration,
    /// Dealing with people.
    Social,
    /// Moving and enduring.
    Physical,
    /// Tools and devices.
    Technical,
    /// Conflict.
    Combat,
}

/// A catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillDefinition {
    /// Skill name as referenced by check requests.
    pub name: &'static str,
    /// Rating before any allocation.
    pub base_value: u32,
    /// Display grouping.
    pub category: SkillCategory,
    /// Short description.
    pub description: &'static str,
}

const fn skill(
    name: &'static str,
    base_value: u32,
    category: SkillCategory,
    description: &'static str,
) -> SkillDefinition {
    SkillDefinition {
        name,
        base_value,
        category,
        description,
    }
}

/// Every skill a character can hold.
pub const SKILL_CATALOGUE: [SkillDefinition; 22] = [
    skill("Spot Hidden", 25, SkillCategory::Exploration, "Notice hidden clues and anything out of place"),
    skill("Listen", 25, SkillCategory::Exploration, "Pick up sounds, conversations and approaching footsteps"),
    skill("Library Use", 20, SkillCategory::Exploration, "Research records, archives and books"),
    skill("Track", 10, SkillCategory::Exploration, "Follow footprints and trails"),
    skill("Navigate", 10, SkillCategory::Exploration, "Find the way without getting lost"),
    skill("Persuade", 15, SkillCategory::Social, "Convince with reasoned argument"),
    skill("Fast Talk", 10, SkillCategory::Social, "Bluff, improvise and tell small lies"),
    skill("Intimidate", 15, SkillCategory::Social, "Threaten and pressure"),
    skill("Credit Rating", 15, SkillCategory::Social, "Pass on status, authority or good faith"),
    skill("Psychology", 10, SkillCategory::Social, "Read lies, nerves and intentions"),
    skill("Hide", 10, SkillCategory::Physical, "Stay out of sight"),
    skill("Stealth", 10, SkillCategory::Physical, "Move without making a sound"),
    skill("Climb", 20, SkillCategory::Physical, "Scale walls, cliffs and heights"),
    skill("Dodge", 25, SkillCategory::Physical, "Avoid danger and attacks"),
    skill("First Aid", 30, SkillCategory::Physical, "Stop bleeding and patch wounds"),
    skill("Locksmith", 10, SkillCategory::Technical, "Open locks and simple seals"),
    skill("Mechanical Repair", 10, SkillCategory::Technical, "Fix and maintain machinery"),
    skill("Electrical Repair", 10, SkillCategory::Technical, "Restore wiring, power and electronics"),
    skill("Conceal", 10, SkillCategory::Technical, "Hide objects and evidence"),
    skill("Brawl", 25, SkillCategory::Combat, "Punch, grapple and swing improvised weapons"),
    skill("Firearms", 20, SkillCategory::Combat, "Shoot pistols, bows and other ranged weapons"),
    skill("Throw", 20, SkillCategory::Combat, "Hurl stones, knives and whatever is at hand"),
];

/// Looks up a catalogue entry by exact name.
#[must_use]
pub fn find_skill(name: &str) -> Option<&'static SkillDefinition> {
    SKILL_CATALOGUE.iter().find(|s| s.name == name)
}

/// Computes final skill ratings from `allocations` (extra points per skill
/// on top of its base value). Every catalogue skill appears in the result.
///
/// # Errors
///
/// Returns `CharacterError::UnknownSkill` for names outside the catalogue,
/// `CharacterError::SkillAboveCap` when a rating would exceed [`SKILL_MAX`],
/// and `CharacterError::PoolExceeded` when the allocation total exceeds the
/// pool granted by `abilities`.
pub fn allocate_skills(
    abilities: &Abilities,
    allocations: &BTreeMap<String, u32>,
) -> Result<BTreeMap<String, u32>, CharacterError> {
    let mut ratings: BTreeMap<String, u32> = SKILL_CATALOGUE
        .iter()
        .map(|s| (s.name.to_owned(), s.base_value))
        .collect();

    let mut allocated: u32 = 0;
    for (name, points) in allocations {
        let rating = ratings
            .get_mut(name)
            .ok_or_else(|| CharacterError::UnknownSkill(name.clone()))?;
        let total = rating.saturating_add(*points);
        if total > SKILL_MAX {
            return Err(CharacterError::SkillAboveCap {
                skill: name.clone(),
                total,
            });
        }
        *rating = total;
        allocated = allocated.saturating_add(*points);
    }

    let available = abilities.skill_point_pool();
    if allocated > available {
        return Err(CharacterError::PoolExceeded {
            allocated,
            available,
        });
    }

    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mythos_test_support::{MockRng, SequenceRng};

    fn sample_abilities() -> Abilities {
        Abilities {
            strength: 10,
            constitution: 12,
            power: 11,
            dexterity: 9,
            appearance: 13,
            size: 14,
            intelligence: 15,
            education: 16,
        }
    }

    #[test]
    fn test_ability_dice_table() {
        assert_eq!(Ability::Strength.dice(), DicePool::new(3, 6, 0));
        assert_eq!(Ability::Size.dice(), DicePool::new(2, 6, 6));
        assert_eq!(Ability::Intelligence.dice(), DicePool::new(2, 6, 6));
        assert_eq!(Ability::Education.dice(), DicePool::new(3, 6, 3));
    }

    #[test]
    fn test_roll_uses_minimum_dice_with_mock_rng() {
        let mut rng = MockRng;

        let abilities = Abilities::roll(&mut rng).unwrap();

        assert_eq!(abilities.strength, 3);
        assert_eq!(abilities.size, 8);
        assert_eq!(abilities.intelligence, 8);
        assert_eq!(abilities.education, 6);
    }

    #[test]
    fn test_roll_consumes_dice_in_ability_order() {
        // STR, CON, POW, DEX, APP use 3 dice; SIZ, INT use 2; EDU uses 3.
        let mut values = vec![6; 15];
        values.extend([1, 1, 2, 2, 4, 4, 4]);
        let mut rng = SequenceRng::new(values);

        let abilities = Abilities::roll(&mut rng).unwrap();

        assert_eq!(abilities.appearance, 18);
        assert_eq!(abilities.size, 8);
        assert_eq!(abilities.intelligence, 10);
        assert_eq!(abilities.education, 15);
    }

    #[test]
    fn test_derived_attributes() {
        let derived = DerivedAttributes::from_abilities(&sample_abilities());

        assert_eq!(derived.sanity, 55);
        assert_eq!(derived.luck, 55);
        assert_eq!(derived.idea, 75);
        assert_eq!(derived.knowledge, 80);
        assert_eq!(derived.hit_points, 13);
        assert_eq!(derived.magic_points, 11);
    }

    #[test]
    fn test_skill_point_pool() {
        assert_eq!(sample_abilities().skill_point_pool(), 16 * 20 + 15 * 10);
    }

    #[test]
    fn test_catalogue_has_unique_names() {
        let mut names: Vec<&str> = SKILL_CATALOGUE.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SKILL_CATALOGUE.len());
        assert_eq!(find_skill("Spot Hidden").map(|s| s.base_value), Some(25));
        assert_eq!(find_skill("Locksmith").map(|s| s.base_value), Some(10));
        assert!(find_skill("Cthulhu Mythos").is_none());
    }

    #[test]
    fn test_allocate_skills_adds_points_to_base() {
        let allocations = BTreeMap::from([("Spot Hidden".to_owned(), 40)]);

        let ratings = allocate_skills(&sample_abilities(), &allocations).unwrap();

        assert_eq!(ratings["Spot Hidden"], 65);
        assert_eq!(ratings["Listen"], 25);
        assert_eq!(ratings.len(), SKILL_CATALOGUE.len());
    }

    #[test]
    fn test_allocate_skills_rejects_rating_above_cap() {
        let allocations = BTreeMap::from([("First Aid".to_owned(), 51)]);

        let result = allocate_skills(&sample_abilities(), &allocations);

        assert_eq!(
            result,
            Err(CharacterError::SkillAboveCap {
                skill: "First Aid".to_owned(),
                total: 81,
            })
        );
    }

    #[test]
    fn test_allocate_skills_accepts_rating_at_cap() {
        let allocations = BTreeMap::from([("First Aid".to_owned(), 50)]);

        let ratings = allocate_skills(&sample_abilities(), &allocations).unwrap();

        assert_eq!(ratings["First Aid"], SKILL_MAX);
    }

    #[test]
    fn test_allocate_skills_rejects_unknown_skill() {
        let allocations = BTreeMap::from([("Astrology".to_owned(), 5)]);

        let result = allocate_skills(&sample_abilities(), &allocations);

        assert_eq!(
            result,
            Err(CharacterError::UnknownSkill("Astrology".to_owned()))
        );
    }

    #[test]
    fn test_allocate_skills_rejects_overspent_pool() {
        let abilities = Abilities {
            intelligence: 1,
            education: 1,
            ..Abilities::default()
        };
        let allocations = BTreeMap::from([
            ("Spot Hidden".to_owned(), 20),
            ("Listen".to_owned(), 20),
        ]);

        let result = allocate_skills(&abilities, &allocations);

        assert_eq!(
            result,
            Err(CharacterError::PoolExceeded {
                allocated: 40,
                available: 30,
            })
        );
    }
}
