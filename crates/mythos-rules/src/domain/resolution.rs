//! Skill resolution.
//!
//! Derives the reported target value from a skill rating and difficulty,
//! and classifies a percentile roll into one of six success tiers.
//! Classification always uses the raw skill rating; difficulty only changes
//! the target value reported alongside the result.

use std::fmt;
use std::str::FromStr;

use mythos_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dice::roll_percentile;

/// Errors raised while interpreting resolution inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The difficulty text is not one of `normal`, `hard` or `extreme`.
    #[error("unknown difficulty: {0:?}")]
    UnknownDifficulty(String),
}

/// Difficulty tier of a requested check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Target equals the skill rating.
    #[default]
    Normal,
    /// Target is half the rating, rounded down.
    Hard,
    /// Target is a fifth of the rating, rounded down.
    Extreme,
}

impl Difficulty {
    /// Wire name of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Extreme => "extreme",
        }
    }

    /// Player-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Hard => "Hard",
            Self::Extreme => "Extreme",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            "extreme" => Ok(Self::Extreme),
            _ => Err(ResolutionError::UnknownDifficulty(s.to_owned())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome tier of a percentile roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessTier {
    /// A natural 1.
    Critical,
    /// Roll at or under a fifth of the rating.
    Extreme,
    /// Roll at or under half the rating.
    Hard,
    /// Roll at or under the rating.
    Regular,
    /// Roll over the rating.
    Failure,
    /// A 100, or 96+ when the rating is 50 or less.
    Fumble,
}

impl SuccessTier {
    /// Player-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Extreme => "Extreme Success",
            Self::Hard => "Hard Success",
            Self::Regular => "Regular Success",
            Self::Failure => "Failure",
            Self::Fumble => "Fumble",
        }
    }

    /// Whether the tier counts as a success.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(
            self,
            Self::Critical | Self::Extreme | Self::Hard | Self::Regular
        )
    }
}

impl fmt::Display for SuccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The resolved outcome of a single skill check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Skill that was tested.
    pub skill: String,
    /// Difficulty the check was requested at.
    pub difficulty: Difficulty,
    /// Target value derived from the rating and difficulty.
    pub target_value: u32,
    /// Raw percentile roll.
    pub roll: u32,
    /// Classified success tier.
    pub tier: SuccessTier,
}

/// Computes the target value for `skill_rating` at `difficulty`.
#[must_use]
pub const fn compute_target_value(skill_rating: u32, difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Normal => skill_rating,
        Difficulty::Hard => skill_rating / 2,
        Difficulty::Extreme => skill_rating / 5,
    }
}

/// Classifies a percentile `roll` (expected in `1..=100`) against
/// `skill_rating`. The first matching rule wins: fumble, critical, extreme,
/// hard, regular, failure.
#[must_use]
pub const fn classify_success(roll: u32, skill_rating: u32) -> SuccessTier {
    if roll == 100 || (skill_rating <= 50 && roll >= 96) {
        SuccessTier::Fumble
    } else if roll == 1 {
        SuccessTier::Critical
    } else if roll <= skill_rating / 5 {
        SuccessTier::Extreme
    } else if roll <= skill_rating / 2 {
        SuccessTier::Hard
    } else if roll <= skill_rating {
        SuccessTier::Regular
    } else {
        SuccessTier::Failure
    }
}

/// Rolls a percentile die and resolves a check for `skill`.
pub fn resolve_check(
    rng: &mut dyn DeterministicRng,
    skill: &str,
    skill_rating: u32,
    difficulty: Difficulty,
) -> CheckResult {
    let roll = roll_percentile(rng);
    let result = CheckResult {
        skill: skill.to_owned(),
        difficulty,
        target_value: compute_target_value(skill_rating, difficulty),
        roll,
        tier: classify_success(roll, skill_rating),
    };
    tracing::debug!(
        skill,
        rating = skill_rating,
        difficulty = %difficulty,
        roll,
        tier = %result.tier,
        "resolved check"
    );
    result
}
