//! Dice engine.
//!
//! Uniform single-die rolls, composite dice pools (`3d6`, `2d6+6`) and the
//! percentile roll used by skill resolution. Every function draws from an
//! injected [`DeterministicRng`]; nothing here keeps state between calls.

use std::fmt;

use mythos_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of faces on the percentile die.
pub const PERCENTILE_SIDES: u32 = 100;

/// Errors raised by the dice engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    /// A die must have at least one face.
    #[error("a die needs at least one side, got {0}")]
    InvalidSides(u32),
}

/// A pool of identical dice plus a flat modifier, e.g. `3d6+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePool {
    /// Number of dice rolled.
    pub count: u32,
    /// Faces per die.
    pub sides: u32,
    /// Flat amount added to the sum.
    pub modifier: i32,
}

impl DicePool {
    /// Creates a new dice pool.
    #[must_use]
    pub const fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Smallest total this pool can produce.
    #[must_use]
    pub const fn min_total(&self) -> i32 {
        saturating_i32(self.count).saturating_add(self.modifier)
    }

    /// Largest total this pool can produce.
    #[must_use]
    pub const fn max_total(&self) -> i32 {
        saturating_i32(self.count.saturating_mul(self.sides)).saturating_add(self.modifier)
    }
}

impl fmt::Display for DicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Converts to `i32`, clamping at `i32::MAX`.
#[allow(clippy::cast_possible_wrap)]
const fn saturating_i32(value: u32) -> i32 {
    if value > i32::MAX.unsigned_abs() {
        i32::MAX
    } else {
        value as i32
    }
}

/// Rolls a single die with faces `1..=sides`.
///
/// # Errors
///
/// Returns `DiceError::InvalidSides` if `sides` is zero.
pub fn roll_die(rng: &mut dyn DeterministicRng, sides: u32) -> Result<u32, DiceError> {
    if sides == 0 {
        return Err(DiceError::InvalidSides(sides));
    }
    Ok(rng.next_u32_range(1, sides))
}

/// Rolls every die in `pool` and adds its modifier. Totals saturate at the
/// bounds of `i32`.
///
/// # Errors
///
/// Returns `DiceError::InvalidSides` if the pool's dice have zero sides.
pub fn roll_pool(rng: &mut dyn DeterministicRng, pool: DicePool) -> Result<i32, DiceError> {
    let mut total = pool.modifier;
    for _ in 0..pool.count {
        total = total.saturating_add(saturating_i32(roll_die(rng, pool.sides)?));
    }
    Ok(total)
}

/// Rolls a d100: a uniform value in `1..=100`.
pub fn roll_percentile(rng: &mut dyn DeterministicRng) -> u32 {
    rng.next_u32_range(1, PERCENTILE_SIDES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mythos_core::rng::SeededRng;
    use mythos_test_support::{MockRng, SequenceRng};

    #[test]
    fn test_roll_die_rejects_zero_sides() {
        let mut rng = MockRng;

        let result = roll_die(&mut rng, 0);

        assert_eq!(result, Err(DiceError::InvalidSides(0)));
    }

    #[test]
    fn test_roll_die_returns_value_from_source() {
        let mut rng = SequenceRng::new(vec![4]);

        assert_eq!(roll_die(&mut rng, 6), Ok(4));
    }

    #[test]
    fn test_roll_die_stays_in_range_with_real_rng() {
        let mut rng = SeededRng::from_seed(99);

        for _ in 0..500 {
            let value = roll_die(&mut rng, 6).unwrap();
            assert!((1..=6).contains(&value));
        }
    }

    #[test]
    fn test_roll_pool_sums_dice_and_modifier() {
        let mut rng = SequenceRng::new(vec![2, 5, 6]);

        let total = roll_pool(&mut rng, DicePool::new(3, 6, 3)).unwrap();

        assert_eq!(total, 16);
    }

    #[test]
    fn test_roll_pool_with_zero_count_returns_modifier() {
        let mut rng = SequenceRng::new(vec![]);

        assert_eq!(roll_pool(&mut rng, DicePool::new(0, 6, 6)), Ok(6));
    }

    #[test]
    fn test_roll_pool_propagates_invalid_sides() {
        let mut rng = MockRng;

        let result = roll_pool(&mut rng, DicePool::new(2, 0, 0));

        assert_eq!(result, Err(DiceError::InvalidSides(0)));
    }

    #[test]
    fn test_roll_pool_respects_bounds() {
        let mut rng = SeededRng::from_seed(3);
        let pool = DicePool::new(2, 6, 6);

        for _ in 0..500 {
            let total = roll_pool(&mut rng, pool).unwrap();
            assert!((pool.min_total()..=pool.max_total()).contains(&total));
        }
    }

    #[test]
    fn test_roll_pool_saturates_instead_of_overflowing() {
        let mut rng = SequenceRng::new(vec![u32::MAX, u32::MAX, u32::MAX]);
        let pool = DicePool::new(3, u32::MAX, 10);

        assert_eq!(roll_pool(&mut rng, pool), Ok(i32::MAX));
        assert_eq!(pool.max_total(), i32::MAX);
    }

    #[test]
    fn test_roll_percentile_uses_one_to_hundred() {
        let mut rng = MockRng;
        assert_eq!(roll_percentile(&mut rng), 1);

        let mut rng = SeededRng::from_seed(11);
        for _ in 0..1_000 {
            let roll = roll_percentile(&mut rng);
            assert!((1..=100).contains(&roll));
        }
    }

    #[test]
    fn test_dice_pool_display() {
        assert_eq!(DicePool::new(3, 6, 0).to_string(), "3d6");
        assert_eq!(DicePool::new(2, 6, 6).to_string(), "2d6+6");
        assert_eq!(DicePool::new(1, 4, -1).to_string(), "1d4-1");
    }
}
