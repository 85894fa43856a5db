//! Shared test doubles and fixtures for the Mythos engine.

mod clock;
mod narrator;
mod rng;

pub use clock::{FixedClock, SteppingClock, fixed_instant};
pub use narrator::{PendingNarrator, QueuedNarrator, sample_scenario};
pub use rng::{MockRng, SequenceRng};
