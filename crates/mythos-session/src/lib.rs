//! Mythos — session state and turn progression.
//!
//! Owns the session aggregate, applies narrator-issued state patches,
//! and sequences turns between the player, the narrator and the rules
//! engine.

pub mod application;
pub mod domain;
