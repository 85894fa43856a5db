//! Mythos — rules of play.
//!
//! Responsible for generating dice results, deriving target values,
//! classifying percentile rolls into success tiers, and the character
//! creation tables (ability dice, derived attributes, skill catalogue).

pub mod domain;
