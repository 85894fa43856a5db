//! Domain layer for the rules crate.

pub mod character;
pub mod dice;
pub mod resolution;
