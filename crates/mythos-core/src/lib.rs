//! Mythos Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that every other
//! crate depends on: the injectable random source, the injectable clock,
//! and the top-level domain error. It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod rng;
