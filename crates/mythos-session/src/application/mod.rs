//! Application layer: the narrator contract and the turn controller.

pub mod controller;
pub mod narrator;
pub mod retry;
