//! Mythos — HTTP API library.
//!
//! Exposes the router pieces so integration tests can assemble the same
//! application `main` serves.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
