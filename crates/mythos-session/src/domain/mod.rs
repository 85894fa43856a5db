//! Domain layer: the session aggregate and the pure operations over it.

pub mod log;
pub mod patch;
pub mod result;
pub mod signals;
pub mod state;
