//! # BCI Engine
//!
//! The scheduler of the simulator. It drives a [`Session`] with two timers:
//!
//! 1. A fixed-period generation tick that produces the next snapshot and
//!    samples chart history
//! 2. A debounced settle timer that classifies the snapshot once it has
//!    stopped changing
//!
//! Everything the presentation layer needs (current snapshot, history,
//! mental state, subscriptions) is read through [`BciEngine`].

mod engine;
mod session;

pub use engine::{BciEngine, EngineError};
pub use session::{Session, TickOutcome};
