//! Timer engine module
//!
//! The stateful controller: it owns the timer state, the subscriber registry,
//! and the tick task, and composes the pure state functions with wall-clock
//! reads to drive the countdown.

pub mod timer_engine;

// Re-export main types
pub use timer_engine::{EngineOptions, Subscription, TimerEngine};
