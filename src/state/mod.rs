//! State management module
//!
//! Pure timer state: the state record, its constants, validation, and the
//! transition-construction logic. Nothing in here performs I/O or owns a clock;
//! the engine supplies every timestamp.

pub mod snapshot;
pub mod timer_state;

// Re-export main types
pub use snapshot::TimerSnapshot;
pub use timer_state::{
    validate_settings, Phase, TimerSettings, TimerState, DEFAULT_ROUND_TIME_MS,
    MIN_ROUND_TIME_MS, SOON_TIME_MS,
};
