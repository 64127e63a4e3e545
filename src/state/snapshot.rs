//! Immutable state snapshot handed to observers

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::timer_state::{Phase, TimerState};

/// Copy of the timer state at a notification boundary.
///
/// Subscribers and `snapshot()` callers only ever see this type; mutating a
/// snapshot has no effect on the engine. Monotonic instants are deliberately
/// left out, so the snapshot serializes cleanly for display layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    /// Whether the phase clock is actively advancing
    pub is_running: bool,
    /// Remaining time in the current phase, clamped to zero for display
    pub time_left_ms: i64,
    /// Current phase
    pub phase: Phase,
    /// Configured full duration of the Work phase
    pub round_time_ms: u64,
    /// Wall-clock instant the session began, if one is in progress
    pub session_start_time: Option<DateTime<Utc>>,
}

impl From<&TimerState> for TimerSnapshot {
    fn from(state: &TimerState) -> Self {
        Self {
            is_running: state.is_running,
            time_left_ms: state.time_left_ms.max(0),
            phase: state.phase,
            round_time_ms: state.round_time_ms,
            session_start_time: state.session_start_time,
        }
    }
}
