//! Timer state structure and the pure transition logic

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Smallest round duration the engine will accept; shorter values clamp up.
pub const MIN_ROUND_TIME_MS: u64 = 30_000;

/// Round duration used when neither the caller nor the settings store provides one.
pub const DEFAULT_ROUND_TIME_MS: u64 = 180_000;

/// Remaining time at which the "ending soon" cue becomes eligible.
pub const SOON_TIME_MS: i64 = 10_000;

/// Phase of the timer's operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Timer is not counting anything down
    Idle,
    /// Active countdown of a training round
    Work,
}

/// Validated engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Full duration of the Work phase in milliseconds
    pub round_time_ms: u64,
}

/// Clamp settings into their legal range. Never errors; sub-minimum
/// durations are raised to [`MIN_ROUND_TIME_MS`] silently.
pub fn validate_settings(settings: TimerSettings) -> TimerSettings {
    TimerSettings {
        round_time_ms: settings.round_time_ms.max(MIN_ROUND_TIME_MS),
    }
}

/// Complete timer state. Owned exclusively by the engine; everything here is
/// plain data, mutated only through the engine's operations.
#[derive(Debug, Clone)]
pub struct TimerState {
    /// Whether the phase clock is actively advancing
    pub is_running: bool,
    /// Remaining time in the current phase. Signed: a late tick may observe a
    /// negative value for one iteration before the transition is processed.
    pub time_left_ms: i64,
    /// Current phase
    pub phase: Phase,
    /// Instant the current phase-run began; recomputed on start/resume/adjust
    pub start_time: Option<Instant>,
    /// Wall-clock instant the overall session began; set once per session,
    /// cleared when the timer returns to idle. Informational only.
    pub session_start_time: Option<DateTime<Utc>>,
    /// Configured full duration of the Work phase
    pub round_time_ms: u64,
    /// One-shot latch so the "ending soon" cue fires at most once per phase
    pub soon_cue_played: bool,
}

impl TimerState {
    /// Create the initial idle state for a given round duration.
    /// The caller is expected to have validated `round_time_ms` already.
    pub fn initial(round_time_ms: u64) -> Self {
        Self {
            is_running: false,
            time_left_ms: round_time_ms as i64,
            phase: Phase::Idle,
            start_time: None,
            session_start_time: None,
            round_time_ms,
            soon_cue_played: false,
        }
    }

    /// Full duration of the current phase in milliseconds.
    ///
    /// Work is the only phase with a real duration; Idle returns the round
    /// duration too so countdown arithmetic never needs a special case.
    pub fn phase_duration_ms(&self) -> u64 {
        match self.phase {
            Phase::Idle | Phase::Work => self.round_time_ms,
        }
    }

    /// Whether the current phase has run out of time.
    pub fn should_transition(&self) -> bool {
        self.time_left_ms <= 0
    }

    /// Build the state that results from transitioning into `phase` at `now`.
    /// Clears the cue latch and stamps the new phase start; entering Idle also
    /// stops the clock and drops both timestamps.
    pub fn transition_to(&self, phase: Phase, now: Instant) -> Self {
        let mut next = self.clone();
        next.phase = phase;
        next.start_time = Some(now);
        next.soon_cue_played = false;
        match phase {
            Phase::Work => {
                next.time_left_ms = next.round_time_ms as i64;
            }
            Phase::Idle => {
                next.is_running = false;
                next.start_time = None;
                next.session_start_time = None;
                next.time_left_ms = next.round_time_ms as i64;
            }
        }
        next
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::initial(DEFAULT_ROUND_TIME_MS)
    }
}
