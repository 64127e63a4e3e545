//! Roundbell - a drift-corrected countdown timer for training rounds
//!
//! This library provides a timer engine that recomputes remaining time from
//! absolute start instants on every tick, so delayed callbacks never skew the
//! countdown, plus the collaborator traits (audio cues, settings persistence)
//! it is wired up with.

pub mod audio;
pub mod config;
pub mod engine;
pub mod settings;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use audio::{ConsoleCuePlayer, CuePlayer, NullCuePlayer};
pub use config::Config;
pub use engine::{EngineOptions, Subscription, TimerEngine};
pub use settings::{JsonFileStore, MemoryStore, SettingsStore};
pub use state::{Phase, TimerSettings, TimerSnapshot};
pub use utils::shutdown_signal;
