//! Settings persistence module
//!
//! A small get/set key-value store abstraction. The engine consults it once at
//! construction to seed the round duration and writes back on every settings
//! change; everything else about persistence lives behind [`SettingsStore`].

pub mod json_file;
pub mod memory;

// Re-export main types
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Key under which the configured round duration is persisted.
pub const ROUND_TIME_KEY: &str = "round_time_ms";

/// String key-value store for user settings.
///
/// Implementations must never surface errors to the engine; failures are
/// logged and swallowed, matching the engine's no-error-channel contract.
pub trait SettingsStore: Send + Sync {
    /// Look up a stored value, `None` if absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: String);
}

/// Parse a stored value as `u64`, treating unparseable values as absent.
pub fn get_u64(store: &dyn SettingsStore, key: &str) -> Option<u64> {
    store.get(key).and_then(|v| v.parse().ok())
}
