//! Utility functions module

pub mod signals;

// Re-export main functions
pub use signals::{shutdown_signal, signal_name};
