//! Audio cue capability
//!
//! The engine only needs two fire-and-forget cues plus a one-time
//! initialization hook (some platforms refuse to play audio until a
//! user-initiated action has occurred). The actual player is injected into the
//! engine so every instance, and every test, controls its own collaborator.

use std::io::Write;

use tracing::{debug, info};

/// Audio cue player capability.
///
/// All calls are fire-and-forget; implementations must not block and have no
/// way to report failure back to the engine.
pub trait CuePlayer: Send + Sync {
    /// Prepare the player. Invoked once, on the first user-initiated start.
    fn initialize(&self);

    /// Play the "ending soon" warning cue.
    fn play_soon(&self);

    /// Play the end-of-round cue.
    fn play_finish(&self);
}

/// Cue player for terminal use: rings the terminal bell and logs the cue.
#[derive(Debug, Default)]
pub struct ConsoleCuePlayer;

impl ConsoleCuePlayer {
    /// Create a console cue player
    pub fn new() -> Self {
        Self
    }

    fn ring(&self, times: usize) {
        let mut stdout = std::io::stdout();
        for _ in 0..times {
            let _ = stdout.write_all(b"\x07");
        }
        let _ = stdout.flush();
    }
}

impl CuePlayer for ConsoleCuePlayer {
    fn initialize(&self) {
        debug!("Console cue player initialized");
    }

    fn play_soon(&self) {
        info!("Round ending soon");
        self.ring(1);
    }

    fn play_finish(&self) {
        info!("Round finished");
        self.ring(3);
    }
}

/// Cue player that does nothing. Useful for headless embedding.
#[derive(Debug, Default)]
pub struct NullCuePlayer;

impl CuePlayer for NullCuePlayer {
    fn initialize(&self) {}
    fn play_soon(&self) {}
    fn play_finish(&self) {}
}
