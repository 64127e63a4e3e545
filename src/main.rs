//! Roundbell - a drift-corrected countdown timer for training rounds
//!
//! This is the main entry point for the roundbell CLI, a thin caller around
//! the timer engine: it runs a single round in the terminal and exits.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use roundbell::{
    audio::ConsoleCuePlayer,
    config::Config,
    engine::{EngineOptions, TimerEngine},
    settings::JsonFileStore,
    state::Phase,
    utils::{shutdown_signal, signal_name},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("roundbell={}", config.log_level()))
        .init();

    info!("Starting roundbell");

    let store = Arc::new(JsonFileStore::new(&config.settings));
    let engine = TimerEngine::new(
        EngineOptions {
            round_time_ms: config.round_time_ms(),
        },
        Arc::new(ConsoleCuePlayer::new()),
        store,
    );

    // Log the countdown once per displayed second; notifications arrive far
    // more often than that.
    let last_printed = Arc::new(AtomicI64::new(i64::MIN));
    let printed = last_printed.clone();
    let _subscription = engine.subscribe(move |snapshot| {
        let seconds = (snapshot.time_left_ms + 999) / 1_000;
        if printed.swap(seconds, Ordering::Relaxed) != seconds && snapshot.is_running {
            info!("{}s remaining", seconds);
        }
    });

    let round_time_ms = engine.snapshot().round_time_ms;
    info!("Round duration: {}s", round_time_ms / 1_000);
    engine.start();

    tokio::select! {
        _ = wait_for_idle(&engine) => {
            info!("Round complete, goodbye");
        }
        signal = shutdown_signal() => {
            info!("Stopping on {}", signal_name(signal));
            engine.destroy();
        }
    }

    Ok(())
}

/// Poll until the engine has returned to idle after running.
async fn wait_for_idle(engine: &Arc<TimerEngine>) {
    loop {
        sleep(Duration::from_millis(250)).await;
        let snapshot = engine.snapshot();
        if snapshot.phase == Phase::Idle && !snapshot.is_running {
            break;
        }
    }
}
