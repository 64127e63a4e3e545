//! The timer engine: state machine, drift-correcting tick loop, and observers

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    time::Duration,
};

use chrono::Utc;
use tokio::{
    task::JoinHandle,
    time::{interval, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    audio::CuePlayer,
    settings::{self, SettingsStore, ROUND_TIME_KEY},
    state::{
        validate_settings, Phase, TimerSettings, TimerSnapshot, TimerState,
        DEFAULT_ROUND_TIME_MS, SOON_TIME_MS,
    },
};

/// Tick period of the countdown recomputation loop (roughly 30 Hz).
pub const TICK_INTERVAL_MS: u64 = 33;

/// Minimum interval between subscriber notifications driven by the tick loop.
pub const NOTIFY_THROTTLE_MS: u64 = 100;

/// Window within which a repeated `toggle` call is ignored.
pub const TOGGLE_DEBOUNCE_MS: u64 = 100;

/// Subscriber callback invoked with a state snapshot on every notification.
/// Shared handles: notification clones them out of the registry and invokes
/// them without holding its lock.
pub type SubscriberFn = Arc<dyn Fn(&TimerSnapshot) + Send + Sync>;

/// Constructor options for [`TimerEngine`].
///
/// A `round_time_ms` given here wins over the persisted value; when both are
/// absent the engine falls back to [`DEFAULT_ROUND_TIME_MS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Full duration of the Work phase in milliseconds
    pub round_time_ms: Option<u64>,
}

/// Handle returned by [`TimerEngine::subscribe`]. Dropping it removes the
/// subscriber, so a caller cannot leak callbacks by forgetting to clean up.
pub struct Subscription {
    id: u64,
    engine: Weak<TimerEngine>,
}

impl Subscription {
    /// Remove this subscriber from the engine. Equivalent to dropping the
    /// handle; safe after the engine has been dropped or destroyed.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.upgrade() {
            lock(&engine.subscribers).remove(&self.id);
        }
    }
}

/// Countdown timer engine for a single work phase.
///
/// Remaining time is always recomputed from the phase's absolute start
/// instant, never decremented by a fixed step, so delayed or missed ticks
/// cannot accumulate timing error. All operations are idempotent no-ops when
/// their precondition does not hold; nothing here returns an error.
pub struct TimerEngine {
    state: Mutex<TimerState>,
    subscribers: Mutex<HashMap<u64, SubscriberFn>>,
    next_subscriber_id: AtomicU64,
    /// Live tick-task handle; `None` whenever the loop is stopped
    ticker: Mutex<Option<JoinHandle<()>>>,
    last_notify: Mutex<Option<Instant>>,
    last_toggle: Mutex<Option<Instant>>,
    audio_initialized: AtomicBool,
    audio: Arc<dyn CuePlayer>,
    settings: Arc<dyn SettingsStore>,
}

/// A poisoned lock only means a subscriber panicked mid-notify; the guarded
/// data is still plain valid state, so recover it rather than wedge the engine.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TimerEngine {
    /// Create an engine with injected audio and settings collaborators.
    ///
    /// The settings store is consulted once here to seed the round duration;
    /// an explicit option takes precedence over the persisted value.
    pub fn new(
        options: EngineOptions,
        audio: Arc<dyn CuePlayer>,
        settings: Arc<dyn SettingsStore>,
    ) -> Arc<Self> {
        let seed = options
            .round_time_ms
            .or_else(|| settings::get_u64(settings.as_ref(), ROUND_TIME_KEY))
            .unwrap_or(DEFAULT_ROUND_TIME_MS);
        let validated = validate_settings(TimerSettings { round_time_ms: seed });

        Arc::new(Self {
            state: Mutex::new(TimerState::initial(validated.round_time_ms)),
            subscribers: Mutex::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(0),
            ticker: Mutex::new(None),
            last_notify: Mutex::new(None),
            last_toggle: Mutex::new(None),
            audio_initialized: AtomicBool::new(false),
            audio,
            settings,
        })
    }

    /// Start the countdown, or resume it if paused mid-phase.
    ///
    /// No-op while already running, so overlapping input events cannot
    /// double-start the clock.
    pub fn start(self: &Arc<Self>) {
        // First user-initiated start unlocks audio playback on platforms that
        // require a user gesture.
        if !self.audio_initialized.swap(true, Ordering::SeqCst) {
            self.audio.initialize();
        }

        {
            let mut state = lock(&self.state);
            if state.is_running {
                debug!("Start ignored: timer already running");
                return;
            }

            let now = Instant::now();
            if state.phase == Phase::Idle {
                let next = state.transition_to(Phase::Work, now);
                *state = next;
                // One precise read for the whole operation; the transition's
                // own stamp is overwritten with it.
                state.start_time = Some(now);
            } else {
                // Resuming: rebuild the start instant so the frozen remainder
                // carries over exactly, regardless of how long the pause was.
                let duration = state.phase_duration_ms() as i64;
                let elapsed = (duration - state.time_left_ms).clamp(0, duration) as u64;
                state.start_time = now.checked_sub(Duration::from_millis(elapsed)).or(Some(now));
            }
            state.is_running = true;
            if state.session_start_time.is_none() {
                state.session_start_time = Some(Utc::now());
            }
            info!(
                "Timer started: phase={:?}, {}ms left",
                state.phase, state.time_left_ms
            );
        }

        self.start_ticking();
        self.notify();
    }

    /// Freeze the countdown, keeping the remaining time. No-op if not running.
    pub fn pause(&self) {
        {
            let mut state = lock(&self.state);
            if !state.is_running {
                debug!("Pause ignored: timer not running");
                return;
            }
            state.is_running = false;
            info!("Timer paused with {}ms left", state.time_left_ms);
        }

        self.stop_ticking();
        self.notify();
    }

    /// Return the machine to idle, keeping only the configured round duration.
    /// Idempotent.
    pub fn reset(&self) {
        self.stop_ticking();
        {
            let mut state = lock(&self.state);
            let round_time_ms = state.round_time_ms;
            *state = TimerState::initial(round_time_ms);
        }
        info!("Timer reset");
        self.notify();
    }

    /// Pause if running, start otherwise. Repeated calls within
    /// [`TOGGLE_DEBOUNCE_MS`] of each other are ignored, which absorbs
    /// duplicate rapid-fire input events.
    pub fn toggle(self: &Arc<Self>) {
        let now = Instant::now();
        {
            let mut last = lock(&self.last_toggle);
            if let Some(prev) = *last {
                if now.duration_since(prev) < Duration::from_millis(TOGGLE_DEBOUNCE_MS) {
                    debug!("Toggle ignored: within debounce window");
                    return;
                }
            }
            *last = Some(now);
        }

        let running = lock(&self.state).is_running;
        if running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Shift the remaining time by `delta_ms`, clamped to the phase duration.
    ///
    /// While running, the start instant is rebuilt so the live projection
    /// agrees with the adjusted remainder on the very next tick.
    pub fn adjust_time(&self, delta_ms: i64) {
        {
            let mut state = lock(&self.state);
            let duration = state.phase_duration_ms() as i64;
            let new_left = state.time_left_ms.saturating_add(delta_ms).clamp(0, duration);
            state.time_left_ms = new_left;
            if state.is_running {
                let now = Instant::now();
                let elapsed = (duration - new_left) as u64;
                state.start_time = now.checked_sub(Duration::from_millis(elapsed)).or(Some(now));
            }
            debug!("Adjusted time by {}ms, {}ms left", delta_ms, new_left);
        }
        self.notify();
    }

    /// Apply new settings, clamping the round duration to its minimum and
    /// persisting it. An idle timer picks the new duration up immediately; a
    /// phase already underway keeps its current remainder.
    pub fn update_settings(&self, new_settings: TimerSettings) {
        let validated = validate_settings(new_settings);
        {
            let mut state = lock(&self.state);
            state.round_time_ms = validated.round_time_ms;
            if state.phase == Phase::Idle {
                state.time_left_ms = validated.round_time_ms as i64;
            }
        }
        self.settings
            .set(ROUND_TIME_KEY, validated.round_time_ms.to_string());
        info!("Round time set to {}ms", validated.round_time_ms);
        self.notify();
    }

    /// Copy out the current state.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(&*lock(&self.state))
    }

    /// Register a notification callback. Subscribers form an unordered set;
    /// each receives its own snapshot copy on every notification. The
    /// callback stays registered for the lifetime of the returned handle.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&TimerSnapshot) + Send + Sync + 'static,
    {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscribers).insert(id, Arc::new(callback));
        Subscription {
            id,
            engine: Arc::downgrade(self),
        }
    }

    /// Stop the tick loop, drop all subscribers, and halt the clock.
    /// The engine is inert afterwards; stale tick callbacks become no-ops.
    pub fn destroy(&self) {
        self.stop_ticking();
        lock(&self.subscribers).clear();
        lock(&self.state).is_running = false;
        info!("Timer engine destroyed");
    }

    /// Spawn the tick task if none is live. The task holds only a weak
    /// engine reference, so dropping the last external handle ends it.
    fn start_ticking(self: &Arc<Self>) {
        let mut ticker = lock(&self.ticker);
        if ticker.is_some() {
            return;
        }
        let engine = Arc::downgrade(self);
        *ticker = Some(tokio::spawn(async move {
            let mut ticks = interval(Duration::from_millis(TICK_INTERVAL_MS));
            // Drift correction recomputes from absolute instants, so there is
            // nothing to catch up after a delay.
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                match engine.upgrade() {
                    Some(engine) => engine.tick(),
                    None => break,
                }
            }
        }));
    }

    /// Abort the tick task and clear its handle. Synchronous; a tick observed
    /// after this sees the empty handle and does nothing.
    fn stop_ticking(&self) {
        if let Some(handle) = lock(&self.ticker).take() {
            handle.abort();
        }
    }

    /// One firing of the recomputation loop.
    fn tick(&self) {
        // A callback that raced stop_ticking/destroy must not touch state.
        if lock(&self.ticker).is_none() {
            return;
        }

        let mut play_soon = false;
        {
            let mut state = lock(&self.state);
            if !state.is_running {
                return;
            }
            let Some(start) = state.start_time else {
                return;
            };

            let now = Instant::now();
            let elapsed = now.saturating_duration_since(start).as_millis() as i64;
            state.time_left_ms = state.phase_duration_ms() as i64 - elapsed;

            if state.should_transition() {
                drop(state);
                self.finish_phase();
                return;
            }

            if Self::soon_cue_due(&state) {
                state.soon_cue_played = true;
                play_soon = true;
            }
        }

        if play_soon {
            self.audio.play_soon();
        }
        self.notify_throttled();
    }

    /// Whether the "ending soon" cue should fire on this tick.
    ///
    /// The lower bound keeps the window two tick periods wide: late ticks
    /// still catch the threshold, but a tick landing long after it (after a
    /// big adjustment, say) stays silent.
    fn soon_cue_due(state: &TimerState) -> bool {
        state.phase == Phase::Work
            && !state.soon_cue_played
            && state.time_left_ms > 0
            && state.time_left_ms <= SOON_TIME_MS
            && state.time_left_ms > SOON_TIME_MS - 2 * TICK_INTERVAL_MS as i64
    }

    /// Handle a phase running out of time.
    fn finish_phase(&self) {
        let ended = {
            let mut state = lock(&self.state);
            state.time_left_ms = 0;
            state.phase
        };
        // Only Work triggers anything today; the match leaves room for more
        // phases later.
        match ended {
            Phase::Work => {
                info!("Round complete");
                self.audio.play_finish();
                // reset stops the tick loop and notifies on its own.
                self.reset();
            }
            Phase::Idle => {}
        }
    }

    /// Notify all subscribers unconditionally and stamp the throttle clock.
    ///
    /// Callbacks run with no engine lock held: a subscriber is free to call
    /// back into the engine (pause from a display, say) or to unsubscribe.
    fn notify(&self) {
        let snapshot = self.snapshot();
        *lock(&self.last_notify) = Some(Instant::now());
        let callbacks: Vec<SubscriberFn> = lock(&self.subscribers).values().cloned().collect();
        for callback in callbacks {
            callback(&snapshot);
        }
    }

    /// Tick-driven notification, capped at one per [`NOTIFY_THROTTLE_MS`] so
    /// observers are not updated at the full tick rate.
    fn notify_throttled(&self) {
        {
            let last = lock(&self.last_notify);
            if let Some(prev) = *last {
                if prev.elapsed() < Duration::from_millis(NOTIFY_THROTTLE_MS) {
                    return;
                }
            }
        }
        self.notify();
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &*lock(&self.state))
            .field("subscribers", &lock(&self.subscribers).len())
            .field("ticking", &lock(&self.ticker).is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::time::advance;

    use super::*;
    use crate::settings::MemoryStore;
    use crate::state::MIN_ROUND_TIME_MS;

    #[derive(Default)]
    struct CountingCues {
        initialized: AtomicUsize,
        soon: AtomicUsize,
        finish: AtomicUsize,
    }

    impl CuePlayer for CountingCues {
        fn initialize(&self) {
            self.initialized.fetch_add(1, Ordering::SeqCst);
        }
        fn play_soon(&self) {
            self.soon.fetch_add(1, Ordering::SeqCst);
        }
        fn play_finish(&self) {
            self.finish.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn engine_with(round_time_ms: u64) -> (Arc<TimerEngine>, Arc<CountingCues>) {
        let cues = Arc::new(CountingCues::default());
        let engine = TimerEngine::new(
            EngineOptions {
                round_time_ms: Some(round_time_ms),
            },
            cues.clone(),
            Arc::new(MemoryStore::new()),
        );
        (engine, cues)
    }

    #[tokio::test(start_paused = true)]
    async fn start_from_idle_enters_work() {
        let (engine, cues) = engine_with(60_000);
        engine.start();

        let state = lock(&engine.state);
        assert_eq!(state.phase, Phase::Work);
        assert!(state.is_running);
        assert_eq!(state.time_left_ms, 60_000);
        assert!(state.start_time.is_some());
        assert!(state.session_start_time.is_some());
        drop(state);

        assert_eq!(cues.initialized.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_is_a_noop() {
        let (engine, cues) = engine_with(60_000);
        engine.start();
        let before = lock(&engine.state).clone();

        engine.start();
        engine.start();

        let after = lock(&engine.state);
        assert_eq!(after.phase, before.phase);
        assert_eq!(after.start_time, before.start_time);
        assert_eq!(after.session_start_time, before.session_start_time);
        drop(after);
        assert_eq!(cues.initialized.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_recomputes_from_absolute_start() {
        let (engine, _) = engine_with(60_000);
        engine.start();

        advance(Duration::from_millis(1_000)).await;
        engine.tick();
        assert_eq!(lock(&engine.state).time_left_ms, 59_000);

        // A long gap between ticks causes no cumulative skew.
        advance(Duration::from_millis(20_000)).await;
        engine.tick();
        assert_eq!(lock(&engine.state).time_left_ms, 39_000);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_resume_preserves_remaining_time() {
        let (engine, _) = engine_with(60_000);
        engine.start();

        advance(Duration::from_millis(50_000)).await;
        engine.tick();
        engine.pause();
        {
            let state = lock(&engine.state);
            assert!(!state.is_running);
            assert_eq!(state.time_left_ms, 10_000);
        }

        // A long pause must not eat into the remainder.
        advance(Duration::from_millis(30_000)).await;
        engine.start();
        assert_eq!(lock(&engine.state).time_left_ms, 10_000);

        engine.tick();
        assert_eq!(lock(&engine.state).time_left_ms, 10_000);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_is_debounced() {
        let (engine, _) = engine_with(60_000);

        engine.toggle();
        assert!(lock(&engine.state).is_running);

        // Second call inside the debounce window is swallowed.
        engine.toggle();
        assert!(lock(&engine.state).is_running);

        advance(Duration::from_millis(150)).await;
        engine.toggle();
        assert!(!lock(&engine.state).is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn adjust_time_clamps_to_phase_duration() {
        let (engine, _) = engine_with(60_000);
        engine.start();

        engine.adjust_time(i64::MAX);
        assert_eq!(lock(&engine.state).time_left_ms, 60_000);

        engine.adjust_time(-15_000);
        assert_eq!(lock(&engine.state).time_left_ms, 45_000);
        // Running projection agrees with the adjusted remainder.
        engine.tick();
        assert_eq!(lock(&engine.state).time_left_ms, 45_000);

        engine.adjust_time(i64::MIN);
        assert_eq!(lock(&engine.state).time_left_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_round_returns_to_idle_with_one_finish_cue() {
        let (engine, cues) = engine_with(MIN_ROUND_TIME_MS);
        engine.start();

        advance(Duration::from_millis(MIN_ROUND_TIME_MS)).await;
        engine.tick();

        {
            let state = lock(&engine.state);
            assert_eq!(state.phase, Phase::Idle);
            assert!(!state.is_running);
            assert_eq!(state.time_left_ms, MIN_ROUND_TIME_MS as i64);
            assert!(state.session_start_time.is_none());
        }
        assert!(lock(&engine.ticker).is_none());
        assert_eq!(cues.finish.load(Ordering::SeqCst), 1);

        // Stale callback after the loop stopped changes nothing.
        engine.tick();
        assert_eq!(cues.finish.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn soon_cue_fires_exactly_once() {
        let (engine, cues) = engine_with(60_000);
        engine.start();

        advance(Duration::from_millis(50_000)).await;
        engine.tick();
        assert_eq!(lock(&engine.state).time_left_ms, 10_000);
        assert_eq!(cues.soon.load(Ordering::SeqCst), 1);

        // Latch holds for the rest of the phase.
        engine.tick();
        advance(Duration::from_millis(1_000)).await;
        engine.tick();
        assert_eq!(cues.soon.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn soon_cue_not_fired_long_after_threshold() {
        let (engine, cues) = engine_with(60_000);
        engine.start();

        // First tick observed with the threshold long gone: window missed,
        // stay silent rather than beep mid-final-stretch.
        advance(Duration::from_millis(55_000)).await;
        engine.tick();
        assert_eq!(lock(&engine.state).time_left_ms, 5_000);
        assert_eq!(cues.soon.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_is_idempotent() {
        let (engine, _) = engine_with(60_000);
        engine.start();
        advance(Duration::from_millis(5_000)).await;
        engine.tick();

        engine.reset();
        let first = engine.snapshot();
        engine.reset();
        let second = engine.snapshot();

        assert_eq!(first, second);
        assert_eq!(first.phase, Phase::Idle);
        assert_eq!(first.time_left_ms, 60_000);
        assert!(!first.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_get_snapshots_and_can_unsubscribe() {
        let (engine, _) = engine_with(60_000);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = engine.subscribe(move |snapshot| {
            lock(&sink).push(snapshot.clone());
        });

        engine.start();
        {
            let seen = lock(&seen);
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].phase, Phase::Work);
            assert!(seen[0].is_running);
        }

        subscription.unsubscribe();
        engine.reset();
        assert_eq!(lock(&seen).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_may_call_back_into_engine() {
        let (engine, _) = engine_with(60_000);

        // A display layer pausing the timer from inside its own update
        // callback must not wedge the notification path.
        let weak = Arc::downgrade(&engine);
        let _subscription = engine.subscribe(move |snapshot| {
            if snapshot.is_running {
                if let Some(engine) = weak.upgrade() {
                    engine.pause();
                }
            }
        });

        engine.start();

        let state = lock(&engine.state);
        assert!(!state.is_running);
        assert_eq!(state.phase, Phase::Work);
        drop(state);
        assert!(lock(&engine.ticker).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_may_unsubscribe_from_its_own_callback() {
        let (engine, _) = engine_with(60_000);
        let notifications = Arc::new(AtomicUsize::new(0));

        let counter = notifications.clone();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner_slot = slot.clone();
        let subscription = engine.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            // First notification removes the subscriber.
            drop(lock(&inner_slot).take());
        });
        *lock(&slot) = Some(subscription);

        engine.start();
        engine.reset();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_subscription_is_removed() {
        let (engine, _) = engine_with(60_000);
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = notifications.clone();
        let subscription = engine.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        engine.reset();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        drop(subscription);
        assert!(lock(&engine.subscribers).is_empty());
        engine.reset();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_notifications_are_throttled() {
        let (engine, _) = engine_with(60_000);
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = notifications.clone();
        let _subscription = engine.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        engine.start();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        // Immediately after the start notification the throttle suppresses
        // tick-driven updates.
        engine.tick();
        engine.tick();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        advance(Duration::from_millis(150)).await;
        engine.tick();
        assert_eq!(notifications.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn update_settings_clamps_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let engine = TimerEngine::new(
            EngineOptions::default(),
            Arc::new(CountingCues::default()),
            store.clone(),
        );

        engine.update_settings(TimerSettings { round_time_ms: 1_000 });
        {
            let state = lock(&engine.state);
            assert_eq!(state.round_time_ms, MIN_ROUND_TIME_MS);
            assert_eq!(state.time_left_ms, MIN_ROUND_TIME_MS as i64);
        }
        assert_eq!(store.get(ROUND_TIME_KEY), Some(MIN_ROUND_TIME_MS.to_string()));

        engine.update_settings(TimerSettings {
            round_time_ms: 90_000,
        });
        assert_eq!(store.get(ROUND_TIME_KEY), Some("90000".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn round_time_seeded_from_store_unless_overridden() {
        let store = Arc::new(MemoryStore::new());
        store.set(ROUND_TIME_KEY, "45000".to_string());

        let seeded = TimerEngine::new(
            EngineOptions::default(),
            Arc::new(CountingCues::default()),
            store.clone(),
        );
        assert_eq!(seeded.snapshot().round_time_ms, 45_000);

        let overridden = TimerEngine::new(
            EngineOptions {
                round_time_ms: Some(120_000),
            },
            Arc::new(CountingCues::default()),
            store,
        );
        assert_eq!(overridden.snapshot().round_time_ms, 120_000);
    }

    #[tokio::test(start_paused = true)]
    async fn running_phase_keeps_remainder_on_settings_change() {
        let (engine, _) = engine_with(60_000);
        engine.start();
        advance(Duration::from_millis(10_000)).await;
        engine.tick();

        engine.update_settings(TimerSettings {
            round_time_ms: 90_000,
        });
        // The operation itself leaves the in-flight remainder alone.
        assert_eq!(lock(&engine.state).time_left_ms, 50_000);
        assert_eq!(lock(&engine.state).round_time_ms, 90_000);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_stops_everything() {
        let (engine, cues) = engine_with(60_000);
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = notifications.clone();
        let _subscription = engine.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        engine.start();
        engine.destroy();

        assert!(lock(&engine.ticker).is_none());
        assert!(!lock(&engine.state).is_running);
        assert!(lock(&engine.subscribers).is_empty());

        // A stale tick after destroy is absorbed.
        advance(Duration::from_millis(1_000)).await;
        engine.tick();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
        assert_eq!(cues.finish.load(Ordering::SeqCst), 0);
    }
}
