use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use sunwise_core::{AdviceProvider, ExposureProfile, SessionRecorder, SunAdvice, SunSession};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::state::{TickOutcome, TimerPhase, TimerState};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
const EVENT_CAPACITY: usize = 64;

/// Notifications for whatever renders the timer.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    AdviceUpdated(SunAdvice),
    PhaseChanged(TimerPhase),
    Tick { remaining_seconds: u32 },
    /// The countdown hit zero. This is the alert: sound, vibrate, notify.
    Finished(SunSession),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub advice: Option<SunAdvice>,
    pub loading_advice: bool,
    pub progress_percent: f64,
}

struct TimerInner {
    timer: TimerState,
    advice: Option<SunAdvice>,
    profile: Option<ExposureProfile>,
    /// Advice requests not yet resolved, abandoned or cancelled.
    in_flight: usize,
    /// Bumped by every advice request.
    issued: u64,
    /// Generation of the last response applied. Older responses are stale.
    applied: u64,
}

/// Counts one pending advice request; released however the request ends.
struct InFlight<'a>(&'a Mutex<TimerInner>);

impl<'a> InFlight<'a> {
    fn begin(inner: &'a Mutex<TimerInner>) -> Self {
        inner.lock().in_flight += 1;
        Self(inner)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut inner = self.0.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }
}

struct Shared {
    inner: Mutex<TimerInner>,
    provider: Arc<dyn AdviceProvider>,
    recorder: Arc<dyn SessionRecorder>,
    events: broadcast::Sender<TimerEvent>,
}

impl Shared {
    fn emit(&self, event: TimerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn tick(&self) -> TickOutcome {
        let (outcome, session) = {
            let mut inner = self.inner.lock();
            let outcome = inner.timer.tick();
            let session = (outcome == TickOutcome::Finished).then(|| {
                let uv_index = inner.profile.map(|p| p.uv_index).unwrap_or(0.0);
                SunSession::new(Utc::now(), inner.timer.total_seconds() / 60, uv_index)
            });
            (outcome, session)
        };

        match outcome {
            TickOutcome::Ignored => {}
            TickOutcome::Counting { remaining_seconds } => {
                self.emit(TimerEvent::Tick { remaining_seconds });
            }
            TickOutcome::Finished => {
                if let Some(session) = session {
                    tracing::info!(
                        "Sun session finished: {} min at UV {}",
                        session.duration_minutes,
                        session.uv_index
                    );
                    self.recorder.record(session.clone());
                    self.emit(TimerEvent::Tick {
                        remaining_seconds: 0,
                    });
                    self.emit(TimerEvent::PhaseChanged(TimerPhase::Finished));
                    self.emit(TimerEvent::Finished(session));
                }
            }
        }
        outcome
    }
}

/// Countdown sized from exposure advice.
///
/// Clones share the same timer. At most one ticker task exists at a time; it
/// runs only while the phase is `Running`. Methods that spawn the ticker must
/// be called from within a Tokio runtime.
#[derive(Clone)]
pub struct SunTimer {
    shared: Arc<Shared>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    cancel: CancellationToken,
}

impl SunTimer {
    pub fn new(provider: Arc<dyn AdviceProvider>, recorder: Arc<dyn SessionRecorder>) -> Self {
        Self::with_tick_interval(provider, recorder, DEFAULT_TICK_INTERVAL)
    }

    pub fn with_tick_interval(
        provider: Arc<dyn AdviceProvider>,
        recorder: Arc<dyn SessionRecorder>,
        tick_interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(TimerInner {
                    timer: TimerState::new(),
                    advice: None,
                    profile: None,
                    in_flight: 0,
                    issued: 0,
                    applied: 0,
                }),
                provider,
                recorder,
                events,
            }),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
            cancel: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> TimerState {
        self.shared.inner.lock().timer
    }

    pub fn advice(&self) -> Option<SunAdvice> {
        self.shared.inner.lock().advice.clone()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let inner = self.shared.inner.lock();
        TimerSnapshot {
            state: inner.timer,
            advice: inner.advice.clone(),
            loading_advice: inner.in_flight > 0,
            progress_percent: inner.timer.progress_percent(),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fetch advice for `profile` and apply it.
    ///
    /// Provider failures are replaced by [`SunAdvice::fallback`]. The
    /// countdown is only resized while Idle or Ready. Returns the applied
    /// advice, or `None` when the result was dropped because the timer was
    /// disposed or a response to a newer request was already applied.
    /// Dropping this future abandons the request without blocking others.
    #[instrument(skip(self), level = "info")]
    pub async fn request_advice(&self, profile: ExposureProfile) -> Option<SunAdvice> {
        if self.is_disposed() {
            return None;
        }

        let _pending = InFlight::begin(&self.shared.inner);
        let generation = {
            let mut inner = self.shared.inner.lock();
            inner.issued += 1;
            inner.issued
        };

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("Timer disposed during advice request");
                return None;
            }
            result = self.shared.provider.advice(&profile) => result,
        };

        let advice = match result.and_then(SunAdvice::validate) {
            Ok(advice) => advice,
            Err(e) => {
                tracing::warn!("Advice unavailable, using fallback: {}", e);
                SunAdvice::fallback()
            }
        };

        let seeded = {
            let mut inner = self.shared.inner.lock();
            if self.cancel.is_cancelled() {
                return None;
            }
            if generation < inner.applied {
                tracing::debug!(
                    "Dropping advice from request {}, request {} already applied",
                    generation,
                    inner.applied
                );
                return None;
            }
            inner.applied = generation;
            inner.profile = Some(profile);
            inner.advice = Some(advice.clone());
            inner.timer.seed(advice.safe_seconds())
        };

        self.shared.emit(TimerEvent::AdviceUpdated(advice.clone()));
        if seeded {
            self.shared.emit(TimerEvent::PhaseChanged(TimerPhase::Ready));
        }
        Some(advice)
    }

    /// Ready or Paused to Running. Returns false (and spawns nothing) from
    /// any other phase.
    pub fn start(&self) -> bool {
        if self.is_disposed() {
            return false;
        }

        let mut ticker = self.ticker.lock();
        if !self.shared.inner.lock().timer.start() {
            return false;
        }

        // A ticker left from an earlier run may still be between ticks.
        if let Some(previous) = ticker.take() {
            previous.abort();
        }
        *ticker = Some(self.spawn_ticker());
        drop(ticker);

        tracing::info!("Sun timer started");
        self.shared.emit(TimerEvent::PhaseChanged(TimerPhase::Running));
        true
    }

    pub fn pause(&self) -> bool {
        // Same lock order as `start`: ticker, then state.
        let mut ticker = self.ticker.lock();
        let paused = self.shared.inner.lock().timer.pause();
        if paused {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
        drop(ticker);

        if paused {
            self.shared.emit(TimerEvent::PhaseChanged(TimerPhase::Paused));
        }
        paused
    }

    /// Advance one second. The ticker calls this; it is public so the
    /// countdown can be driven directly.
    pub fn tick(&self) -> TickOutcome {
        let outcome = self.shared.tick();
        if outcome == TickOutcome::Finished {
            self.cancel_ticker();
        }
        outcome
    }

    pub fn reset(&self) {
        let mut ticker = self.ticker.lock();
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
        let phase = {
            let mut inner = self.shared.inner.lock();
            inner.timer.reset();
            inner.timer.phase()
        };
        drop(ticker);
        self.shared.emit(TimerEvent::PhaseChanged(phase));
    }

    /// Play/pause toggle: pause while running, otherwise start.
    pub fn toggle(&self) -> bool {
        if self.state().is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Stop ticking and ignore any advice still in flight. Idempotent.
    pub fn dispose(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("Disposing sun timer");
        }
        self.cancel.cancel();
        self.cancel_ticker();
    }

    pub fn has_ticker(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        let period = self.tick_interval;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                match shared.tick() {
                    TickOutcome::Counting { .. } => {}
                    TickOutcome::Ignored | TickOutcome::Finished => break,
                }
            }
        })
    }
}
