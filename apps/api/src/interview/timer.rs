//! Session Timer: wall-clock budget for one interview.
//!
//! `SessionTimer` is a pure state machine (`Running -> Warning -> Expired`)
//! advanced one second per `tick()`. `spawn_countdown` drives any `Countdown`
//! from a periodic Tokio task that is stopped by a single `cancel()` call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::interview::models::DurationInput;

pub const DEFAULT_MINUTES: u32 = 15;
/// Remaining seconds at which the one-time warning fires.
pub const WARNING_AT_SECS: u32 = 60;
pub const TICK: Duration = Duration::from_secs(1);
/// How long the warning advisory stays visible.
pub const ADVISORY_TTL: Duration = Duration::from_secs(5);
/// Pause between the closing message and automatic termination.
pub const TERMINATION_DELAY: Duration = Duration::from_secs(2);

pub const WARNING_MESSAGE: &str = "1 minute left! Wrap up your answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Running,
    Warning,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Remaining time reached `WARNING_AT_SECS`.
    Warning,
    /// Remaining time reached zero.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimer {
    remaining_secs: u32,
    phase: TimerPhase,
    stopped: bool,
}

impl SessionTimer {
    /// Budget from caller input; anything without a positive number of minutes
    /// falls back to `DEFAULT_MINUTES`.
    pub fn from_duration(input: Option<&DurationInput>) -> Self {
        let minutes = input
            .and_then(DurationInput::minutes)
            .unwrap_or(DEFAULT_MINUTES);
        Self::from_secs(minutes.saturating_mul(60))
    }

    pub fn from_secs(secs: u32) -> Self {
        Self {
            remaining_secs: secs,
            phase: TimerPhase::Running,
            stopped: false,
        }
    }

    /// Evaluates the starting budget. A session that starts exactly at the
    /// warning threshold warns immediately.
    pub fn begin(&mut self) -> Option<TimerEvent> {
        if self.stopped {
            return None;
        }
        self.evaluate()
    }

    /// Advances one second. No-op once expired or stopped.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.is_counting() {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.evaluate()
    }

    fn evaluate(&mut self) -> Option<TimerEvent> {
        if self.phase == TimerPhase::Expired {
            return None;
        }
        if self.remaining_secs == 0 {
            self.phase = TimerPhase::Expired;
            return Some(TimerEvent::Expired);
        }
        if self.remaining_secs == WARNING_AT_SECS && self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Warning;
            return Some(TimerEvent::Warning);
        }
        None
    }

    /// Permanently stops the countdown.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_counting(&self) -> bool {
        !self.stopped && self.phase != TimerPhase::Expired
    }

    pub fn is_expired(&self) -> bool {
        self.phase == TimerPhase::Expired
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Periodic driver
// ────────────────────────────────────────────────────────────────────────────

/// Result of one driven second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Counting,
    Event(TimerEvent),
    /// The owner stopped the clock; the driver exits.
    Stopped,
}

/// Something with a clock that the countdown task can advance.
#[async_trait]
pub trait Countdown: Send + Sync + 'static {
    async fn tick(&self) -> Tick;
    async fn on_event(&self, event: TimerEvent);
}

/// Owner's handle on a running countdown. Dropping it cancels the task.
pub struct CountdownHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawns a task that ticks `countdown` once per second until it expires,
/// reports `Tick::Stopped`, or the returned handle is cancelled.
pub fn spawn_countdown<C: Countdown>(countdown: Arc<C>) -> CountdownHandle {
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        loop {
            tokio::select! {
                biased;
                () = cancelled.cancelled() => break,
                _ = ticker.tick() => {
                    match countdown.tick().await {
                        Tick::Counting => {}
                        Tick::Stopped => break,
                        Tick::Event(event) => {
                            countdown.on_event(event).await;
                            if event == TimerEvent::Expired {
                                break;
                            }
                        }
                    }
                }
            }
        }
        debug!("Countdown task finished");
    });

    CountdownHandle { token, task }
}
