use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::error::GameError;

pub const MIN_TIME_LIMIT_SECS: u64 = 10;

/// Source of the current time
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock for tests and headless drivers. Clones share the
/// same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    Continue,
    Expired,
}

/// Countdown for a timed session
#[derive(Debug, Clone)]
pub struct TimerController<C: Clock = SystemClock> {
    clock: C,
    limit_secs: u64,
    deadline: Instant,
    running: bool,
}

impl<C: Clock> TimerController<C> {
    pub fn start(clock: C, limit_secs: u64) -> Result<Self, GameError> {
        if limit_secs < MIN_TIME_LIMIT_SECS {
            return Err(GameError::InvalidTimeLimit(limit_secs));
        }
        let deadline = clock
            .now()
            .checked_add(Duration::from_secs(limit_secs))
            .ok_or(GameError::InvalidTimeLimit(limit_secs))?;
        info!(limit_secs, "countdown started");

        Ok(Self {
            clock,
            limit_secs,
            deadline,
            running: true,
        })
    }

    pub fn limit_secs(&self) -> u64 {
        self.limit_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.deadline
            .saturating_duration_since(self.clock.now())
            .as_secs()
    }

    /// Fires [`TimerEvent::Expired`] once, on the first tick where no whole
    /// second remains. A stopped timer only ever reports `Continue`.
    pub fn tick(&mut self) -> TimerEvent {
        if !self.running || self.remaining_secs() > 0 {
            return TimerEvent::Continue;
        }
        self.running = false;
        info!(limit_secs = self.limit_secs, "countdown expired");
        TimerEvent::Expired
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}
