//! Clock and sleep seams.
//!
//! All wall-clock reads and deliberate waits (settle delay, retry backoff,
//! chunk backoff) go through these traits so tests can drive the full
//! retry/backoff matrix without real sleeps.

use chrono::NaiveDateTime;
use std::cell::RefCell;
use std::time::Duration;

/// Source of local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Real clock: local wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Blocking wait between retries and queue items.
pub trait Sleeper {
    fn sleep(&self, d: Duration);
}

/// Real sleeper: blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Test clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: RefCell<NaiveDateTime>,
}

impl FixedClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: RefCell::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.borrow_mut() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.borrow()
    }
}

/// Test sleeper that records requested durations instead of blocking.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, d: Duration) {
        self.slept.borrow_mut().push(d);
    }
}
