//! Wall-clock sources
//!
//! Version ids, ledger entries and retention all derive from "now". Managers
//! take a [`SharedClock`] so tests can step time explicitly instead of
//! sleeping between snapshots.

use chrono::{Duration, Local, NaiveDateTime};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Source of local wall-clock time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current local time without offset (matches the on-disk format)
    fn now(&self) -> NaiveDateTime;
}

/// Clock handle shared between managers
pub type SharedClock = Arc<dyn Clock>;

/// Production clock reading the system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Shared handle to the system clock
    #[inline]
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock
///
/// Time only moves when [`ManualClock::advance`] or [`ManualClock::set`]
/// is called.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Create clock frozen at `start`
    #[inline]
    #[must_use]
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a shared clock frozen at `start`
    #[inline]
    #[must_use]
    pub fn shared(start: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self::new(start))
    }

    /// Move time forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Jump to an absolute time
    pub fn set(&self, at: NaiveDateTime) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}
