//! Time as seen by the simulated peripherals.
//!
//! Only the teletype cares what time it is (it uses the time to pace
//! characters at the configured rate).  The processor itself runs as
//! fast as the host allows.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Clock supplies the current time, measured from some arbitrary
/// starting point.  Successive calls never go backwards.
pub trait Clock: Debug + Send {
    /// Retrieves the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use cpu::{Clock, ManualClock};
    ///
    /// let clk = ManualClock::new();
    /// clk.consume(&Duration::from_millis(100));
    /// assert_eq!(clk.now(), Duration::from_millis(100));
    /// ```
    fn now(&self) -> Duration;
}

/// WallClock follows real elapsed time.
#[derive(Debug)]
pub struct WallClock {
    started: Instant,
}

impl WallClock {
    pub fn new() -> WallClock {
        WallClock {
            started: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Duration {
        self.started.elapsed()
    }
}

/// ManualClock only moves when told to.  Clones share the same
/// time, so a test can keep one copy and give the other to the
/// simulator.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    /// Simulate the passing of `interval`.
    pub fn consume(&self, interval: &Duration) {
        let mut elapsed = self
            .elapsed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *elapsed += *interval;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self
            .elapsed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[test]
fn test_manual_clock_shared_between_clones() {
    let a = ManualClock::new();
    let b = a.clone();
    a.consume(&Duration::from_micros(12));
    b.consume(&Duration::from_micros(30));
    assert_eq!(a.now(), Duration::from_micros(42));
    assert_eq!(b.now(), Duration::from_micros(42));
}

#[test]
fn test_wall_clock_is_monotonic() {
    let clk = WallClock::new();
    let t1 = clk.now();
    let t2 = clk.now();
    assert!(t2 >= t1);
}
