use std::time::{Duration, Instant};

/// Monotonic millisecond time source for the sampling loop.
///
/// The counter is 32 bits wide to match the timestamp field of the binary
/// telemetry record; it wraps after ~49 days of uptime.
pub trait Clock {
    /// Milliseconds since the clock was created.
    fn now_ms(&self) -> u32;

    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
