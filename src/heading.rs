//! Compass heading from averaged magnetometer samples.

use std::f64::consts::{PI, TAU};
use std::time::Duration;

use crate::clock::Clock;
use crate::config::SamplingConfig;
use crate::error::Result;
use crate::magnetometer::{MagneticField, Magnetometer};

/// Heading in radians, in (-π, π], plus the vertical field of the middle
/// sample (a jump in Z means the robot was picked up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingReading {
    pub angle: f64,
    pub z: i32,
}

pub struct HeadingEstimator<M> {
    magnetometer: M,
    samples: usize,
    spacing: Duration,
}

impl<M: Magnetometer> HeadingEstimator<M> {
    pub fn new(magnetometer: M, samples: usize, spacing: Duration) -> Self {
        Self {
            magnetometer,
            samples: samples.max(1),
            spacing,
        }
    }

    pub fn from_config(magnetometer: M, config: &SamplingConfig) -> Self {
        Self::new(
            magnetometer,
            config.heading_samples,
            Duration::from_millis(config.sample_spacing_ms),
        )
    }

    /// Take `samples` readings `spacing` apart and average them into one heading.
    ///
    /// The spacing must exceed the sensor's refresh period so that each
    /// reading carries independent noise.
    pub fn current_heading<C: Clock>(&mut self, clock: &C) -> Result<HeadingReading> {
        let mut readings = Vec::with_capacity(self.samples);
        for i in 0..self.samples {
            if i > 0 {
                clock.sleep(self.spacing);
            }
            readings.push(self.magnetometer.read()?);
        }

        Ok(HeadingReading {
            angle: mean_heading(&readings),
            z: readings[readings.len() / 2].z,
        })
    }
}

/// `atan2` of the mean Y over the mean X.
pub fn mean_heading(readings: &[MagneticField]) -> f64 {
    let n = readings.len().max(1) as f64;
    let (sum_x, sum_y) = readings
        .iter()
        .fold((0.0, 0.0), |(sx, sy), r| (sx + r.x as f64, sy + r.y as f64));
    (sum_y / n).atan2(sum_x / n)
}

/// Signed rotation from `previous` to `current`, in (-π, π].
///
/// Takes the shorter way round the circle, which is only correct while the
/// robot turns less than half a revolution between two readings. Faster
/// turns alias to the wrong direction and are not detected.
pub fn heading_delta(previous: f64, current: f64) -> f64 {
    let delta = current - previous;
    if delta > PI {
        delta - TAU
    } else if delta <= -PI {
        delta + TAU
    } else {
        delta
    }
}
