//! Fixed-cadence sampling loop.
//!
//! Each tick: snapshot the encoders, read the heading, append one telemetry
//! record, then drive the motors for the next stretch of the drive plan.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::encoder::{EncoderState, EncoderTracker};
use crate::error::Result;
use crate::heading::{HeadingEstimator, heading_delta};
use crate::magnetometer::Magnetometer;
use crate::motion::MotionProfileGenerator;
use crate::motor::MotorDrive;
use crate::telemetry::{LogSink, Sample, TelemetryRecorder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    WaitingForTick,
    Executing,
}

/// Opens once per period. Late ticks are not made up: the next period is
/// measured from when the late tick actually started.
pub struct TickGate {
    period_ms: u32,
    last_tick: u32,
}

impl TickGate {
    pub fn new(period_ms: u32, start: u32) -> Self {
        Self {
            period_ms,
            last_tick: start,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Block until one period has passed since the last tick and return the
    /// time of the new tick.
    pub fn wait<C: Clock>(&mut self, clock: &C) -> u32 {
        loop {
            let now = clock.now_ms();
            let elapsed = now.wrapping_sub(self.last_tick);
            if elapsed >= self.period_ms {
                let late = elapsed - self.period_ms;
                if late > 0 {
                    log::debug!("Tick at {}ms started {}ms late", now, late);
                }
                self.last_tick = now;
                return now;
            }
            clock.sleep(Duration::from_millis((self.period_ms - elapsed) as u64));
        }
    }
}

pub struct SamplingLoop<C, M, D, W>
where
    C: Clock,
    M: Magnetometer,
    D: MotorDrive,
    W: LogSink,
{
    clock: C,
    gate: TickGate,
    state: LoopState,
    encoders: Arc<EncoderTracker>,
    heading: HeadingEstimator<M>,
    motion: MotionProfileGenerator,
    recorder: TelemetryRecorder<W>,
    motors: D,
    previous_position: EncoderState,
    previous_heading: Option<f64>,
    ticks: u64,
}

impl<C, M, D, W> SamplingLoop<C, M, D, W>
where
    C: Clock,
    M: Magnetometer,
    D: MotorDrive,
    W: LogSink,
{
    /// The first tick fires one period after construction.
    pub fn new(
        clock: C,
        period_ms: u32,
        encoders: Arc<EncoderTracker>,
        heading: HeadingEstimator<M>,
        motion: MotionProfileGenerator,
        recorder: TelemetryRecorder<W>,
        motors: D,
    ) -> Self {
        let gate = TickGate::new(period_ms, clock.now_ms());
        let previous_position = encoders.snapshot();
        Self {
            clock,
            gate,
            state: LoopState::WaitingForTick,
            encoders,
            heading,
            motion,
            recorder,
            motors,
            previous_position,
            previous_heading: None,
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn recorder(&self) -> &TelemetryRecorder<W> {
        &self.recorder
    }

    /// Wait for the next tick boundary and run one full cycle.
    pub fn run_once(&mut self) -> Result<Sample> {
        self.state = LoopState::WaitingForTick;
        let now = self.gate.wait(&self.clock);

        self.state = LoopState::Executing;
        let result = self.execute(now);
        self.state = LoopState::WaitingForTick;
        result
    }

    /// Run until a component fails. Only ever returns an error.
    pub fn run(&mut self) -> Result<Infallible> {
        log::info!(
            "Sampling loop started: {}ms period, {:?} records",
            self.gate.period_ms(),
            self.recorder.format()
        );
        loop {
            self.run_once()?;
        }
    }

    fn execute(&mut self, now: u32) -> Result<Sample> {
        let position = self.encoders.snapshot();
        let (left_step_delta, right_step_delta) = position.delta_since(&self.previous_position);

        let reading = self.heading.current_heading(&self.clock)?;
        // Nothing to compare against on the first tick
        let heading_change = self
            .previous_heading
            .map_or(0.0, |previous| heading_delta(previous, reading.angle));

        let sample = Sample {
            timestamp_ms: now,
            heading: reading.angle,
            heading_delta: heading_change,
            position,
            left_step_delta,
            right_step_delta,
            z: reading.z,
        };
        self.recorder.append(&sample)?;

        let duty = self.motion.tick(now);
        self.motors.apply(duty)?;

        self.previous_position = position;
        self.previous_heading = Some(reading.angle);
        self.ticks += 1;

        Ok(sample)
    }
}
