// Test doubles for the loop's capabilities. Only compiled during tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::magnetometer::{MagneticField, Magnetometer};
use crate::motor::{MotorDrive, Side};

/// Manual clock. `sleep` advances time instantly.
pub struct FakeClock {
    now: Cell<u32>,
    sleeps: Cell<u32>,
}

impl FakeClock {
    pub fn new(now: u32) -> Self {
        Self {
            now: Cell::new(now),
            sleeps: Cell::new(0),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration.as_millis() as u32);
    }
}

/// Returns queued readings in order, then fails.
pub struct ScriptedMagnetometer {
    readings: VecDeque<MagneticField>,
    reads: Rc<Cell<usize>>,
}

impl ScriptedMagnetometer {
    pub fn new(readings: Vec<MagneticField>) -> Self {
        Self {
            readings: readings.into(),
            reads: Rc::new(Cell::new(0)),
        }
    }

    pub fn read_count(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.reads)
    }
}

impl Magnetometer for ScriptedMagnetometer {
    fn read(&mut self) -> Result<MagneticField> {
        self.reads.set(self.reads.get() + 1);
        self.readings
            .pop_front()
            .ok_or_else(|| Error::Sensor("scripted readings exhausted".into()))
    }
}

/// Records every duty written.
#[derive(Default)]
pub struct RecordingMotors {
    log: Rc<RefCell<Vec<(Side, u8)>>>,
}

impl RecordingMotors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<Vec<(Side, u8)>>> {
        Rc::clone(&self.log)
    }
}

impl MotorDrive for RecordingMotors {
    fn set_duty_cycle(&mut self, side: Side, value: u8) -> Result<()> {
        self.log.borrow_mut().push((side, value));
        Ok(())
    }
}
