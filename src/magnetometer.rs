use crate::config::CompassConfig;
use crate::error::Result;

/// One calibrated reading of the magnetic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MagneticField {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// A 3-axis magnetometer. Each call triggers a fresh read of the sensor.
pub trait Magnetometer {
    fn read(&mut self) -> Result<MagneticField>;
}

/// Hard and soft iron correction, supplied from an offline calibration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub offsets: [f64; 3],
    pub scales: [f64; 3],
}

impl Calibration {
    /// No correction at all.
    #[cfg(test)]
    pub fn identity() -> Self {
        Self {
            offsets: [0.0; 3],
            scales: [1.0; 3],
        }
    }

    /// `(raw - offset) * scale` per axis, truncated toward zero.
    pub fn apply(&self, raw: [i16; 3]) -> MagneticField {
        let axis = |i: usize| ((raw[i] as f64 - self.offsets[i]) * self.scales[i]) as i32;
        MagneticField {
            x: axis(0),
            y: axis(1),
            z: axis(2),
        }
    }
}

impl From<&CompassConfig> for Calibration {
    fn from(config: &CompassConfig) -> Self {
        Self {
            offsets: config.offsets,
            scales: config.scales,
        }
    }
}
