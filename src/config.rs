use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::telemetry::RecordFormat;

// ** SAMPLING CONFIGURATION ** //

/// One telemetry record is produced per tick.
pub const TICK_PERIOD_MS: u32 = 50;
/// Compass readings averaged into one heading.
pub const HEADING_SAMPLES: usize = 5;
/// The compass refreshes at 200Hz (every 5ms). Readings 6ms apart are independent.
pub const HEADING_SAMPLE_SPACING_MS: u64 = 6;

// ** COMPASS CONFIGURATION ** //

/// QMC5883L I2C address
pub const COMPASS_I2C_ADDR: u16 = 0x0D;
// Hard iron correction (X, Y, Z), subtracted from the raw reading
pub const COMPASS_OFFSETS: [f64; 3] = [-125.0, -223.0, -661.0];
// Soft iron correction (X, Y, Z), applied after the offset
pub const COMPASS_SCALES: [f64; 3] = [1.01, 0.93, 1.06];

// ** MOTION CONFIGURATION ** //

/// Slowest forward duty. Below this the motors stall.
pub const MIN_DUTY: u8 = 128;
pub const MAX_DUTY: u8 = 255;
/// Both wheels start the first stage from this duty.
pub const INITIAL_DUTY: u8 = 128;
/// Each stage of the drive plan lasts [MIN_STAGE_MS, MAX_STAGE_MS).
pub const MIN_STAGE_MS: u32 = 500;
pub const MAX_STAGE_MS: u32 = 3000;

// ** MOTOR CONFIGURATION ** //

/// Matches the default analogWrite() frequency of the motor driver board.
pub const MOTOR_PWM_FREQUENCY_HZ: f64 = 490.0;

// ** GPIO CONFIGURATION (BCM numbering) ** //

/// Hardware PWM is only available on 12/18 (PWM0) and 13/19 (PWM1).
pub const LEFT_FORWARD_PIN: u8 = 18;
pub const RIGHT_FORWARD_PIN: u8 = 13;
pub const LEFT_BACKWARD_PIN: u8 = 23;
pub const RIGHT_BACKWARD_PIN: u8 = 24;
/// Phase A pins raise the interrupts, phase B pins give the direction.
pub const ENC_LEFT_A_PIN: u8 = 17;
pub const ENC_LEFT_B_PIN: u8 = 27;
pub const ENC_RIGHT_A_PIN: u8 = 22;
pub const ENC_RIGHT_B_PIN: u8 = 5;
pub const STATUS_LED_PIN: u8 = 25;

// ** TELEMETRY CONFIGURATION ** //

pub const TELEMETRY_FILE: &str = "tele.bin";

/// Environment variable naming a TOML file that overrides the defaults above.
pub const CONFIG_ENV_VAR: &str = "ROAM_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub compass: CompassConfig,
    pub motion: MotionConfig,
    pub motor: MotorConfig,
    pub pins: PinConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub tick_period_ms: u32,
    pub heading_samples: usize,
    pub sample_spacing_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: TICK_PERIOD_MS,
            heading_samples: HEADING_SAMPLES,
            sample_spacing_ms: HEADING_SAMPLE_SPACING_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompassConfig {
    pub i2c_address: u16,
    pub offsets: [f64; 3],
    pub scales: [f64; 3],
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            i2c_address: COMPASS_I2C_ADDR,
            offsets: COMPASS_OFFSETS,
            scales: COMPASS_SCALES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub min_duty: u8,
    pub max_duty: u8,
    pub initial_duty: u8,
    pub min_stage_ms: u32,
    pub max_stage_ms: u32,
    /// Fixed seed for a reproducible drive plan. None = OS entropy.
    pub seed: Option<u64>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            min_duty: MIN_DUTY,
            max_duty: MAX_DUTY,
            initial_duty: INITIAL_DUTY,
            min_stage_ms: MIN_STAGE_MS,
            max_stage_ms: MAX_STAGE_MS,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub pwm_frequency_hz: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: MOTOR_PWM_FREQUENCY_HZ,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub left_forward: u8,
    pub right_forward: u8,
    pub left_backward: u8,
    pub right_backward: u8,
    pub enc_left_a: u8,
    pub enc_left_b: u8,
    pub enc_right_a: u8,
    pub enc_right_b: u8,
    pub status_led: Option<u8>,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            left_forward: LEFT_FORWARD_PIN,
            right_forward: RIGHT_FORWARD_PIN,
            left_backward: LEFT_BACKWARD_PIN,
            right_backward: RIGHT_BACKWARD_PIN,
            enc_left_a: ENC_LEFT_A_PIN,
            enc_left_b: ENC_LEFT_B_PIN,
            enc_right_a: ENC_RIGHT_A_PIN,
            enc_right_b: ENC_RIGHT_B_PIN,
            status_led: Some(STATUS_LED_PIN),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub path: PathBuf,
    pub format: RecordFormat,
    /// Remove the previous log on startup instead of appending to it.
    pub truncate: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(TELEMETRY_FILE),
            format: RecordFormat::Binary,
            truncate: true,
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from `ROAM_CONFIG` when set, otherwise use the built-in defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.to_string_lossy());
                Self::load(path)
            }
            None => {
                log::info!("{} not set, using built-in configuration", CONFIG_ENV_VAR);
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling.tick_period_ms == 0 {
            return Err(Error::Config("tick_period_ms must be positive".into()));
        }
        if self.sampling.heading_samples == 0 {
            return Err(Error::Config("heading_samples must be at least 1".into()));
        }

        let motion = &self.motion;
        if motion.min_duty > motion.max_duty {
            return Err(Error::Config(format!(
                "min_duty ({}) exceeds max_duty ({})",
                motion.min_duty, motion.max_duty
            )));
        }
        if !(motion.min_duty..=motion.max_duty).contains(&motion.initial_duty) {
            return Err(Error::Config(format!(
                "initial_duty ({}) outside [{}, {}]",
                motion.initial_duty, motion.min_duty, motion.max_duty
            )));
        }
        if motion.min_stage_ms == 0 {
            return Err(Error::Config("min_stage_ms must be positive".into()));
        }
        if motion.min_stage_ms >= motion.max_stage_ms {
            return Err(Error::Config(format!(
                "min_stage_ms ({}) must be below max_stage_ms ({})",
                motion.min_stage_ms, motion.max_stage_ms
            )));
        }

        if self.motor.pwm_frequency_hz.is_nan() || self.motor.pwm_frequency_hz <= 0.0 {
            return Err(Error::Config("pwm_frequency_hz must be positive".into()));
        }
        let left = crate::motor::pwm_channel(self.pins.left_forward)?;
        let right = crate::motor::pwm_channel(self.pins.right_forward)?;
        if left == right {
            return Err(Error::Config(
                "left and right forward pins share a PWM channel".into(),
            ));
        }

        Ok(())
    }
}
