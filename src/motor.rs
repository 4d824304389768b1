// Use rppal in production
#[cfg(not(test))]
use rppal::gpio::{Gpio, OutputPin};
#[cfg(not(test))]
use rppal::pwm::{Channel, Polarity, Pwm};

// Mock GPIO and PWM for testing
#[cfg(test)]
use crate::mocks::mock_gpio::{Gpio, OutputPin};
#[cfg(test)]
use crate::mocks::mock_pwm::{Channel, Polarity, Pwm};

use crate::config::{MotorConfig, PinConfig};
use crate::error::{Error, Result};
use crate::motion::DutyCycles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Forward drive for the two wheel motors. Duty 0 is stopped, 255 is full power.
pub trait MotorDrive {
    fn set_duty_cycle(&mut self, side: Side, value: u8) -> Result<()>;

    fn apply(&mut self, duty: DutyCycles) -> Result<()> {
        self.set_duty_cycle(Side::Left, duty.left)?;
        self.set_duty_cycle(Side::Right, duty.right)
    }
}

/// Hardware PWM channel behind a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmChannel {
    Pwm0,
    Pwm1,
}

impl From<PwmChannel> for Channel {
    fn from(channel: PwmChannel) -> Self {
        match channel {
            PwmChannel::Pwm0 => Channel::Pwm0,
            PwmChannel::Pwm1 => Channel::Pwm1,
        }
    }
}

/// Hardware PWM is available on:
/// - GPIO 12, 18 (PWM0)
/// - GPIO 13, 19 (PWM1)
///
/// The pin still has to be routed to its PWM function in /boot/config.txt
/// (`dtoverlay=pwm-2chan`).
pub fn pwm_channel(pin: u8) -> Result<PwmChannel> {
    match pin {
        12 | 18 => Ok(PwmChannel::Pwm0),
        13 | 19 => Ok(PwmChannel::Pwm1),
        _ => Err(Error::Config(format!(
            "GPIO {} has no hardware PWM. Use 12, 13, 18, or 19",
            pin
        ))),
    }
}

/// Map a 0-255 duty to the 0.0-1.0 fraction the PWM peripheral expects.
pub fn duty_fraction(value: u8) -> f64 {
    value as f64 / u8::MAX as f64
}

pub struct PwmMotors {
    left: Pwm,
    right: Pwm,
    // Held low for as long as the motors run: the robot only drives forward.
    _left_backward: OutputPin,
    _right_backward: OutputPin,
}

impl PwmMotors {
    pub fn new(pins: &PinConfig, config: &MotorConfig) -> Result<Self> {
        let gpio = Gpio::new()?;
        let left_backward = gpio.get(pins.left_backward)?.into_output_low();
        let right_backward = gpio.get(pins.right_backward)?.into_output_low();

        let open = |pin: u8| -> Result<Pwm> {
            let channel = pwm_channel(pin)?;
            Ok(Pwm::with_frequency(
                channel.into(),
                config.pwm_frequency_hz,
                0.0, // stopped
                Polarity::Normal,
                true, // enabled
            )?)
        };
        let left = open(pins.left_forward)?;
        let right = open(pins.right_forward)?;

        log::info!(
            "Motors on GPIO {} (left) and {} (right) at {:.0}Hz",
            pins.left_forward,
            pins.right_forward,
            config.pwm_frequency_hz
        );

        Ok(Self {
            left,
            right,
            _left_backward: left_backward,
            _right_backward: right_backward,
        })
    }

    /// Stop both motors and disable PWM output
    pub fn disable(&mut self) -> Result<()> {
        self.left.set_duty_cycle(0.0)?;
        self.right.set_duty_cycle(0.0)?;
        self.left.disable()?;
        self.right.disable()?;
        Ok(())
    }
}

impl MotorDrive for PwmMotors {
    fn set_duty_cycle(&mut self, side: Side, value: u8) -> Result<()> {
        let pwm = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        pwm.set_duty_cycle(duty_fraction(value))?;
        Ok(())
    }
}

impl Drop for PwmMotors {
    fn drop(&mut self) {
        // Ensure the robot stops when the driver goes away
        let _ = self.disable();
    }
}
