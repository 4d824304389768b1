use std::sync::Arc;

// Use rppal in production
#[cfg(not(test))]
use rppal::gpio::{Gpio, InputPin, Trigger};

#[cfg(test)]
// This is only used in testing, not compiled in release.
use crate::mocks::mock_gpio::{Gpio, InputPin, Trigger};

use crate::config::PinConfig;
use crate::encoder::EncoderTracker;
use crate::error::Result;

/// Rising-edge interrupts on both encoders' phase A lines.
///
/// Each handler reads its wheel's phase B line and steps the shared
/// tracker, nothing else. Dropping this stops the interrupts.
pub struct EncoderInputs {
    _left_a: InputPin,
    _right_a: InputPin,
}

impl EncoderInputs {
    pub fn attach(tracker: Arc<EncoderTracker>, pins: &PinConfig) -> Result<Self> {
        let gpio = Gpio::new()?;

        let mut left_a = gpio.get(pins.enc_left_a)?.into_input();
        let left_b = gpio.get(pins.enc_left_b)?.into_input();
        let mut right_a = gpio.get(pins.enc_right_a)?.into_input();
        let right_b = gpio.get(pins.enc_right_b)?.into_input();

        let left_tracker = Arc::clone(&tracker);
        left_a.set_async_interrupt(Trigger::RisingEdge, None, move |_event| {
            left_tracker.on_edge_left(left_b.read());
        })?;

        let right_tracker = tracker;
        right_a.set_async_interrupt(Trigger::RisingEdge, None, move |_event| {
            right_tracker.on_edge_right(right_b.read());
        })?;

        log::info!(
            "Encoder interrupts attached: left A/B = GPIO {}/{}, right A/B = GPIO {}/{}",
            pins.enc_left_a,
            pins.enc_left_b,
            pins.enc_right_a,
            pins.enc_right_b
        );

        Ok(Self {
            _left_a: left_a,
            _right_a: right_a,
        })
    }
}
