// Use rppal in production
#[cfg(not(test))]
use rppal::gpio::{Gpio, OutputPin};

#[cfg(test)]
use crate::mocks::mock_gpio::{Gpio, OutputPin};

use crate::error::{Error, Result};

/// LED lit when the logger has stopped on a fatal error. There is no
/// operator console on the robot, so this is the only way to notice.
pub struct StatusLed {
    pin: OutputPin,
}

impl StatusLed {
    pub fn new(pin: u8) -> Result<Self> {
        let gpio = Gpio::new()?;
        let pin = gpio.get(pin)?.into_output_low();
        Ok(Self { pin })
    }

    /// Open the configured LED. A missing LED is not worth stopping for.
    pub fn from_pin(pin: Option<u8>) -> Option<Self> {
        let pin = pin?;
        match Self::new(pin) {
            Ok(led) => Some(led),
            Err(e) => {
                log::warn!("Status LED on GPIO {} unavailable: {}", pin, e);
                None
            }
        }
    }

    pub fn set_fault(&mut self) {
        self.pin.set_high();
    }
}

/// Log the error and light the LED.
pub fn report_fault(error: &Error, led: Option<&mut StatusLed>) {
    log::error!("Fatal: {}", error);
    match led {
        Some(led) => led.set_fault(),
        None => log::error!("No status LED configured, fault only visible in the log"),
    }
}

/// Stop here for good. Nothing is retried; the LED stays lit until power-off.
pub fn halt(error: &Error, mut led: Option<StatusLed>) -> ! {
    report_fault(error, led.as_mut());
    log::error!("Halted. Power cycle to restart.");
    loop {
        std::thread::park();
    }
}
