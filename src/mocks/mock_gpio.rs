// This file is only compiled during tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

pub use rppal::gpio::{Level, Trigger};

type Callback = Box<dyn FnMut(Event) + Send>;

thread_local! {
    static MOCK_PINS: RefCell<HashMap<u8, Level>> = RefCell::new(HashMap::new());
    static MOCK_INTERRUPTS: RefCell<HashMap<u8, (Trigger, Callback)>> = RefCell::new(HashMap::new());
}

#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub trigger: Trigger,
}

pub struct Gpio;

impl Gpio {
    pub fn new() -> Result<Self, rppal::gpio::Error> {
        Ok(Gpio)
    }

    pub fn get(&self, pin: u8) -> Result<Pin, rppal::gpio::Error> {
        Ok(Pin { pin })
    }
}

pub struct Pin {
    pin: u8,
}

impl Pin {
    pub fn into_input(self) -> InputPin {
        MOCK_PINS.with(|pins| {
            pins.borrow_mut().entry(self.pin).or_insert(Level::Low);
        });
        InputPin { pin: self.pin }
    }

    pub fn into_output_low(self) -> OutputPin {
        set_mock_pin_level(self.pin, Level::Low);
        OutputPin { pin: self.pin }
    }
}

pub struct InputPin {
    pin: u8,
}

impl InputPin {
    pub fn read(&self) -> Level {
        get_mock_pin_level(self.pin)
    }

    pub fn set_async_interrupt<C>(
        &mut self,
        trigger: Trigger,
        _debounce: Option<Duration>,
        callback: C,
    ) -> Result<(), rppal::gpio::Error>
    where
        C: FnMut(Event) + Send + 'static,
    {
        MOCK_INTERRUPTS.with(|interrupts| {
            interrupts
                .borrow_mut()
                .insert(self.pin, (trigger, Box::new(callback)));
        });
        Ok(())
    }
}

impl Drop for InputPin {
    fn drop(&mut self) {
        // The handler owns other pins, so drop it after the map is released.
        let handler = MOCK_INTERRUPTS
            .try_with(|interrupts| {
                interrupts
                    .try_borrow_mut()
                    .ok()
                    .and_then(|mut map| map.remove(&self.pin))
            })
            .ok()
            .flatten();
        drop(handler);
    }
}

pub struct OutputPin {
    pin: u8,
}

impl OutputPin {
    pub fn set_high(&mut self) {
        set_mock_pin_level(self.pin, Level::High);
    }
}

// test helper function to set pin levels
pub fn set_mock_pin_level(pin: u8, level: Level) {
    MOCK_PINS.with(|pins| {
        pins.borrow_mut().insert(pin, level);
    });
}

pub fn get_mock_pin_level(pin: u8) -> Level {
    MOCK_PINS.with(|pins| *pins.borrow().get(&pin).unwrap_or(&Level::Low))
}

/// Run the interrupt handler registered on `pin`, as a rising edge would.
/// Returns false when no rising-edge handler is attached.
pub fn fire_rising_edge(pin: u8) -> bool {
    let handler = MOCK_INTERRUPTS.with(|interrupts| interrupts.borrow_mut().remove(&pin));
    match handler {
        Some((trigger, mut callback)) => {
            let fires = matches!(trigger, Trigger::RisingEdge | Trigger::Both);
            if fires {
                callback(Event { trigger });
            }
            MOCK_INTERRUPTS.with(|interrupts| {
                interrupts.borrow_mut().insert(pin, (trigger, callback));
            });
            fires
        }
        None => false,
    }
}

pub fn has_interrupt(pin: u8) -> bool {
    MOCK_INTERRUPTS.with(|interrupts| interrupts.borrow().contains_key(&pin))
}

// test helper to reset all pins
pub fn reset_mock_pins() {
    MOCK_PINS.with(|pins| {
        pins.borrow_mut().clear();
    });
    let handlers = MOCK_INTERRUPTS.with(|interrupts| std::mem::take(&mut *interrupts.borrow_mut()));
    drop(handlers);
}
