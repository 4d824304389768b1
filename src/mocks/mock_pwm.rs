// This file is only compiled during tests

use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Pwm0,
    Pwm1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockChannelState {
    pub frequency: f64,
    pub duty_cycle: f64,
    pub enabled: bool,
}

thread_local! {
    static MOCK_PWM: RefCell<HashMap<Channel, MockChannelState>> = RefCell::new(HashMap::new());
}

pub struct Pwm {
    channel: Channel,
}

impl Pwm {
    pub fn with_frequency(
        channel: Channel,
        frequency: f64,
        duty_cycle: f64,
        _polarity: Polarity,
        enabled: bool,
    ) -> Result<Self, rppal::pwm::Error> {
        MOCK_PWM.with(|pwm| {
            pwm.borrow_mut().insert(
                channel,
                MockChannelState {
                    frequency,
                    duty_cycle,
                    enabled,
                },
            );
        });
        Ok(Pwm { channel })
    }

    pub fn set_duty_cycle(&self, duty_cycle: f64) -> Result<(), rppal::pwm::Error> {
        self.update(|state| state.duty_cycle = duty_cycle);
        Ok(())
    }

    pub fn disable(&self) -> Result<(), rppal::pwm::Error> {
        self.update(|state| state.enabled = false);
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut MockChannelState)) {
        MOCK_PWM.with(|pwm| {
            if let Some(state) = pwm.borrow_mut().get_mut(&self.channel) {
                f(state);
            }
        });
    }
}

// Test helpers
pub fn get_mock_channel(channel: Channel) -> Option<MockChannelState> {
    MOCK_PWM.with(|pwm| pwm.borrow().get(&channel).copied())
}

pub fn reset_mock_pwm() {
    MOCK_PWM.with(|pwm| pwm.borrow_mut().clear());
}
