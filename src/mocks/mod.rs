pub mod fakes;
pub mod mock_gpio;
pub mod mock_i2c;
pub mod mock_pwm;
