use std::thread;
use std::time::Duration;

// Use rppal in production
#[cfg(not(test))]
use rppal::i2c::I2c;

#[cfg(test)]
use crate::mocks::mock_i2c::I2c;

use crate::config::CompassConfig;
use crate::error::{Error, Result};
use crate::magnetometer::{Calibration, MagneticField, Magnetometer};

// QMC5883L Register addresses
const OUT_X_L: u8 = 0x00;
const STATUS: u8 = 0x06;
const CONTROL_1: u8 = 0x09;
const CONTROL_2: u8 = 0x0A;
const SET_RESET_PERIOD: u8 = 0x0B;
const CHIP_ID: u8 = 0x0D;

const EXPECTED_CHIP_ID: u8 = 0xFF;

// CONTROL_1: continuous mode, 200Hz output rate, ±8 gauss, 512x oversampling
const MODE_CONTINUOUS_200HZ_8G: u8 = 0x1D;
const SOFT_RESET: u8 = 0x80;

// STATUS bits
const STATUS_DRDY: u8 = 0x01;
const STATUS_OVL: u8 = 0x02;

/// Two output periods at 200Hz. No data after that means the chip stopped.
const DATA_READY_POLLS: usize = 10;
const DATA_READY_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct Qmc5883l {
    i2c: I2c,
    calibration: Calibration,
}

impl Qmc5883l {
    pub fn new(config: &CompassConfig) -> Result<Self> {
        let mut i2c = I2c::new()?;
        i2c.set_slave_address(config.i2c_address)?;

        let chip_id = i2c.smbus_read_byte(CHIP_ID)?;
        if chip_id != EXPECTED_CHIP_ID {
            return Err(Error::Sensor(format!(
                "Wrong chip ID: 0x{:02X}, expected 0x{:02X}",
                chip_id, EXPECTED_CHIP_ID
            )));
        }

        i2c.smbus_write_byte(CONTROL_2, SOFT_RESET)?;
        thread::sleep(Duration::from_millis(10));

        // Recommended by the datasheet
        i2c.smbus_write_byte(SET_RESET_PERIOD, 0x01)?;
        i2c.smbus_write_byte(CONTROL_1, MODE_CONTINUOUS_200HZ_8G)?;

        thread::sleep(Duration::from_millis(10));

        let calibration = Calibration::from(config);
        log::info!(
            "Compass (QMC5883L) initialized at 0x{:02X}, offsets {:?}, scales {:?}",
            config.i2c_address,
            calibration.offsets,
            calibration.scales
        );

        Ok(Self { i2c, calibration })
    }

    fn wait_data_ready(&self) -> Result<()> {
        for _ in 0..DATA_READY_POLLS {
            let status = self.i2c.smbus_read_byte(STATUS)?;
            if status & STATUS_OVL != 0 {
                log::trace!("Compass reading out of range (status 0x{:02X})", status);
            }
            if status & STATUS_DRDY != 0 {
                return Ok(());
            }
            thread::sleep(DATA_READY_POLL_INTERVAL);
        }
        Err(Error::Sensor("Compass has no new data".into()))
    }

    fn read_raw(&mut self) -> Result<[i16; 3]> {
        self.wait_data_ready()?;

        // One burst, so all three axes come from the same conversion
        let mut data = [0u8; 6];
        self.i2c.block_read(OUT_X_L, &mut data)?;
        Ok(decode_axes(&data))
    }
}

impl Magnetometer for Qmc5883l {
    fn read(&mut self) -> Result<MagneticField> {
        let raw = self.read_raw()?;
        Ok(self.calibration.apply(raw))
    }
}

/// X, Y, Z from the six output registers (little endian).
fn decode_axes(data: &[u8; 6]) -> [i16; 3] {
    [
        i16::from_le_bytes([data[0], data[1]]),
        i16::from_le_bytes([data[2], data[3]]),
        i16::from_le_bytes([data[4], data[5]]),
    ]
}
