// This file is only compiled during tests

use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    ReadByte(u8),
    WriteByte(u8, u8),
    BlockRead(u8, usize),
}

thread_local! {
    static MOCK_REGISTERS: RefCell<HashMap<u8, u8>> = RefCell::new(HashMap::new());
    static MOCK_TRANSACTIONS: RefCell<Vec<Transaction>> = const { RefCell::new(Vec::new()) };
}

pub struct I2c;

impl I2c {
    pub fn new() -> Result<Self, rppal::i2c::Error> {
        Ok(I2c)
    }

    pub fn set_slave_address(&mut self, _address: u16) -> Result<(), rppal::i2c::Error> {
        Ok(())
    }

    pub fn smbus_read_byte(&self, command: u8) -> Result<u8, rppal::i2c::Error> {
        record(Transaction::ReadByte(command));
        Ok(get_mock_register(command))
    }

    pub fn smbus_write_byte(&self, command: u8, value: u8) -> Result<(), rppal::i2c::Error> {
        record(Transaction::WriteByte(command, value));
        set_mock_register(command, value);
        Ok(())
    }

    /// Reads consecutive registers starting at `command`, like the chip's
    /// auto-incrementing register pointer.
    pub fn block_read(&self, command: u8, buffer: &mut [u8]) -> Result<(), rppal::i2c::Error> {
        record(Transaction::BlockRead(command, buffer.len()));
        for (offset, byte) in buffer.iter_mut().enumerate() {
            *byte = get_mock_register(command.wrapping_add(offset as u8));
        }
        Ok(())
    }
}

fn record(transaction: Transaction) {
    MOCK_TRANSACTIONS.with(|log| log.borrow_mut().push(transaction));
}

// Test helpers
pub fn set_mock_register(register: u8, value: u8) {
    MOCK_REGISTERS.with(|registers| {
        registers.borrow_mut().insert(register, value);
    });
}

pub fn get_mock_register(register: u8) -> u8 {
    MOCK_REGISTERS.with(|registers| registers.borrow().get(&register).copied().unwrap_or(0))
}

/// Transactions since the last call, oldest first.
pub fn take_transactions() -> Vec<Transaction> {
    MOCK_TRANSACTIONS.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

pub fn reset_mock_i2c() {
    MOCK_REGISTERS.with(|registers| registers.borrow_mut().clear());
    MOCK_TRANSACTIONS.with(|log| log.borrow_mut().clear());
}
