//! Fake CCS811 for driver tests
//!
//! Keeps the registers the driver touches and records every transaction
//! so tests can check the exact bytes put on the bus.

use ccs811_i2c::registers::*;
use ccs811_i2c::BusChannel;
use std::cell::RefCell;
use std::rc::Rc;

pub const STATUS_APP_MODE: u8 = 0b1001_0000;
pub const STATUS_BOOT_MODE: u8 = 0b0001_0000;
pub const STATUS_ERROR: u8 = 0b0000_0001;
pub const STATUS_DATA_READY: u8 = 0b0000_1000;

/// Bus transaction type for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write(Vec<u8>),
    WriteRead { write_data: Vec<u8>, read_len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusFault;

#[derive(Debug)]
pub struct DeviceState {
    pub hw_id: u8,
    pub status: u8,
    /// STATUS loaded by APP_START
    pub status_after_app_start: u8,
    pub meas_mode: u8,
    pub error_id: u8,
    pub alg_result: [u8; 8],
    pub ntc: [u8; 4],
    /// ERROR_ID raised by the next ALG_RESULT_DATA read
    pub error_on_result_read: Option<u8>,
    pub fail_bus: bool,
    pub transactions: Vec<Transaction>,
}

/// Cloning shares the device, keep one handle in the test
/// and give the other one to the driver.
#[derive(Debug, Clone)]
pub struct FakeCcs811 {
    state: Rc<RefCell<DeviceState>>,
}

impl FakeCcs811 {
    /// A healthy CCS811 in boot mode with the data ready
    /// interrupt left enabled.
    pub fn new() -> Self {
        FakeCcs811 {
            state: Rc::new(RefCell::new(DeviceState {
                hw_id: HW_ID_CODE,
                status: STATUS_BOOT_MODE,
                status_after_app_start: STATUS_APP_MODE,
                meas_mode: 0b0000_1000,
                error_id: 0,
                alg_result: [0; 8],
                ntc: [0; 4],
                error_on_result_read: None,
                fail_bus: false,
                transactions: Vec::new(),
            })),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.borrow().transactions.clone()
    }

    pub fn clear_transactions(&self) {
        self.state.borrow_mut().transactions.clear();
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.transactions()
            .into_iter()
            .filter_map(|t| match t {
                Transaction::Write(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    /// Loads a result and raises the data ready bit
    pub fn publish(&self, eco2: u16, tvoc: u16) {
        self.with(|s| {
            let eco2 = eco2.to_be_bytes();
            let tvoc = tvoc.to_be_bytes();
            s.alg_result = [eco2[0], eco2[1], tvoc[0], tvoc[1], STATUS_APP_MODE, 0, 0x12, 0x34];
            s.status |= STATUS_DATA_READY;
        });
    }

    pub fn set_ntc(&self, vref: u16, vntc: u16) {
        self.with(|s| {
            let vref = vref.to_be_bytes();
            let vntc = vntc.to_be_bytes();
            s.ntc = [vref[0], vref[1], vntc[0], vntc[1]];
        });
    }
}

impl BusChannel for FakeCcs811 {
    type Error = BusFault;

    fn write(&mut self, bytes: &[u8]) -> Result<(), BusFault> {
        let mut s = self.state.borrow_mut();
        if s.fail_bus {
            return Err(BusFault);
        }
        s.transactions.push(Transaction::Write(bytes.to_vec()));
        match bytes[0] {
            APP_START => s.status = s.status_after_app_start,
            MEAS_MODE => s.meas_mode = bytes[1],
            SW_RESET if bytes[1..] == SW_RESET_SEQUENCE => s.status = STATUS_BOOT_MODE,
            _ => {}
        }
        Ok(())
    }

    fn write_then_read(&mut self, bytes: &[u8], buffer: &mut [u8]) -> Result<(), BusFault> {
        let mut s = self.state.borrow_mut();
        if s.fail_bus {
            return Err(BusFault);
        }
        s.transactions.push(Transaction::WriteRead {
            write_data: bytes.to_vec(),
            read_len: buffer.len(),
        });
        match bytes[0] {
            STATUS => buffer[0] = s.status,
            MEAS_MODE => buffer[0] = s.meas_mode,
            HW_ID => buffer[0] = s.hw_id,
            ERROR_ID => buffer[0] = s.error_id,
            NTC => buffer.copy_from_slice(&s.ntc[..buffer.len()]),
            ALG_RESULT_DATA => {
                buffer.copy_from_slice(&s.alg_result[..buffer.len()]);
                s.status &= !STATUS_DATA_READY;
                if let Some(code) = s.error_on_result_read.take() {
                    s.status |= STATUS_ERROR;
                    s.error_id = code;
                }
            }
            _ => buffer.fill(0),
        }
        Ok(())
    }
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub fn read(register: u8, read_len: usize) -> Transaction {
    Transaction::WriteRead {
        write_data: vec![register],
        read_len,
    }
}
