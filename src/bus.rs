// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use i2cdev::core::{I2CDevice, I2CMessage, I2CTransfer};
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError, LinuxI2CMessage};
use std::fmt;

/// Bus access used by the CCS811 driver.
///
/// The device address is fixed by the implementation, every call is one
/// complete transaction against that address.
pub trait BusChannel {
    /// Error reported by the underlying bus
    type Error: fmt::Debug;

    /// Writes `bytes` in a single transaction.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Writes `bytes` (usually a register pointer) and fills `buffer` with
    /// the device answer, without releasing the bus between both phases.
    fn write_then_read(&mut self, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error>;
}

impl<B: BusChannel + ?Sized> BusChannel for &mut B {
    type Error = B::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(bytes)
    }

    fn write_then_read(&mut self, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).write_then_read(bytes, buffer)
    }
}

/// Linux userspace I2C, the repeated start is done with a single
/// `I2C_RDWR` transfer of two messages.
impl BusChannel for LinuxI2CDevice {
    type Error = LinuxI2CError;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        I2CDevice::write(self, bytes)
    }

    fn write_then_read(&mut self, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        let mut messages = [LinuxI2CMessage::write(bytes), LinuxI2CMessage::read(buffer)];
        self.transfer(&mut messages)?;
        Ok(())
    }
}
