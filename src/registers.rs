// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! CCS811 register map, bit positions and fixed values taken from the
//! [datasheet](https://cdn-learn.adafruit.com/assets/assets/000/044/636/original/CCS811_DS000459_2-00-1098798.pdf).

use std::time::Duration;

/// STATUS, 1 byte, read only
pub const STATUS: u8 = 0x00;
/// MEAS_MODE, 1 byte, read/write
pub const MEAS_MODE: u8 = 0x01;
/// ALG_RESULT_DATA, 8 bytes, read only
pub const ALG_RESULT_DATA: u8 = 0x02;
/// RAW_DATA, 2 bytes, read only. Not used by the driver.
pub const RAW_DATA: u8 = 0x03;
/// ENV_DATA, 4 bytes, write only
pub const ENV_DATA: u8 = 0x05;
/// NTC, 4 bytes, read only
pub const NTC: u8 = 0x06;
/// THRESHOLDS, 5 bytes, write only
pub const THRESHOLDS: u8 = 0x10;
/// HW_ID, 1 byte, read only
pub const HW_ID: u8 = 0x20;
/// ERROR_ID, 1 byte, read only
pub const ERROR_ID: u8 = 0xE0;
/// APP_START, command without payload
pub const APP_START: u8 = 0xF4;
/// SW_RESET, command followed by [`SW_RESET_SEQUENCE`]
pub const SW_RESET: u8 = 0xFF;

/// Unlock pattern that has to follow [`SW_RESET`] in a single write
pub const SW_RESET_SEQUENCE: [u8; 4] = [0x11, 0xE5, 0x72, 0x8A];

/// Value of HW_ID for a CCS811
pub const HW_ID_CODE: u8 = 0x81;

// STATUS bits
pub const STATUS_ERROR_BIT: u8 = 0;
pub const STATUS_DATA_READY_BIT: u8 = 3;
pub const STATUS_APP_VALID_BIT: u8 = 4;
pub const STATUS_FW_MODE_BIT: u8 = 7;

// MEAS_MODE bits
pub const MEAS_MODE_INT_THRESH_BIT: u8 = 2;
pub const MEAS_MODE_INT_ENABLE_BIT: u8 = 3;
pub const MEAS_MODE_DRIVE_MODE_OFFSET: u8 = 4;
pub const MEAS_MODE_DRIVE_MODE_WIDTH: u8 = 3;

/// Reference resistor of the NTC bridge, ohms
pub const REF_RESISTOR: f32 = 100_000.0;
/// Thermistor nominal resistance at 25 Celsius, ohms
pub const NTC_NOMINAL_RESISTANCE: f32 = 10_000.0;
/// Thermistor beta coefficient
pub const NTC_BETA: f32 = 3380.0;
/// 25 Celsius in Kelvin
pub const NTC_NOMINAL_TEMPERATURE_K: f32 = 298.15;
pub const KELVIN_OFFSET: f32 = 273.15;

/// ENV_DATA temperature field maps 0 to -25 Celsius
pub const ENV_TEMPERATURE_BIAS: i32 = 25;

/// Time the firmware needs after APP_START before STATUS is meaningful
pub const APP_START_DELAY: Duration = Duration::from_millis(100);
