// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! CCS811 driver implementing the I2C operations of the CCS811 eCO2/TVOC gas sensor
//!
//! Operations taken from the [datasheet](https://cdn-learn.adafruit.com/assets/assets/000/044/636/original/CCS811_DS000459_2-00-1098798.pdf)
//! and the ams application note for the NTC thermistor (AN000372).
//!
//! Creating the driver runs the boot sequence: hardware id check, application
//! start and measurement mode setup. A driver that was created successfully is
//! always talking to a CCS811 in application mode.
//!
//! The driver works on anything implementing [`bus::BusChannel`], an
//! implementation for `i2cdev`'s `LinuxI2CDevice` is included.
//! Logging goes through `tracing`, install a subscriber to see it.
//!
//! ## Basic Example
//!
//! Obtaining measurements, eCO2, TVOC and temperature
//!
//!
//!```no_run
//!use ccs811_i2c::ccs811::Ccs811;
//!use std::thread;
//!use std::time::Duration;
//!
//!fn main() {
//!    // Open the I2C device
//!    let mut ccs = Ccs811::open_default().unwrap();
//!    ccs.set_environmental_data(45.0, 21.5).unwrap();
//!
//!    loop {
//!        match ccs.measurement() {
//!            Ok(Some(m)) => {
//!                println!("eCO2: {} ppm TVOC: {} ppb", m.eco2, m.tvoc);
//!            }
//!            Ok(None) => println!("Waiting for the first measurement"),
//!            Err(e) => {
//!                println!("Error obtaining measurements. More details: {}", e);
//!            }
//!        }
//!        thread::sleep(Duration::from_secs(1));
//!    }
//!}
//!```
//!
//! A driver shared between threads goes behind a `std::sync::Mutex`, a
//! register pointer write must never be interleaved with another transaction.
//!

/// Bus abstraction used by the driver
pub mod bus;
/// Driver implementing CCS811 device related operations
pub mod ccs811;
/// Register map and fixed values
pub mod registers;

pub use bus::BusChannel;
pub use ccs811::{Ccs811, Ccs811Error, Config, DriveMode, Measurement, Status};
