// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::bus::BusChannel;
use crate::registers::*;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use std::fmt;
use std::path::Path;
use std::thread;
use tracing::{debug, trace, warn};

/// Standard I2C address of the CCS811 (ADDR pin low)
pub const DEFAULT_ADDRESS: u16 = 0x5A;
/// I2C address of the CCS811 with the ADDR pin high
pub const ALTERNATE_ADDRESS: u16 = 0x5B;
/// Bus used by [`Ccs811::open_default`]
pub const DEFAULT_BUS_PATH: &str = "/dev/i2c-1";

///
///CCS811 error enum, generic over the error of the
///bus the driver runs on. Device related variants
///follow the order in which the boot sequence can
///fail.
///
#[derive(Debug, thiserror::Error)]
pub enum Ccs811Error<E: fmt::Debug> {
    /// Read or write on the bus failed
    #[error("I2C bus error: {0:?}")]
    Bus(E),

    /// HW_ID did not match, wrong or absent device
    #[error("device ID returned is {hw_id:#04x}, expected 0x81. Please check your wiring")]
    DeviceNotFound { hw_id: u8 },

    /// The device stayed in boot mode after APP_START
    #[error("device did not enter application mode, the sensor firmware may be damaged")]
    BootFailure,

    /// The error bit of STATUS was set, `code` is the ERROR_ID content
    #[error("device returned error code {code:#04x}. Try removing and reapplying power")]
    DeviceError { code: u8 },

    /// Data read from the device can not be converted
    #[error("sensor read error: {0}")]
    SensorRead(&'static str),

    /// Caller supplied value outside of what the register can hold
    #[error("invalid argument {name} = {value}")]
    InvalidArgument { name: &'static str, value: f32 },
}

/// Measurement cadence, bits 4-6 of MEAS_MODE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DriveMode {
    /// No measurements
    Idle = 0x00,
    /// One measurement every second
    OneSecond = 0x01,
    /// One measurement every 10 seconds
    TenSeconds = 0x02,
    /// One measurement every 60 seconds
    SixtySeconds = 0x03,
    /// Raw data every 250 ms, no algorithm results
    QuarterSecond = 0x04,
}

impl DriveMode {
    /// Decodes the 3 bit MEAS_MODE field
    pub fn from_code(code: u8) -> Option<DriveMode> {
        match code {
            0x00 => Some(DriveMode::Idle),
            0x01 => Some(DriveMode::OneSecond),
            0x02 => Some(DriveMode::TenSeconds),
            0x03 => Some(DriveMode::SixtySeconds),
            0x04 => Some(DriveMode::QuarterSecond),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Settings applied at the end of the boot sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub drive_mode: DriveMode,
    pub interrupt_enabled: bool,
    /// Subtracted from the thermistor temperature, Celsius
    pub temperature_offset: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            drive_mode: DriveMode::OneSecond,
            interrupt_enabled: false,
            temperature_offset: 0.0,
        }
    }
}

/// Snapshot of the STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    fn bit(self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }

    pub fn error(self) -> bool {
        self.bit(STATUS_ERROR_BIT)
    }

    pub fn data_ready(self) -> bool {
        self.bit(STATUS_DATA_READY_BIT)
    }

    pub fn app_valid(self) -> bool {
        self.bit(STATUS_APP_VALID_BIT)
    }

    /// true in application mode, false in boot mode
    pub fn fw_mode(self) -> bool {
        self.bit(STATUS_FW_MODE_BIT)
    }
}

/// eCO2 and TVOC parsed from one ALG_RESULT_DATA read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Equivalent CO2, ppm
    pub eco2: u16,
    /// Total volatile organic compounds, ppb
    pub tvoc: u16,
}

/// CCS811 Struct, wraps a bus implementing [`BusChannel`]
/// and has implemented related CCS811 operations.
///
/// A value of this type only exists for a device that passed the
/// boot sequence and is running its application firmware.
///
pub struct Ccs811<B: BusChannel> {
    bus: B,
    temperature_offset: f32,
    last_measurement: Option<Measurement>,
}

impl Ccs811<LinuxI2CDevice> {
    /// Opens the I2C device at `path` with the given address
    /// and runs the boot sequence with the default [`Config`].
    ///
    pub fn open<P: AsRef<Path>>(
        path: P,
        address: u16,
    ) -> Result<Ccs811<LinuxI2CDevice>, Ccs811Error<LinuxI2CError>> {
        let device = LinuxI2CDevice::new(path, address).map_err(Ccs811Error::Bus)?;
        Ccs811::new(device)
    }

    /// Same as [`Ccs811::open`] on `/dev/i2c-1`, address 0x5A
    pub fn open_default() -> Result<Ccs811<LinuxI2CDevice>, Ccs811Error<LinuxI2CError>> {
        Ccs811::open(DEFAULT_BUS_PATH, DEFAULT_ADDRESS)
    }
}

/// Implementation of CCS811 related
/// operations
///
impl<B: BusChannel> Ccs811<B> {
    /// Create a new CCS811 Struct with the default [`Config`].
    ///
    /// Checks the hardware id, starts the application firmware
    /// and sets 1 second measurements without interrupts.
    /// If any step fails the device has to be power cycled or
    /// reset and the construction attempted again.
    ///
    pub fn new(bus: B) -> Result<Ccs811<B>, Ccs811Error<B::Error>> {
        Ccs811::with_config(bus, Config::default())
    }

    /// Create a new CCS811 Struct, applying `config` once the
    /// device is in application mode.
    ///
    pub fn with_config(bus: B, config: Config) -> Result<Ccs811<B>, Ccs811Error<B::Error>> {
        let mut sensor = Ccs811 {
            bus,
            temperature_offset: config.temperature_offset,
            last_measurement: None,
        };

        let hw_id = sensor.hardware_id()?;
        if hw_id != HW_ID_CODE {
            warn!(hw_id, "unexpected CCS811 hardware id");
            return Err(Ccs811Error::DeviceNotFound { hw_id });
        }

        debug!("starting CCS811 application firmware");
        sensor.write(&[APP_START])?;
        thread::sleep(APP_START_DELAY);

        let status = sensor.status()?;
        if status.error() {
            let code = sensor.error_code()?;
            warn!(code, "CCS811 reported an error after application start");
            return Err(Ccs811Error::DeviceError { code });
        }
        if !status.fw_mode() {
            warn!(status = status.0, "CCS811 stayed in boot mode");
            return Err(Ccs811Error::BootFailure);
        }

        sensor.set_interrupt_enabled(config.interrupt_enabled)?;
        sensor.set_drive_mode(config.drive_mode)?;
        debug!(drive_mode = ?config.drive_mode, "CCS811 ready");

        Ok(sensor)
    }

    /// Gives the bus back, the driver is consumed.
    pub fn release(self) -> B {
        self.bus
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Ccs811Error<B::Error>> {
        trace!(?bytes, "write");
        self.bus.write(bytes).map_err(Ccs811Error::Bus)
    }

    fn read_into(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Ccs811Error<B::Error>> {
        self.bus
            .write_then_read(&[register], buffer)
            .map_err(Ccs811Error::Bus)?;
        trace!(register, ?buffer, "read");
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Ccs811Error<B::Error>> {
        let mut buffer = [0u8; 1];
        self.read_into(register, &mut buffer)?;
        Ok(buffer[0])
    }

    /// Reads `width` bits starting at `offset` of a 1 byte register.
    fn read_bits(&mut self, register: u8, offset: u8, width: u8) -> Result<u8, Ccs811Error<B::Error>> {
        let mask = field_mask(width);
        Ok((self.read_register(register)? >> offset) & mask)
    }

    /// Read-modify-write of `width` bits starting at `offset`.
    fn write_bits(
        &mut self,
        register: u8,
        offset: u8,
        width: u8,
        value: u8,
    ) -> Result<(), Ccs811Error<B::Error>> {
        let mask = field_mask(width) << offset;
        let current = self.read_register(register)?;
        let updated = (current & !mask) | ((value << offset) & mask);
        self.write(&[register, updated])
    }

    /// Reads STATUS once
    pub fn status(&mut self) -> Result<Status, Ccs811Error<B::Error>> {
        Ok(Status(self.read_register(STATUS)?))
    }

    pub fn error(&mut self) -> Result<bool, Ccs811Error<B::Error>> {
        Ok(self.status()?.error())
    }

    pub fn data_ready(&mut self) -> Result<bool, Ccs811Error<B::Error>> {
        Ok(self.status()?.data_ready())
    }

    pub fn app_valid(&mut self) -> Result<bool, Ccs811Error<B::Error>> {
        Ok(self.status()?.app_valid())
    }

    pub fn fw_mode(&mut self) -> Result<bool, Ccs811Error<B::Error>> {
        Ok(self.status()?.fw_mode())
    }

    /// Reads HW_ID, 0x81 for a CCS811
    pub fn hardware_id(&mut self) -> Result<u8, Ccs811Error<B::Error>> {
        self.read_register(HW_ID)
    }

    /// Reads ERROR_ID. Only meaningful while the error bit of STATUS is set,
    /// the value is passed through untouched.
    pub fn error_code(&mut self) -> Result<u8, Ccs811Error<B::Error>> {
        self.read_register(ERROR_ID)
    }

    pub fn drive_mode(&mut self) -> Result<DriveMode, Ccs811Error<B::Error>> {
        let code = self.read_bits(MEAS_MODE, MEAS_MODE_DRIVE_MODE_OFFSET, MEAS_MODE_DRIVE_MODE_WIDTH)?;
        DriveMode::from_code(code).ok_or(Ccs811Error::SensorRead("unknown drive mode in MEAS_MODE"))
    }

    pub fn set_drive_mode(&mut self, mode: DriveMode) -> Result<(), Ccs811Error<B::Error>> {
        self.write_bits(
            MEAS_MODE,
            MEAS_MODE_DRIVE_MODE_OFFSET,
            MEAS_MODE_DRIVE_MODE_WIDTH,
            mode.code(),
        )
    }

    /// Data ready interrupt on the nINT pin
    pub fn interrupt_enabled(&mut self) -> Result<bool, Ccs811Error<B::Error>> {
        Ok(self.read_bits(MEAS_MODE, MEAS_MODE_INT_ENABLE_BIT, 1)? == 1)
    }

    pub fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Ccs811Error<B::Error>> {
        self.write_bits(MEAS_MODE, MEAS_MODE_INT_ENABLE_BIT, 1, enabled as u8)
    }

    /// When set, the interrupt only fires if eCO2 crosses one of the
    /// thresholds from [`Ccs811::set_interrupt_thresholds`]
    pub fn interrupt_threshold_mode(&mut self) -> Result<bool, Ccs811Error<B::Error>> {
        Ok(self.read_bits(MEAS_MODE, MEAS_MODE_INT_THRESH_BIT, 1)? == 1)
    }

    pub fn set_interrupt_threshold_mode(&mut self, enabled: bool) -> Result<(), Ccs811Error<B::Error>> {
        self.write_bits(MEAS_MODE, MEAS_MODE_INT_THRESH_BIT, 1, enabled as u8)
    }

    pub fn temperature_offset(&self) -> f32 {
        self.temperature_offset
    }

    pub fn set_temperature_offset(&mut self, offset: f32) {
        self.temperature_offset = offset;
    }

    /// Reads ALG_RESULT_DATA if the device has new data.
    ///
    /// eCO2 and TVOC are only stored together, and only when the
    /// error bit is still clear after the read. Otherwise the
    /// previous values are kept and the device error is returned.
    ///
    pub fn refresh_measurement(&mut self) -> Result<(), Ccs811Error<B::Error>> {
        if !self.data_ready()? {
            trace!("no new data");
            return Ok(());
        }

        let mut data_buffer = [0u8; 8];
        self.read_into(ALG_RESULT_DATA, &mut data_buffer)?;
        let measurement = Measurement {
            eco2: u16::from_be_bytes([data_buffer[0], data_buffer[1]]),
            tvoc: u16::from_be_bytes([data_buffer[2], data_buffer[3]]),
        };

        if self.error()? {
            let code = self.error_code()?;
            warn!(code, "CCS811 reported an error while reading results");
            return Err(Ccs811Error::DeviceError { code });
        }

        debug!(eco2 = measurement.eco2, tvoc = measurement.tvoc, "new measurement");
        self.last_measurement = Some(measurement);
        Ok(())
    }

    /// Refreshes and returns the last eCO2 and TVOC pair,
    /// None until the device produced a first result.
    pub fn measurement(&mut self) -> Result<Option<Measurement>, Ccs811Error<B::Error>> {
        self.refresh_measurement()?;
        Ok(self.last_measurement)
    }

    /// Equivalent CO2 in ppm. The datasheet range is 400 to 8192 ppm,
    /// values are returned as read.
    pub fn eco2(&mut self) -> Result<Option<u16>, Ccs811Error<B::Error>> {
        Ok(self.measurement()?.map(|m| m.eco2))
    }

    /// Total volatile organic compounds in ppb
    pub fn tvoc(&mut self) -> Result<Option<u16>, Ccs811Error<B::Error>> {
        Ok(self.measurement()?.map(|m| m.tvoc))
    }

    /// Temperature from an NTC thermistor connected to the sensor, Celsius,
    /// minus the configured offset.
    pub fn temperature(&mut self) -> Result<f32, Ccs811Error<B::Error>> {
        let mut data_buffer = [0u8; 4];
        self.read_into(NTC, &mut data_buffer)?;
        let vref = u16::from_be_bytes([data_buffer[0], data_buffer[1]]);
        let vntc = u16::from_be_bytes([data_buffer[2], data_buffer[3]]);
        let celsius = ntc_temperature(vref, vntc)
            .ok_or(Ccs811Error::SensorRead("NTC reference voltage is zero"))?;
        Ok(celsius - self.temperature_offset)
    }

    /// Sets the relative humidity (percent) and temperature (Celsius)
    /// the sensor uses to compensate eCO2 and TVOC.
    ///
    pub fn set_environmental_data(
        &mut self,
        humidity: f32,
        temperature: f32,
    ) -> Result<(), Ccs811Error<B::Error>> {
        let [humidity_high, humidity_low] = encode_humidity(humidity).ok_or(Ccs811Error::InvalidArgument {
            name: "humidity",
            value: humidity,
        })?;
        let [temperature_high, temperature_low] =
            encode_temperature(temperature).ok_or(Ccs811Error::InvalidArgument {
                name: "temperature",
                value: temperature,
            })?;
        self.write(&[ENV_DATA, humidity_high, humidity_low, temperature_high, temperature_low])
    }

    /// Sets the eCO2 boundaries (ppm) between the low, medium and high
    /// ranges and the hysteresis used by the threshold interrupt.
    ///
    pub fn set_interrupt_thresholds(
        &mut self,
        low_med: u16,
        med_high: u16,
        hysteresis: u8,
    ) -> Result<(), Ccs811Error<B::Error>> {
        self.write(&threshold_frame(low_med, med_high, hysteresis))
    }

    /// Soft reset the sensor device.
    /// The device goes back to boot mode, a new driver
    /// has to be created to use it again.
    ///
    pub fn reset(&mut self) -> Result<(), Ccs811Error<B::Error>> {
        let [a, b, c, d] = SW_RESET_SEQUENCE;
        debug!("CCS811 software reset");
        self.write(&[SW_RESET, a, b, c, d])?;
        self.last_measurement = None;
        Ok(())
    }
}

fn field_mask(width: u8) -> u8 {
    ((1u16 << width) - 1) as u8
}

/// Converts the NTC bridge voltages into Celsius using the beta equation
/// (ams application note AN000372). None when `vref` is zero.
pub fn ntc_temperature(vref: u16, vntc: u16) -> Option<f32> {
    if vref == 0 {
        return None;
    }
    let rntc = vntc as f32 * REF_RESISTOR / vref as f32;
    let inverse_kelvin = (rntc / NTC_NOMINAL_RESISTANCE).ln() / NTC_BETA + 1.0 / NTC_NOMINAL_TEMPERATURE_K;
    Some(1.0 / inverse_kelvin - KELVIN_OFFSET)
}

/// ENV_DATA humidity, 1/512 %RH. Rounded to whole percent, written
/// to the high byte only.
pub fn encode_humidity(humidity: f32) -> Option<[u8; 2]> {
    if !(0.0..=100.0).contains(&humidity) {
        return None;
    }
    Some([(humidity.round() as u8) << 1, 0x00])
}

/// ENV_DATA temperature, 1/512 Celsius above -25 Celsius: integer part in
/// bits 9-15, fraction in bits 0-8.
pub fn encode_temperature(temperature: f32) -> Option<[u8; 2]> {
    if !(-25.0..=100.0).contains(&temperature) {
        return None;
    }
    let integer = temperature.floor();
    let fractional = temperature - integer;
    let ticks = (fractional * 512.0).round() as u16;
    // a fraction rounding up to 512 carries into the integer part
    let field = (((integer as i32 + ENV_TEMPERATURE_BIAS) as u16) << 9) + ticks;
    Some(field.to_be_bytes())
}

/// THRESHOLDS write: both boundaries big endian, then the hysteresis
pub fn threshold_frame(low_med: u16, med_high: u16, hysteresis: u8) -> [u8; 6] {
    let low_med = low_med.to_be_bytes();
    let med_high = med_high.to_be_bytes();
    [THRESHOLDS, low_med[0], low_med[1], med_high[0], med_high[1], hysteresis]
}
