//! Hardware-independent driver for the TMP102 two-wire temperature sensor
//!
//! The driver finds a named I2C bus through a [`bus::BusController`] supplied
//! by the application, opens the sensor at `0x48` in fast mode with shared
//! access, verifies it with one probe read and then decodes the 12-bit
//! temperature register on demand.
//!
//! It is `#![no_std]` and allocation free so it builds for embedded targets
//! and for desktop hosts running the tests.

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod config;
pub mod error;
pub mod sensors;

pub use config::Tmp102Config;
pub use error::SensorError;
pub use sensors::{DriverState, TemperatureEncoding, Tmp102, Tmp102Sensor};
