//! Driver configuration
//!
//! Borrowed from the firmware's stored config blob, so the bus name is not
//! copied until a driver is built from it.

use serde::{Deserialize, Serialize};

use crate::sensors::TemperatureEncoding;

/// Driver configuration, as stored alongside the rest of the firmware config.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Tmp102Config<'a> {
    /// Friendly name of the bus the sensor sits on, e.g. `"I2C1"`
    pub bus_name: &'a str,
    /// How the temperature register is decoded
    pub encoding: TemperatureEncoding,
}
