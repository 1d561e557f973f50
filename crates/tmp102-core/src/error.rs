//! Error types shared by the bus connector and the temperature reader

use embedded_hal::i2c::ErrorKind;
use thiserror_no_std::Error;

use crate::bus::BusName;

/// Errors surfaced by the driver.
///
/// Two initialization outcomes are deliberately *not* errors: a connection
/// that yields no handle, and a failed probe read. Both resolve
/// [`Tmp102::begin`](crate::sensors::Tmp102::begin) to `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    /// The bus name does not fit in a [`BusName`]
    #[error("Bus name too long (max: {max} bytes)")]
    BusNameTooLong {
        /// Capacity of a bus name
        max: usize,
    },

    /// The bus registry has no room for another bus
    #[error("Bus registry full (max: {max})")]
    RegistryFull {
        /// Number of buses the registry can hold
        max: usize,
    },

    /// Enumeration returned no device for the requested bus
    #[error("No bus device found for '{bus}'")]
    NoBusDeviceFound {
        /// The bus name that was searched for
        bus: BusName,
    },

    /// The bus controller could not enumerate devices
    #[error("Bus enumeration failed: {details}")]
    EnumerationFailed { details: &'static str },

    /// The bus controller failed outright while opening a connection
    #[error("Connection failed: {details}")]
    ConnectionFailed { details: &'static str },

    /// A bus transaction failed while reading the sensor
    #[error("{sensor}: {operation} failed ({kind:?})")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        kind: ErrorKind,
    },
}
