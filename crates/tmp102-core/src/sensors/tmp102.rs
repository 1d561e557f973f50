//! TMP102 driver: bus connection, availability and temperature reads
//!
//! The lifecycle is `Uninitialized -> Available | Unavailable`, driven only
//! by [`Tmp102::begin`]. The open device handle lives inside
//! [`DriverState::Available`], so there is no way to read through a
//! connection that was never verified.

use core::mem;

use embedded_hal::i2c::{Error as _, I2c, SevenBitAddress};
use log::{debug, error, info, warn};

use super::decode::{RawTemperature, TemperatureEncoding};
use crate::bus::{
    BusController, BusName, BusSpeed, ConnectionSettings, DeviceSelector, SharingMode, bus_name,
};
use crate::config::Tmp102Config;
use crate::error::SensorError;

/// Fixed 7-bit address of the sensor (ADD0 tied to ground).
pub const TMP102_ADDRESS: SevenBitAddress = 0x48;

/// Value [`Tmp102::temperature`] returns when no verified connection is held.
///
/// This means "no reading", not 0 °C.
pub const UNAVAILABLE_SENTINEL: f32 = 0.0;

const SENSOR_NAME: &str = "TMP102";

/// Connection parameters used for every TMP102 connection.
pub const CONNECTION_SETTINGS: ConnectionSettings = ConnectionSettings::new(TMP102_ADDRESS)
    .with_speed(BusSpeed::Fast)
    .with_sharing(SharingMode::Shared);

/// Verified connection to a TMP102.
///
/// Only [`Tmp102::begin`] creates one, after a successful probe read.
#[derive(Debug)]
pub struct Tmp102Sensor<D> {
    device: D,
    address: SevenBitAddress,
    encoding: TemperatureEncoding,
}

impl<D: I2c> Tmp102Sensor<D> {
    fn new(device: D, address: SevenBitAddress, encoding: TemperatureEncoding) -> Self {
        Self {
            device,
            address,
            encoding,
        }
    }

    /// Read the temperature register.
    ///
    /// Two bytes are read with no pointer write first, so this relies on the
    /// pointer still selecting the temperature register (its power-on value).
    pub fn read_raw(&mut self) -> Result<RawTemperature, SensorError> {
        let mut buf = [0u8; 2];
        self.device
            .read(self.address, &mut buf)
            .map_err(|e| SensorError::ReadFailed {
                sensor: SENSOR_NAME,
                operation: "read temperature register",
                kind: e.kind(),
            })?;
        Ok(RawTemperature::from_bytes(buf[0], buf[1]))
    }

    /// Read the temperature in degrees Celsius.
    pub fn temperature(&mut self) -> Result<f32, SensorError> {
        Ok(self.read_raw()?.celsius(self.encoding))
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn encoding(&self) -> TemperatureEncoding {
        self.encoding
    }

    /// Give back the underlying device handle.
    pub fn release(self) -> D {
        self.device
    }
}

/// Where a [`Tmp102`] is in its lifecycle.
#[derive(Debug)]
pub enum DriverState<D> {
    /// [`Tmp102::begin`] has not run
    Uninitialized,
    /// The last [`Tmp102::begin`] did not produce a verified connection
    Unavailable,
    /// Connected and verified
    Available(Tmp102Sensor<D>),
}

impl<D> DriverState<D> {
    pub fn is_available(&self) -> bool {
        matches!(self, DriverState::Available(_))
    }
}

/// TMP102 temperature sensor driver.
///
/// ```ignore
/// let mut sensor = Tmp102::new("I2C1")?;
/// if sensor.begin(&mut registry).await? {
///     info!("{} °C", sensor.temperature()?);
/// }
/// ```
#[derive(Debug)]
pub struct Tmp102<D> {
    bus_name: BusName,
    encoding: TemperatureEncoding,
    state: DriverState<D>,
}

impl<D: I2c> Tmp102<D> {
    /// Create a driver for the sensor on the bus called `bus_name`.
    ///
    /// No I/O happens until [`Tmp102::begin`].
    pub fn new(bus_name: &str) -> Result<Self, SensorError> {
        Self::with_encoding(bus_name, TemperatureEncoding::default())
    }

    pub fn with_encoding(
        bus_name_str: &str,
        encoding: TemperatureEncoding,
    ) -> Result<Self, SensorError> {
        Ok(Self {
            bus_name: bus_name(bus_name_str)?,
            encoding,
            state: DriverState::Uninitialized,
        })
    }

    pub fn from_config(config: &Tmp102Config<'_>) -> Result<Self, SensorError> {
        Self::with_encoding(config.bus_name, config.encoding)
    }

    /// Locate the bus, open the sensor and verify it with one probe read.
    ///
    /// Resolves to `Ok(true)` when the sensor is ready. A connection the
    /// controller declines to hand out, or a failed probe read, resolves to
    /// `Ok(false)` and leaves the driver [`DriverState::Unavailable`]. Only
    /// an empty enumeration or a failing controller are errors.
    ///
    /// Calling this again drops any held connection and starts over.
    pub async fn begin<C>(&mut self, controller: &mut C) -> Result<bool, SensorError>
    where
        C: BusController<Device = D>,
    {
        self.state = DriverState::Unavailable;

        let selector = DeviceSelector::from(self.bus_name.clone());
        let devices = controller.find_all(&selector).await?;
        let info = devices.first().ok_or_else(|| {
            error!("{}: no bus device named '{}'", SENSOR_NAME, self.bus_name);
            SensorError::NoBusDeviceFound {
                bus: self.bus_name.clone(),
            }
        })?;
        debug!(
            "{}: {} device(s) match '{}', using {:?}",
            SENSOR_NAME,
            devices.len(),
            self.bus_name,
            info.id
        );

        let Some(device) = controller.open(&info.id, &CONNECTION_SETTINGS).await? else {
            warn!(
                "{}: no connection to 0x{:02X} on '{}'",
                SENSOR_NAME, TMP102_ADDRESS, info.name
            );
            return Ok(false);
        };

        let mut sensor = Tmp102Sensor::new(device, TMP102_ADDRESS, self.encoding);
        match sensor.read_raw() {
            Ok(raw) => {
                info!(
                    "{}: ready on '{}' ({} °C)",
                    SENSOR_NAME,
                    info.name,
                    raw.celsius(self.encoding)
                );
                self.state = DriverState::Available(sensor);
                Ok(true)
            }
            Err(e) => {
                warn!("{}: probe failed on '{}': {}", SENSOR_NAME, info.name, e);
                Ok(false)
            }
        }
    }

    /// Read the temperature in degrees Celsius.
    ///
    /// Returns [`UNAVAILABLE_SENTINEL`] without touching the bus unless
    /// [`Tmp102::begin`] succeeded. A bus error after that is returned as-is;
    /// availability is not re-checked and stays set.
    pub fn temperature(&mut self) -> Result<f32, SensorError> {
        let DriverState::Available(sensor) = &mut self.state else {
            return Ok(UNAVAILABLE_SENTINEL);
        };
        sensor.temperature().map_err(|e| {
            error!("{}: {}", SENSOR_NAME, e);
            e
        })
    }

    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    pub fn state(&self) -> &DriverState<D> {
        &self.state
    }

    /// The verified sensor handle, once [`Tmp102::begin`] has succeeded.
    pub fn sensor_mut(&mut self) -> Option<&mut Tmp102Sensor<D>> {
        match &mut self.state {
            DriverState::Available(sensor) => Some(sensor),
            _ => None,
        }
    }

    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    pub fn encoding(&self) -> TemperatureEncoding {
        self.encoding
    }

    /// Return to [`DriverState::Uninitialized`], handing back the device if
    /// one was held.
    pub fn release(&mut self) -> Option<D> {
        match mem::replace(&mut self.state, DriverState::Uninitialized) {
            DriverState::Available(sensor) => Some(sensor.release()),
            _ => None,
        }
    }
}
