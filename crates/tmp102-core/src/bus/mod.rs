//! Two-wire bus discovery and connection
//!
//! The driver never touches a HAL directly. Instead the application hands it a
//! [`BusController`]: something that can enumerate the buses present on the
//! host and open a logical connection to one device address on one of them.
//! [`BusRegistry`] is the implementation used on targets where the buses are
//! plain `embedded-hal` I2C peripherals shared between drivers.

mod shared;

pub use shared::{BusRegistry, SharedBus, SharedI2cDevice};

use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::error::SensorError;

/// Maximum length of a bus name, in bytes.
pub const MAX_BUS_NAME_LEN: usize = 32;

/// Maximum number of devices a single enumeration can report.
pub const MAX_BUS_DEVICES: usize = 4;

/// Fixed-capacity bus name, e.g. `"I2C1"`.
pub type BusName = heapless::String<MAX_BUS_NAME_LEN>;

/// Result of one enumeration.
pub type DeviceList = heapless::Vec<DeviceInfo, MAX_BUS_DEVICES>;

/// Copy `name` into a [`BusName`].
pub fn bus_name(name: &str) -> Result<BusName, SensorError> {
    let mut bus = BusName::new();
    bus.push_str(name).map_err(|_| SensorError::BusNameTooLong {
        max: MAX_BUS_NAME_LEN,
    })?;
    Ok(bus)
}

/// Query selecting the bus devices with a given friendly name.
///
/// Names are compared ASCII case-insensitively, so `"i2c1"` selects `"I2C1"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    bus_name: BusName,
}

impl DeviceSelector {
    /// Build the selector for the bus called `name`.
    pub fn for_bus(name: &str) -> Result<Self, SensorError> {
        Ok(Self {
            bus_name: bus_name(name)?,
        })
    }

    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    /// Whether a bus called `name` satisfies this selector.
    pub fn matches(&self, name: &str) -> bool {
        self.bus_name.eq_ignore_ascii_case(name)
    }
}

impl From<BusName> for DeviceSelector {
    fn from(bus_name: BusName) -> Self {
        Self { bus_name }
    }
}

/// Controller-specific identifier of an enumerated bus device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u16);

/// One enumeration result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: BusName,
}

/// Bus clock requested for a connection.
///
/// Ordered by speed, so `Standard < Fast`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum BusSpeed {
    /// 100 kHz
    #[default]
    Standard,
    /// 400 kHz
    Fast,
}

impl BusSpeed {
    pub const fn frequency_khz(self) -> u32 {
        match self {
            BusSpeed::Standard => 100,
            BusSpeed::Fast => 400,
        }
    }
}

/// Whether a connection tolerates other consumers of the same bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SharingMode {
    /// No other connection may be open on the bus
    #[default]
    Exclusive,
    /// Other shared connections may interleave transactions
    Shared,
}

/// Parameters of a logical connection to one device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub address: SevenBitAddress,
    pub speed: BusSpeed,
    pub sharing: SharingMode,
}

impl ConnectionSettings {
    /// Standard speed, exclusive access.
    pub const fn new(address: SevenBitAddress) -> Self {
        Self {
            address,
            speed: BusSpeed::Standard,
            sharing: SharingMode::Exclusive,
        }
    }

    pub const fn with_speed(self, speed: BusSpeed) -> Self {
        Self { speed, ..self }
    }

    pub const fn with_sharing(self, sharing: SharingMode) -> Self {
        Self { sharing, ..self }
    }
}

/// Bus-access capability supplied by the application.
///
/// Both operations are asynchronous: on real hosts enumerating buses and
/// opening a device are I/O-bound and must not block the caller.
pub trait BusController {
    /// Device handle produced by [`BusController::open`].
    type Device: I2c;

    /// Enumerate the bus devices matching `selector`, in controller order.
    fn find_all(
        &mut self,
        selector: &DeviceSelector,
    ) -> impl Future<Output = Result<DeviceList, SensorError>>;

    /// Open a connection to `settings.address` on the bus identified by `id`.
    ///
    /// `Ok(None)` means the controller declined to hand out a handle (the bus
    /// is held exclusively, or cannot run at the requested speed). `Err` is
    /// reserved for the controller itself failing.
    fn open(
        &mut self,
        id: &DeviceId,
        settings: &ConnectionSettings,
    ) -> impl Future<Output = Result<Option<Self::Device>, SensorError>>;
}
