//! Shared two-wire bus implementation
//!
//! Provides a blocking, critical-section protected wrapper around an
//! `embedded-hal` I2C peripheral, plus a [`BusRegistry`] that hands out
//! per-driver device handles under the requested [`SharingMode`].

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::i2c::{ErrorType, I2c, Operation};
use log::{debug, warn};

use super::{
    BusController, BusName, BusSpeed, ConnectionSettings, DeviceId, DeviceInfo, DeviceList,
    DeviceSelector, SharingMode, bus_name,
};
use crate::error::SensorError;

#[derive(Debug, Clone, Copy, Default)]
struct BusClaims {
    shared: u8,
    exclusive: bool,
}

/// A named I2C bus that several device handles can use.
///
/// Each transaction runs inside a critical section, so transactions from
/// different handles never interleave on the wire. Nothing is held between
/// transactions.
///
/// # Example
///
/// ```ignore
/// use static_cell::StaticCell;
/// use tmp102_core::bus::{BusSpeed, SharedBus};
///
/// static I2C0_BUS: StaticCell<SharedBus<esp_hal::i2c::master::I2c<'static, esp_hal::Blocking>>> =
///     StaticCell::new();
///
/// let i2c = /* ... create blocking I2C at 400 kHz ... */;
/// let bus = I2C0_BUS.init(SharedBus::new("I2C0", BusSpeed::Fast, i2c)?);
/// ```
pub struct SharedBus<T> {
    name: BusName,
    speed: BusSpeed,
    bus: Mutex<CriticalSectionRawMutex, RefCell<T>>,
    claims: Mutex<CriticalSectionRawMutex, Cell<BusClaims>>,
}

impl<T> SharedBus<T> {
    /// Wrap `bus`, which the HAL has already clocked at `speed`.
    pub fn new(name: &str, speed: BusSpeed, bus: T) -> Result<Self, SensorError> {
        Ok(Self {
            name: bus_name(name)?,
            speed,
            bus: Mutex::new(RefCell::new(bus)),
            claims: Mutex::new(Cell::new(BusClaims::default())),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> BusSpeed {
        self.speed
    }

    /// Number of device handles currently open on this bus.
    pub fn open_handles(&self) -> usize {
        self.claims.lock(|claims| {
            let claims = claims.get();
            claims.shared as usize + claims.exclusive as usize
        })
    }

    fn try_claim(&self, sharing: SharingMode) -> bool {
        self.claims.lock(|claims| {
            let mut current = claims.get();
            let granted = match sharing {
                SharingMode::Shared => !current.exclusive && current.shared < u8::MAX,
                SharingMode::Exclusive => !current.exclusive && current.shared == 0,
            };
            if granted {
                match sharing {
                    SharingMode::Shared => current.shared += 1,
                    SharingMode::Exclusive => current.exclusive = true,
                }
                claims.set(current);
            }
            granted
        })
    }

    fn release(&self, sharing: SharingMode) {
        self.claims.lock(|claims| {
            let mut current = claims.get();
            match sharing {
                SharingMode::Shared => current.shared = current.shared.saturating_sub(1),
                SharingMode::Exclusive => current.exclusive = false,
            }
            claims.set(current);
        });
    }
}

/// Device handle onto a [`SharedBus`], obtained from [`BusRegistry`].
///
/// Dropping the handle releases its claim on the bus.
pub struct SharedI2cDevice<'a, T> {
    bus: &'a SharedBus<T>,
    sharing: SharingMode,
}

impl<T> SharedI2cDevice<'_, T> {
    pub fn sharing(&self) -> SharingMode {
        self.sharing
    }
}

impl<T> Drop for SharedI2cDevice<'_, T> {
    fn drop(&mut self) {
        self.bus.release(self.sharing);
    }
}

impl<T> ErrorType for SharedI2cDevice<'_, T>
where
    T: ErrorType,
{
    type Error = T::Error;
}

impl<T> I2c for SharedI2cDevice<'_, T>
where
    T: I2c,
{
    #[inline]
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.bus.lock(|bus| bus.borrow_mut().read(address, read))
    }

    #[inline]
    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.bus.bus.lock(|bus| bus.borrow_mut().write(address, write))
    }

    #[inline]
    fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.bus
            .bus
            .lock(|bus| bus.borrow_mut().write_read(address, write, read))
    }

    #[inline]
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bus
            .bus
            .lock(|bus| bus.borrow_mut().transaction(address, operations))
    }
}

/// Id for the bus at registration `index`.
fn device_id(index: usize) -> Result<DeviceId, SensorError> {
    u16::try_from(index)
        .map(DeviceId)
        .map_err(|_| SensorError::RegistryFull {
            max: u16::MAX as usize + 1,
        })
}

/// [`BusController`] over a fixed set of [`SharedBus`]es.
///
/// Device ids are registration indices. Opening honours the requested
/// [`SharingMode`] and refuses speeds the bus was not clocked for.
pub struct BusRegistry<'a, T, const N: usize> {
    buses: heapless::Vec<&'a SharedBus<T>, N>,
}

impl<'a, T, const N: usize> BusRegistry<'a, T, N> {
    pub const fn new() -> Self {
        Self {
            buses: heapless::Vec::new(),
        }
    }

    /// Make `bus` discoverable, returning the id enumeration will report.
    pub fn register(&mut self, bus: &'a SharedBus<T>) -> Result<DeviceId, SensorError> {
        let id = device_id(self.buses.len())?;
        self.buses
            .push(bus)
            .map_err(|_| SensorError::RegistryFull { max: N })?;
        debug!("Registered bus '{}' as {:?}", bus.name(), id);
        Ok(id)
    }
}

impl<T, const N: usize> Default for BusRegistry<'_, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T, const N: usize> BusController for BusRegistry<'a, T, N>
where
    T: I2c,
{
    type Device = SharedI2cDevice<'a, T>;

    async fn find_all(&mut self, selector: &DeviceSelector) -> Result<DeviceList, SensorError> {
        let mut found = DeviceList::new();
        // `register` keeps every index within u16.
        for (bus, index) in self.buses.iter().zip(0u16..) {
            if !selector.matches(bus.name()) {
                continue;
            }
            let info = DeviceInfo {
                id: DeviceId(index),
                name: bus.name.clone(),
            };
            // Matches past the list capacity are dropped, earlier ones win.
            if found.push(info).is_err() {
                debug!(
                    "More than {} buses match '{}', keeping the first",
                    found.len(),
                    selector.bus_name()
                );
                break;
            }
        }
        Ok(found)
    }

    async fn open(
        &mut self,
        id: &DeviceId,
        settings: &ConnectionSettings,
    ) -> Result<Option<SharedI2cDevice<'a, T>>, SensorError> {
        let bus: &'a SharedBus<T> = self.buses.get(id.0 as usize).copied().ok_or(
            SensorError::ConnectionFailed {
                details: "Unknown bus device id",
            },
        )?;

        if settings.speed > bus.speed() {
            warn!(
                "Bus '{}' runs at {} kHz, cannot open 0x{:02X} at {} kHz",
                bus.name(),
                bus.speed().frequency_khz(),
                settings.address,
                settings.speed.frequency_khz()
            );
            return Ok(None);
        }

        if !bus.try_claim(settings.sharing) {
            warn!(
                "Bus '{}' is busy, cannot open 0x{:02X} as {:?}",
                bus.name(),
                settings.address,
                settings.sharing
            );
            return Ok(None);
        }

        debug!(
            "Opened 0x{:02X} on '{}' ({:?})",
            settings.address,
            bus.name(),
            settings.sharing
        );
        Ok(Some(SharedI2cDevice {
            bus,
            sharing: settings.sharing,
        }))
    }
}
