//! Full lifecycle: construct, begin, read.

use embassy_futures::block_on;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

use tmp102_core::bus::{
    BusController, BusRegistry, BusSpeed, ConnectionSettings, DeviceId, DeviceInfo, DeviceList,
    DeviceSelector, MAX_BUS_DEVICES, SharedBus, bus_name,
};
use tmp102_core::sensors::{TMP102_ADDRESS, UNAVAILABLE_SENTINEL};
use tmp102_core::{SensorError, Tmp102};

/// Reports a single bus and hands out one scripted device.
struct OneBus {
    device: Option<I2cMock>,
    find_calls: usize,
    open_calls: usize,
}

impl OneBus {
    fn new(device: Option<I2cMock>) -> Self {
        Self {
            device,
            find_calls: 0,
            open_calls: 0,
        }
    }
}

impl BusController for OneBus {
    type Device = I2cMock;

    async fn find_all(&mut self, selector: &DeviceSelector) -> Result<DeviceList, SensorError> {
        self.find_calls += 1;
        let mut found = DeviceList::new();
        if selector.matches("I2C1") {
            found
                .push(DeviceInfo {
                    id: DeviceId(0),
                    name: bus_name("I2C1")?,
                })
                .unwrap();
        }
        Ok(found)
    }

    async fn open(
        &mut self,
        _id: &DeviceId,
        _settings: &ConnectionSettings,
    ) -> Result<Option<I2cMock>, SensorError> {
        self.open_calls += 1;
        Ok(self.device.take())
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_begin_then_read_room_temperature() {
    init_logger();
    let mut i2c = I2cMock::new(&[
        I2cTransaction::read(TMP102_ADDRESS, vec![0x19, 0x00]),
        I2cTransaction::read(TMP102_ADDRESS, vec![0x19, 0x00]),
    ]);
    let mut controller = OneBus::new(Some(i2c.clone()));
    let mut sensor = Tmp102::new("I2C1").unwrap();

    assert_eq!(block_on(sensor.begin(&mut controller)), Ok(true));
    assert!(sensor.is_available());
    assert_eq!(sensor.temperature(), Ok(25.0));
    assert_eq!((controller.find_calls, controller.open_calls), (1, 1));

    drop(sensor);
    i2c.done();
}

#[test]
fn test_unavailable_sensor_never_touches_the_bus() {
    init_logger();
    let mut controller = OneBus::new(None);
    let mut sensor = Tmp102::new("I2C1").unwrap();

    assert_eq!(block_on(sensor.begin(&mut controller)), Ok(false));
    for _ in 0..3 {
        assert_eq!(sensor.temperature(), Ok(UNAVAILABLE_SENTINEL));
    }
    assert_eq!(controller.open_calls, 1);
}

#[test]
fn test_probe_failure_resolves_false() {
    init_logger();
    let mut i2c = I2cMock::new(&[
        I2cTransaction::read(TMP102_ADDRESS, vec![0x00, 0x00]).with_error(ErrorKind::Bus)
    ]);
    let mut controller = OneBus::new(Some(i2c.clone()));
    let mut sensor = Tmp102::new("I2C1").unwrap();

    assert_eq!(block_on(sensor.begin(&mut controller)), Ok(false));
    assert_eq!(sensor.temperature(), Ok(UNAVAILABLE_SENTINEL));
    i2c.done();
}

#[test]
fn test_unknown_bus_is_reported() {
    init_logger();
    let mut controller = OneBus::new(None);
    let mut sensor = Tmp102::<I2cMock>::new("I2C5").unwrap();

    let result = block_on(sensor.begin(&mut controller));
    assert!(matches!(result, Err(SensorError::NoBusDeviceFound { .. })));
    assert_eq!(controller.open_calls, 0);
    assert!(!sensor.is_available());
}

#[test]
fn test_shared_bus_registry_end_to_end() {
    init_logger();
    let mut i2c = I2cMock::new(&[
        I2cTransaction::read(TMP102_ADDRESS, vec![0x19, 0x00]),
        I2cTransaction::read(TMP102_ADDRESS, vec![0x1A, 0x80]),
    ]);
    let bus = SharedBus::new("I2C1", BusSpeed::Fast, i2c.clone()).unwrap();
    let mut registry = BusRegistry::<_, 2>::new();
    registry.register(&bus).unwrap();

    let mut sensor = Tmp102::new("I2C1").unwrap();
    assert_eq!(block_on(sensor.begin(&mut registry)), Ok(true));
    assert_eq!(bus.open_handles(), 1);
    assert_eq!(sensor.temperature(), Ok(26.5));

    drop(sensor.release());
    assert_eq!(bus.open_handles(), 0);
    i2c.done();
}

#[test]
fn test_exclusive_holder_blocks_the_sensor() {
    init_logger();
    let mut i2c = I2cMock::new(&[]);
    let bus = SharedBus::new("I2C1", BusSpeed::Fast, i2c.clone()).unwrap();
    let mut registry = BusRegistry::<_, 1>::new();
    let id = registry.register(&bus).unwrap();

    let holder = block_on(registry.open(&id, &ConnectionSettings::new(0x40)))
        .unwrap()
        .unwrap();

    let mut sensor = Tmp102::new("I2C1").unwrap();
    assert_eq!(block_on(sensor.begin(&mut registry)), Ok(false));
    assert_eq!(sensor.temperature(), Ok(UNAVAILABLE_SENTINEL));

    drop(holder);
    i2c.done();
}

#[test]
fn test_standard_speed_bus_cannot_host_the_sensor() {
    init_logger();
    let mut i2c = I2cMock::new(&[]);
    let bus = SharedBus::new("I2C1", BusSpeed::Standard, i2c.clone()).unwrap();
    let mut registry = BusRegistry::<_, 1>::new();
    registry.register(&bus).unwrap();

    let mut sensor = Tmp102::new("I2C1").unwrap();
    assert_eq!(block_on(sensor.begin(&mut registry)), Ok(false));
    assert_eq!(bus.open_handles(), 0);
    i2c.done();
}

#[test]
fn test_begin_picks_first_of_many_matching_buses() {
    init_logger();
    let mut i2c = I2cMock::new(&[I2cTransaction::read(TMP102_ADDRESS, vec![0x19, 0x00])]);
    let buses: Vec<_> = (0..MAX_BUS_DEVICES + 1)
        .map(|_| SharedBus::new("I2C1", BusSpeed::Fast, i2c.clone()).unwrap())
        .collect();
    let mut registry = BusRegistry::<_, 8>::new();
    for bus in &buses {
        registry.register(bus).unwrap();
    }

    let mut sensor = Tmp102::new("I2C1").unwrap();
    assert_eq!(block_on(sensor.begin(&mut registry)), Ok(true));
    assert_eq!(buses[0].open_handles(), 1);
    assert!(buses[1..].iter().all(|bus| bus.open_handles() == 0));

    drop(sensor);
    i2c.done();
}
