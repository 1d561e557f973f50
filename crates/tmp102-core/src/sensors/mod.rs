mod decode;
mod tmp102;

pub use decode::{CELSIUS_PER_LSB, RawTemperature, TemperatureEncoding, decode, decode_signed};
pub use tmp102::{
    CONNECTION_SETTINGS, DriverState, TMP102_ADDRESS, Tmp102, Tmp102Sensor, UNAVAILABLE_SENTINEL,
};
