//! TMP102 temperature register decoding
//!
//! The register is read as two bytes: `byte0` carries bits 11..4 of the
//! reading and the upper nibble of `byte1` carries bits 3..0. One LSB is
//! 1/16 °C.

use serde::{Deserialize, Serialize};

/// Degrees Celsius per LSB of the temperature register.
pub const CELSIUS_PER_LSB: f32 = 0.0625;

/// Bit 11, the sign of the 12-bit register.
const SIGN_BIT: u16 = 0x800;

/// How the 12-bit register value is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureEncoding {
    /// Plain 12-bit magnitude. Readings below 0 °C wrap to values near 256 °C.
    #[default]
    Unsigned,
    /// 12-bit two's complement, as the part actually reports it.
    TwosComplement,
}

/// A 12-bit temperature sample, bits 15..12 always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTemperature(u16);

impl RawTemperature {
    pub const fn from_bytes(byte0: u8, byte1: u8) -> Self {
        Self(((byte0 as u16) << 4) | ((byte1 as u16) >> 4))
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Sign-extended register value.
    pub const fn signed(self) -> i16 {
        if self.0 & SIGN_BIT != 0 {
            self.0 as i16 - 0x1000
        } else {
            self.0 as i16
        }
    }

    pub fn celsius(self, encoding: TemperatureEncoding) -> f32 {
        match encoding {
            TemperatureEncoding::Unsigned => self.0 as f32 * CELSIUS_PER_LSB,
            TemperatureEncoding::TwosComplement => self.signed() as f32 * CELSIUS_PER_LSB,
        }
    }
}

/// Decode a register read as an unsigned 12-bit magnitude.
pub fn decode(byte0: u8, byte1: u8) -> f32 {
    RawTemperature::from_bytes(byte0, byte1).celsius(TemperatureEncoding::Unsigned)
}

/// Decode a register read as 12-bit two's complement.
pub fn decode_signed(byte0: u8, byte1: u8) -> f32 {
    RawTemperature::from_bytes(byte0, byte1).celsius(TemperatureEncoding::TwosComplement)
}
