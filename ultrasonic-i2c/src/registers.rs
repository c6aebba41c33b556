//! Register map of the ultrasonic module's onboard controller.
//!
//! The controller exposes three byte-addressed registers. Writing the
//! `Command` address with no payload starts a ping; the two result
//! registers hold 16-bit little-endian values.

/// Default 7-bit bus address of the module.
pub const DEFAULT_ADDRESS: u8 = 0x34;

/// Highest valid 7-bit address.
pub const MAX_ADDRESS: u8 = 0x7F;

/// Register addresses of the module.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Write-only. Sending the address alone triggers a measurement.
    Command = 0x00,
    /// Last measured distance in centimeters.
    Distance = 0x01,
    /// Last echo pulse width in microseconds.
    Duration = 0x02,
}

impl From<Register> for u8 {
    fn from(r: Register) -> Self {
        r as u8
    }
}

/// Decode a result register payload.
pub fn decode_u16_le(buffer: [u8; 2]) -> u16 {
    u16::from_le_bytes(buffer)
}

/// Both result registers as read after one trigger.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawMeasurement {
    pub distance_cm: u16,
    pub duration_us: u16,
}

impl RawMeasurement {
    /// A zero distance is the module's "no echo yet" sentinel.
    pub fn is_valid(&self) -> bool {
        self.distance_cm > 0
    }

    pub fn distance(&self) -> f32 {
        f32::from(self.distance_cm)
    }
}
