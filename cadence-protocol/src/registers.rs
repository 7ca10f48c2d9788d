//! Application register map and typed payload codec.
//!
//! The application bank occupies addresses 0x20..=0x2A. Every register is a
//! single element of a primitive numeric type; writes are type-checked
//! against this map before the bank ever sees the value.

/// First address of the application register bank
pub const APP_REGS_ADD_MIN: u8 = 0x20;

/// Last address of the application register bank
pub const APP_REGS_ADD_MAX: u8 = 0x2A;

/// CONTROL register bits
pub mod control {
    /// Enable the motor output driver
    pub const ENABLE_MOTOR: u8 = 1 << 0;
    /// Disable the motor output driver
    pub const DISABLE_MOTOR: u8 = 1 << 1;
    /// Enable periodic analog input sampling
    pub const ENABLE_ANALOG_IN: u8 = 1 << 2;
    /// Disable periodic analog input sampling
    pub const DISABLE_ANALOG_IN: u8 = 1 << 3;
    /// Enable quadrature encoder change events
    pub const ENABLE_QUAD_ENCODER: u8 = 1 << 4;
    /// Disable quadrature encoder change events
    pub const DISABLE_QUAD_ENCODER: u8 = 1 << 5;
    /// Re-centre the quadrature encoder (self-clearing, acts immediately)
    pub const RESET_QUAD_ENCODER: u8 = 1 << 6;
}

/// STOP_SWITCH register bit: switch is asserted
pub const B_STOP_SWITCH: u8 = 1 << 0;

/// MOVING register bit: pulse generator is active
pub const B_IS_MOVING: u8 = 1 << 0;

/// Addresses of the application registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterAddress {
    /// Module enable/disable bitmask (see [`control`])
    Control = 0x20,
    /// Signed step request; sign selects direction
    Pulses = 0x21,
    /// Pulse interval at nominal (running) speed, in microseconds
    NominalPulseInterval = 0x22,
    /// Pulse interval at startup, also the slowest interval of a ramp
    InitialPulseInterval = 0x23,
    /// Interval change per pulse while ramping
    PulseStepInterval = 0x24,
    /// Width of each step pulse
    PulsePeriod = 0x25,
    /// Quadrature encoder position (write to re-centre)
    Encoder = 0x26,
    /// Analog input reading (read-only over the host link)
    AnalogInput = 0x27,
    /// Emergency stop switch state (read-only)
    StopSwitch = 0x28,
    /// Motor active flag (read-only)
    Moving = 0x29,
    /// Constant-rate pulse interval; sign selects direction, 0 stops
    ImmediatePulses = 0x2A,
}

impl RegisterAddress {
    /// Look up a register by wire address
    pub fn from_address(address: u8) -> Option<Self> {
        match address {
            0x20 => Some(Self::Control),
            0x21 => Some(Self::Pulses),
            0x22 => Some(Self::NominalPulseInterval),
            0x23 => Some(Self::InitialPulseInterval),
            0x24 => Some(Self::PulseStepInterval),
            0x25 => Some(Self::PulsePeriod),
            0x26 => Some(Self::Encoder),
            0x27 => Some(Self::AnalogInput),
            0x28 => Some(Self::StopSwitch),
            0x29 => Some(Self::Moving),
            0x2A => Some(Self::ImmediatePulses),
            _ => None,
        }
    }

    /// Wire address of this register
    pub fn address(self) -> u8 {
        self as u8
    }

    /// Payload type carried by this register
    pub fn payload_type(self) -> PayloadType {
        match self {
            Self::Control | Self::StopSwitch | Self::Moving => PayloadType::U8,
            Self::Pulses => PayloadType::I32,
            Self::NominalPulseInterval
            | Self::InitialPulseInterval
            | Self::PulseStepInterval
            | Self::PulsePeriod => PayloadType::U16,
            Self::Encoder | Self::AnalogInput | Self::ImmediatePulses => PayloadType::I16,
        }
    }
}

/// Primitive payload types used by the register bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadType {
    U8,
    U16,
    I16,
    I32,
}

impl PayloadType {
    /// Size of one element in bytes
    pub fn size(self) -> usize {
        match self {
            PayloadType::U8 => 1,
            PayloadType::U16 | PayloadType::I16 => 2,
            PayloadType::I32 => 4,
        }
    }

    /// Wire encoding of this payload type (sign flag in bit 7)
    pub fn wire_byte(self) -> u8 {
        match self {
            PayloadType::U8 => 0x01,
            PayloadType::U16 => 0x02,
            PayloadType::I16 => 0x82,
            PayloadType::I32 => 0x84,
        }
    }

    /// Decode a wire payload-type byte
    pub fn from_wire_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(PayloadType::U8),
            0x02 => Some(PayloadType::U16),
            0x82 => Some(PayloadType::I16),
            0x84 => Some(PayloadType::I32),
            _ => None,
        }
    }
}

/// Errors from payload encode/decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueError {
    /// Payload length does not match the element size
    LengthMismatch,
    /// Destination buffer too small for encoding
    BufferTooSmall,
}

/// A typed register value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    U8(u8),
    U16(u16),
    I16(i16),
    I32(i32),
}

impl Value {
    /// Payload type of this value
    pub fn payload_type(self) -> PayloadType {
        match self {
            Value::U8(_) => PayloadType::U8,
            Value::U16(_) => PayloadType::U16,
            Value::I16(_) => PayloadType::I16,
            Value::I32(_) => PayloadType::I32,
        }
    }

    /// Decode a little-endian payload of the given type
    ///
    /// The payload must be exactly one element long; a mismatched length is
    /// a protocol-level rejection, reported before any register sees the
    /// value.
    pub fn decode(payload_type: PayloadType, payload: &[u8]) -> Result<Self, ValueError> {
        if payload.len() != payload_type.size() {
            return Err(ValueError::LengthMismatch);
        }

        Ok(match payload_type {
            PayloadType::U8 => Value::U8(payload[0]),
            PayloadType::U16 => Value::U16(u16::from_le_bytes([payload[0], payload[1]])),
            PayloadType::I16 => Value::I16(i16::from_le_bytes([payload[0], payload[1]])),
            PayloadType::I32 => Value::I32(i32::from_le_bytes([
                payload[0], payload[1], payload[2], payload[3],
            ])),
        })
    }

    /// Encode this value little-endian into a buffer
    ///
    /// Returns the number of bytes written.
    pub fn encode(self, buffer: &mut [u8]) -> Result<usize, ValueError> {
        let size = self.payload_type().size();
        if buffer.len() < size {
            return Err(ValueError::BufferTooSmall);
        }

        match self {
            Value::U8(v) => buffer[0] = v,
            Value::U16(v) => buffer[..2].copy_from_slice(&v.to_le_bytes()),
            Value::I16(v) => buffer[..2].copy_from_slice(&v.to_le_bytes()),
            Value::I32(v) => buffer[..4].copy_from_slice(&v.to_le_bytes()),
        }

        Ok(size)
    }
}
