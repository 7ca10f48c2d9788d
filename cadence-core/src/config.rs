//! Device variant configuration
//!
//! The same core runs on two board variants that differ only in identity
//! and in the wire format of the external-control serial input.

use cadence_protocol::external::{ExternalParser, SingleByteParser, TwoByteLeParser};

/// Hardware version reported to the host
pub const HW_VERSION: (u8, u8) = (1, 0);

/// Firmware version reported to the host
pub const FW_VERSION: (u8, u8) = (1, 0);

/// Board variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceVariant {
    /// High-rate bench stepper controller
    FastStepper,
    /// Vestibular VR rig motor controller (H2 revision)
    VestibularVrH2,
}

impl DeviceVariant {
    /// Device name reported during the host handshake
    pub fn name(self) -> &'static str {
        match self {
            DeviceVariant::FastStepper => "FastStepper",
            DeviceVariant::VestibularVrH2 => "VestibularVrH2",
        }
    }

    /// Harp who-am-I identity
    pub fn who_am_i(self) -> u16 {
        match self {
            DeviceVariant::FastStepper => 2120,
            DeviceVariant::VestibularVrH2 => 0,
        }
    }

    /// Parser for the external-control serial input
    ///
    /// The two variants never agreed on a format; the difference is kept
    /// as configuration.
    pub fn external_parser(self) -> ExternalParser {
        match self {
            DeviceVariant::FastStepper => ExternalParser::TwoByteLe(TwoByteLeParser::default()),
            DeviceVariant::VestibularVrH2 => ExternalParser::SingleByte(SingleByteParser),
        }
    }
}
