//! Register-bank support types
//!
//! The register dispatch itself lives on [`crate::device::Device`]; this
//! module holds the write-error taxonomy and the control-flag staging
//! used by the CONTROL register.

use cadence_protocol::registers::control;

/// Why a register write was refused
///
/// The first three are protocol-level failures detected while decoding
/// the request; the rest are per-register validation failures. A refused
/// write mutates nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// Address outside the application bank
    UnknownRegister,
    /// Payload type byte does not match the register
    TypeMismatch,
    /// Payload length does not match the payload type
    LengthMismatch,
    /// Register is not writable
    ReadOnly,
    /// Value outside the register's accepted range
    OutOfRange,
    /// Register is locked while pulses are being generated
    MotorRunning,
}

/// Motor enable/disable request carried by a control mask, if any
///
/// The enable output follows this at write time, ahead of the staged
/// commit of the remaining flags.
pub fn motor_request(mask: u8) -> Option<bool> {
    if mask & control::ENABLE_MOTOR != 0 {
        Some(true)
    } else if mask & control::DISABLE_MOTOR != 0 {
        Some(false)
    } else {
        None
    }
}

/// Staged CONTROL flags
///
/// Host writes land in `staged` and take effect at the next control
/// commit tick; reads produce a normalized mask with exactly one bit of
/// each enable/disable pair set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlFlags {
    staged: u8,
    pub motor_enabled: bool,
    pub analog_input_enabled: bool,
    pub quad_encoder_enabled: bool,
}

impl Default for ControlFlags {
    fn default() -> Self {
        let mut flags = Self {
            staged: 0,
            motor_enabled: false,
            analog_input_enabled: false,
            quad_encoder_enabled: false,
        };
        flags.staged = flags.normalized();
        flags
    }
}

impl ControlFlags {
    /// Record a host write; flags change at the next [`commit`](Self::commit)
    pub fn stage(&mut self, mask: u8) {
        self.staged = mask;
    }

    /// The raw staged mask
    pub fn staged(&self) -> u8 {
        self.staged
    }

    /// Apply the staged mask to the live flags
    ///
    /// For each pair the enable bit wins over the disable bit; a pair
    /// with neither bit set leaves its flag unchanged. Idempotent.
    pub fn commit(&mut self) {
        if self.staged & control::ENABLE_MOTOR != 0 {
            self.motor_enabled = true;
        } else if self.staged & control::DISABLE_MOTOR != 0 {
            self.motor_enabled = false;
        }

        if self.staged & control::ENABLE_ANALOG_IN != 0 {
            self.analog_input_enabled = true;
        } else if self.staged & control::DISABLE_ANALOG_IN != 0 {
            self.analog_input_enabled = false;
        }

        if self.staged & control::ENABLE_QUAD_ENCODER != 0 {
            self.quad_encoder_enabled = true;
        } else if self.staged & control::DISABLE_QUAD_ENCODER != 0 {
            self.quad_encoder_enabled = false;
        }
    }

    /// Clear the motor flag outside the write path (emergency and fault
    /// stops) and re-stage so the next commit cannot re-enable it
    pub fn force_motor_off(&mut self) {
        self.motor_enabled = false;
        self.staged = self.normalized();
    }

    /// Read-back mask with one bit of each pair set from the live flags
    pub fn normalized(&self) -> u8 {
        let mut mask = 0;
        mask |= if self.motor_enabled {
            control::ENABLE_MOTOR
        } else {
            control::DISABLE_MOTOR
        };
        mask |= if self.analog_input_enabled {
            control::ENABLE_ANALOG_IN
        } else {
            control::DISABLE_ANALOG_IN
        };
        mask |= if self.quad_encoder_enabled {
            control::ENABLE_QUAD_ENCODER
        } else {
            control::DISABLE_QUAD_ENCODER
        };
        mask
    }
}
