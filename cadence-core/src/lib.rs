//! Board-agnostic core logic for the Cadence stepper controller firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction trait (pulse generator, motor outputs, encoder)
//! - Trapezoidal speed-ramp motion control
//! - Step-request merging against live motion state
//! - Register bank with typed dispatch and control-flag staging
//! - Device variant configuration

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod device;
pub mod events;
pub mod motion;
pub mod registers;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_utils;
