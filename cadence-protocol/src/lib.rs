//! Host-link protocol for the Cadence stepper controller.
//!
//! This crate defines the serial register protocol between the controller
//! board and its host: the application register map, the typed payload
//! codec, the message framing, and the parsers for the auxiliary
//! external-control input.
//!
//! # Message overview
//!
//! All host traffic uses a simple binary frame:
//! ```text
//! ┌──────┬────────┬─────────┬──────┬──────────────┬─────────┬──────────┐
//! │ TYPE │ LENGTH │ ADDRESS │ PORT │ PAYLOAD TYPE │ PAYLOAD │ CHECKSUM │
//! │ 1B   │ 1B     │ 1B      │ 1B   │ 1B           │ 0–8B    │ 1B       │
//! └──────┴────────┴─────────┴──────┴──────────────┴─────────┴──────────┘
//! ```
//!
//! The device is a "dumb register bank" over the wire - the host reads and
//! writes addressed registers, and the device pushes event frames when
//! register values change on their own (motor stopped, encoder moved,
//! stop switch toggled, analog sample ready).

#![no_std]
#![deny(unsafe_code)]

pub mod external;
pub mod frame;
pub mod registers;

pub use external::{ExternalParser, SingleByteParser, TwoByteLeParser};
pub use frame::{Frame, FrameError, FrameParser, MessageType, MAX_PAYLOAD_SIZE};
pub use registers::{PayloadType, RegisterAddress, Value, ValueError};
