//! Trapezoidal speed-ramp motion control
//!
//! The ramp is table-free: every pulse moves the live half-period one
//! step toward the nominal (fast) or initial (slow) interval, based only
//! on how many steps remain. That keeps the deceleration point correct
//! even when the target is being changed mid-motion.

pub mod controller;
pub mod merger;
pub mod ramp;
pub mod state;

pub use controller::{
    ImmediateError, ImmediateUpdate, MotionController, OverflowAction, PulseMode, PulseTrain,
    StepOutcome,
};
pub use merger::{merge_request, Submission};
pub use ramp::{OutOfRange, RampParameters};
pub use state::{Direction, MotionState};
