//! Board hardware seam
//!
//! Everything the device logic needs from the hardware behind one trait,
//! so the whole state machine runs against a mock on the host.

use crate::motion::{Direction, PulseTrain};

/// Hardware operations required by the device logic
///
/// Pulse-train timing values are half-periods in the generator's 2 µs
/// tick domain, as stored by the ramp parameters.
pub trait Board {
    /// Arm the pulse generator with a fresh train
    fn arm_pulses(&mut self, train: PulseTrain);

    /// Update the half-period for the next pulse of a running train
    fn set_half_period(&mut self, half_period: u16);

    /// Update period and width of a running train at the next overflow
    fn retune_pulses(&mut self, train: PulseTrain);

    /// Disarm the pulse generator, finishing any in-flight pulse
    fn stop_pulses(&mut self);

    /// Whether the generator is armed
    fn pulses_active(&self) -> bool;

    /// Drive the direction output
    ///
    /// Only called immediately before arming, never mid-train.
    fn set_direction(&mut self, direction: Direction);

    /// Drive the motor driver enable output
    fn set_motor_enabled(&mut self, enabled: bool);

    /// Current quadrature-decoded encoder count
    fn encoder_count(&self) -> i16;

    /// Re-centre the encoder counter on a written value
    fn recenter_encoder(&mut self, value: i16);

    /// Kick off an analog conversion; the sample arrives asynchronously
    fn start_analog_conversion(&mut self);
}
