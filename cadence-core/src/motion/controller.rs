//! Pulse-mode coordination above the ramp state machine
//!
//! `MotionController` decides what the pulse generator should be doing:
//! nothing, a ramped motion toward a step target, or a constant-rate
//! immediate train driven by the external control input. It owns the ramp
//! tunables and the motion state and translates submissions and pulse
//! edges into generator commands.

use super::merger::{merge_request, Submission};
use super::ramp::RampParameters;
use super::state::{Direction, MotionState};

/// Slowest immediate interval accepted, in raw microseconds
pub const IMMEDIATE_INTERVAL_MIN: u16 = 10;

/// What the pulse generator is currently producing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseMode {
    /// Generator disarmed
    Idle,
    /// Ramped motion toward a step target
    Ramp,
    /// Constant-rate train, retuned live, no target
    Immediate,
}

/// Parameters to arm the pulse generator with
///
/// Intervals are half-periods in the generator's 2 µs tick domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseTrain {
    pub half_period: u16,
    pub width: u16,
    pub direction: Direction,
}

/// Generator command returned from the overflow (rising-edge) handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverflowAction {
    /// Program this half-period for the next pulse
    Retime(u16),
    /// Spurious overflow while idle; disarm
    Stop,
}

/// Outcome of submitting a signed step request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepOutcome {
    /// Train to arm the generator with (a fresh motion started)
    pub arm: Option<PulseTrain>,
    /// Signed steps that could not be absorbed and must be re-submitted
    pub remainder: i32,
}

/// Generator command resulting from an immediate-interval write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImmediateUpdate {
    /// Disarm the generator; `motion_aborted` is set when a ramped motion
    /// was cut short and a stopped notification is owed
    Stop { motion_aborted: bool },
    /// Arm the generator from idle
    Arm(PulseTrain),
    /// Generator already running immediate; new values take effect at the
    /// next overflow
    Retune(PulseTrain),
}

/// Rejected immediate-interval write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImmediateError {
    /// Non-zero interval below the accepted minimum
    OutOfRange,
    /// A ramped motion owns the generator
    RampActive,
}

#[derive(Debug, Default)]
pub struct MotionController {
    ramp: RampParameters,
    state: MotionState,
    mode: PulseMode,
    immediate_half: u16,
    immediate_width: u16,
}

impl Default for PulseMode {
    fn default() -> Self {
        PulseMode::Idle
    }
}

impl MotionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> PulseMode {
        self.mode
    }

    /// Whether the pulse generator is armed in either mode
    pub fn pulses_active(&self) -> bool {
        self.mode != PulseMode::Idle
    }

    pub fn ramp(&self) -> &RampParameters {
        &self.ramp
    }

    /// Mutable ramp access; callers must reject tuning while
    /// `pulses_active()`
    pub fn ramp_mut(&mut self) -> &mut RampParameters {
        &mut self.ramp
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    /// Submit a signed step request
    ///
    /// Starts a motion when idle, merges into a running ramp otherwise.
    /// While an immediate train owns the generator the whole request is
    /// returned as remainder.
    pub fn submit(&mut self, requested_steps: i32) -> StepOutcome {
        if self.mode == PulseMode::Immediate {
            return StepOutcome {
                arm: None,
                remainder: requested_steps,
            };
        }

        match merge_request(&mut self.state, &self.ramp, requested_steps) {
            Submission::StartMotion(steps) => {
                self.state.start(steps, &self.ramp);
                self.mode = PulseMode::Ramp;
                StepOutcome {
                    arm: Some(PulseTrain {
                        half_period: self.ramp.initial_half_period(),
                        width: self.ramp.pulse_width(),
                        direction: self.state.direction,
                    }),
                    remainder: 0,
                }
            }
            Submission::Merged { remainder } => StepOutcome {
                arm: None,
                remainder,
            },
        }
    }

    /// Write to the immediate-interval register
    ///
    /// Zero stops any active pulsing, a running ramp motion included; a
    /// non-zero value arms or retunes a constant-rate train with half the
    /// interval as period and a quarter as width, and is only valid while
    /// idle or already immediate.
    pub fn set_immediate(&mut self, interval: i16) -> Result<ImmediateUpdate, ImmediateError> {
        if interval == 0 {
            let motion_aborted = self.mode == PulseMode::Ramp && self.state.running;
            self.state.stop();
            self.mode = PulseMode::Idle;
            return Ok(ImmediateUpdate::Stop { motion_aborted });
        }

        if self.mode == PulseMode::Ramp {
            return Err(ImmediateError::RampActive);
        }

        let magnitude = interval.unsigned_abs();
        if magnitude < IMMEDIATE_INTERVAL_MIN {
            return Err(ImmediateError::OutOfRange);
        }

        self.immediate_half = magnitude / 2;
        self.immediate_width = magnitude / 4;
        let train = PulseTrain {
            half_period: self.immediate_half,
            width: self.immediate_width,
            direction: Direction::from_steps(interval as i32),
        };

        if self.mode == PulseMode::Immediate {
            Ok(ImmediateUpdate::Retune(train))
        } else {
            self.mode = PulseMode::Immediate;
            Ok(ImmediateUpdate::Arm(train))
        }
    }

    /// Rising-edge handler: advance the ramp or re-read the immediate
    /// interval, returning the half-period for the next pulse
    pub fn on_overflow(&mut self) -> OverflowAction {
        match self.mode {
            PulseMode::Idle => OverflowAction::Stop,
            PulseMode::Ramp => OverflowAction::Retime(self.state.advance_pulse(&self.ramp)),
            PulseMode::Immediate => OverflowAction::Retime(self.immediate_half),
        }
    }

    /// Trailing-edge handler; true when the motion just finished and
    /// exactly one stopped notification is owed
    pub fn on_complete(&mut self) -> bool {
        if self.mode == PulseMode::Ramp && self.state.target_reached() {
            self.state.stop();
            self.mode = PulseMode::Idle;
            return true;
        }
        false
    }

    /// Forced stop: emergency input, motor disable, fault paths
    pub fn stop(&mut self) {
        self.state.stop();
        self.mode = PulseMode::Idle;
    }
}
