//! Motion state: direction, step counters, and the per-pulse ramp advance
//!
//! The state is owned exclusively by the pulse-level handlers; everything
//! else reads it through snapshots or mutates it through the merger with
//! pulse interrupts masked.

use super::ramp::RampParameters;

/// Motor rotation direction, taken from the sign of a step request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Positive step counts
    Positive,
    /// Negative step counts
    Negative,
}

impl Direction {
    /// Direction implied by a signed step count (zero maps to positive)
    pub fn from_steps(steps: i32) -> Self {
        if steps >= 0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// The opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }

    /// Whether a signed request agrees with this direction
    pub fn matches_sign(self, steps: i32) -> bool {
        match self {
            Direction::Positive => steps > 0,
            Direction::Negative => steps < 0,
        }
    }
}

/// Live state of the current motion
///
/// The interrupt logic only distinguishes "within one ramp of the target,
/// slow down" from "not yet, speed up or cruise" - there is no separate
/// accelerate/cruise state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionState {
    /// A ramp motion is in progress
    pub running: bool,
    /// Current direction
    pub direction: Direction,
    /// Pulses emitted since the motion started
    pub steps_issued: u32,
    /// Total pulses requested (live-mutable through the merger)
    pub steps_target: u32,
    /// Speed is being reduced toward the initial interval
    pub decelerating: bool,
    /// Live half-period, mirroring the pulse generator's period register
    pub current_half_period: u16,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            running: false,
            direction: Direction::Positive,
            steps_issued: 0,
            steps_target: 0,
            decelerating: false,
            current_half_period: 0,
        }
    }
}

impl MotionState {
    /// Steps still to issue
    ///
    /// Wrapping mirrors the unsigned arithmetic of the pulse handler; in
    /// normal operation issued never passes target because the motion
    /// stops at equality.
    pub fn steps_remaining(&self) -> u32 {
        self.steps_target.wrapping_sub(self.steps_issued)
    }

    /// Begin a new motion for a signed step request
    ///
    /// Direction comes from the sign, the target from the magnitude; all
    /// counters reset and the live half-period starts at the slowest
    /// (initial) interval.
    pub fn start(&mut self, requested_steps: i32, params: &RampParameters) {
        self.direction = Direction::from_steps(requested_steps);
        self.steps_target = requested_steps.unsigned_abs();
        self.steps_issued = 0;
        self.decelerating = false;
        self.current_half_period = params.initial_half_period();
        self.running = true;
    }

    /// Stop the motion (voluntary or forced; idempotent)
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance the ramp by one pulse (pulse-generator overflow)
    ///
    /// Counts the step, then decides the ramp direction for this pulse:
    /// decelerate once the remaining steps fit inside one ramp *and* no
    /// longer exceed the steps already issued, otherwise keep moving the
    /// half-period toward the nominal interval. Returns the half-period
    /// to program for the next pulse.
    pub fn advance_pulse(&mut self, params: &RampParameters) -> u16 {
        self.steps_issued = self.steps_issued.wrapping_add(1);
        let remaining = self.steps_remaining();

        if remaining <= self.steps_issued && remaining <= params.ramp_steps() {
            self.decelerating = true;

            if self.current_half_period < params.initial_half_period() {
                self.current_half_period = self
                    .current_half_period
                    .saturating_add(params.step_half_period())
                    .min(params.initial_half_period());
            }
        } else {
            self.decelerating = false;

            if self.current_half_period > params.nominal_half_period() {
                self.current_half_period = self
                    .current_half_period
                    .saturating_sub(params.step_half_period())
                    .max(params.nominal_half_period());
            }
        }

        self.current_half_period
    }

    /// Whether the motion has issued every requested step
    pub fn target_reached(&self) -> bool {
        self.steps_issued == self.steps_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> RampParameters {
        // nominal 125, initial 1000, step 5, ramp_steps 175
        RampParameters::default()
    }

    #[test]
    fn test_start_from_positive_request() {
        let mut state = MotionState::default();
        state.start(1000, &params());

        assert!(state.running);
        assert_eq!(state.direction, Direction::Positive);
        assert_eq!(state.steps_target, 1000);
        assert_eq!(state.steps_issued, 0);
        assert!(!state.decelerating);
        assert_eq!(state.current_half_period, 1000);
    }

    #[test]
    fn test_start_from_negative_request() {
        let mut state = MotionState::default();
        state.start(-250, &params());

        assert_eq!(state.direction, Direction::Negative);
        assert_eq!(state.steps_target, 250);
    }

    #[test]
    fn test_acceleration_steps_down_toward_nominal() {
        let p = params();
        let mut state = MotionState::default();
        state.start(10_000, &p);

        let first = state.advance_pulse(&p);
        assert_eq!(first, 1000 - 5);
        assert!(!state.decelerating);

        let second = state.advance_pulse(&p);
        assert_eq!(second, 1000 - 10);
    }

    #[test]
    fn test_cruise_clamps_at_nominal() {
        let p = params();
        let mut state = MotionState::default();
        state.start(10_000, &p);

        for _ in 0..500 {
            state.advance_pulse(&p);
        }
        assert_eq!(state.current_half_period, p.nominal_half_period());
    }

    #[test]
    fn test_deceleration_clamps_at_initial() {
        let p = params();
        let mut state = MotionState::default();
        state.start(10_000, &p);

        let mut decelerated = false;
        while !state.target_reached() {
            state.advance_pulse(&p);
            if state.decelerating {
                decelerated = true;
            }
        }

        assert!(decelerated);
        assert_eq!(state.current_half_period, p.initial_half_period());
    }

    #[test]
    fn test_short_motion_never_reaches_nominal() {
        let p = params();
        let mut state = MotionState::default();
        // Fewer steps than two full ramps: triangle profile
        state.start(100, &p);

        let mut fastest = u16::MAX;
        while !state.target_reached() {
            fastest = fastest.min(state.advance_pulse(&p));
        }
        assert!(fastest > p.nominal_half_period());
    }

    proptest! {
        /// The live half-period stays inside [nominal, initial] for the
        /// whole of any motion, whatever the step count.
        #[test]
        fn prop_half_period_bounded(steps in 1u32..30_000) {
            let p = params();
            let mut state = MotionState::default();
            state.start(steps as i32, &p);

            while !state.target_reached() {
                let half = state.advance_pulse(&p);
                prop_assert!(half >= p.nominal_half_period());
                prop_assert!(half <= p.initial_half_period());
            }
            prop_assert_eq!(state.steps_issued, steps);
        }
    }
}
