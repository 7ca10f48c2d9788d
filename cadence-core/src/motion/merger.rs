//! Merging of step requests into an in-flight motion
//!
//! A request arriving while the motor is idle simply starts a motion. A
//! request arriving mid-motion is folded into the live target where the
//! ramp allows it, and any part that cannot be absorbed safely is handed
//! back to the caller for re-submission once the motor stops.

use super::ramp::RampParameters;
use super::state::MotionState;

/// Outcome of submitting a step request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Submission {
    /// Motor was idle; the caller must start a fresh motion for this count
    StartMotion(i32),
    /// Request folded into the running motion; `remainder` is the signed
    /// part that could not be absorbed (zero when fully merged)
    Merged { remainder: i32 },
}

/// Fold a signed step request into the current motion
///
/// Must run with pulse handling masked, since it mutates the live target.
///
/// Same-direction requests extend the target by the request's magnitude.
/// Opposite-direction requests can only shorten the motion down to the
/// point where a full deceleration ramp still fits; whatever cannot be
/// removed is returned as a remainder carrying the request's sign. While
/// already decelerating, or before the first ramp has completed, nothing
/// is removed at all.
pub fn merge_request(
    state: &mut MotionState,
    params: &RampParameters,
    requested_steps: i32,
) -> Submission {
    if requested_steps == 0 {
        return Submission::Merged { remainder: 0 };
    }

    if !state.running {
        return Submission::StartMotion(requested_steps);
    }

    let magnitude = requested_steps.unsigned_abs();

    if state.direction.matches_sign(requested_steps) {
        // Extending is always safe. The add intentionally wraps, matching
        // the unsigned target arithmetic of the pulse handler.
        state.steps_target = state.steps_target.wrapping_add(magnitude);
        return Submission::Merged { remainder: 0 };
    }

    // Opposite direction. While slowing down, or before one full ramp of
    // steps has been issued, the target cannot move without breaking the
    // deceleration profile.
    if state.decelerating || state.steps_issued <= params.ramp_steps() {
        return Submission::Merged {
            remainder: requested_steps,
        };
    }

    // Steps that can be removed while still leaving room to decelerate
    let available = state
        .steps_remaining()
        .saturating_sub(params.ramp_steps())
        .saturating_sub(1);
    let removed = magnitude.min(available);
    state.steps_target = state.steps_target.wrapping_sub(removed);

    // A fully deferred i32::MIN request leaves a leftover of 2^31, which
    // has no positive i32 form; wrapping negation maps it back onto the
    // request itself.
    let leftover = (magnitude - removed) as i32;
    Submission::Merged {
        remainder: if requested_steps > 0 {
            leftover
        } else {
            leftover.wrapping_neg()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> RampParameters {
        let mut p = RampParameters::default();
        // ramp of 50 steps: (600 - 100) / 10 in raw microseconds
        p.set_nominal_interval(100).unwrap();
        p.set_initial_interval(600).unwrap();
        p.set_step_interval(10).unwrap();
        assert_eq!(p.ramp_steps(), 50);
        p
    }

    fn running(target: u32, issued: u32, decelerating: bool) -> MotionState {
        let p = params();
        let mut state = MotionState::default();
        state.start(target as i32, &p);
        state.steps_issued = issued;
        state.decelerating = decelerating;
        state
    }

    #[test]
    fn test_idle_starts_motion() {
        let p = params();
        let mut state = MotionState::default();
        assert_eq!(
            merge_request(&mut state, &p, -300),
            Submission::StartMotion(-300)
        );
        assert!(!state.running);
    }

    #[test]
    fn test_zero_request_is_noop() {
        let p = params();
        let mut state = running(1000, 200, false);
        assert_eq!(
            merge_request(&mut state, &p, 0),
            Submission::Merged { remainder: 0 }
        );
        assert_eq!(state.steps_target, 1000);
    }

    #[test]
    fn test_same_direction_extends_target() {
        let p = params();
        let mut state = running(1000, 200, false);
        assert_eq!(
            merge_request(&mut state, &p, 50),
            Submission::Merged { remainder: 0 }
        );
        assert_eq!(state.steps_target, 1050);
    }

    #[test]
    fn test_same_direction_add_wraps() {
        let p = params();
        let mut state = running(1000, 200, false);
        state.steps_target = u32::MAX - 10;
        merge_request(&mut state, &p, 50);
        assert_eq!(state.steps_target, (u32::MAX - 10).wrapping_add(50));
    }

    #[test]
    fn test_opposite_while_decelerating_defers_everything() {
        let p = params();
        let mut state = running(1000, 990, true);
        assert_eq!(
            merge_request(&mut state, &p, -5),
            Submission::Merged { remainder: -5 }
        );
        assert_eq!(state.steps_target, 1000);
    }

    #[test]
    fn test_opposite_within_first_ramp_defers_everything() {
        let p = params();
        let mut state = running(1000, 30, false);
        assert_eq!(
            merge_request(&mut state, &p, -200),
            Submission::Merged { remainder: -200 }
        );
        assert_eq!(state.steps_target, 1000);
    }

    #[test]
    fn test_opposite_fully_absorbed() {
        let p = params();
        let mut state = running(1000, 400, false);
        // remaining 600, ramp 50: 549 removable
        assert_eq!(
            merge_request(&mut state, &p, -300),
            Submission::Merged { remainder: 0 }
        );
        assert_eq!(state.steps_target, 700);
    }

    #[test]
    fn test_opposite_partially_absorbed() {
        let p = params();
        let mut state = running(1000, 400, false);
        assert_eq!(
            merge_request(&mut state, &p, -600),
            Submission::Merged { remainder: -51 }
        );
        assert_eq!(state.steps_target, 451);
    }

    #[test]
    fn test_opposite_against_negative_motion() {
        let p = params();
        let mut state = running(1000, 400, false);
        state.direction = state.direction.opposite();
        // Motion is now negative, so a positive request shortens it and
        // the remainder keeps the positive sign.
        assert_eq!(
            merge_request(&mut state, &p, 600),
            Submission::Merged { remainder: 51 }
        );
        assert_eq!(state.steps_target, 451);
    }

    #[test]
    fn test_nothing_removable_returns_whole_request() {
        let p = params();
        // remaining 51 = ramp + 1: available is zero
        let mut state = running(1000, 949, false);
        assert_eq!(
            merge_request(&mut state, &p, -40),
            Submission::Merged { remainder: -40 }
        );
        assert_eq!(state.steps_target, 1000);
    }

    #[test]
    fn test_min_request_deferred_intact() {
        let p = params();
        // remaining 51 = ramp + 1: nothing removable, the whole request
        // comes back at the signed boundary
        let mut state = running(1000, 949, false);
        assert_eq!(
            merge_request(&mut state, &p, i32::MIN),
            Submission::Merged { remainder: i32::MIN }
        );
        assert_eq!(state.steps_target, 1000);
    }

    #[test]
    fn test_min_request_partially_absorbed() {
        let p = params();
        let mut state = running(1000, 400, false);
        // 549 removable out of 2^31
        assert_eq!(
            merge_request(&mut state, &p, i32::MIN),
            Submission::Merged { remainder: i32::MIN + 549 }
        );
        assert_eq!(state.steps_target, 451);
    }

    proptest! {
        /// Nothing is lost in a merge: the change to the live target plus
        /// the returned remainder always accounts for the whole request,
        /// and a non-zero remainder keeps the request's sign.
        #[test]
        fn prop_merge_conserves_request_magnitude(
            target in 1u32..1_000_000,
            issued in 0u32..1_000_000,
            decelerating: bool,
            request: i32,
        ) {
            prop_assume!(issued <= target);
            let p = params();
            let mut state = running(target, issued, decelerating);
            let before = state.steps_target;

            match merge_request(&mut state, &p, request) {
                Submission::StartMotion(_) => {
                    prop_assert!(false, "motion was running");
                }
                Submission::Merged { remainder } => {
                    let absorbed = before.abs_diff(state.steps_target);
                    prop_assert_eq!(
                        absorbed + remainder.unsigned_abs(),
                        request.unsigned_abs()
                    );
                    if remainder != 0 {
                        prop_assert_eq!(remainder.signum(), request.signum());
                    }
                }
            }
        }
    }
}
