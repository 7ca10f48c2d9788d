//! Ramp parameter store
//!
//! Holds the four tunable intervals and the derived ramp length. All four
//! registers arrive in microseconds of requested timing; the stored form
//! is **half** the requested value (floor), because the pulse generator
//! counts half-periods. Doubling a stored value recovers the requested
//! timing unit.

/// Accepted raw range for the nominal and initial pulse intervals (µs)
pub const PULSE_INTERVAL_RAW_MIN: u16 = 100;
pub const PULSE_INTERVAL_RAW_MAX: u16 = 20000;

/// Accepted raw range for the per-pulse step interval (µs)
pub const STEP_INTERVAL_RAW_MIN: u16 = 2;
pub const STEP_INTERVAL_RAW_MAX: u16 = 2000;

/// Accepted raw range for the pulse width (µs)
pub const PULSE_WIDTH_RAW_MIN: u16 = 10;
pub const PULSE_WIDTH_RAW_MAX: u16 = 1000;

/// Register reset values (raw, µs)
pub const DEFAULT_NOMINAL_INTERVAL: u16 = 250;
pub const DEFAULT_INITIAL_INTERVAL: u16 = 2000;
pub const DEFAULT_STEP_INTERVAL: u16 = 10;
pub const DEFAULT_PULSE_PERIOD: u16 = 50;

/// A parameter write fell outside its accepted range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange;

/// The four tunable intervals plus the derived ramp length
///
/// `ramp_steps` is the number of pulses needed to move between the
/// initial (slowest) and nominal (fastest) half-periods one step at a
/// time. It is recomputed on every successful parameter write, never
/// during a motion - callers must reject writes while the motor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampParameters {
    nominal_half: u16,
    initial_half: u16,
    step_half: u16,
    width_half: u16,
    ramp_steps: u32,
}

impl Default for RampParameters {
    fn default() -> Self {
        let mut params = Self {
            nominal_half: DEFAULT_NOMINAL_INTERVAL >> 1,
            initial_half: DEFAULT_INITIAL_INTERVAL >> 1,
            step_half: DEFAULT_STEP_INTERVAL >> 1,
            width_half: DEFAULT_PULSE_PERIOD >> 1,
            ramp_steps: 0,
        };
        params.recompute_ramp_steps();
        params
    }
}

impl RampParameters {
    /// Set the pulse interval at nominal (running) speed
    pub fn set_nominal_interval(&mut self, raw_us: u16) -> Result<(), OutOfRange> {
        check_range(raw_us, PULSE_INTERVAL_RAW_MIN, PULSE_INTERVAL_RAW_MAX)?;
        self.nominal_half = raw_us >> 1;
        self.recompute_ramp_steps();
        Ok(())
    }

    /// Set the pulse interval at startup, the slowest interval of a ramp
    pub fn set_initial_interval(&mut self, raw_us: u16) -> Result<(), OutOfRange> {
        check_range(raw_us, PULSE_INTERVAL_RAW_MIN, PULSE_INTERVAL_RAW_MAX)?;
        self.initial_half = raw_us >> 1;
        self.recompute_ramp_steps();
        Ok(())
    }

    /// Set the interval change applied on each pulse while ramping
    pub fn set_step_interval(&mut self, raw_us: u16) -> Result<(), OutOfRange> {
        check_range(raw_us, STEP_INTERVAL_RAW_MIN, STEP_INTERVAL_RAW_MAX)?;
        self.step_half = raw_us >> 1;
        self.recompute_ramp_steps();
        Ok(())
    }

    /// Set the width of each step pulse
    pub fn set_pulse_width(&mut self, raw_us: u16) -> Result<(), OutOfRange> {
        check_range(raw_us, PULSE_WIDTH_RAW_MIN, PULSE_WIDTH_RAW_MAX)?;
        self.width_half = raw_us >> 1;
        self.recompute_ramp_steps();
        Ok(())
    }

    fn recompute_ramp_steps(&mut self) {
        // step_half is at least 1 after halving the minimum raw value of 2.
        // A nominal above initial would be a host configuration error;
        // saturate so the ramp degenerates to zero steps instead of
        // underflowing.
        let span = self.initial_half.saturating_sub(self.nominal_half) as u32;
        self.ramp_steps = span / self.step_half.max(1) as u32;
    }

    /// Half-period at nominal speed (fastest)
    pub fn nominal_half_period(&self) -> u16 {
        self.nominal_half
    }

    /// Half-period at startup (slowest)
    pub fn initial_half_period(&self) -> u16 {
        self.initial_half
    }

    /// Per-pulse half-period delta
    pub fn step_half_period(&self) -> u16 {
        self.step_half
    }

    /// Half pulse width
    pub fn pulse_width(&self) -> u16 {
        self.width_half
    }

    /// Pulses needed to ramp between the slowest and fastest half-periods
    pub fn ramp_steps(&self) -> u32 {
        self.ramp_steps
    }
}

fn check_range(value: u16, min: u16, max: u16) -> Result<(), OutOfRange> {
    if value < min || value > max {
        return Err(OutOfRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let params = RampParameters::default();
        assert_eq!(params.nominal_half_period(), 125);
        assert_eq!(params.initial_half_period(), 1000);
        assert_eq!(params.step_half_period(), 5);
        assert_eq!(params.pulse_width(), 25);
        assert_eq!(params.ramp_steps(), (1000 - 125) / 5);
    }

    #[test]
    fn test_setters_halve_input() {
        let mut params = RampParameters::default();
        params.set_nominal_interval(251).unwrap();
        assert_eq!(params.nominal_half_period(), 125); // floor

        params.set_pulse_width(101).unwrap();
        assert_eq!(params.pulse_width(), 50);
    }

    #[test]
    fn test_ramp_steps_recomputed_on_every_write() {
        let mut params = RampParameters::default();

        params.set_initial_interval(1000).unwrap();
        assert_eq!(params.ramp_steps(), (500 - 125) / 5);

        params.set_step_interval(50).unwrap();
        assert_eq!(params.ramp_steps(), (500 - 125) / 25);

        params.set_nominal_interval(500).unwrap();
        assert_eq!(params.ramp_steps(), (500 - 250) / 25);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut params = RampParameters::default();

        assert_eq!(params.set_nominal_interval(99), Err(OutOfRange));
        assert_eq!(params.set_nominal_interval(20001), Err(OutOfRange));
        assert_eq!(params.set_initial_interval(0), Err(OutOfRange));
        assert_eq!(params.set_step_interval(1), Err(OutOfRange));
        assert_eq!(params.set_step_interval(2001), Err(OutOfRange));
        assert_eq!(params.set_pulse_width(9), Err(OutOfRange));
        assert_eq!(params.set_pulse_width(1001), Err(OutOfRange));

        // A rejected write leaves everything untouched
        assert_eq!(params, RampParameters::default());
    }

    #[test]
    fn test_boundary_values_accepted() {
        let mut params = RampParameters::default();
        assert!(params.set_nominal_interval(100).is_ok());
        assert!(params.set_initial_interval(20000).is_ok());
        assert!(params.set_step_interval(2).is_ok());
        assert!(params.set_pulse_width(1000).is_ok());
    }

    #[test]
    fn test_zero_length_ramp() {
        let mut params = RampParameters::default();
        params.set_initial_interval(250).unwrap();
        // initial == nominal: no ramp at all
        assert_eq!(params.ramp_steps(), 0);
    }

    proptest! {
        #[test]
        fn prop_ramp_steps_is_floor_division(
            nominal in PULSE_INTERVAL_RAW_MIN..=PULSE_INTERVAL_RAW_MAX,
            initial in PULSE_INTERVAL_RAW_MIN..=PULSE_INTERVAL_RAW_MAX,
            step in STEP_INTERVAL_RAW_MIN..=STEP_INTERVAL_RAW_MAX,
        ) {
            prop_assume!(initial >= nominal);

            let mut params = RampParameters::default();
            params.set_nominal_interval(nominal).unwrap();
            params.set_initial_interval(initial).unwrap();
            params.set_step_interval(step).unwrap();

            let expected =
                ((initial >> 1) - (nominal >> 1)) as u32 / ((step >> 1).max(1)) as u32;
            prop_assert_eq!(params.ramp_steps(), expected);
        }
    }
}
