//! RP2040 board implementation of the hardware seam
//!
//! The pulse generator is a software task; arming and retuning happen
//! through atomics read by that task at pulse edges, so calls from inside
//! the device lock never block.

use embassy_rp::gpio::Output;
use portable_atomic::{AtomicBool, AtomicI16, AtomicU16, Ordering};

use cadence_core::motion::{Direction, PulseTrain};
use cadence_core::traits::Board;

use crate::channels::{ANALOG_TRIGGER, PULSE_KICK};

/// Pulse generator armed flag, cleared to stop the train
pub static PULSE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Half-period of the next pulse, in 2 µs units
pub static PULSE_HALF_PERIOD: AtomicU16 = AtomicU16::new(0);

/// High time of each pulse, in 2 µs units
pub static PULSE_WIDTH: AtomicU16 = AtomicU16::new(0);

/// Quadrature-decoded encoder position, maintained by the encoder task
pub static ENCODER_COUNT: AtomicI16 = AtomicI16::new(0);

/// Motor control outputs on the RP2040
pub struct RpBoard {
    step: Output<'static>,
    dir: Output<'static>,
    enable: Output<'static>,
}

impl RpBoard {
    pub fn new(step: Output<'static>, dir: Output<'static>, enable: Output<'static>) -> Self {
        Self { step, dir, enable }
    }

    /// Rising edge of a step pulse, driven by the pulse task
    pub fn step_high(&mut self) {
        self.step.set_high();
    }

    /// Trailing edge of a step pulse
    pub fn step_low(&mut self) {
        self.step.set_low();
    }
}

impl Board for RpBoard {
    fn arm_pulses(&mut self, train: PulseTrain) {
        PULSE_HALF_PERIOD.store(train.half_period, Ordering::Release);
        PULSE_WIDTH.store(train.width, Ordering::Release);
        PULSE_ACTIVE.store(true, Ordering::Release);
        PULSE_KICK.signal(());
    }

    fn set_half_period(&mut self, half_period: u16) {
        PULSE_HALF_PERIOD.store(half_period, Ordering::Release);
    }

    fn retune_pulses(&mut self, train: PulseTrain) {
        PULSE_HALF_PERIOD.store(train.half_period, Ordering::Release);
        PULSE_WIDTH.store(train.width, Ordering::Release);
    }

    fn stop_pulses(&mut self) {
        PULSE_ACTIVE.store(false, Ordering::Release);
    }

    fn pulses_active(&self) -> bool {
        PULSE_ACTIVE.load(Ordering::Acquire)
    }

    fn set_direction(&mut self, direction: Direction) {
        match direction {
            Direction::Positive => self.dir.set_high(),
            Direction::Negative => self.dir.set_low(),
        }
    }

    fn set_motor_enabled(&mut self, enabled: bool) {
        // Driver enable input is active low
        if enabled {
            self.enable.set_low();
        } else {
            self.enable.set_high();
        }
    }

    fn encoder_count(&self) -> i16 {
        ENCODER_COUNT.load(Ordering::Relaxed)
    }

    fn recenter_encoder(&mut self, value: i16) {
        ENCODER_COUNT.store(value, Ordering::Relaxed);
    }

    fn start_analog_conversion(&mut self) {
        ANALOG_TRIGGER.signal(());
    }
}
