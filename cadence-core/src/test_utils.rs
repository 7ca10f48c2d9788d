//! Test doubles shared by the core test modules

use crate::motion::{Direction, PulseTrain};
use crate::traits::Board;

/// Board double recording every hardware call
#[derive(Debug)]
pub struct MockBoard {
    pub active: bool,
    pub armed_train: Option<PulseTrain>,
    pub last_half_period: Option<u16>,
    pub retuned_train: Option<PulseTrain>,
    pub direction: Option<Direction>,
    pub motor_enabled: bool,
    pub encoder: i16,
    pub conversions_started: u32,
    pub stop_calls: u32,
}

impl Default for MockBoard {
    fn default() -> Self {
        Self {
            active: false,
            armed_train: None,
            last_half_period: None,
            retuned_train: None,
            direction: None,
            motor_enabled: false,
            encoder: 0,
            conversions_started: 0,
            stop_calls: 0,
        }
    }
}

impl Board for MockBoard {
    fn arm_pulses(&mut self, train: PulseTrain) {
        self.armed_train = Some(train);
        self.active = true;
    }

    fn set_half_period(&mut self, half_period: u16) {
        self.last_half_period = Some(half_period);
    }

    fn retune_pulses(&mut self, train: PulseTrain) {
        self.retuned_train = Some(train);
    }

    fn stop_pulses(&mut self) {
        self.active = false;
        self.stop_calls += 1;
    }

    fn pulses_active(&self) -> bool {
        self.active
    }

    fn set_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
    }

    fn set_motor_enabled(&mut self, enabled: bool) {
        self.motor_enabled = enabled;
    }

    fn encoder_count(&self) -> i16 {
        self.encoder
    }

    fn recenter_encoder(&mut self, value: i16) {
        self.encoder = value;
    }

    fn start_analog_conversion(&mut self) {
        self.conversions_started += 1;
    }
}
