//! The device object: single access path to all mutable firmware state
//!
//! Every handler that used to be a free-running interrupt routine is a
//! method here. The firmware wraps one `Device` in a critical-section
//! mutex; whoever holds the lock holds the interrupt mask, so methods
//! can assume exclusive access and stay free of interior atomics.

use heapless::Vec;

use cadence_protocol::external::ExternalParser;
use cadence_protocol::registers::{RegisterAddress, Value};

use crate::config::DeviceVariant;
use crate::events::Event;
use crate::motion::{ImmediateError, ImmediateUpdate, MotionController, OverflowAction};
use crate::registers::{motor_request, ControlFlags, WriteError};
use crate::traits::Board;

/// Most events a single 1 ms tick can produce
pub const MAX_TICK_EVENTS: usize = 4;

/// Event batch returned by the periodic handlers
pub type EventBatch = Vec<Event, MAX_TICK_EVENTS>;

/// Complete device state over a hardware seam
pub struct Device<B: Board> {
    board: B,
    variant: DeviceVariant,
    control: ControlFlags,
    controller: MotionController,
    external: ExternalParser,

    /// Signed steps accepted from the host but not yet merged into a motion
    pending_steps: i32,
    /// Last host-written step request, read back verbatim
    pulses_mirror: i32,
    /// Encoder count at the previous 1 ms tick
    last_encoder: i16,
    analog_mirror: i16,
    immediate_mirror: i16,
    stop_switch: bool,
    /// Motion finished; MOVING-cleared notification owed at the next tick
    stopped_pending: bool,

    nominal_raw: u16,
    initial_raw: u16,
    step_raw: u16,
    width_raw: u16,
}

impl<B: Board> Device<B> {
    pub fn new(variant: DeviceVariant, board: B) -> Self {
        let controller = MotionController::new();
        Self {
            board,
            variant,
            control: ControlFlags::default(),
            external: variant.external_parser(),
            pending_steps: 0,
            pulses_mirror: 0,
            last_encoder: 0,
            analog_mirror: 0,
            immediate_mirror: 0,
            stop_switch: false,
            stopped_pending: false,
            nominal_raw: crate::motion::ramp::DEFAULT_NOMINAL_INTERVAL,
            initial_raw: crate::motion::ramp::DEFAULT_INITIAL_INTERVAL,
            step_raw: crate::motion::ramp::DEFAULT_STEP_INTERVAL,
            width_raw: crate::motion::ramp::DEFAULT_PULSE_PERIOD,
            controller,
        }
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Whether the pulse generator is producing steps, in either mode
    pub fn is_moving(&self) -> bool {
        self.controller.pulses_active()
    }

    // --- host register access -------------------------------------------

    /// Read any application register
    pub fn read_register(&self, address: RegisterAddress) -> Value {
        match address {
            RegisterAddress::Control => Value::U8(self.control.normalized()),
            RegisterAddress::Pulses => Value::I32(self.pulses_mirror),
            RegisterAddress::NominalPulseInterval => Value::U16(self.nominal_raw),
            RegisterAddress::InitialPulseInterval => Value::U16(self.initial_raw),
            RegisterAddress::PulseStepInterval => Value::U16(self.step_raw),
            RegisterAddress::PulsePeriod => Value::U16(self.width_raw),
            RegisterAddress::Encoder => Value::I16(self.board.encoder_count()),
            RegisterAddress::AnalogInput => Value::I16(self.analog_mirror),
            RegisterAddress::StopSwitch => Value::U8(self.stop_switch as u8),
            RegisterAddress::Moving => Value::U8(self.is_moving() as u8),
            RegisterAddress::ImmediatePulses => Value::I16(self.immediate_mirror),
        }
    }

    /// Write an application register
    ///
    /// Payload-type agreement is checked ahead of any per-register
    /// validation; a refused write leaves every mirror and flag untouched.
    pub fn write_register(
        &mut self,
        address: RegisterAddress,
        value: Value,
    ) -> Result<(), WriteError> {
        if value.payload_type() != address.payload_type() {
            return Err(WriteError::TypeMismatch);
        }

        match (address, value) {
            (RegisterAddress::Control, Value::U8(mask)) => {
                self.control.stage(mask);
                // The enable output tracks the write itself; the module
                // flags wait for the commit tick.
                if let Some(enabled) = motor_request(mask) {
                    self.board.set_motor_enabled(enabled);
                }
                if mask & cadence_protocol::registers::control::RESET_QUAD_ENCODER != 0 {
                    // last_encoder keeps its stale value, so the change
                    // surfaces as an encoder event on the next tick.
                    self.board.recenter_encoder(0);
                }
                Ok(())
            }
            (RegisterAddress::Pulses, Value::I32(steps)) => {
                self.pulses_mirror = steps;
                if self.control.motor_enabled {
                    self.pending_steps = self.pending_steps.wrapping_add(steps);
                }
                Ok(())
            }
            (RegisterAddress::NominalPulseInterval, Value::U16(raw)) => {
                self.tunable_write(raw, |ramp, raw| ramp.set_nominal_interval(raw))
                    .map(|()| self.nominal_raw = raw)
            }
            (RegisterAddress::InitialPulseInterval, Value::U16(raw)) => {
                self.tunable_write(raw, |ramp, raw| ramp.set_initial_interval(raw))
                    .map(|()| self.initial_raw = raw)
            }
            (RegisterAddress::PulseStepInterval, Value::U16(raw)) => {
                self.tunable_write(raw, |ramp, raw| ramp.set_step_interval(raw))
                    .map(|()| self.step_raw = raw)
            }
            (RegisterAddress::PulsePeriod, Value::U16(raw)) => {
                self.tunable_write(raw, |ramp, raw| ramp.set_pulse_width(raw))
                    .map(|()| self.width_raw = raw)
            }
            (RegisterAddress::Encoder, Value::I16(position)) => {
                // Deliberately does not refresh last_encoder; the jump is
                // reported as a change event on the next tick.
                self.board.recenter_encoder(position);
                Ok(())
            }
            (
                RegisterAddress::AnalogInput | RegisterAddress::StopSwitch | RegisterAddress::Moving,
                _,
            ) => Err(WriteError::ReadOnly),
            (RegisterAddress::ImmediatePulses, Value::I16(interval)) => {
                self.apply_immediate(interval)?;
                self.immediate_mirror = interval;
                Ok(())
            }
            _ => Err(WriteError::TypeMismatch),
        }
    }

    fn tunable_write(
        &mut self,
        raw: u16,
        set: impl FnOnce(
            &mut crate::motion::RampParameters,
            u16,
        ) -> Result<(), crate::motion::OutOfRange>,
    ) -> Result<(), WriteError> {
        if self.controller.pulses_active() {
            return Err(WriteError::MotorRunning);
        }
        set(self.controller.ramp_mut(), raw).map_err(|_| WriteError::OutOfRange)
    }

    fn apply_immediate(&mut self, interval: i16) -> Result<(), WriteError> {
        let update = self.controller.set_immediate(interval).map_err(|e| match e {
            ImmediateError::OutOfRange => WriteError::OutOfRange,
            ImmediateError::RampActive => WriteError::MotorRunning,
        })?;

        match update {
            ImmediateUpdate::Stop { motion_aborted } => {
                self.board.stop_pulses();
                if motion_aborted {
                    self.stopped_pending = true;
                }
            }
            ImmediateUpdate::Arm(train) => {
                self.board.set_direction(train.direction);
                self.board.arm_pulses(train);
            }
            ImmediateUpdate::Retune(train) => {
                self.board.set_direction(train.direction);
                self.board.retune_pulses(train);
            }
        }
        Ok(())
    }

    // --- periodic handlers ----------------------------------------------

    /// 1 ms housekeeping tick
    ///
    /// Flushes the deferred stopped notification, forces a stop while the
    /// motor flag is clear, merges pending step requests, samples the
    /// encoder and triggers the next analog conversion.
    pub fn tick_1ms(&mut self) -> EventBatch {
        let mut events = EventBatch::new();

        if self.stopped_pending {
            self.stopped_pending = false;
            let _ = events.push(Event::MotorStopped);
        }

        if !self.control.motor_enabled && self.controller.pulses_active() {
            self.controller.stop();
            self.board.stop_pulses();
        }

        if self.pending_steps != 0 && self.control.motor_enabled {
            let outcome = self.controller.submit(self.pending_steps);
            self.pending_steps = outcome.remainder;
            if let Some(train) = outcome.arm {
                self.board.set_direction(train.direction);
                self.board.arm_pulses(train);
            }
        }

        let encoder = self.board.encoder_count();
        if encoder != self.last_encoder {
            if self.control.quad_encoder_enabled {
                let _ = events.push(Event::EncoderChanged(encoder));
            }
            self.last_encoder = encoder;
        }

        if self.control.analog_input_enabled {
            self.board.start_analog_conversion();
        }

        events
    }

    /// 500 µs control-commit tick
    pub fn tick_control(&mut self) {
        self.control.commit();
    }

    // --- pulse generator edges ------------------------------------------

    /// Rising edge of a step pulse
    pub fn on_pulse_overflow(&mut self) {
        match self.controller.on_overflow() {
            OverflowAction::Retime(half_period) => self.board.set_half_period(half_period),
            OverflowAction::Stop => self.board.stop_pulses(),
        }
    }

    /// Trailing edge of a step pulse
    pub fn on_pulse_complete(&mut self) {
        if self.controller.on_complete() {
            self.board.stop_pulses();
            self.stopped_pending = true;
        }
    }

    // --- asynchronous inputs --------------------------------------------

    /// Stop-switch level change
    ///
    /// Assertion stops the motor unconditionally and forces the enable
    /// flag off; both edges are reported to the host.
    pub fn on_stop_switch(&mut self, pressed: bool) -> Option<Event> {
        if pressed == self.stop_switch {
            return None;
        }
        self.stop_switch = pressed;

        if pressed {
            self.controller.stop();
            self.board.stop_pulses();
            self.control.force_motor_off();
            self.board.set_motor_enabled(false);
        }
        Some(Event::StopSwitch(pressed))
    }

    /// Unrecoverable fault: stop everything and hold the driver disabled
    pub fn on_catastrophic_error(&mut self) {
        self.controller.stop();
        self.board.stop_pulses();
        self.control.force_motor_off();
        self.board.set_motor_enabled(false);
    }

    /// Host-initiated standby: motor off through the ordinary write path
    pub fn enter_standby(&mut self) {
        let _ = self.write_register(
            RegisterAddress::Control,
            Value::U8(cadence_protocol::registers::control::DISABLE_MOTOR),
        );
    }

    /// Byte received on the external motor-control serial input
    pub fn handle_external_byte(&mut self, byte: u8, now_ms: u32) -> Option<Event> {
        let value = self.external.feed(byte, now_ms)?;
        match self.variant {
            DeviceVariant::VestibularVrH2 => {
                self.analog_mirror = value;
                Some(Event::AnalogSample(value))
            }
            DeviceVariant::FastStepper => {
                // Out-of-range intervals from the wire are dropped, not
                // reported; the host link never saw them.
                if self.apply_immediate(value).is_ok() {
                    self.immediate_mirror = value;
                }
                None
            }
        }
    }

    /// Completed ADC conversion
    pub fn analog_sample_ready(&mut self, sample: i16) -> Option<Event> {
        self.analog_mirror = sample;
        self.control.analog_input_enabled.then_some(Event::AnalogSample(sample))
    }
}
