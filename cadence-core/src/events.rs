//! Device-originated host notifications
//!
//! Every event maps onto an application register so the host link can
//! send it as a register-event frame.

use cadence_protocol::registers::{RegisterAddress, Value};

/// Notifications the device sends without a host request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A ramped motion issued its last pulse
    MotorStopped,
    /// Encoder position changed since the previous 1 ms tick
    EncoderChanged(i16),
    /// Stop-switch input level changed (true = pressed)
    StopSwitch(bool),
    /// New analog sample, from the ADC or the external control input
    AnalogSample(i16),
}

impl Event {
    /// Register this event is reported through
    pub fn register(&self) -> RegisterAddress {
        match self {
            Event::MotorStopped => RegisterAddress::Moving,
            Event::EncoderChanged(_) => RegisterAddress::Encoder,
            Event::StopSwitch(_) => RegisterAddress::StopSwitch,
            Event::AnalogSample(_) => RegisterAddress::AnalogInput,
        }
    }

    /// Payload carried by the event frame
    pub fn value(&self) -> Value {
        match *self {
            Event::MotorStopped => Value::U8(0),
            Event::EncoderChanged(position) => Value::I16(position),
            Event::StopSwitch(pressed) => Value::U8(pressed as u8),
            Event::AnalogSample(sample) => Value::I16(sample),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_protocol::registers::PayloadType;

    #[test]
    fn test_event_register_mapping() {
        assert_eq!(Event::MotorStopped.register(), RegisterAddress::Moving);
        assert_eq!(
            Event::EncoderChanged(-12).register(),
            RegisterAddress::Encoder
        );
        assert_eq!(Event::StopSwitch(true).register(), RegisterAddress::StopSwitch);
        assert_eq!(
            Event::AnalogSample(512).register(),
            RegisterAddress::AnalogInput
        );
    }

    #[test]
    fn test_event_payload_matches_register_type() {
        for event in [
            Event::MotorStopped,
            Event::EncoderChanged(-12),
            Event::StopSwitch(true),
            Event::AnalogSample(512),
        ] {
            assert_eq!(event.value().payload_type(), event.register().payload_type());
        }
    }

    #[test]
    fn test_stop_switch_levels() {
        assert_eq!(Event::StopSwitch(true).value(), Value::U8(1));
        assert_eq!(Event::StopSwitch(false).value(), Value::U8(0));
        assert_eq!(Event::StopSwitch(false).value().payload_type(), PayloadType::U8);
    }
}
