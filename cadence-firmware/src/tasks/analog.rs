//! Analog input sampling task
//!
//! Conversions are triggered from the 1 ms tick while the analog module
//! is enabled; each completed sample goes back into the device and, when
//! enabled, out to the host as an event.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};

use crate::channels::{with_device, SharedDevice, ANALOG_TRIGGER, EVENT_CHANNEL};

/// Analog sampling task
#[embassy_executor::task]
pub async fn analog_task(
    mut adc: Adc<'static, Async>,
    mut channel: Channel<'static>,
    device: &'static SharedDevice,
) {
    info!("Analog task started");

    loop {
        ANALOG_TRIGGER.wait().await;

        match adc.read(&mut channel).await {
            Ok(raw) => {
                let event = with_device(device, |dev| dev.analog_sample_ready(raw as i16));
                if let Some(event) = event {
                    if EVENT_CHANNEL.try_send(event).is_err() {
                        warn!("Event queue full, dropping analog sample");
                    }
                }
            }
            Err(e) => {
                warn!("ADC read error: {:?}", e);
            }
        }
    }
}
