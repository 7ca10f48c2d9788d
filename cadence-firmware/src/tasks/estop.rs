//! Emergency stop-switch task
//!
//! Runs on the high-priority interrupt executor so the stop preempts
//! even the pulse generator. The switch shorts the input to ground when
//! pressed.

use defmt::*;
use embassy_rp::gpio::Input;

use crate::channels::{with_device, SharedDevice, EVENT_CHANNEL};

/// Stop-switch task - unconditional motor stop on assertion
#[embassy_executor::task]
pub async fn estop_task(mut pin: Input<'static>, device: &'static SharedDevice) {
    info!("Stop-switch task started");

    loop {
        pin.wait_for_any_edge().await;
        let pressed = pin.is_low();
        if pressed {
            warn!("Stop switch pressed, motor halted");
        } else {
            info!("Stop switch released");
        }

        if let Some(event) = with_device(device, |dev| dev.on_stop_switch(pressed)) {
            if EVENT_CHANNEL.try_send(event).is_err() {
                warn!("Event queue full, dropping stop-switch event");
            }
        }
    }
}
