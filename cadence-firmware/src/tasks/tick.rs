//! Periodic housekeeping tasks
//!
//! The 1 ms tick merges pending step requests, samples the encoder,
//! triggers analog conversions and flushes deferred notifications. The
//! 500 µs tick commits staged control flags.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::channels::{with_device, SharedDevice, EVENT_CHANNEL};

/// 1 ms housekeeping tick task
#[embassy_executor::task]
pub async fn tick_task(device: &'static SharedDevice) {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(1));

    loop {
        ticker.next().await;

        let events = with_device(device, |dev| dev.tick_1ms());
        for event in events {
            if EVENT_CHANNEL.try_send(event).is_err() {
                warn!("Event queue full, dropping {:?}", event);
            }
        }
    }
}

/// 500 µs control-commit tick task
#[embassy_executor::task]
pub async fn control_commit_task(device: &'static SharedDevice) {
    info!("Control commit task started");

    let mut ticker = Ticker::every(Duration::from_micros(500));

    loop {
        ticker.next().await;
        with_device(device, |dev| dev.tick_control());
    }
}
