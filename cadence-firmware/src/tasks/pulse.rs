//! Software pulse generator task
//!
//! Runs on the medium-priority interrupt executor so pulse edges are not
//! delayed by host traffic. Each cycle drives the step output high, runs
//! the overflow handler, waits out the pulse width, drives the output low
//! and runs the completion handler, then idles for the rest of the
//! period. Stored timing values are half-periods in 2 µs units.

use defmt::*;
use embassy_time::Timer;
use portable_atomic::Ordering;

use crate::board::{PULSE_ACTIVE, PULSE_HALF_PERIOD, PULSE_WIDTH};
use crate::channels::{with_device, SharedDevice, PULSE_KICK};

/// Pulse generator task - sole driver of the step output
#[embassy_executor::task]
pub async fn pulse_task(device: &'static SharedDevice) {
    info!("Pulse generator task started");

    loop {
        PULSE_KICK.wait().await;
        trace!("Pulse train armed");

        while PULSE_ACTIVE.load(Ordering::Acquire) {
            // A stop can land between the flag check and the lock; the
            // re-check under the lock keeps the step output clean.
            let proceed = with_device(device, |dev| {
                if !dev.is_moving() {
                    return false;
                }
                dev.board_mut().step_high();
                dev.on_pulse_overflow();
                true
            });
            if !proceed {
                break;
            }

            let width_us = PULSE_WIDTH.load(Ordering::Acquire) as u64 * 2;
            Timer::after_micros(width_us).await;

            with_device(device, |dev| {
                dev.board_mut().step_low();
                dev.on_pulse_complete();
            });

            // Half-period written at the overflow covers this cycle's
            // low time, so a retune takes effect on the very next pulse
            let period_us = PULSE_HALF_PERIOD.load(Ordering::Acquire) as u64 * 2;
            Timer::after_micros(period_us.saturating_sub(width_us).max(2)).await;
        }

        trace!("Pulse train stopped");
    }
}
