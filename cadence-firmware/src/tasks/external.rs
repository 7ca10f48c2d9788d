//! External motor-control serial input task
//!
//! Feeds received bytes through the variant's parser: single bytes
//! become analog samples on the VestibularVrH2 boards, little-endian
//! pairs drive the immediate-pulse path on the FastStepper boards.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embassy_time::Instant;
use embedded_io_async::Read;

use crate::channels::{with_device, SharedDevice, EVENT_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 16;

/// External control RX task
#[embassy_executor::task]
pub async fn external_rx_task(mut rx: BufferedUartRx, device: &'static SharedDevice) {
    info!("External control task started");

    let started = Instant::now();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                let now_ms = started.elapsed().as_millis() as u32;
                for &byte in &buf[..n] {
                    let event =
                        with_device(device, |dev| dev.handle_external_byte(byte, now_ms));
                    if let Some(event) = event {
                        if EVENT_CHANNEL.try_send(event).is_err() {
                            warn!("Event queue full, dropping external sample");
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("External UART read error: {:?}", e);
            }
        }
    }
}
