//! Quadrature encoder sampling task
//!
//! Decodes the A/B signals edge by edge into the shared position
//! counter. The device reads and re-centres the counter through the
//! board seam; this task is its only other writer.
//!
//! Quadrature encoding:
//! CW:  A leads B (A changes first when rotating clockwise)
//! CCW: B leads A (B changes first when rotating counter-clockwise)

use defmt::*;
use embassy_futures::select::select;
use embassy_rp::gpio::Input;
use portable_atomic::Ordering;

use crate::board::ENCODER_COUNT;

/// Count delta per state transition, indexed by (previous << 2) | current
/// where each state is (A << 1) | B. Invalid double transitions count 0.
const QUAD_DELTA: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

fn phase(a: &Input<'static>, b: &Input<'static>) -> u8 {
    ((a.is_high() as u8) << 1) | b.is_high() as u8
}

/// Encoder task - maintains the quadrature position counter
#[embassy_executor::task]
pub async fn encoder_task(mut a: Input<'static>, mut b: Input<'static>) {
    info!("Encoder task started");

    let mut previous = phase(&a, &b);

    loop {
        select(a.wait_for_any_edge(), b.wait_for_any_edge()).await;

        let current = phase(&a, &b);
        let delta = QUAD_DELTA[((previous << 2) | current) as usize];
        if delta != 0 {
            ENCODER_COUNT.fetch_add(delta as i16, Ordering::Relaxed);
        }
        previous = current;
    }
}
