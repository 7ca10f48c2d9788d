//! Inter-task communication channels and the shared device
//!
//! Defines the static channels used for communication between Embassy
//! tasks, plus the critical-section mutex holding the device object.
//! Locking the device masks interrupts, so every handler that used to be
//! an interrupt routine runs with the same exclusion it had on bare metal.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use cadence_core::device::Device;
use cadence_core::events::Event;
use cadence_protocol::frame::Frame;

use crate::board::RpBoard;

/// Channel capacity for host-bound events
const EVENT_CHANNEL_SIZE: usize = 16;

/// Channel capacity for host command replies
const REPLY_CHANNEL_SIZE: usize = 8;

/// The device object behind the interrupt-masking lock
pub type SharedDevice = Mutex<CriticalSectionRawMutex, RefCell<Device<RpBoard>>>;

/// Device-originated events on their way to the host link
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_SIZE> =
    Channel::new();

/// Replies to host commands, queued for the TX task
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, Frame, REPLY_CHANNEL_SIZE> =
    Channel::new();

/// Signal that the pulse generator has been armed
pub static PULSE_KICK: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Signal that an analog conversion should start
pub static ANALOG_TRIGGER: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Run a closure against the locked device
pub fn with_device<R>(
    device: &'static SharedDevice,
    f: impl FnOnce(&mut Device<RpBoard>) -> R,
) -> R {
    device.lock(|cell| f(&mut cell.borrow_mut()))
}
