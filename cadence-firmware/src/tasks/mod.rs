//! Embassy async tasks
//!
//! One task per original interrupt routine or periodic callback; the
//! pulse and emergency-stop tasks run on interrupt executors so they
//! preempt the housekeeping work.

pub mod analog;
pub mod encoder;
pub mod estop;
pub mod external;
pub mod host_link;
pub mod pulse;
pub mod tick;

pub use analog::analog_task;
pub use encoder::encoder_task;
pub use estop::estop_task;
pub use external::external_rx_task;
pub use host_link::{host_rx_task, host_tx_task};
pub use pulse::pulse_task;
pub use tick::{control_commit_task, tick_task};
