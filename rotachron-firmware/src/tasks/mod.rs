//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod axis;
pub mod command_rx;
pub mod command_tx;
pub mod dispatcher;
pub mod persist;

pub use axis::{axis_task, ClockStepper};
pub use command_rx::command_rx_task;
pub use command_tx::command_tx_task;
pub use dispatcher::{dispatcher_task, ClockRtc};
pub use persist::persist_task;
