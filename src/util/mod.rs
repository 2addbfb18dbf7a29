pub mod clock;
pub mod serde;
pub mod telemetry;

pub use clock::{now_ms, Clock, ManualClock, SystemClock};
pub use serde::{ReminderId, TaskId, WorkerId};
pub use telemetry::init_tracing;
