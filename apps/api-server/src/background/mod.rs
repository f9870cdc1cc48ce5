//! Background tasks.

mod scheduler;

pub use scheduler::{Scheduler, SchedulerConfig};
