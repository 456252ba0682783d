//! Engagement Report Scheduler
//!
//! Samples the shared session on a fixed wall-clock interval and hands
//! each snapshot to an attendance sink without waiting for delivery.

mod scheduler;

pub use scheduler::{ReportScheduler, ReportingConfig, SharedSession};
