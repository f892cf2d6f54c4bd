pub mod config;
pub mod job;
pub mod notifier;
pub mod observability;
pub mod report;
pub mod source;
pub mod trends;
pub mod trigger;

pub use job::{JobError, RunResult, UsageTrendsJob};
