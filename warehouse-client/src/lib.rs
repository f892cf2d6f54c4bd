pub mod db;
pub mod domain;

pub use domain::MonthlyUsageRecord;
