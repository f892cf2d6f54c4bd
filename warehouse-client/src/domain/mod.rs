pub mod monthly_usage;

pub use monthly_usage::MonthlyUsageRecord;
