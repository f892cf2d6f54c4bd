pub mod usage_queries;

pub use usage_queries::monthly_segment_usage;
