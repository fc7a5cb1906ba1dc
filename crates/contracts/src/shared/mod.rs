pub mod aggregation;
pub mod cascade;
pub mod list_query;
pub mod period_label;
pub mod scoring;
