pub mod breakdowns;
pub mod kpi_policy;
pub mod kpi_service;
pub mod metric_aggregator;
pub mod period_sequence;
pub mod period_summary;
