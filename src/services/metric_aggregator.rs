use std::collections::HashMap;

use chrono::NaiveDate;

use crate::db::kpi_queries::{PeriodLoadRow, PeriodOfferRow};
use crate::models::{PeriodBucket, PeriodMetric};

/// Left-merges grouped storage rows onto the bucket sequence.
///
/// The buckets are the driving set: every bucket yields exactly one output
/// row, in bucket order, whether or not any grouped row matches it. Driving
/// off the entity rows instead is the historical defect this module exists to
/// prevent (zero rows on an empty store, N×M rows when two collections are
/// combined before bucketing).
pub fn aggregate(
    buckets: &[PeriodBucket],
    offer_rows: Vec<PeriodOfferRow>,
    load_rows: Vec<PeriodLoadRow>,
) -> Vec<PeriodMetric> {
    let offers_by_start: HashMap<NaiveDate, PeriodOfferRow> = offer_rows
        .into_iter()
        .map(|r| (r.period_start, r))
        .collect();
    let load_by_start: HashMap<NaiveDate, f64> = load_rows
        .into_iter()
        .map(|r| (r.period_start, r.team_load_hours))
        .collect();

    buckets
        .iter()
        .map(|bucket| {
            let mut metric = PeriodMetric::zero(bucket.period_start);
            if let Some(row) = offers_by_start.get(&bucket.period_start) {
                metric.offers_created = row.offers_created;
                metric.offers_won = row.offers_won;
                metric.forecast_revenue = row.forecast_revenue;
            }
            if let Some(hours) = load_by_start.get(&bucket.period_start) {
                metric.team_load_hours = *hours;
            }
            metric
        })
        .collect()
}
