use crate::db::kpi_queries::{DelayStats, OfferTotals, StaffingTotals};
use crate::models::PeriodSummary;
use crate::services::kpi_policy::KpiPolicy;

/// Builds the range-wide scalar summary from whole-range grouped totals.
///
/// Ratios are computed here, not in SQL, and every denominator is guarded:
/// an empty range produces a summary of zeros, never NaN and never an error.
/// Note the summary is not derived by summing the per-bucket series; ratios
/// like conversion rate are not summable per bucket.
pub fn summarize(
    offers: &OfferTotals,
    delays: &DelayStats,
    staffing: &StaffingTotals,
    range_days: i64,
    policy: &KpiPolicy,
) -> PeriodSummary {
    let conversion_rate = if offers.total_offers > 0 {
        offers.won_offers as f64 / offers.total_offers as f64 * 100.0
    } else {
        0.0
    };

    let expected_margin_percentage = if offers.margin_amount_base > 0.0 {
        offers.weighted_margin / offers.margin_amount_base
    } else {
        0.0
    };

    let average_delay_days = if delays.delay_sample_count > 0 {
        delays.total_delay_days / delays.delay_sample_count as f64
    } else {
        0.0
    };

    // Capacity: each distinct staff member contributes the contractual weekly
    // hours for every (possibly partial) week of the range.
    let range_weeks = (range_days as f64 / 7.0).ceil().max(1.0);
    let capacity_hours = staffing.distinct_staff as f64 * range_weeks * policy.weekly_capacity_hours;
    let team_load_percentage = if capacity_hours > 0.0 {
        staffing.planned_hours / capacity_hours * 100.0
    } else {
        0.0
    };

    PeriodSummary {
        conversion_rate,
        forecast_revenue: offers.forecast_revenue,
        team_load_percentage,
        average_delay_days,
        expected_margin_percentage,
        total_delayed_tasks: delays.delayed_tasks,
        total_offers: offers.total_offers,
        total_won_offers: offers.won_offers,
    }
}
