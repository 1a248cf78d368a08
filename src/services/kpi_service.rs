use std::collections::BTreeSet;
use std::time::Instant;

use tracing::info;

use crate::errors::AppError;
use crate::models::{
    ConsolidatedKpiResult, KpiFilters, PeriodMetric, QueryPerformance, ReportRange,
};
use crate::services::kpi_policy::KpiPolicy;
use crate::services::{breakdowns, metric_aggregator, period_sequence, period_summary};
use crate::store::KpiStore;

/// Runs one consolidated KPI report: bucket sequence, per-bucket time series,
/// range-wide summary and dimension breakdowns, assembled with execution
/// metadata.
///
/// The three calculators share the same immutable window and run
/// concurrently; the join fails the whole request as soon as one of them
/// fails, so a partially computed result is never returned. Dropping the
/// returned future cancels every in-flight storage read.
pub async fn get_consolidated_kpis(
    store: &dyn KpiStore,
    policy: &KpiPolicy,
    range: ReportRange,
    filters: KpiFilters,
) -> Result<ConsolidatedKpiResult, AppError> {
    let started = Instant::now();

    let buckets = period_sequence::generate(&range);
    let window = period_sequence::window(&range);
    debug_assert_eq!(
        Some(window.end_exclusive),
        buckets.last().map(|b| b.period_end),
        "window must end where the last bucket ends"
    );
    let range_days = (range.to() - range.from()).num_days() + 1;

    let series_stage = async {
        let (offer_rows, load_rows) = tokio::try_join!(
            store.offers_by_period(&window, &filters, policy),
            store.team_load_by_period(&window, &filters),
        )
        .map_err(|e| e.in_stage("metric_aggregator"))?;
        Ok::<Vec<PeriodMetric>, AppError>(metric_aggregator::aggregate(
            &buckets, offer_rows, load_rows,
        ))
    };

    let summary_stage = async {
        let (offer_totals, delay_stats, staffing_totals) = tokio::try_join!(
            store.offer_totals(&window, &filters, policy),
            store.delay_stats(&window, &filters, policy),
            store.staffing_totals(&window, &filters),
        )
        .map_err(|e| e.in_stage("period_summary"))?;
        Ok(period_summary::summarize(
            &offer_totals,
            &delay_stats,
            &staffing_totals,
            range_days,
            policy,
        ))
    };

    let breakdown_stage = async {
        let (conversion_rows, load_rows, margin_rows) = tokio::try_join!(
            store.conversion_by_user(&window, &filters, policy),
            store.load_by_user(&window, &filters),
            store.margin_by_category(&window, &filters),
        )
        .map_err(|e| e.in_stage("breakdowns"))?;
        Ok(breakdowns::breakdown(conversion_rows, load_rows, margin_rows))
    };

    let (time_series, period_summary, breakdowns) =
        tokio::try_join!(series_stage, summary_stage, breakdown_stage)?;

    let performance = QueryPerformance {
        execution_time_ms: started.elapsed().as_millis() as u64,
        tables_queried: tables_queried(),
        cache_hit_rate: 0.0,
        data_freshness: "live".to_string(),
    };

    info!(
        "Consolidated KPI report: {} buckets in {}ms ({} -> {})",
        time_series.len(),
        performance.execution_time_ms,
        range.from(),
        range.to()
    );

    Ok(ConsolidatedKpiResult {
        time_series,
        period_summary,
        breakdowns,
        performance,
    })
}

fn tables_queried() -> BTreeSet<String> {
    ["offers", "staffing_entries", "project_tasks"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::kpi_queries::{
        CategoryMarginRow, DelayStats, OfferTotals, PeriodLoadRow, PeriodOfferRow, StaffingTotals,
        UserConversionRow, UserLoadRow,
    };
    use crate::models::{Granularity, ReportWindow};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(from: &str, to: &str, g: Granularity) -> ReportRange {
        ReportRange::new(d(from), d(to), g).unwrap()
    }

    /// In-memory stand-in for the two storage read shapes. Counts round-trips
    /// and can be told to fail a single read.
    #[derive(Default)]
    struct FakeStore {
        offer_rows: Vec<PeriodOfferRow>,
        load_rows: Vec<PeriodLoadRow>,
        offer_totals: Option<OfferTotals>,
        delay_stats: Option<DelayStats>,
        staffing_totals: Option<StaffingTotals>,
        conversion_rows: Vec<UserConversionRow>,
        user_load_rows: Vec<UserLoadRow>,
        margin_rows: Vec<CategoryMarginRow>,
        fail_read: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeStore {
        fn record(&self, read: &'static str) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_read == Some(read) {
                return Err(AppError::Storage(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KpiStore for FakeStore {
        async fn offers_by_period(
            &self,
            _: &ReportWindow,
            _: &KpiFilters,
            _: &KpiPolicy,
        ) -> Result<Vec<PeriodOfferRow>, AppError> {
            self.record("offers_by_period")?;
            Ok(self.offer_rows.clone())
        }

        async fn team_load_by_period(
            &self,
            _: &ReportWindow,
            _: &KpiFilters,
        ) -> Result<Vec<PeriodLoadRow>, AppError> {
            self.record("team_load_by_period")?;
            Ok(self.load_rows.clone())
        }

        async fn offer_totals(
            &self,
            _: &ReportWindow,
            _: &KpiFilters,
            _: &KpiPolicy,
        ) -> Result<OfferTotals, AppError> {
            self.record("offer_totals")?;
            Ok(self.offer_totals.clone().unwrap_or(OfferTotals {
                total_offers: 0,
                won_offers: 0,
                forecast_revenue: 0.0,
                weighted_margin: 0.0,
                margin_amount_base: 0.0,
            }))
        }

        async fn delay_stats(
            &self,
            _: &ReportWindow,
            _: &KpiFilters,
            _: &KpiPolicy,
        ) -> Result<DelayStats, AppError> {
            self.record("delay_stats")?;
            Ok(self.delay_stats.clone().unwrap_or(DelayStats {
                delayed_tasks: 0,
                delay_sample_count: 0,
                total_delay_days: 0.0,
            }))
        }

        async fn staffing_totals(
            &self,
            _: &ReportWindow,
            _: &KpiFilters,
        ) -> Result<StaffingTotals, AppError> {
            self.record("staffing_totals")?;
            Ok(self.staffing_totals.clone().unwrap_or(StaffingTotals {
                planned_hours: 0.0,
                distinct_staff: 0,
            }))
        }

        async fn conversion_by_user(
            &self,
            _: &ReportWindow,
            _: &KpiFilters,
            _: &KpiPolicy,
        ) -> Result<Vec<UserConversionRow>, AppError> {
            self.record("conversion_by_user")?;
            Ok(self.conversion_rows.clone())
        }

        async fn load_by_user(
            &self,
            _: &ReportWindow,
            _: &KpiFilters,
        ) -> Result<Vec<UserLoadRow>, AppError> {
            self.record("load_by_user")?;
            Ok(self.user_load_rows.clone())
        }

        async fn margin_by_category(
            &self,
            _: &ReportWindow,
            _: &KpiFilters,
        ) -> Result<Vec<CategoryMarginRow>, AppError> {
            self.record("margin_by_category")?;
            Ok(self.margin_rows.clone())
        }
    }

    async fn run(
        store: &FakeStore,
        range: ReportRange,
    ) -> Result<ConsolidatedKpiResult, AppError> {
        get_consolidated_kpis(store, &KpiPolicy::default(), range, KpiFilters::default()).await
    }

    #[tokio::test]
    async fn test_empty_store_seven_daily_buckets_all_zero() {
        let store = FakeStore::default();
        let result = run(&store, range("2025-01-01", "2025-01-07", Granularity::Day))
            .await
            .unwrap();

        assert_eq!(result.time_series.len(), 7);
        for metric in &result.time_series {
            assert_eq!(metric.offers_created, 0);
            assert_eq!(metric.offers_won, 0);
            assert_eq!(metric.forecast_revenue, 0.0);
            assert_eq!(metric.team_load_hours, 0.0);
        }
        assert_eq!(result.period_summary.total_offers, 0);
        assert_eq!(result.period_summary.conversion_rate, 0.0);
        assert!(result.breakdowns.conversion_by_user.is_empty());
    }

    #[tokio::test]
    async fn test_period_count_holds_on_empty_store() {
        for (from, to, g, expected) in [
            ("2025-01-01", "2025-01-30", Granularity::Day, 30),
            ("2025-01-01", "2025-03-31", Granularity::Day, 90),
            ("2025-01-01", "2025-01-28", Granularity::Week, 4),
            ("2025-01-01", "2025-02-25", Granularity::Week, 8),
            ("2025-05-05", "2025-05-05", Granularity::Week, 1),
        ] {
            let store = FakeStore::default();
            let result = run(&store, range(from, to, g)).await.unwrap();
            assert_eq!(result.time_series.len(), expected, "{from}..{to}");
        }
    }

    #[tokio::test]
    async fn test_series_is_contiguous_and_ascending() {
        let store = FakeStore::default();
        let result = run(&store, range("2025-01-01", "2025-02-25", Granularity::Week))
            .await
            .unwrap();
        for pair in result.time_series.windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 7);
        }
    }

    #[tokio::test]
    async fn test_summary_totals_match_series_sum() {
        let store = FakeStore {
            offer_rows: vec![
                PeriodOfferRow {
                    period_start: d("2025-01-02"),
                    offers_created: 3,
                    offers_won: 1,
                    forecast_revenue: 5_000.0,
                },
                PeriodOfferRow {
                    period_start: d("2025-01-05"),
                    offers_created: 2,
                    offers_won: 2,
                    forecast_revenue: 8_000.0,
                },
            ],
            offer_totals: Some(OfferTotals {
                total_offers: 5,
                won_offers: 3,
                forecast_revenue: 13_000.0,
                weighted_margin: 0.0,
                margin_amount_base: 0.0,
            }),
            ..FakeStore::default()
        };

        let result = run(&store, range("2025-01-01", "2025-01-07", Granularity::Day))
            .await
            .unwrap();

        let created: i64 = result.time_series.iter().map(|m| m.offers_created).sum();
        assert_eq!(result.period_summary.total_offers, created);
        assert_eq!(result.period_summary.conversion_rate, 60.0);
    }

    #[tokio::test]
    async fn test_round_trip_count_independent_of_bucket_count() {
        let small = FakeStore::default();
        run(&small, range("2025-01-01", "2025-01-07", Granularity::Day))
            .await
            .unwrap();

        let large = FakeStore::default();
        run(&large, range("2025-01-01", "2025-03-31", Granularity::Day))
            .await
            .unwrap();

        assert_eq!(small.call_count(), 8);
        assert_eq!(large.call_count(), small.call_count());
    }

    #[tokio::test]
    async fn test_failed_read_fails_the_whole_request_with_stage() {
        let store = FakeStore {
            fail_read: Some("delay_stats"),
            ..FakeStore::default()
        };
        let err = run(&store, range("2025-01-01", "2025-01-07", Granularity::Day))
            .await
            .unwrap_err();

        match err {
            AppError::PartialAggregation { stage, .. } => assert_eq!(stage, "period_summary"),
            other => panic!("expected PartialAggregation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_all_numeric_fields_finite_and_non_negative() {
        let store = FakeStore::default();
        let result = run(&store, range("2025-01-01", "2025-01-30", Granularity::Day))
            .await
            .unwrap();

        for m in &result.time_series {
            assert!(m.offers_created >= 0 && m.offers_won >= 0);
            assert!(m.forecast_revenue.is_finite() && m.forecast_revenue >= 0.0);
            assert!(m.team_load_hours.is_finite() && m.team_load_hours >= 0.0);
        }
        let s = &result.period_summary;
        for v in [
            s.conversion_rate,
            s.forecast_revenue,
            s.team_load_percentage,
            s.average_delay_days,
            s.expected_margin_percentage,
        ] {
            assert!(v.is_finite() && v >= 0.0);
        }
    }

    #[tokio::test]
    async fn test_performance_metadata_names_source_tables() {
        let store = FakeStore::default();
        let result = run(&store, range("2025-01-01", "2025-01-07", Granularity::Day))
            .await
            .unwrap();
        let tables: Vec<&str> = result
            .performance
            .tables_queried
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(tables, vec!["offers", "project_tasks", "staffing_entries"]);
        assert_eq!(result.performance.cache_hit_rate, 0.0);
    }

    #[test]
    fn test_invalid_range_rejected_before_any_read() {
        let err = ReportRange::new(d("2025-02-01"), d("2025-01-01"), Granularity::Day).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange(_)));
    }
}
