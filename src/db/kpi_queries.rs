use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{KpiFilters, ReportWindow};

/// Grouped offer aggregates keyed by origin-aligned bucket start. One row per
/// bucket that has at least one offer; buckets with no offers produce no row
/// and are filled in by the aggregator's left merge.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PeriodOfferRow {
    pub period_start: NaiveDate,
    pub offers_created: i64,
    pub offers_won: i64,
    pub forecast_revenue: f64,
}

/// Grouped staffing hours keyed by bucket start.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PeriodLoadRow {
    pub period_start: NaiveDate,
    pub team_load_hours: f64,
}

/// Whole-range offer scalars. `weighted_margin` and `margin_amount_base` are
/// the numerator and denominator of the amount-weighted margin mean.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferTotals {
    pub total_offers: i64,
    pub won_offers: i64,
    pub forecast_revenue: f64,
    pub weighted_margin: f64,
    pub margin_amount_base: f64,
}

/// Delay scalars over tasks that have both planned and actual completion
/// dates. Tasks missing either date are excluded, not counted as zero delay.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DelayStats {
    pub delayed_tasks: i64,
    pub delay_sample_count: i64,
    pub total_delay_days: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffingTotals {
    pub planned_hours: f64,
    pub distinct_staff: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserConversionRow {
    pub user_id: Uuid,
    pub offers: i64,
    pub won_offers: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserLoadRow {
    pub user_id: Uuid,
    pub entries: i64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryMarginRow {
    pub category: String,
    pub offers: i64,
    pub average_margin_percentage: f64,
}

pub async fn fetch_offers_by_period(
    pool: &PgPool,
    window: &ReportWindow,
    filters: &KpiFilters,
    won_statuses: &[String],
    active_statuses: &[String],
) -> Result<Vec<PeriodOfferRow>, sqlx::Error> {
    // Bucket start is origin-aligned to the window start: integer day
    // arithmetic, truncating division by the step.
    sqlx::query_as::<_, PeriodOfferRow>(
        r#"
        SELECT
          $1::date + (((o.created_at::date - $1::date) / $3::int) * $3::int) AS period_start,
          COUNT(*) AS offers_created,
          COUNT(*) FILTER (WHERE o.status = ANY($4::text[])) AS offers_won,
          COALESCE(SUM(o.expected_amount) FILTER (WHERE o.status = ANY($5::text[])), 0)::double precision
            AS forecast_revenue
        FROM offers o
        WHERE o.created_at::date >= $1::date
          AND o.created_at::date < $2::date
          AND ($6::uuid IS NULL OR o.responsible_user_id = $6)
          AND ($7::text IS NULL OR o.departement = $7)
        GROUP BY 1
        ORDER BY 1 ASC
        "#,
    )
    .bind(window.start)
    .bind(window.end_exclusive)
    .bind(window.step_days as i32)
    .bind(won_statuses)
    .bind(active_statuses)
    .bind(filters.user_id)
    .bind(filters.departement.as_deref())
    .fetch_all(pool)
    .await
}

pub async fn fetch_team_load_by_period(
    pool: &PgPool,
    window: &ReportWindow,
    filters: &KpiFilters,
) -> Result<Vec<PeriodLoadRow>, sqlx::Error> {
    sqlx::query_as::<_, PeriodLoadRow>(
        r#"
        SELECT
          $1::date + (((s.entry_date - $1::date) / $3::int) * $3::int) AS period_start,
          COALESCE(SUM(s.planned_hours), 0)::double precision AS team_load_hours
        FROM staffing_entries s
        WHERE s.entry_date >= $1::date
          AND s.entry_date < $2::date
          AND ($4::uuid IS NULL OR s.user_id = $4)
          AND ($5::text IS NULL OR s.departement = $5)
        GROUP BY 1
        ORDER BY 1 ASC
        "#,
    )
    .bind(window.start)
    .bind(window.end_exclusive)
    .bind(window.step_days as i32)
    .bind(filters.user_id)
    .bind(filters.departement.as_deref())
    .fetch_all(pool)
    .await
}

pub async fn fetch_offer_totals(
    pool: &PgPool,
    window: &ReportWindow,
    filters: &KpiFilters,
    won_statuses: &[String],
    active_statuses: &[String],
) -> Result<OfferTotals, sqlx::Error> {
    sqlx::query_as::<_, OfferTotals>(
        r#"
        SELECT
          COUNT(*) AS total_offers,
          COUNT(*) FILTER (WHERE o.status = ANY($3::text[])) AS won_offers,
          COALESCE(SUM(o.expected_amount) FILTER (WHERE o.status = ANY($4::text[])), 0)::double precision
            AS forecast_revenue,
          COALESCE(SUM(o.expected_amount * o.expected_margin_pct)
                   FILTER (WHERE o.expected_margin_pct IS NOT NULL), 0)::double precision
            AS weighted_margin,
          COALESCE(SUM(o.expected_amount)
                   FILTER (WHERE o.expected_margin_pct IS NOT NULL), 0)::double precision
            AS margin_amount_base
        FROM offers o
        WHERE o.created_at::date >= $1::date
          AND o.created_at::date < $2::date
          AND ($5::uuid IS NULL OR o.responsible_user_id = $5)
          AND ($6::text IS NULL OR o.departement = $6)
        "#,
    )
    .bind(window.start)
    .bind(window.end_exclusive)
    .bind(won_statuses)
    .bind(active_statuses)
    .bind(filters.user_id)
    .bind(filters.departement.as_deref())
    .fetch_one(pool)
    .await
}

pub async fn fetch_delay_stats(
    pool: &PgPool,
    window: &ReportWindow,
    filters: &KpiFilters,
    on_time_slip_days: i64,
) -> Result<DelayStats, sqlx::Error> {
    // Negative slips (early completion) count as zero delay in the mean.
    sqlx::query_as::<_, DelayStats>(
        r#"
        SELECT
          COUNT(*) FILTER (WHERE t.actual_end - t.planned_end > $3::int) AS delayed_tasks,
          COUNT(*) AS delay_sample_count,
          COALESCE(SUM(GREATEST(t.actual_end - t.planned_end, 0)), 0)::double precision
            AS total_delay_days
        FROM project_tasks t
        WHERE t.planned_end IS NOT NULL
          AND t.actual_end IS NOT NULL
          AND t.planned_end >= $1::date
          AND t.planned_end < $2::date
          AND ($4::uuid IS NULL OR t.responsible_user_id = $4)
          AND ($5::text IS NULL OR t.departement = $5)
        "#,
    )
    .bind(window.start)
    .bind(window.end_exclusive)
    .bind(on_time_slip_days as i32)
    .bind(filters.user_id)
    .bind(filters.departement.as_deref())
    .fetch_one(pool)
    .await
}

pub async fn fetch_staffing_totals(
    pool: &PgPool,
    window: &ReportWindow,
    filters: &KpiFilters,
) -> Result<StaffingTotals, sqlx::Error> {
    sqlx::query_as::<_, StaffingTotals>(
        r#"
        SELECT
          COALESCE(SUM(s.planned_hours), 0)::double precision AS planned_hours,
          COUNT(DISTINCT s.user_id) AS distinct_staff
        FROM staffing_entries s
        WHERE s.entry_date >= $1::date
          AND s.entry_date < $2::date
          AND ($3::uuid IS NULL OR s.user_id = $3)
          AND ($4::text IS NULL OR s.departement = $4)
        "#,
    )
    .bind(window.start)
    .bind(window.end_exclusive)
    .bind(filters.user_id)
    .bind(filters.departement.as_deref())
    .fetch_one(pool)
    .await
}

pub async fn fetch_conversion_by_user(
    pool: &PgPool,
    window: &ReportWindow,
    filters: &KpiFilters,
    won_statuses: &[String],
) -> Result<Vec<UserConversionRow>, sqlx::Error> {
    sqlx::query_as::<_, UserConversionRow>(
        r#"
        SELECT
          o.responsible_user_id AS user_id,
          COUNT(*) AS offers,
          COUNT(*) FILTER (WHERE o.status = ANY($3::text[])) AS won_offers
        FROM offers o
        WHERE o.created_at::date >= $1::date
          AND o.created_at::date < $2::date
          AND o.responsible_user_id IS NOT NULL
          AND ($4::uuid IS NULL OR o.responsible_user_id = $4)
          AND ($5::text IS NULL OR o.departement = $5)
        GROUP BY o.responsible_user_id
        "#,
    )
    .bind(window.start)
    .bind(window.end_exclusive)
    .bind(won_statuses)
    .bind(filters.user_id)
    .bind(filters.departement.as_deref())
    .fetch_all(pool)
    .await
}

pub async fn fetch_load_by_user(
    pool: &PgPool,
    window: &ReportWindow,
    filters: &KpiFilters,
) -> Result<Vec<UserLoadRow>, sqlx::Error> {
    sqlx::query_as::<_, UserLoadRow>(
        r#"
        SELECT
          s.user_id,
          COUNT(*) AS entries,
          COALESCE(SUM(s.planned_hours), 0)::double precision AS total_hours
        FROM staffing_entries s
        WHERE s.entry_date >= $1::date
          AND s.entry_date < $2::date
          AND ($3::uuid IS NULL OR s.user_id = $3)
          AND ($4::text IS NULL OR s.departement = $4)
        GROUP BY s.user_id
        "#,
    )
    .bind(window.start)
    .bind(window.end_exclusive)
    .bind(filters.user_id)
    .bind(filters.departement.as_deref())
    .fetch_all(pool)
    .await
}

pub async fn fetch_margin_by_category(
    pool: &PgPool,
    window: &ReportWindow,
    filters: &KpiFilters,
) -> Result<Vec<CategoryMarginRow>, sqlx::Error> {
    sqlx::query_as::<_, CategoryMarginRow>(
        r#"
        SELECT
          o.cost_category AS category,
          COUNT(*) AS offers,
          COALESCE(AVG(o.expected_margin_pct), 0)::double precision
            AS average_margin_percentage
        FROM offers o
        WHERE o.created_at::date >= $1::date
          AND o.created_at::date < $2::date
          AND o.cost_category IS NOT NULL
          AND o.expected_margin_pct IS NOT NULL
          AND ($3::uuid IS NULL OR o.responsible_user_id = $3)
          AND ($4::text IS NULL OR o.departement = $4)
        GROUP BY o.cost_category
        "#,
    )
    .bind(window.start)
    .bind(window.end_exclusive)
    .bind(filters.user_id)
    .bind(filters.departement.as_deref())
    .fetch_all(pool)
    .await
}
