use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::kpi_queries;
use crate::db::kpi_queries::{
    CategoryMarginRow, DelayStats, OfferTotals, PeriodLoadRow, PeriodOfferRow, StaffingTotals,
    UserConversionRow, UserLoadRow,
};
use crate::errors::AppError;
use crate::models::{KpiFilters, ReportWindow};
use crate::services::kpi_policy::KpiPolicy;
use crate::store::kpi_store::KpiStore;

/// Postgres-backed implementation of the KPI storage seam. Thin delegation to
/// the grouped queries in `db::kpi_queries`; no business logic lives here.
pub struct PgKpiStore {
    pool: PgPool,
}

impl PgKpiStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KpiStore for PgKpiStore {
    async fn offers_by_period(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
        policy: &KpiPolicy,
    ) -> Result<Vec<PeriodOfferRow>, AppError> {
        Ok(kpi_queries::fetch_offers_by_period(
            &self.pool,
            window,
            filters,
            &policy.won_statuses,
            &policy.active_statuses,
        )
        .await?)
    }

    async fn team_load_by_period(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
    ) -> Result<Vec<PeriodLoadRow>, AppError> {
        Ok(kpi_queries::fetch_team_load_by_period(&self.pool, window, filters).await?)
    }

    async fn offer_totals(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
        policy: &KpiPolicy,
    ) -> Result<OfferTotals, AppError> {
        Ok(kpi_queries::fetch_offer_totals(
            &self.pool,
            window,
            filters,
            &policy.won_statuses,
            &policy.active_statuses,
        )
        .await?)
    }

    async fn delay_stats(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
        policy: &KpiPolicy,
    ) -> Result<DelayStats, AppError> {
        Ok(
            kpi_queries::fetch_delay_stats(&self.pool, window, filters, policy.on_time_slip_days)
                .await?,
        )
    }

    async fn staffing_totals(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
    ) -> Result<StaffingTotals, AppError> {
        Ok(kpi_queries::fetch_staffing_totals(&self.pool, window, filters).await?)
    }

    async fn conversion_by_user(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
        policy: &KpiPolicy,
    ) -> Result<Vec<UserConversionRow>, AppError> {
        Ok(kpi_queries::fetch_conversion_by_user(
            &self.pool,
            window,
            filters,
            &policy.won_statuses,
        )
        .await?)
    }

    async fn load_by_user(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
    ) -> Result<Vec<UserLoadRow>, AppError> {
        Ok(kpi_queries::fetch_load_by_user(&self.pool, window, filters).await?)
    }

    async fn margin_by_category(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
    ) -> Result<Vec<CategoryMarginRow>, AppError> {
        Ok(kpi_queries::fetch_margin_by_category(&self.pool, window, filters).await?)
    }
}
