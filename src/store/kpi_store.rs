use async_trait::async_trait;

use crate::db::kpi_queries::{
    CategoryMarginRow, DelayStats, OfferTotals, PeriodLoadRow, PeriodOfferRow, StaffingTotals,
    UserConversionRow, UserLoadRow,
};
use crate::errors::AppError;
use crate::models::{KpiFilters, ReportWindow};
use crate::services::kpi_policy::KpiPolicy;

/// The engine's storage seam: a fixed set of grouped/aggregate reads, each
/// issued at most once per report, independent of the bucket count. The
/// engine performs no writes and no per-bucket queries through this trait.
#[async_trait]
pub trait KpiStore: Send + Sync {
    async fn offers_by_period(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
        policy: &KpiPolicy,
    ) -> Result<Vec<PeriodOfferRow>, AppError>;

    async fn team_load_by_period(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
    ) -> Result<Vec<PeriodLoadRow>, AppError>;

    async fn offer_totals(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
        policy: &KpiPolicy,
    ) -> Result<OfferTotals, AppError>;

    async fn delay_stats(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
        policy: &KpiPolicy,
    ) -> Result<DelayStats, AppError>;

    async fn staffing_totals(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
    ) -> Result<StaffingTotals, AppError>;

    async fn conversion_by_user(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
        policy: &KpiPolicy,
    ) -> Result<Vec<UserConversionRow>, AppError>;

    async fn load_by_user(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
    ) -> Result<Vec<UserLoadRow>, AppError>;

    async fn margin_by_category(
        &self,
        window: &ReportWindow,
        filters: &KpiFilters,
    ) -> Result<Vec<CategoryMarginRow>, AppError>;
}
