use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Reporting bucket width. Serialized lowercase to match the UI query params.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
}

impl Granularity {
    pub fn step_days(&self) -> i64 {
        match self {
            Granularity::Day => 1,
            Granularity::Week => 7,
        }
    }
}

/// Validated report range. `from <= to` is enforced at construction; the rest
/// of the engine never re-checks it.
#[derive(Debug, Clone, Copy)]
pub struct ReportRange {
    from: NaiveDate,
    to: NaiveDate,
    granularity: Granularity,
}

impl ReportRange {
    pub fn new(from: NaiveDate, to: NaiveDate, granularity: Granularity) -> Result<Self, AppError> {
        if from > to {
            return Err(AppError::InvalidRange(format!(
                "range start {} is after range end {}",
                from, to
            )));
        }
        Ok(Self { from, to, granularity })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }
}

/// One time slice of a report. `period_end = period_start + step`; consecutive
/// buckets are contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBucket {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// Half-open query window shared by the time series and the summary reads.
/// `end_exclusive` is the exclusive end of the *last* bucket, which may
/// overhang `to` at week granularity.
#[derive(Debug, Clone, Copy)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end_exclusive: NaiveDate,
    pub step_days: i64,
}

/// Optional dimension filters applied uniformly to every read.
#[derive(Debug, Clone, Default)]
pub struct KpiFilters {
    pub user_id: Option<Uuid>,
    pub departement: Option<String>,
}

/// One row of the consolidated time series. Numeric fields default to zero,
/// never null; `date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetric {
    pub date: NaiveDate,
    pub offers_created: i64,
    pub offers_won: i64,
    pub forecast_revenue: f64,
    pub team_load_hours: f64,
}

impl PeriodMetric {
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            offers_created: 0,
            offers_won: 0,
            forecast_revenue: 0.0,
            team_load_hours: 0.0,
        }
    }
}

/// Range-wide scalar KPIs. All fields are finite numbers; ratios fall back to
/// zero when their denominator is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub conversion_rate: f64,
    pub forecast_revenue: f64,
    pub team_load_percentage: f64,
    pub average_delay_days: f64,
    pub expected_margin_percentage: f64,
    pub total_delayed_tasks: i64,
    pub total_offers: i64,
    pub total_won_offers: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConversion {
    pub offers: i64,
    pub won_offers: i64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoad {
    pub entries: i64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMargin {
    pub offers: i64,
    pub average_margin_percentage: f64,
}

/// Dimension breakdowns. Keys are the distinct values observed in range; an
/// absent key means "no data", not zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdowns {
    pub conversion_by_user: HashMap<String, UserConversion>,
    pub load_by_user: HashMap<String, UserLoad>,
    pub margin_by_category: HashMap<String, CategoryMargin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPerformance {
    pub execution_time_ms: u64,
    pub tables_queried: BTreeSet<String>,
    pub cache_hit_rate: f64,
    pub data_freshness: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedKpiResult {
    pub time_series: Vec<PeriodMetric>,
    pub period_summary: PeriodSummary,
    pub breakdowns: Breakdowns,
    pub performance: QueryPerformance,
}
