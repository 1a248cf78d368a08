use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ConsolidatedKpiResult, Granularity, KpiFilters, ReportRange};
use crate::services::kpi_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/consolidated", get(get_consolidated_kpis))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsolidatedKpiQuery {
    from: String,
    to: String,
    granularity: String,
    user_id: Option<Uuid>,
    departement: Option<String>,
}

async fn get_consolidated_kpis(
    Query(params): Query<ConsolidatedKpiQuery>,
    State(state): State<AppState>,
) -> Result<Json<ConsolidatedKpiResult>, AppError> {
    let granularity = parse_granularity(&params.granularity)?;
    let range = ReportRange::new(
        parse_report_date(&params.from)?,
        parse_report_date(&params.to)?,
        granularity,
    )?;
    let filters = KpiFilters {
        user_id: params.user_id,
        departement: params.departement,
    };

    kpi_service::get_consolidated_kpis(state.kpi_store.as_ref(), &state.kpi_policy, range, filters)
        .await
        .map(Json)
}

fn parse_granularity(value: &str) -> Result<Granularity, AppError> {
    match value {
        "day" => Ok(Granularity::Day),
        "week" => Ok(Granularity::Week),
        other => Err(AppError::InvalidRange(format!(
            "unsupported granularity '{}', expected 'day' or 'week'",
            other
        ))),
    }
}

/// Accepts an ISO-8601 date or timestamp; any time-of-day component is
/// truncated, buckets are calendar-day aligned.
fn parse_report_date(value: &str) -> Result<NaiveDate, AppError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    Err(AppError::InvalidRange(format!(
        "'{}' is not an ISO-8601 date",
        value
    )))
}
