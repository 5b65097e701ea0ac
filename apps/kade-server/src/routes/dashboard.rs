//! `/api/dashboard`

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use kade_core::validation::{normalize_optional, parse_date};
use kade_core::DashboardStats;

use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/stats", get(stats))
}

#[derive(Debug, Default, Deserialize)]
struct StatsQuery {
    /// Business day to report on; today when absent.
    date: Option<String>,
}

async fn stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<Json<DashboardStats>> {
    let day = match normalize_optional(query.date) {
        Some(date) => parse_date("date", &date)?,
        None => state.today(),
    };

    Ok(Json(state.db.dashboard().stats(day).await?))
}
