//! `/api/sales`
//!
//! ```text
//! POST /api/sales
//!   │  ApiJson<NewSale>
//!   ▼
//! business_day(now, store.utc_offset_minutes)
//!   │
//!   ▼
//! SaleRepository::create_sale  ── one transaction ──►  SaleReceipt + message
//! ```

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use kade_core::sale::NewSale;
use kade_core::validation::{normalize_optional, parse_date};
use kade_core::{SaleDetail, SaleReceipt, SaleSummary};
use kade_db::SaleFilter;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::MessageResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale).delete(void_sale))
}

/// Raw query of `GET /sales`. Dates arrive as text so an empty
/// `start_date=` means "no bound" rather than a parse error.
#[derive(Debug, Default, Deserialize)]
struct SalesQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    limit: Option<i64>,
}

impl SalesQuery {
    fn into_filter(self) -> ApiResult<SaleFilter> {
        let start_date = normalize_optional(self.start_date)
            .map(|d| parse_date("start_date", &d))
            .transpose()?;
        let end_date = normalize_optional(self.end_date)
            .map(|d| parse_date("end_date", &d))
            .transpose()?;

        Ok(SaleFilter {
            start_date,
            end_date,
            limit: self.limit,
        })
    }
}

async fn list_sales(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SalesQuery>,
) -> ApiResult<Json<Vec<SaleSummary>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.db.sales().list(&filter).await?))
}

#[derive(Debug, Serialize)]
struct SaleCreated {
    #[serde(flatten)]
    receipt: SaleReceipt,
    message: &'static str,
}

async fn create_sale(
    State(state): State<AppState>,
    ApiJson(new_sale): ApiJson<NewSale>,
) -> ApiResult<Json<SaleCreated>> {
    let now = Utc::now();
    let receipt = state
        .db
        .sales()
        .create_sale(&new_sale, now, state.business_day(now))
        .await?;

    Ok(Json(SaleCreated {
        receipt,
        message: "Sale completed successfully",
    }))
}

async fn get_sale(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<SaleDetail>> {
    Ok(Json(state.db.sales().get_detail(id).await?))
}

async fn void_sale(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.sales().void_sale(id, Utc::now()).await?;

    Ok(Json(MessageResponse {
        message: "Sale voided successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_blank_dates_are_unbounded() {
        let filter = SalesQuery {
            start_date: Some("".into()),
            end_date: Some("2024-03-05".into()),
            limit: Some(10),
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.start_date, None);
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(filter.limit, Some(10));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let err = SalesQuery {
            start_date: Some("05/03/2024".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap_err();

        assert!(err.to_string().contains("start_date"));
    }
}
