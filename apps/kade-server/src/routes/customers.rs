//! `/api/customers`

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use kade_core::validation::validate_search_query;
use kade_core::{Customer, CustomerInput};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::{CreatedResponse, MessageResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/points", put(adjust_points))
}

#[derive(Debug, Default, Deserialize)]
struct CustomerQuery {
    search: Option<String>,
}

async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    let search = validate_search_query(query.search.as_deref())?;
    Ok(Json(state.db.customers().list(search.as_deref()).await?))
}

async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get_by_id(id).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<Json<CreatedResponse>> {
    let input = input.normalized()?;
    let customer = state.db.customers().create(&input).await?;

    info!(id = customer.id, "Customer created");
    Ok(Json(CreatedResponse {
        id: customer.id,
        message: "Customer created successfully",
    }))
}

async fn update_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<Json<MessageResponse>> {
    let input = input.normalized()?;
    state.db.customers().update(id, &input).await?;

    Ok(Json(MessageResponse {
        message: "Customer updated successfully",
    }))
}

async fn delete_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.customers().delete(id).await?;

    Ok(Json(MessageResponse {
        message: "Customer deleted successfully",
    }))
}

#[derive(Debug, Deserialize)]
struct PointsAdjustment {
    /// Signed change to the balance.
    points: i64,
}

#[derive(Debug, Serialize)]
struct PointsResponse {
    message: &'static str,
    loyalty_points: i64,
}

async fn adjust_points(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<PointsAdjustment>,
) -> ApiResult<Json<PointsResponse>> {
    let loyalty_points = state
        .db
        .customers()
        .adjust_loyalty_points(id, body.points)
        .await?;

    info!(id, delta = body.points, loyalty_points, "Loyalty points adjusted");
    Ok(Json(PointsResponse {
        message: "Loyalty points updated successfully",
        loyalty_points,
    }))
}
