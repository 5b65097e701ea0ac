//! `/api/products`

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use kade_core::validation::validate_search_query;
use kade_core::{Product, ProductInput};
use kade_db::ProductFilter;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::{CreatedResponse, MessageResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/categories", get(list_categories))
        .route("/products/barcode/{code}", get(get_product_by_barcode))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/stock", put(adjust_stock))
}

async fn list_products(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    let filter = ProductFilter {
        search: validate_search_query(filter.search.as_deref())?,
        category: filter.category,
    };
    Ok(Json(state.db.products().list(&filter).await?))
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.products().categories().await?))
}

async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get_by_id(id).await?))
}

async fn get_product_by_barcode(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get_by_barcode(code.trim()).await?))
}

async fn create_product(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<CreatedResponse>> {
    let input = input.normalized()?;
    let product = state.db.products().create(&input).await?;

    info!(id = product.id, name = %product.name, "Product created");
    Ok(Json(CreatedResponse {
        id: product.id,
        message: "Product created successfully",
    }))
}

async fn update_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<MessageResponse>> {
    let input = input.normalized()?;
    state.db.products().update(id, &input).await?;

    Ok(Json(MessageResponse {
        message: "Product updated successfully",
    }))
}

async fn delete_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.products().soft_delete(id).await?;

    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}

#[derive(Debug, Deserialize)]
struct StockAdjustment {
    /// Units received (positive) or written off (negative).
    delta: i64,
}

#[derive(Debug, Serialize)]
struct StockResponse {
    message: &'static str,
    stock_quantity: i64,
}

/// Receives or writes off stock outside a sale, under the stock policy.
async fn adjust_stock(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StockAdjustment>,
) -> ApiResult<Json<StockResponse>> {
    let policy = state.db.policies().stock;
    let stock_quantity = state.db.products().adjust_stock(id, body.delta, policy).await?;

    info!(id, delta = body.delta, stock_quantity, "Stock adjusted");
    Ok(Json(StockResponse {
        message: "Stock updated successfully",
        stock_quantity,
    }))
}
