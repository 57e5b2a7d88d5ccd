//! Dataset upload/query endpoints and sales records.

use axum::extract::{Path, State};
use axum::response::Json;
use deskhand_core::dataset::DatasetQuery;
use deskhand_core::sales::SalesAnalytics;
use deskhand_store::NewSale;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthedUser;
use crate::{ApiError, SharedState};

#[derive(Deserialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

pub async fn create_dataset_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<CreateDatasetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.name.is_empty() {
        return Err(ApiError::bad_request("Database name is required"));
    }

    let dataset = state
        .store
        .insert_dataset(
            &ctx.user_id,
            &request.name,
            &request.description,
            &request.filename,
            &request.file_type,
            request.data,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Database saved successfully!",
        "db_id": dataset.id,
        "record_count": dataset.record_count,
    })))
}

pub async fn list_datasets_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let datasets = state.store.datasets_for_owner(&ctx.user_id).await?;
    // Listings stay light: metadata only, no record payloads.
    let summaries: Vec<_> = datasets
        .iter()
        .map(|d| {
            json!({
                "id": d.id,
                "name": d.name,
                "description": d.description,
                "filename": d.source_filename,
                "file_type": d.source_type,
                "record_count": d.record_count,
                "created_at": d.created_at.to_rfc3339(),
            })
        })
        .collect();
    Ok(Json(json!({ "success": true, "databases": summaries })))
}

pub async fn get_dataset_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Path(dataset_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let dataset = state
        .store
        .dataset(&ctx.user_id, &dataset_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Database not found"))?;
    Ok(Json(json!({ "success": true, "database": dataset })))
}

pub async fn query_dataset_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Path(dataset_id): Path<String>,
    Json(query): Json<DatasetQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let dataset = state
        .store
        .dataset(&ctx.user_id, &dataset_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Database not found"))?;

    let results = query.apply(&dataset.records);
    Ok(Json(json!({
        "success": true,
        "count": results.len(),
        "results": results,
    })))
}

#[derive(Deserialize)]
pub struct AddSaleRequest {
    pub db_id: String,
    pub customer_name: String,
    pub product_service: String,
    pub amount: f64,
    pub quantity: i64,
    pub sale_date: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub customer_contact: String,
    #[serde(default)]
    pub notes: String,
}

pub async fn add_sale_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<AddSaleRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.customer_name.is_empty() || request.product_service.is_empty() {
        return Err(ApiError::bad_request(
            "Customer name and product/service are required",
        ));
    }

    let sale = state
        .store
        .insert_sale(
            &ctx.user_id,
            &request.db_id,
            NewSale {
                customer_name: request.customer_name,
                product_service: request.product_service,
                amount: request.amount,
                quantity: request.quantity,
                sale_date: request.sale_date,
                payment_method: request.payment_method,
                customer_contact: request.customer_contact,
                notes: request.notes,
            },
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Sale recorded successfully!",
        "sale_id": sale.id,
        "total": sale.total,
    })))
}

pub async fn sales_analytics_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Path(dataset_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sales = state.store.sales_for_dataset(&ctx.user_id, &dataset_id).await?;
    let analytics = SalesAnalytics::compute(&sales);
    Ok(Json(json!({ "success": true, "analytics": analytics })))
}
