use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    schemas::{validate_input, ComputeHeatingBillInput, HeatingBillPath, HeatingBillQuery},
    services::heating_bill::{
        compute_heating_bill, fetch_heating_bill_data, mock_heating_bill_model,
        preview_props_to_model, validate_model, BillingError, HeatingBillModel, PreviewProps,
        ValidationResult,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/heating-bills/mock", axum::routing::get(get_mock_bill))
        .route(
            "/heating-bills/compute",
            axum::routing::post(compute_bill),
        )
        .route(
            "/heating-bills/validate",
            axum::routing::post(validate_bill),
        )
        .route(
            "/heating-bills/preview",
            axum::routing::post(preview_bill),
        )
        .route(
            "/heating-bills/{document_id}",
            axum::routing::get(get_heating_bill),
        )
}

#[derive(Debug, Serialize)]
struct HeatingBillResponse {
    model: HeatingBillModel,
    validation: ValidationResult,
}

fn checked(model: HeatingBillModel) -> Json<HeatingBillResponse> {
    let validation = validate_model(&model);
    Json(HeatingBillResponse { model, validation })
}

/// `NoData` is an empty state for the UI, not a failure.
fn render(result: Result<HeatingBillModel, BillingError>) -> AppResult<Response> {
    match result {
        Ok(model) => Ok(checked(model).into_response()),
        Err(BillingError::NoData { unit_id }) => {
            Ok(Json(json!({ "status": "no_data", "unit_id": unit_id })).into_response())
        }
        Err(error) => Err(error.into()),
    }
}

async fn get_heating_bill(
    State(state): State<AppState>,
    Path(path): Path<HeatingBillPath>,
    Query(query): Query<HeatingBillQuery>,
) -> AppResult<Response> {
    validate_input(&path)?;
    validate_input(&query)?;

    if state.config.heating_bill_use_mock {
        tracing::info!(document_id = %path.document_id, "Serving mock heating bill");
        return render(mock_heating_bill_model());
    }

    let pool = db_pool(&state)?;
    let target_unit_id = query.unit_id.as_deref();
    let timeout = Duration::from_secs(state.config.fetch_timeout_seconds);

    let inputs =
        match fetch_heating_bill_data(pool, &path.document_id, target_unit_id, timeout).await {
            Ok(inputs) => inputs,
            Err(error) => return render(Err(error)),
        };
    let config = state.config.billing_config().for_document(&inputs.document);
    render(compute_heating_bill(&inputs, &config, target_unit_id))
}

async fn compute_bill(
    State(state): State<AppState>,
    Json(payload): Json<ComputeHeatingBillInput>,
) -> AppResult<Response> {
    validate_input(&payload)?;

    let mut config = state
        .config
        .billing_config()
        .for_document(&payload.inputs.document);
    if let Some(overrides) = &payload.config {
        config = overrides.apply(config);
    }
    render(compute_heating_bill(
        &payload.inputs,
        &config,
        payload.target_unit_id.as_deref(),
    ))
}

async fn validate_bill(Json(model): Json<HeatingBillModel>) -> Json<ValidationResult> {
    Json(validate_model(&model))
}

async fn get_mock_bill() -> AppResult<Response> {
    render(mock_heating_bill_model())
}

async fn preview_bill(Json(props): Json<PreviewProps>) -> AppResult<Response> {
    render(preview_props_to_model(&props))
}

fn db_pool(state: &AppState) -> AppResult<&sqlx::PgPool> {
    state.db_pool.as_ref().ok_or_else(|| {
        AppError::Dependency(
            "Supabase database is not configured. Set SUPABASE_DB_URL or DATABASE_URL.".to_string(),
        )
    })
}
