//! Prediction and explanation handlers.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use ipo_models::{ListingRecord, PredictionResult};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Batch request shared by predict and explain.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub items: Vec<ListingRecord>,
}

/// Prediction response.
#[derive(Serialize)]
pub struct PredictResponse {
    pub results: Vec<PredictionResult>,
}

/// Predict first-day change for each item; results keep input order.
pub async fn predict(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PredictRequest>,
) -> ApiResult<Json<PredictResponse>> {
    let results = state
        .predictions
        .predict_batch(&user.username, &request.items)
        .await?;

    info!(
        username = %user.username,
        items = results.len(),
        "prediction batch completed"
    );
    Ok(Json(PredictResponse { results }))
}

/// Explanation response.
#[derive(Serialize)]
pub struct ExplainResponse {
    pub explanations: Vec<BTreeMap<String, f64>>,
}

/// Best-effort per-feature attribution scores for each item.
pub async fn explain(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(request): Json<PredictRequest>,
) -> ApiResult<Json<ExplainResponse>> {
    let explanations = state.predictions.explain_batch(&request.items);
    Ok(Json(ExplainResponse { explanations }))
}
