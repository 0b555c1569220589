//! Prediction history handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use ipo_models::HistoryEntry;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// History response.
#[derive(Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

/// Return the full global history, in append order.
///
/// Authentication is required but the history is not partitioned: any
/// authenticated user sees every entry.
pub async fn get_history(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<HistoryResponse>> {
    let history = state.history.load().await?;
    Ok(Json(HistoryResponse { history }))
}
