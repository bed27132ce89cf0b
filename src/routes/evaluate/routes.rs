use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::error;

use crate::sources::FetchError;
use crate::state::AppState;
use super::{EvaluateParams, EvaluateResponse};

/// Evaluate one flag for one user
pub async fn evaluate(
    State(state): State<AppState>,
    Query(params): Query<EvaluateParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if params.user_id.is_empty() || params.flag_name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "user_id and flag_name are required".to_string(),
        ));
    }

    // An unknown flag (or rule) is a fail-closed 'false', not an error.
    // Only a source that is actually misbehaving surfaces as a failure.
    let result = match state.engine.decide(&params.user_id, &params.flag_name).await {
        Ok(result) => result,
        Err(FetchError::NotFound(_)) => false,
        Err(e) => {
            error!(flag_name = %params.flag_name, error = %e, "failed to evaluate flag");
            return Err((
                StatusCode::BAD_GATEWAY,
                "Failed to evaluate flag".to_string(),
            ));
        }
    };

    // The audit event rides a background worker and never delays the response
    state
        .emitter
        .emit(&params.user_id, &params.flag_name, result);

    Ok(Json(EvaluateResponse {
        flag_name: params.flag_name,
        user_id: params.user_id,
        result,
    }))
}
