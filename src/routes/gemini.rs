use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;

use crate::{
    error::{AppError, ValidationError},
    message::{GenerateResponse, RawGenerateRequest},
    state::SharedState,
};

pub async fn generate_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(body) = payload.map_err(|rejection| ValidationError::new("body", rejection.body_text()))?;
    let request = RawGenerateRequest::from_value(body)?.validate()?;

    let response = state.router.generate(request).await?;
    Ok(Json(response))
}
