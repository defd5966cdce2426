// API handlers for the web server

use super::{
    SharedPipeline,
    error::ApiError,
    models::{HealthResponse, RenderRequestBody},
};
use crate::pipeline::{RenderRequest, RenderResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

// --- POST /render ---
// Renders the requested items on both mannequins
pub async fn render(
    State(pipeline): State<SharedPipeline>,
    payload: Result<Json<RenderRequestBody>, JsonRejection>,
) -> Result<Json<RenderResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        debug!("Rejected render request body: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;
    debug!("Render request: {:?}", body);

    let request = RenderRequest::try_from(body)?;
    let response = pipeline.run(&request).await?;

    Ok(Json(response))
}

// --- GET /health ---
pub async fn health(State(pipeline): State<SharedPipeline>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        items: pipeline.catalog().len(),
    })
}
