//! Visitor lookup handler.

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{app::AppState, error::AppError, models::visitor::VisitorResponse};

/// `GET /api/v1/visitors/{id}`
pub async fn get_visitor(
    State(state): State<AppState>,
    Path(visitor_id): Path<Uuid>,
) -> Result<Json<VisitorResponse>, AppError> {
    let visitor = state
        .visitors
        .get_visitor(visitor_id)
        .await?
        .ok_or(AppError::VisitorNotFound)?;

    Ok(Json(visitor.into()))
}
