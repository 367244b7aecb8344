//! Bonus proposal route handlers

use crate::error::{ApiResult, AppError};
use crate::models::{BonusProposal, CreateBonusRequest, SearchBonusQuery};
use crate::state::SharedState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::debug;

/// List all bonus proposals
pub async fn list_bonuses(State(state): State<SharedState>) -> ApiResult<Json<Vec<BonusProposal>>> {
    debug!("Listing bonus proposals");
    let proposals = state.bonuses.list().await?;
    Ok(Json(proposals))
}

/// Search proposals by employee id, optionally checking the employee name
pub async fn search_bonuses(
    State(state): State<SharedState>,
    query: Result<Query<SearchBonusQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<BonusProposal>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    debug!("Searching bonus proposals: {:?}", query);

    let proposals = state
        .bonuses
        .search(query.employee_id.as_deref(), query.employee_name.as_deref())
        .await?;
    Ok(Json(proposals))
}

/// Submit a new bonus proposal
pub async fn create_bonus(
    State(state): State<SharedState>,
    payload: Result<Json<CreateBonusRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BonusProposal>)> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    debug!("Creating bonus proposal for {:?}", payload.employee_id);

    let created = state.bonuses.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
