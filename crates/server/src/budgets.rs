//! Budget API endpoints

use axum::{
    Json,
    extract::{Path, State},
};

use api_types::{
    EntityId, ParentRef,
    budget::{BudgetView, BudgetWrite},
    bulk::ParentView,
};
use engine::EngineError;

use crate::{ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BudgetWrite>,
) -> Result<Json<BudgetView>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.create_budget(payload)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
) -> Result<Json<BudgetView>, ServerError> {
    let db = state.db.read().await;
    match db.parent_view(ParentRef::Budget(id))? {
        ParentView::Budget(view) => Ok(Json(view)),
        _ => Err(ServerError::Engine(EngineError::NotFound(format!(
            "budget {id}"
        )))),
    }
}
