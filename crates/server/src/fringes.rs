//! Fringe endpoints, scoped under their owning budget.

use axum::{
    Json,
    extract::{Path, State},
};

use api_types::{
    EntityId,
    bulk::{BulkCreate, BulkDelete, BulkUpdate},
    fringe::{FringeUpdate, FringeView, FringeWrite},
};

use crate::{ServerError, server::ServerState};

pub async fn list(
    State(state): State<ServerState>,
    Path(budget): Path<EntityId>,
) -> Result<Json<Vec<FringeView>>, ServerError> {
    let db = state.db.read().await;
    Ok(Json(db.list_fringes(budget)?))
}

pub async fn create(
    State(state): State<ServerState>,
    Path(budget): Path<EntityId>,
    Json(payload): Json<BulkCreate<FringeWrite>>,
) -> Result<Json<Vec<FringeView>>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.create_fringes(budget, payload)?))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(budget): Path<EntityId>,
    Json(payload): Json<BulkUpdate<FringeUpdate>>,
) -> Result<Json<Vec<FringeView>>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.update_fringes(budget, payload)?))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(budget): Path<EntityId>,
    Json(payload): Json<BulkDelete>,
) -> Result<(), ServerError> {
    let mut db = state.db.write().await;
    db.delete_fringes(budget, payload)?;
    Ok(())
}
