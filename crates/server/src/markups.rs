//! Markup endpoints. Create and update return the recalculated parent
//! alongside the markup itself, since markups move table totals.

use axum::{
    Json,
    extract::{Path, State},
};

use api_types::{
    EntityId, ParentRef,
    bulk::BulkDeleted,
    markup::{MarkupUpdate, MarkupWrite},
};
use engine::MarkupChanged;

use crate::{ServerError, server::ServerState};

async fn create(
    state: &ServerState,
    parent: ParentRef,
    payload: MarkupWrite,
) -> Result<Json<MarkupChanged>, ServerError> {
    let mut db = state.db.write().await;
    let (data, markup) = db.create_markup(parent, payload)?;
    Ok(Json(MarkupChanged { data, markup }))
}

pub async fn create_under_budget(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<MarkupWrite>,
) -> Result<Json<MarkupChanged>, ServerError> {
    create(&state, ParentRef::Budget(id), payload).await
}

pub async fn create_under_account(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<MarkupWrite>,
) -> Result<Json<MarkupChanged>, ServerError> {
    create(&state, ParentRef::Account(id), payload).await
}

pub async fn create_under_subaccount(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<MarkupWrite>,
) -> Result<Json<MarkupChanged>, ServerError> {
    create(&state, ParentRef::Subaccount(id), payload).await
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<MarkupUpdate>,
) -> Result<Json<MarkupChanged>, ServerError> {
    let mut db = state.db.write().await;
    let (data, markup) = db.update_markup(id, payload)?;
    Ok(Json(MarkupChanged { data, markup }))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
) -> Result<Json<BulkDeleted>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.delete_markup(id)?))
}
