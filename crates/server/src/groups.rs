//! Group endpoints. Creation is scoped to a table parent; update and
//! delete address the group by id.

use axum::{
    Json,
    extract::{Path, State},
};

use api_types::{
    EntityId, ParentRef,
    group::{GroupUpdate, GroupView, GroupWrite},
};

use crate::{ServerError, server::ServerState};

async fn create(
    state: &ServerState,
    parent: ParentRef,
    payload: GroupWrite,
) -> Result<Json<GroupView>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.create_group(parent, payload)?))
}

pub async fn create_under_budget(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<GroupWrite>,
) -> Result<Json<GroupView>, ServerError> {
    create(&state, ParentRef::Budget(id), payload).await
}

pub async fn create_under_account(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<GroupWrite>,
) -> Result<Json<GroupView>, ServerError> {
    create(&state, ParentRef::Account(id), payload).await
}

pub async fn create_under_subaccount(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<GroupWrite>,
) -> Result<Json<GroupView>, ServerError> {
    create(&state, ParentRef::Subaccount(id), payload).await
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<GroupUpdate>,
) -> Result<Json<GroupView>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.update_group(id, payload)?))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
) -> Result<(), ServerError> {
    let mut db = state.db.write().await;
    db.delete_group(id)?;
    Ok(())
}
