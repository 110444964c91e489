//! Account table endpoints, scoped under their owning budget.

use axum::{
    Json,
    extract::{Path, State},
};

use api_types::{
    EntityId, ParentRef,
    account::{AccountUpdate, AccountView, AccountWrite},
    bulk::{BulkCreate, BulkCreated, BulkDelete, BulkDeleted, BulkUpdate, BulkUpdated, ParentView, TableResponse},
};
use engine::EngineError;

use crate::{ServerError, server::ServerState};

pub async fn list(
    State(state): State<ServerState>,
    Path(budget): Path<EntityId>,
) -> Result<Json<TableResponse<AccountView>>, ServerError> {
    let db = state.db.read().await;
    Ok(Json(db.list_accounts(budget)?))
}

pub async fn create(
    State(state): State<ServerState>,
    Path(budget): Path<EntityId>,
    Json(payload): Json<BulkCreate<AccountWrite>>,
) -> Result<Json<BulkCreated<AccountView>>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.create_accounts(budget, payload)?))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(budget): Path<EntityId>,
    Json(payload): Json<BulkUpdate<AccountUpdate>>,
) -> Result<Json<BulkUpdated<AccountView>>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.update_accounts(budget, payload)?))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(budget): Path<EntityId>,
    Json(payload): Json<BulkDelete>,
) -> Result<Json<BulkDeleted>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.delete_accounts(budget, payload)?))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
) -> Result<Json<AccountView>, ServerError> {
    let db = state.db.read().await;
    match db.parent_view(ParentRef::Account(id))? {
        ParentView::Account(view) => Ok(Json(view)),
        _ => Err(ServerError::Engine(EngineError::NotFound(format!(
            "account {id}"
        )))),
    }
}
