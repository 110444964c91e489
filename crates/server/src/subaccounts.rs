//! Subaccount table endpoints.
//!
//! The same table operations exist under `/accounts/{id}/subaccounts` and
//! `/subaccounts/{id}/subaccounts`; each pair of handlers folds into one
//! implementation keyed by [`ParentRef`].

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use api_types::{
    EntityId, ParentRef,
    bulk::{BulkCreate, BulkCreated, BulkDelete, BulkDeleted, BulkUpdate, BulkUpdated, ParentView, TableResponse},
    subaccount::{SubAccountUpdate, SubAccountView, SubAccountWrite},
};
use engine::EngineError;

use crate::{ServerError, server::ServerState};

async fn list(
    state: &ServerState,
    parent: ParentRef,
) -> Result<Json<TableResponse<SubAccountView>>, ServerError> {
    let db = state.db.read().await;
    Ok(Json(db.list_subaccounts(parent)?))
}

async fn create(
    state: &ServerState,
    parent: ParentRef,
    payload: BulkCreate<SubAccountWrite>,
) -> Result<Json<BulkCreated<SubAccountView>>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.create_subaccounts(parent, payload)?))
}

async fn update(
    state: &ServerState,
    parent: ParentRef,
    payload: BulkUpdate<SubAccountUpdate>,
) -> Result<Json<BulkUpdated<SubAccountView>>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.update_subaccounts(parent, payload)?))
}

async fn delete(
    state: &ServerState,
    parent: ParentRef,
    payload: BulkDelete,
) -> Result<Json<BulkDeleted>, ServerError> {
    let mut db = state.db.write().await;
    Ok(Json(db.delete_subaccounts(parent, payload)?))
}

pub async fn list_under_account(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
) -> Result<Json<TableResponse<SubAccountView>>, ServerError> {
    list(&state, ParentRef::Account(id)).await
}

pub async fn create_under_account(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<BulkCreate<SubAccountWrite>>,
) -> Result<Json<BulkCreated<SubAccountView>>, ServerError> {
    create(&state, ParentRef::Account(id), payload).await
}

pub async fn update_under_account(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<BulkUpdate<SubAccountUpdate>>,
) -> Result<Json<BulkUpdated<SubAccountView>>, ServerError> {
    update(&state, ParentRef::Account(id), payload).await
}

pub async fn delete_under_account(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<BulkDelete>,
) -> Result<Json<BulkDeleted>, ServerError> {
    delete(&state, ParentRef::Account(id), payload).await
}

pub async fn list_under_subaccount(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
) -> Result<Json<TableResponse<SubAccountView>>, ServerError> {
    list(&state, ParentRef::Subaccount(id)).await
}

pub async fn create_under_subaccount(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<BulkCreate<SubAccountWrite>>,
) -> Result<Json<BulkCreated<SubAccountView>>, ServerError> {
    create(&state, ParentRef::Subaccount(id), payload).await
}

pub async fn update_under_subaccount(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<BulkUpdate<SubAccountUpdate>>,
) -> Result<Json<BulkUpdated<SubAccountView>>, ServerError> {
    update(&state, ParentRef::Subaccount(id), payload).await
}

pub async fn delete_under_subaccount(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
    Json(payload): Json<BulkDelete>,
) -> Result<Json<BulkDeleted>, ServerError> {
    delete(&state, ParentRef::Subaccount(id), payload).await
}

#[derive(Deserialize)]
pub struct IdsQuery {
    /// Comma-separated list of subaccount ids.
    ids: String,
}

pub async fn get_many(
    State(state): State<ServerState>,
    Query(query): Query<IdsQuery>,
) -> Result<Json<Vec<SubAccountView>>, ServerError> {
    let mut ids = Vec::new();
    for part in query.ids.split(',').filter(|part| !part.is_empty()) {
        let id = part
            .trim()
            .parse::<EntityId>()
            .map_err(|_| ServerError::Generic(format!("invalid id \"{part}\"")))?;
        ids.push(id);
    }
    let db = state.db.read().await;
    Ok(Json(db.get_subaccounts(&ids)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<EntityId>,
) -> Result<Json<SubAccountView>, ServerError> {
    let db = state.db.read().await;
    match db.parent_view(ParentRef::Subaccount(id))? {
        ParentView::Subaccount(view) => Ok(Json(view)),
        _ => Err(ServerError::Engine(EngineError::NotFound(format!(
            "subaccount {id}"
        )))),
    }
}
