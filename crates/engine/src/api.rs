//! The backend seam: the bulk operations the engine issues, and the error
//! taxonomy their failures are folded into.
//!
//! The dispatcher and the invalidation coordinator only ever talk to the
//! backend through [`BudgetApi`], so tests can drive the whole pipeline
//! against an in-memory implementation.

use async_trait::async_trait;
use thiserror::Error;

use api_types::{
    EntityId, ParentRef,
    account::{AccountUpdate, AccountView, AccountWrite},
    bulk::{
        BulkCreate, BulkCreated, BulkDelete, BulkDeleted, BulkUpdate, BulkUpdated, ParentView,
        TableResponse,
    },
    fringe::{FringeUpdate, FringeView, FringeWrite},
    group::{GroupUpdate, GroupView, GroupWrite},
    markup::{MarkupUpdate, MarkupView, MarkupWrite},
    subaccount::{SubAccountUpdate, SubAccountView, SubAccountWrite},
};

/// Network-level error classes, ordered from most to least benign.
///
/// `Cancelled` is never surfaced to the user. `Validation` covers 4xx
/// responses: the optimistic local state is kept so the user can correct and
/// resubmit. `Server` and `Transport` roll the affected store back to its
/// last confirmed snapshot.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("request cancelled")]
    Cancelled,
    #[error("{0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("transport error: {0}")]
    Transport(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Response to markup create/update: the recalculated parent plus the
/// markup record itself.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarkupChanged {
    pub data: ParentView,
    pub markup: MarkupView,
}

/// The bulk HTTP contract of the backend.
///
/// One method per logical operation; every mutating call returns the
/// recalculated parent so callers can clear their `loading` flags with
/// fresh totals.
#[async_trait]
pub trait BudgetApi: Send + Sync {
    // Account tables (owned by a budget).
    async fn list_accounts(&self, budget: EntityId) -> ApiResult<TableResponse<AccountView>>;
    async fn create_accounts(
        &self,
        budget: EntityId,
        body: BulkCreate<AccountWrite>,
    ) -> ApiResult<BulkCreated<AccountView>>;
    async fn update_accounts(
        &self,
        budget: EntityId,
        body: BulkUpdate<AccountUpdate>,
    ) -> ApiResult<BulkUpdated<AccountView>>;
    async fn delete_accounts(&self, budget: EntityId, body: BulkDelete)
    -> ApiResult<BulkDeleted>;

    // Subaccount tables (owned by an account or another subaccount).
    async fn list_subaccounts(
        &self,
        parent: ParentRef,
    ) -> ApiResult<TableResponse<SubAccountView>>;
    async fn create_subaccounts(
        &self,
        parent: ParentRef,
        body: BulkCreate<SubAccountWrite>,
    ) -> ApiResult<BulkCreated<SubAccountView>>;
    async fn update_subaccounts(
        &self,
        parent: ParentRef,
        body: BulkUpdate<SubAccountUpdate>,
    ) -> ApiResult<BulkUpdated<SubAccountView>>;
    async fn delete_subaccounts(
        &self,
        parent: ParentRef,
        body: BulkDelete,
    ) -> ApiResult<BulkDeleted>;

    // Point reads used by the invalidation coordinator.
    async fn get_subaccounts(&self, ids: Vec<EntityId>) -> ApiResult<Vec<SubAccountView>>;
    async fn get_parent(&self, parent: ParentRef, force: bool) -> ApiResult<ParentView>;

    // Fringes are budget-scoped.
    async fn list_fringes(&self, budget: EntityId) -> ApiResult<Vec<FringeView>>;
    async fn create_fringes(
        &self,
        budget: EntityId,
        body: BulkCreate<FringeWrite>,
    ) -> ApiResult<Vec<FringeView>>;
    async fn update_fringes(
        &self,
        budget: EntityId,
        body: BulkUpdate<FringeUpdate>,
    ) -> ApiResult<Vec<FringeView>>;
    async fn delete_fringes(&self, budget: EntityId, body: BulkDelete) -> ApiResult<()>;

    // Group and markup CRUD, by id, referencing child row ids.
    async fn create_group(&self, parent: ParentRef, body: GroupWrite) -> ApiResult<GroupView>;
    async fn update_group(&self, id: EntityId, body: GroupUpdate) -> ApiResult<GroupView>;
    async fn delete_group(&self, id: EntityId) -> ApiResult<()>;
    async fn create_markup(&self, parent: ParentRef, body: MarkupWrite)
    -> ApiResult<MarkupChanged>;
    async fn update_markup(&self, id: EntityId, body: MarkupUpdate) -> ApiResult<MarkupChanged>;
    async fn delete_markup(&self, id: EntityId) -> ApiResult<BulkDeleted>;
}
