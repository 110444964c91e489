//! HTTP implementation of [`engine::BudgetApi`] backed by `reqwest`.
//!
//! Failures fold into the engine's [`ApiError`] classes: transport
//! problems become `Transport`, 4xx responses become `Validation` with
//! the server's error message, everything else becomes `Server`.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, de::DeserializeOwned};

use api_types::{
    EntityId, ParentRef,
    account::{AccountUpdate, AccountView, AccountWrite},
    budget::{BudgetView, BudgetWrite},
    bulk::{
        BulkCreate, BulkCreated, BulkDelete, BulkDeleted, BulkUpdate, BulkUpdated, ParentView,
        TableResponse,
    },
    fringe::{FringeUpdate, FringeView, FringeWrite},
    group::{GroupUpdate, GroupView, GroupWrite},
    markup::{MarkupUpdate, MarkupWrite},
    subaccount::{SubAccountUpdate, SubAccountView, SubAccountWrite},
};
use engine::{ApiError, ApiResult, BudgetApi, MarkupChanged};

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ApiError::Transport(format!("invalid base_url: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::Transport(format!("invalid endpoint \"{path}\": {err}")))
    }

    async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> ApiResult<T> {
        if res.status().is_success() {
            return res
                .json::<T>()
                .await
                .map_err(|err| ApiError::Transport(err.to_string()));
        }

        let status = res.status();
        let body = res
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());

        if status.is_client_error() {
            Err(ApiError::Validation(body))
        } else {
            Err(ApiError::Server(body))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let res = self
            .http
            .get(self.endpoint(path)?)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::decode(res).await
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let res = self
            .http
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::decode(res).await
    }

    async fn patch_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let res = self
            .http
            .patch(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::decode(res).await
    }

    async fn delete_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let res = self
            .http
            .delete(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::decode(res).await
    }

    async fn delete_empty(&self, path: &str) -> ApiResult<()> {
        let res = self
            .http
            .delete(self.endpoint(path)?)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if res.status().is_success() {
            return Ok(());
        }
        Self::decode::<serde::de::IgnoredAny>(res).await.map(|_| ())
    }

    /// Budgets are created outside the table pipeline, so this lives on
    /// the client rather than on [`BudgetApi`].
    pub async fn create_budget(&self, body: BudgetWrite) -> ApiResult<BudgetView> {
        self.post_json("budgets", &body).await
    }
}

#[async_trait]
impl BudgetApi for Client {
    async fn list_accounts(&self, budget: EntityId) -> ApiResult<TableResponse<AccountView>> {
        self.get_json(&format!("budgets/{budget}/accounts")).await
    }

    async fn create_accounts(
        &self,
        budget: EntityId,
        body: BulkCreate<AccountWrite>,
    ) -> ApiResult<BulkCreated<AccountView>> {
        self.post_json(&format!("budgets/{budget}/accounts"), &body)
            .await
    }

    async fn update_accounts(
        &self,
        budget: EntityId,
        body: BulkUpdate<AccountUpdate>,
    ) -> ApiResult<BulkUpdated<AccountView>> {
        self.patch_json(&format!("budgets/{budget}/accounts"), &body)
            .await
    }

    async fn delete_accounts(
        &self,
        budget: EntityId,
        body: BulkDelete,
    ) -> ApiResult<BulkDeleted> {
        self.delete_json(&format!("budgets/{budget}/accounts"), &body)
            .await
    }

    async fn list_subaccounts(
        &self,
        parent: ParentRef,
    ) -> ApiResult<TableResponse<SubAccountView>> {
        self.get_json(&format!("{}/subaccounts", parent.path_prefix()))
            .await
    }

    async fn create_subaccounts(
        &self,
        parent: ParentRef,
        body: BulkCreate<SubAccountWrite>,
    ) -> ApiResult<BulkCreated<SubAccountView>> {
        self.post_json(&format!("{}/subaccounts", parent.path_prefix()), &body)
            .await
    }

    async fn update_subaccounts(
        &self,
        parent: ParentRef,
        body: BulkUpdate<SubAccountUpdate>,
    ) -> ApiResult<BulkUpdated<SubAccountView>> {
        self.patch_json(&format!("{}/subaccounts", parent.path_prefix()), &body)
            .await
    }

    async fn delete_subaccounts(
        &self,
        parent: ParentRef,
        body: BulkDelete,
    ) -> ApiResult<BulkDeleted> {
        self.delete_json(&format!("{}/subaccounts", parent.path_prefix()), &body)
            .await
    }

    async fn get_subaccounts(&self, ids: Vec<EntityId>) -> ApiResult<Vec<SubAccountView>> {
        let joined = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.get_json(&format!("subaccounts?ids={joined}")).await
    }

    async fn get_parent(&self, parent: ParentRef, force: bool) -> ApiResult<ParentView> {
        let path = if force {
            format!("{}?force=true", parent.path_prefix())
        } else {
            parent.path_prefix()
        };
        match parent {
            ParentRef::Budget(_) => Ok(ParentView::Budget(self.get_json(&path).await?)),
            ParentRef::Account(_) => Ok(ParentView::Account(self.get_json(&path).await?)),
            ParentRef::Subaccount(_) => Ok(ParentView::Subaccount(self.get_json(&path).await?)),
        }
    }

    async fn list_fringes(&self, budget: EntityId) -> ApiResult<Vec<FringeView>> {
        self.get_json(&format!("budgets/{budget}/fringes")).await
    }

    async fn create_fringes(
        &self,
        budget: EntityId,
        body: BulkCreate<FringeWrite>,
    ) -> ApiResult<Vec<FringeView>> {
        self.post_json(&format!("budgets/{budget}/fringes"), &body)
            .await
    }

    async fn update_fringes(
        &self,
        budget: EntityId,
        body: BulkUpdate<FringeUpdate>,
    ) -> ApiResult<Vec<FringeView>> {
        self.patch_json(&format!("budgets/{budget}/fringes"), &body)
            .await
    }

    async fn delete_fringes(&self, budget: EntityId, body: BulkDelete) -> ApiResult<()> {
        let res = self
            .http
            .delete(self.endpoint(&format!("budgets/{budget}/fringes"))?)
            .json(&body)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if res.status().is_success() {
            return Ok(());
        }
        Self::decode::<serde::de::IgnoredAny>(res).await.map(|_| ())
    }

    async fn create_group(&self, parent: ParentRef, body: GroupWrite) -> ApiResult<GroupView> {
        self.post_json(&format!("{}/groups", parent.path_prefix()), &body)
            .await
    }

    async fn update_group(&self, id: EntityId, body: GroupUpdate) -> ApiResult<GroupView> {
        self.patch_json(&format!("groups/{id}"), &body).await
    }

    async fn delete_group(&self, id: EntityId) -> ApiResult<()> {
        self.delete_empty(&format!("groups/{id}")).await
    }

    async fn create_markup(
        &self,
        parent: ParentRef,
        body: MarkupWrite,
    ) -> ApiResult<MarkupChanged> {
        self.post_json(&format!("{}/markups", parent.path_prefix()), &body)
            .await
    }

    async fn update_markup(&self, id: EntityId, body: MarkupUpdate) -> ApiResult<MarkupChanged> {
        self.patch_json(&format!("markups/{id}"), &body).await
    }

    async fn delete_markup(&self, id: EntityId) -> ApiResult<BulkDeleted> {
        let res = self
            .http
            .delete(self.endpoint(&format!("markups/{id}"))?)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::decode(res).await
    }
}
