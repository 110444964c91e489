//! Optimistic dispatch: every user-intent event is applied locally first,
//! then translated into at most one bulk backend call whose outcome settles
//! the store.
//!
//! The dispatcher is generic over [`TableDomain`] so account tables and
//! subaccount tables run through the same pipeline with different wire
//! endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use uuid::Uuid;

use api_types::{
    EntityId, ParentRef,
    bulk::{BulkCreate, BulkCreated, BulkDelete, BulkDeleted, BulkUpdate, BulkUpdated, ParentView, TableResponse},
    group::{GroupUpdate, GroupWrite},
    markup::{MarkupUpdate, MarkupWrite},
};

use crate::api::{ApiError, ApiResult, BudgetApi, MarkupChanged};
use crate::accounts::Account;
use crate::budgets::Budget;
use crate::error::EngineError;
use crate::events::{ChangeEvent, FieldPatch, consolidate};
use crate::groups::Group;
use crate::markups::Markup;
use crate::rows::{Row, RowId, TableRecord, generate_table_data};
use crate::store::{DetailStore, TableStore};
use crate::subaccounts::SubAccount;

type ViewOf<D> = <<D as TableDomain>::Record as TableRecord>::View;
type WriteOf<D> = <<D as TableDomain>::Record as TableRecord>::Write;
type UpdateOf<D> = <<D as TableDomain>::Record as TableRecord>::Update;

/// Binds a record type to the concrete backend endpoints its tables flush
/// through.
#[async_trait]
pub trait TableDomain: Send + Sync + 'static {
    type Record: TableRecord;

    async fn list(
        api: &dyn BudgetApi,
        parent: ParentRef,
    ) -> ApiResult<TableResponse<ViewOf<Self>>>;
    async fn bulk_create(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkCreate<WriteOf<Self>>,
    ) -> ApiResult<BulkCreated<ViewOf<Self>>>;
    async fn bulk_update(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkUpdate<UpdateOf<Self>>,
    ) -> ApiResult<BulkUpdated<ViewOf<Self>>>;
    async fn bulk_delete(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkDelete,
    ) -> ApiResult<BulkDeleted>;
}

/// Account tables hang directly off a budget.
pub struct AccountsDomain;

#[async_trait]
impl TableDomain for AccountsDomain {
    type Record = Account;

    async fn list(
        api: &dyn BudgetApi,
        parent: ParentRef,
    ) -> ApiResult<TableResponse<ViewOf<Self>>> {
        api.list_accounts(parent.id()).await
    }

    async fn bulk_create(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkCreate<WriteOf<Self>>,
    ) -> ApiResult<BulkCreated<ViewOf<Self>>> {
        api.create_accounts(parent.id(), body).await
    }

    async fn bulk_update(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkUpdate<UpdateOf<Self>>,
    ) -> ApiResult<BulkUpdated<ViewOf<Self>>> {
        api.update_accounts(parent.id(), body).await
    }

    async fn bulk_delete(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkDelete,
    ) -> ApiResult<BulkDeleted> {
        api.delete_accounts(parent.id(), body).await
    }
}

/// Subaccount tables hang off an account or another subaccount.
pub struct SubAccountsDomain;

#[async_trait]
impl TableDomain for SubAccountsDomain {
    type Record = SubAccount;

    async fn list(
        api: &dyn BudgetApi,
        parent: ParentRef,
    ) -> ApiResult<TableResponse<ViewOf<Self>>> {
        api.list_subaccounts(parent).await
    }

    async fn bulk_create(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkCreate<WriteOf<Self>>,
    ) -> ApiResult<BulkCreated<ViewOf<Self>>> {
        api.create_subaccounts(parent, body).await
    }

    async fn bulk_update(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkUpdate<UpdateOf<Self>>,
    ) -> ApiResult<BulkUpdated<ViewOf<Self>>> {
        api.update_subaccounts(parent, body).await
    }

    async fn bulk_delete(
        api: &dyn BudgetApi,
        parent: ParentRef,
        body: BulkDelete,
    ) -> ApiResult<BulkDeleted> {
        api.delete_subaccounts(parent, body).await
    }
}

/// The single backend call one event translates to, built from the store's
/// post-application state.
enum PlannedCall<D: TableDomain> {
    Create {
        placeholder_ids: Vec<Uuid>,
        body: BulkCreate<WriteOf<D>>,
        /// Group the created rows join once the backend assigns their ids.
        group: Option<EntityId>,
    },
    Update {
        body: BulkUpdate<UpdateOf<D>>,
    },
    Delete {
        body: BulkDelete,
    },
    /// Every group whose membership the event changed, persisted as one
    /// `update_group` per entry.
    GroupChildren {
        updates: Vec<(EntityId, Vec<EntityId>)>,
    },
    MarkupChildren {
        id: EntityId,
        children: Vec<EntityId>,
    },
}

/// What a flushed call produced, normalized across endpoints.
enum Settled<D: TableDomain> {
    Created {
        placeholder_ids: Vec<Uuid>,
        response: BulkCreated<ViewOf<D>>,
        group: Option<EntityId>,
    },
    Updated(BulkUpdated<ViewOf<D>>),
    Deleted(BulkDeleted),
    GroupSynced(Vec<Group>),
    MarkupSynced(MarkupChanged),
}

/// Drives one mounted table: local state, event translation, and settlement
/// of backend responses.
pub struct TableDispatcher<D: TableDomain> {
    api: Arc<dyn BudgetApi>,
    parent: ParentRef,
    store: Arc<Mutex<TableStore<D::Record>>>,
    detail: Arc<Mutex<DetailStore>>,
    budget: Arc<Mutex<Option<Budget>>>,
}

impl<D: TableDomain> TableDispatcher<D> {
    pub fn new(api: Arc<dyn BudgetApi>, parent: ParentRef) -> Self {
        Self {
            api,
            parent,
            store: Arc::new(Mutex::new(TableStore::new())),
            detail: Arc::new(Mutex::new(DetailStore::default())),
            budget: Arc::new(Mutex::new(None)),
        }
    }

    /// Shares an existing store, used when a cache hit remounts a table
    /// without refetching.
    pub fn with_stores(
        api: Arc<dyn BudgetApi>,
        parent: ParentRef,
        store: Arc<Mutex<TableStore<D::Record>>>,
        detail: Arc<Mutex<DetailStore>>,
    ) -> Self {
        Self {
            api,
            parent,
            store,
            detail,
            budget: Arc::new(Mutex::new(None)),
        }
    }

    pub fn parent(&self) -> ParentRef {
        self.parent
    }

    pub fn store(&self) -> Arc<Mutex<TableStore<D::Record>>> {
        Arc::clone(&self.store)
    }

    pub fn detail(&self) -> Arc<Mutex<DetailStore>> {
        Arc::clone(&self.detail)
    }

    pub fn budget(&self) -> Arc<Mutex<Option<Budget>>> {
        Arc::clone(&self.budget)
    }

    /// Fetches the table listing and parent detail and installs them as the
    /// confirmed snapshot.
    pub async fn mount(&self) -> Result<(), EngineError> {
        {
            let mut store = self.store.lock().await;
            store.loading = true;
        }
        let listing = D::list(self.api.as_ref(), self.parent).await?;
        let entities = listing
            .data
            .into_iter()
            .map(<D::Record as TableRecord>::from_view)
            .collect();
        let groups = listing.groups.into_iter().map(Group::from).collect();
        let markups = listing.markups.into_iter().map(Markup::from).collect();
        let rows = generate_table_data(entities, groups, markups);

        let parent = self.api.get_parent(self.parent, false).await?;
        {
            let mut store = self.store.lock().await;
            store.hydrate(rows);
        }
        self.merge_parent(&parent).await;
        {
            let mut detail = self.detail.lock().await;
            detail.loading = false;
            detail.invalidated = false;
        }
        Ok(())
    }

    /// Applies an event locally, then flushes it as at most one backend
    /// call. Backend failures never return an error from here; they settle
    /// into store flags per the error class.
    pub async fn dispatch(&self, event: ChangeEvent<D::Record>) {
        let affects_totals = event.affects_totals();
        let generation;
        let call;
        {
            let mut store = self.store.lock().await;
            // A move strips the row from every group it was in; those
            // memberships must be flushed too, so capture them before the
            // event rewrites them.
            let detached_from = match &event {
                ChangeEvent::RowPositionChanged {
                    row: RowId::Model(id),
                    ..
                } => groups_containing(store.rows(), *id),
                _ => Vec::new(),
            };
            store.record(event.clone());
            generation = store.generation();
            call = Self::plan(&event, store.rows(), &detached_from);
            if call.is_some() {
                store.begin_save();
            }
        }
        let Some(call) = call else {
            return;
        };
        if affects_totals {
            let mut detail = self.detail.lock().await;
            detail.begin_recalculation();
        }

        tracing::debug!(event = event.kind(), parent = %self.parent.path_prefix(), "flushing event");
        let outcome = self.execute(call).await;
        self.settle(generation, affects_totals, outcome).await;
    }

    /// Translates an applied event into its backend call. `None` means the
    /// event is local-only (placeholder edits, server echoes).
    fn plan(
        event: &ChangeEvent<D::Record>,
        rows: &[Row<D::Record>],
        detached_from: &[EntityId],
    ) -> Option<PlannedCall<D>> {
        match event {
            ChangeEvent::DataChange { changes } => {
                // Placeholder rows have no backend id yet; their edits ride
                // along with the create that activates them.
                let mut per_row: HashMap<EntityId, Vec<FieldPatch>> = HashMap::new();
                let mut order: Vec<EntityId> = Vec::new();
                for change in changes {
                    if let RowId::Model(id) = change.row {
                        per_row
                            .entry(id)
                            .or_insert_with(|| {
                                order.push(id);
                                Vec::new()
                            })
                            .push(change.patch.clone());
                    }
                }
                if order.is_empty() {
                    return None;
                }
                let data = order
                    .iter()
                    .filter_map(|id| {
                        per_row
                            .get(id)
                            .map(|patches| D::Record::update_from_patches(*id, patches))
                    })
                    .collect();
                Some(PlannedCall::Update {
                    body: BulkUpdate { data },
                })
            }
            ChangeEvent::RowAdd {
                placeholder_ids,
                writes,
            } => {
                let body = match writes {
                    Some(writes) => BulkCreate::Data {
                        data: writes.clone(),
                    },
                    None => BulkCreate::Count {
                        count: placeholder_ids.len(),
                    },
                };
                Some(PlannedCall::Create {
                    placeholder_ids: placeholder_ids.clone(),
                    body,
                    group: None,
                })
            }
            ChangeEvent::RowInsert {
                placeholder_id,
                write,
                group,
                ..
            } => Some(PlannedCall::Create {
                placeholder_ids: vec![*placeholder_id],
                body: BulkCreate::Data {
                    data: vec![write.clone()],
                },
                group: *group,
            }),
            ChangeEvent::RowDelete { rows } => {
                let ids: Vec<EntityId> = rows
                    .iter()
                    .filter_map(|row| match row {
                        RowId::Model(id) => Some(*id),
                        _ => None,
                    })
                    .collect();
                if ids.is_empty() {
                    // Placeholders, group rows, and markup rows deleted
                    // here were never persisted or are deleted via their
                    // own endpoints first.
                    return None;
                }
                Some(PlannedCall::Delete {
                    body: BulkDelete { ids },
                })
            }
            ChangeEvent::RowPositionChanged { group, .. } => {
                // Every group the move touched gets its membership
                // persisted: the groups the row left and the destination.
                let mut touched = detached_from.to_vec();
                if let Some(id) = group {
                    if !touched.contains(id) {
                        touched.push(*id);
                    }
                }
                let updates: Vec<(EntityId, Vec<EntityId>)> = touched
                    .into_iter()
                    .filter_map(|id| Some((id, group_children(rows, id)?)))
                    .collect();
                if updates.is_empty() {
                    return None;
                }
                Some(PlannedCall::GroupChildren { updates })
            }
            ChangeEvent::RowAddToGroup { group, .. }
            | ChangeEvent::RowRemoveFromGroup { group, .. } => {
                Some(PlannedCall::GroupChildren {
                    updates: vec![(*group, group_children(rows, *group)?)],
                })
            }
            ChangeEvent::RowAddToMarkup { markup, .. }
            | ChangeEvent::RowRemoveFromMarkup { markup, .. } => {
                Some(PlannedCall::MarkupChildren {
                    id: *markup,
                    children: markup_children(rows, *markup)?,
                })
            }
            // Produced by api-first flows or by settlement itself.
            ChangeEvent::GroupAdded(_)
            | ChangeEvent::GroupUpdated(_)
            | ChangeEvent::MarkupAdded(_)
            | ChangeEvent::MarkupUpdated(_)
            | ChangeEvent::PlaceholdersActivated { .. } => None,
        }
    }

    async fn execute(&self, call: PlannedCall<D>) -> ApiResult<Settled<D>> {
        match call {
            PlannedCall::Create {
                placeholder_ids,
                body,
                group,
            } => {
                let response = D::bulk_create(self.api.as_ref(), self.parent, body).await?;
                Ok(Settled::Created {
                    placeholder_ids,
                    response,
                    group,
                })
            }
            PlannedCall::Update { body } => {
                let response = D::bulk_update(self.api.as_ref(), self.parent, body).await?;
                Ok(Settled::Updated(response))
            }
            PlannedCall::Delete { body } => {
                let response = D::bulk_delete(self.api.as_ref(), self.parent, body).await?;
                Ok(Settled::Deleted(response))
            }
            PlannedCall::GroupChildren { updates } => {
                let mut synced = Vec::with_capacity(updates.len());
                for (id, children) in updates {
                    let view = self
                        .api
                        .update_group(
                            id,
                            GroupUpdate {
                                name: None,
                                color: None,
                                children: Some(children),
                            },
                        )
                        .await?;
                    synced.push(Group::from(view));
                }
                Ok(Settled::GroupSynced(synced))
            }
            PlannedCall::MarkupChildren { id, children } => {
                let changed = self
                    .api
                    .update_markup(
                        id,
                        MarkupUpdate {
                            identifier: None,
                            description: None,
                            unit: None,
                            rate: None,
                            children: Some(children),
                        },
                    )
                    .await?;
                Ok(Settled::MarkupSynced(changed))
            }
        }
    }

    /// Lands a backend outcome, unless local state has moved on since the
    /// request was issued.
    async fn settle(
        &self,
        generation: u64,
        affects_totals: bool,
        outcome: ApiResult<Settled<D>>,
    ) {
        let stale = {
            let mut store = self.store.lock().await;
            if store.generation() != generation {
                store.end_save();
                true
            } else {
                false
            }
        };
        if stale {
            tracing::debug!("discarding response from a superseded request");
            if affects_totals {
                let mut detail = self.detail.lock().await;
                detail.end_recalculation();
            }
            return;
        }
        match outcome {
            Ok(settled) => {
                let (parent, attach) = self.land(settled).await;
                {
                    let mut store = self.store.lock().await;
                    store.end_save();
                    store.error = None;
                }
                if let Some(parent) = parent {
                    self.merge_parent(&parent).await;
                }
                if let Some(group) = attach {
                    self.flush_group_membership(group).await;
                }
                if affects_totals {
                    let mut detail = self.detail.lock().await;
                    detail.end_recalculation();
                }
            }
            Err(ApiError::Cancelled) => {
                {
                    let mut store = self.store.lock().await;
                    store.end_save();
                }
                if affects_totals {
                    let mut detail = self.detail.lock().await;
                    detail.end_recalculation();
                }
            }
            Err(ApiError::Validation(message)) => {
                // The optimistic rows stay; the user can correct and retry.
                let mut store = self.store.lock().await;
                store.end_save();
                store.error = Some(message);
                drop(store);
                if affects_totals {
                    let mut detail = self.detail.lock().await;
                    detail.end_recalculation();
                }
            }
            Err(err @ (ApiError::Server(_) | ApiError::Transport(_))) => {
                tracing::error!(error = %err, "flush failed, rolling back to confirmed state");
                let mut store = self.store.lock().await;
                store.rollback();
                store.end_save();
                store.error = Some(err.to_string());
                drop(store);
                let mut detail = self.detail.lock().await;
                if affects_totals {
                    detail.end_recalculation();
                }
                detail.invalidated = true;
            }
        }
    }

    /// Lands a settled outcome; returns the refreshed parent view and, for
    /// creates targeting a group, the group whose membership must still be
    /// persisted.
    async fn land(&self, settled: Settled<D>) -> (Option<ParentView>, Option<EntityId>) {
        let mut store = self.store.lock().await;
        match settled {
            Settled::Created {
                placeholder_ids,
                response,
                group,
            } => {
                let models: Vec<D::Record> = response
                    .children
                    .into_iter()
                    .map(<D::Record as TableRecord>::from_view)
                    .collect();
                let model_ids: Vec<EntityId> =
                    models.iter().map(TableRecord::id).collect();
                store.record(ChangeEvent::PlaceholdersActivated {
                    placeholder_ids,
                    models,
                });
                if let Some(group) = group {
                    store.record(ChangeEvent::RowAddToGroup {
                        group,
                        rows: model_ids,
                    });
                }
                (Some(response.data), group)
            }
            Settled::Updated(response) => {
                if let Some(children) = response.children {
                    for child in children {
                        store.sync_model(<D::Record as TableRecord>::from_view(child));
                    }
                }
                if let Some(budget) = response.budget {
                    let mut held = self.budget.lock().await;
                    *held = Some(Budget::from(budget));
                }
                (Some(response.data), None)
            }
            Settled::Deleted(response) => (Some(response.data), None),
            Settled::GroupSynced(groups) => {
                for group in groups {
                    store.sync_group(group);
                }
                (None, None)
            }
            Settled::MarkupSynced(changed) => {
                store.sync_markup(Markup::from(changed.markup));
                (Some(changed.data), None)
            }
        }
    }

    /// Persists a group's membership after an activation attached freshly
    /// created rows to it.
    async fn flush_group_membership(&self, id: EntityId) {
        let children = {
            let store = self.store.lock().await;
            group_children(store.rows(), id)
        };
        let Some(children) = children else {
            return;
        };
        let update = GroupUpdate {
            name: None,
            color: None,
            children: Some(children),
        };
        match self.api.update_group(id, update).await {
            Ok(view) => {
                let mut store = self.store.lock().await;
                store.sync_group(Group::from(view));
            }
            Err(ApiError::Cancelled) => {}
            Err(err) => {
                tracing::warn!(group = id, error = %err, "failed to persist membership of created rows");
                let mut store = self.store.lock().await;
                store.error = Some(err.to_string());
            }
        }
    }

    async fn merge_parent(&self, parent: &ParentView) {
        {
            let mut detail = self.detail.lock().await;
            detail.view = Some(parent.clone());
        }
        if let ParentView::Budget(view) = parent {
            let mut budget = self.budget.lock().await;
            *budget = Some(Budget::from(view.clone()));
        }
    }

    // Group and markup management is api-first: the row only appears once
    // the backend has assigned it an id.

    pub async fn add_group(&self, body: GroupWrite) -> Result<(), EngineError> {
        let view = self.api.create_group(self.parent, body).await?;
        let mut store = self.store.lock().await;
        store.record(ChangeEvent::GroupAdded(Group::from(view)));
        Ok(())
    }

    pub async fn update_group(&self, id: EntityId, body: GroupUpdate) -> Result<(), EngineError> {
        let view = self.api.update_group(id, body).await?;
        let mut store = self.store.lock().await;
        store.record(ChangeEvent::GroupUpdated(Group::from(view)));
        Ok(())
    }

    /// Deletes a group row, keeping its children in the table.
    pub async fn delete_group(&self, id: EntityId) -> Result<(), EngineError> {
        self.api.delete_group(id).await?;
        let mut store = self.store.lock().await;
        store.record(ChangeEvent::RowDelete {
            rows: vec![RowId::Group(id)],
        });
        Ok(())
    }

    /// Deletes a group and its member rows. Strictly sequenced: the group
    /// goes first so the bulk row delete never races a membership update.
    pub async fn delete_group_cascade(
        &self,
        id: EntityId,
        rows: Vec<RowId>,
    ) -> Result<(), EngineError> {
        self.api.delete_group(id).await?;
        {
            let mut store = self.store.lock().await;
            store.record(ChangeEvent::RowDelete {
                rows: vec![RowId::Group(id)],
            });
        }
        self.dispatch(ChangeEvent::RowDelete { rows }).await;
        Ok(())
    }

    pub async fn add_markup(&self, body: MarkupWrite) -> Result<(), EngineError> {
        let changed = self.api.create_markup(self.parent, body).await?;
        {
            let mut store = self.store.lock().await;
            store.record(ChangeEvent::MarkupAdded(Markup::from(changed.markup)));
        }
        self.merge_parent(&changed.data).await;
        Ok(())
    }

    pub async fn update_markup(
        &self,
        id: EntityId,
        body: MarkupUpdate,
    ) -> Result<(), EngineError> {
        let changed = self.api.update_markup(id, body).await?;
        {
            let mut store = self.store.lock().await;
            store.record(ChangeEvent::MarkupUpdated(Markup::from(changed.markup)));
        }
        self.merge_parent(&changed.data).await;
        Ok(())
    }

    pub async fn delete_markup(&self, id: EntityId) -> Result<(), EngineError> {
        let deleted = self.api.delete_markup(id).await?;
        {
            let mut store = self.store.lock().await;
            store.record(ChangeEvent::RowDelete {
                rows: vec![RowId::Markup(id)],
            });
        }
        self.merge_parent(&deleted.data).await;
        Ok(())
    }

    pub async fn undo(&self) -> bool {
        let mut store = self.store.lock().await;
        store.undo()
    }

    pub async fn redo(&self) -> bool {
        let mut store = self.store.lock().await;
        store.redo()
    }
}

fn groups_containing<E: TableRecord>(rows: &[Row<E>], id: EntityId) -> Vec<EntityId> {
    rows.iter()
        .filter_map(|row| match row {
            Row::Group(g) if g.children.contains(&id) => Some(g.id),
            _ => None,
        })
        .collect()
}

fn group_children<E: TableRecord>(rows: &[Row<E>], id: EntityId) -> Option<Vec<EntityId>> {
    match rows.iter().find_map(|row| match row {
        Row::Group(g) if g.id == id => Some(g.children.clone()),
        _ => None,
    }) {
        Some(children) => Some(children),
        None => {
            tracing::warn!(group = id, "membership change names a missing group");
            None
        }
    }
}

fn markup_children<E: TableRecord>(rows: &[Row<E>], id: EntityId) -> Option<Vec<EntityId>> {
    match rows.iter().find_map(|row| match row {
        Row::Markup(m) if m.id == id => Some(m.children.clone()),
        _ => None,
    }) {
        Some(children) => Some(children),
        None => {
            tracing::warn!(markup = id, "membership change names a missing markup");
            None
        }
    }
}

/// One mounted table plus the background tasks flushing its events.
///
/// Submitted events are buffered and consolidated before they hit the
/// wire, so a burst of edits to one cell flushes as a single net change.
/// Dropping or unmounting the session aborts in-flight flushes; the
/// generation check makes any torn response a no-op.
pub struct TableSession<D: TableDomain> {
    dispatcher: Arc<TableDispatcher<D>>,
    pending: Vec<ChangeEvent<D::Record>>,
    tasks: JoinSet<()>,
}

impl<D: TableDomain> TableSession<D> {
    pub fn new(api: Arc<dyn BudgetApi>, parent: ParentRef) -> Self {
        Self {
            dispatcher: Arc::new(TableDispatcher::new(api, parent)),
            pending: Vec::new(),
            tasks: JoinSet::new(),
        }
    }

    pub fn from_dispatcher(dispatcher: TableDispatcher<D>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            pending: Vec::new(),
            tasks: JoinSet::new(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<TableDispatcher<D>> {
        &self.dispatcher
    }

    /// Buffers an event for the next flush and flushes right away.
    /// Callers batching a burst of edits use [`Self::stage`] instead.
    pub fn submit(&mut self, event: ChangeEvent<D::Record>) {
        self.stage(event);
        self.flush();
    }

    /// Buffers an event without flushing it.
    pub fn stage(&mut self, event: ChangeEvent<D::Record>) {
        self.pending.push(event);
    }

    /// Consolidates the buffered events and dispatches them in order on a
    /// background task.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let events = consolidate(std::mem::take(&mut self.pending));
        let dispatcher = Arc::clone(&self.dispatcher);
        self.tasks.spawn(async move {
            for event in events {
                dispatcher.dispatch(event).await;
            }
        });
    }

    /// Waits for all queued flushes to finish. Test and shutdown aid.
    pub async fn drain(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    pub async fn unmount(mut self) {
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        let store = self.dispatcher.store();
        let mut store = store.lock().await;
        store.bump_generation();
    }
}
