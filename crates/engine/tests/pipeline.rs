use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use api_types::{
    EntityId, FringeUnit, ParentRef,
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
use engine::{
    ApiError, ApiResult, BudgetApi, CacheEntry, ChangeEvent, Fringe, MarkupChanged, Row, RowId,
    StateContainer, StoreKey, SubAccount, SubAccountsDomain, TableDispatcher,
    TableSession, generate_table_data, reconcile_fringe_change,
};

fn sub_view(id: EntityId, rate: f64) -> SubAccountView {
    SubAccountView {
        id,
        identifier: Some(format!("{:04}", 1000 + id)),
        description: None,
        rate: Some(rate),
        quantity: None,
        multiplier: None,
        fringes: vec![],
        children: vec![],
        children_markups: vec![],
        nominal_value: rate,
        fringe_contribution: 0.0,
        accumulated_fringe_contribution: 0.0,
        accumulated_markup_contribution: 0.0,
        actual: 0.0,
    }
}

fn parent_view() -> ParentView {
    ParentView::Account(AccountView {
        id: 1,
        identifier: Some("100".to_string()),
        description: None,
        children: vec![],
        nominal_value: 123.0,
        accumulated_fringe_contribution: 0.0,
        accumulated_markup_contribution: 0.0,
        actual: 0.0,
    })
}

#[derive(Default)]
struct MockApi {
    calls: Mutex<Vec<&'static str>>,
    next_id: AtomicI64,
    listing: Mutex<TableResponse<SubAccountView>>,
    refreshed: Mutex<Vec<SubAccountView>>,
    updates: Mutex<Vec<BulkUpdate<SubAccountUpdate>>>,
    group_updates: Mutex<Vec<(EntityId, Vec<EntityId>)>>,
    update_error: Mutex<Option<ApiError>>,
    create_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockApi {
    fn new(listing: TableResponse<SubAccountView>) -> Self {
        Self {
            next_id: AtomicI64::new(100),
            listing: Mutex::new(listing),
            ..Self::default()
        }
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn fail_updates_with(&self, err: ApiError) {
        *self.update_error.lock().unwrap() = Some(err);
    }

    fn updates(&self) -> Vec<BulkUpdate<SubAccountUpdate>> {
        self.updates.lock().unwrap().clone()
    }

    fn group_updates(&self) -> Vec<(EntityId, Vec<EntityId>)> {
        self.group_updates.lock().unwrap().clone()
    }

    fn gate_creates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl BudgetApi for MockApi {
    async fn list_accounts(&self, _budget: EntityId) -> ApiResult<TableResponse<AccountView>> {
        Err(ApiError::Validation("not used by this mock".to_string()))
    }

    async fn create_accounts(
        &self,
        _budget: EntityId,
        _body: BulkCreate<AccountWrite>,
    ) -> ApiResult<BulkCreated<AccountView>> {
        Err(ApiError::Validation("not used by this mock".to_string()))
    }

    async fn update_accounts(
        &self,
        _budget: EntityId,
        _body: BulkUpdate<AccountUpdate>,
    ) -> ApiResult<BulkUpdated<AccountView>> {
        Err(ApiError::Validation("not used by this mock".to_string()))
    }

    async fn delete_accounts(
        &self,
        _budget: EntityId,
        _body: BulkDelete,
    ) -> ApiResult<BulkDeleted> {
        Err(ApiError::Validation("not used by this mock".to_string()))
    }

    async fn list_subaccounts(
        &self,
        _parent: ParentRef,
    ) -> ApiResult<TableResponse<SubAccountView>> {
        self.record("list_subaccounts");
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn create_subaccounts(
        &self,
        _parent: ParentRef,
        body: BulkCreate<SubAccountWrite>,
    ) -> ApiResult<BulkCreated<SubAccountView>> {
        let gate = self.create_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.record("create_subaccounts");
        let children = (0..body.len())
            .map(|_| sub_view(self.next_id.fetch_add(1, Ordering::SeqCst), 0.0))
            .collect();
        Ok(BulkCreated {
            data: parent_view(),
            children,
        })
    }

    async fn update_subaccounts(
        &self,
        _parent: ParentRef,
        body: BulkUpdate<SubAccountUpdate>,
    ) -> ApiResult<BulkUpdated<SubAccountView>> {
        self.record("update_subaccounts");
        self.updates.lock().unwrap().push(body);
        if let Some(err) = self.update_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(BulkUpdated {
            data: parent_view(),
            children: None,
            budget: None,
        })
    }

    async fn delete_subaccounts(
        &self,
        _parent: ParentRef,
        _body: BulkDelete,
    ) -> ApiResult<BulkDeleted> {
        self.record("delete_subaccounts");
        Ok(BulkDeleted {
            data: parent_view(),
        })
    }

    async fn get_subaccounts(&self, ids: Vec<EntityId>) -> ApiResult<Vec<SubAccountView>> {
        self.record("get_subaccounts");
        Ok(self
            .refreshed
            .lock()
            .unwrap()
            .iter()
            .filter(|view| ids.contains(&view.id))
            .cloned()
            .collect())
    }

    async fn get_parent(&self, _parent: ParentRef, force: bool) -> ApiResult<ParentView> {
        self.record(if force { "get_parent_forced" } else { "get_parent" });
        Ok(parent_view())
    }

    async fn list_fringes(&self, _budget: EntityId) -> ApiResult<Vec<FringeView>> {
        Ok(vec![])
    }

    async fn create_fringes(
        &self,
        _budget: EntityId,
        _body: BulkCreate<FringeWrite>,
    ) -> ApiResult<Vec<FringeView>> {
        Err(ApiError::Validation("not used by this mock".to_string()))
    }

    async fn update_fringes(
        &self,
        _budget: EntityId,
        _body: BulkUpdate<FringeUpdate>,
    ) -> ApiResult<Vec<FringeView>> {
        Err(ApiError::Validation("not used by this mock".to_string()))
    }

    async fn delete_fringes(&self, _budget: EntityId, _body: BulkDelete) -> ApiResult<()> {
        Err(ApiError::Validation("not used by this mock".to_string()))
    }

    async fn create_group(&self, _parent: ParentRef, body: GroupWrite) -> ApiResult<GroupView> {
        self.record("create_group");
        Ok(GroupView {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: body.name,
            color: body.color,
            children: body.children,
        })
    }

    async fn update_group(&self, id: EntityId, body: GroupUpdate) -> ApiResult<GroupView> {
        self.record("update_group");
        self.group_updates
            .lock()
            .unwrap()
            .push((id, body.children.clone().unwrap_or_default()));
        Ok(GroupView {
            id,
            name: body.name.unwrap_or_default(),
            color: body.color,
            children: body.children.unwrap_or_default(),
        })
    }

    async fn delete_group(&self, _id: EntityId) -> ApiResult<()> {
        self.record("delete_group");
        Ok(())
    }

    async fn create_markup(
        &self,
        _parent: ParentRef,
        body: MarkupWrite,
    ) -> ApiResult<MarkupChanged> {
        self.record("create_markup");
        Ok(MarkupChanged {
            data: parent_view(),
            markup: MarkupView {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                identifier: body.identifier,
                description: body.description,
                unit: body.unit,
                rate: body.rate,
                children: body.children,
                actual: 0.0,
            },
        })
    }

    async fn update_markup(&self, id: EntityId, body: MarkupUpdate) -> ApiResult<MarkupChanged> {
        self.record("update_markup");
        Ok(MarkupChanged {
            data: parent_view(),
            markup: MarkupView {
                id,
                identifier: body.identifier,
                description: body.description,
                unit: body.unit.unwrap_or_default(),
                rate: body.rate.unwrap_or_default(),
                children: body.children.unwrap_or_default(),
                actual: 0.0,
            },
        })
    }

    async fn delete_markup(&self, _id: EntityId) -> ApiResult<BulkDeleted> {
        self.record("delete_markup");
        Ok(BulkDeleted {
            data: parent_view(),
        })
    }
}

fn listing(data: Vec<SubAccountView>, groups: Vec<GroupView>) -> TableResponse<SubAccountView> {
    TableResponse {
        data,
        groups,
        markups: vec![],
    }
}

async fn mounted(
    mock: &Arc<MockApi>,
) -> TableDispatcher<SubAccountsDomain> {
    let api: Arc<dyn BudgetApi> = Arc::clone(mock) as Arc<dyn BudgetApi>;
    let dispatcher = TableDispatcher::<SubAccountsDomain>::new(api, ParentRef::Account(1));
    dispatcher.mount().await.unwrap();
    dispatcher
}

#[tokio::test]
async fn added_rows_are_activated_with_server_ids() {
    let mock = Arc::new(MockApi::new(listing(vec![sub_view(1, 10.0)], vec![])));
    let dispatcher = mounted(&mock).await;

    dispatcher.dispatch(ChangeEvent::add_count(2)).await;

    let store = dispatcher.store();
    let store = store.lock().await;
    assert_eq!(store.rows().len(), 3);
    assert_eq!(store.rows()[1].row_id(), RowId::Model(100));
    assert_eq!(store.rows()[2].row_id(), RowId::Model(101));
    assert!(!store.saving);
    assert!(store.error.is_none());

    let detail = dispatcher.detail();
    let detail = detail.lock().await;
    assert!(!detail.loading);
    assert_eq!(detail.view.as_ref().map(ParentView::id), Some(1));
}

#[tokio::test]
async fn validation_failure_keeps_optimistic_rows() {
    let mock = Arc::new(MockApi::new(listing(vec![sub_view(1, 10.0)], vec![])));
    let dispatcher = mounted(&mock).await;
    mock.fail_updates_with(ApiError::Validation("rate out of range".to_string()));

    dispatcher
        .dispatch(ChangeEvent::DataChange {
            changes: vec![engine::CellChange {
                row: RowId::Model(1),
                patch: engine::FieldPatch::Rate(Some(42.0)),
            }],
        })
        .await;

    let store = dispatcher.store();
    let store = store.lock().await;
    assert_eq!(store.rows()[0].as_model().unwrap().rate, Some(42.0));
    assert_eq!(store.error.as_deref(), Some("rate out of range"));
    assert!(!store.invalidated);
    assert!(store.can_undo());
}

#[tokio::test]
async fn server_failure_rolls_back_to_confirmed_state() {
    let mock = Arc::new(MockApi::new(listing(vec![sub_view(1, 10.0)], vec![])));
    let dispatcher = mounted(&mock).await;
    mock.fail_updates_with(ApiError::Server("boom".to_string()));

    dispatcher
        .dispatch(ChangeEvent::DataChange {
            changes: vec![engine::CellChange {
                row: RowId::Model(1),
                patch: engine::FieldPatch::Rate(Some(42.0)),
            }],
        })
        .await;

    let store = dispatcher.store();
    let store = store.lock().await;
    assert_eq!(store.rows()[0].as_model().unwrap().rate, Some(10.0));
    assert!(store.invalidated);
    assert!(!store.can_undo());
    assert!(store.error.is_some());

    let detail = dispatcher.detail();
    let detail = detail.lock().await;
    assert!(detail.invalidated);
}

#[tokio::test]
async fn group_cascade_deletes_the_group_before_its_rows() {
    let group = GroupView {
        id: 10,
        name: "Talent".to_string(),
        color: None,
        children: vec![1, 2],
    };
    let mock = Arc::new(MockApi::new(listing(
        vec![sub_view(1, 10.0), sub_view(2, 5.0)],
        vec![group],
    )));
    let dispatcher = mounted(&mock).await;

    dispatcher
        .delete_group_cascade(10, vec![RowId::Model(1), RowId::Model(2)])
        .await
        .unwrap();

    let calls = mock.calls();
    let group_at = calls.iter().position(|c| *c == "delete_group").unwrap();
    let rows_at = calls
        .iter()
        .position(|c| *c == "delete_subaccounts")
        .unwrap();
    assert!(group_at < rows_at);

    let store = dispatcher.store();
    let store = store.lock().await;
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn moving_a_row_out_of_a_group_persists_the_detachment() {
    let group = GroupView {
        id: 10,
        name: "Set".to_string(),
        color: None,
        children: vec![1],
    };
    let mock = Arc::new(MockApi::new(listing(
        vec![sub_view(1, 10.0), sub_view(2, 5.0)],
        vec![group],
    )));
    let dispatcher = mounted(&mock).await;

    dispatcher
        .dispatch(ChangeEvent::RowPositionChanged {
            row: RowId::Model(1),
            previous: Some(RowId::Model(2)),
            group: None,
        })
        .await;

    // The backend's copy of the source group must match the local strip.
    assert_eq!(mock.group_updates(), vec![(10, vec![])]);

    let store = dispatcher.store();
    let store = store.lock().await;
    let group_row = store
        .rows()
        .iter()
        .find_map(|row| row.as_group())
        .unwrap();
    assert!(group_row.children.is_empty());
}

#[tokio::test]
async fn moving_a_row_between_groups_persists_both_memberships() {
    let groups = vec![
        GroupView {
            id: 10,
            name: "Set".to_string(),
            color: None,
            children: vec![1],
        },
        GroupView {
            id: 11,
            name: "Location".to_string(),
            color: None,
            children: vec![2],
        },
    ];
    let mock = Arc::new(MockApi::new(listing(
        vec![sub_view(1, 10.0), sub_view(2, 5.0)],
        groups,
    )));
    let dispatcher = mounted(&mock).await;

    dispatcher
        .dispatch(ChangeEvent::RowPositionChanged {
            row: RowId::Model(1),
            previous: Some(RowId::Model(2)),
            group: Some(11),
        })
        .await;

    let updates = mock.group_updates();
    assert!(updates.contains(&(10, vec![])));
    assert!(updates.contains(&(11, vec![2, 1])));
}

#[tokio::test]
async fn inserted_row_joins_its_group_after_activation() {
    let group = GroupView {
        id: 10,
        name: "Set".to_string(),
        color: None,
        children: vec![1],
    };
    let mock = Arc::new(MockApi::new(listing(vec![sub_view(1, 10.0)], vec![group])));
    let dispatcher = mounted(&mock).await;

    dispatcher
        .dispatch(ChangeEvent::insert_row(
            SubAccountWrite {
                identifier: Some("100.2".to_string()),
                ..SubAccountWrite::default()
            },
            Some(RowId::Model(1)),
            Some(10),
        ))
        .await;

    {
        let store = dispatcher.store();
        let store = store.lock().await;
        let group_row = store
            .rows()
            .iter()
            .find_map(|row| row.as_group())
            .unwrap();
        assert_eq!(group_row.children, vec![1, 100]);
    }
    assert_eq!(mock.group_updates(), vec![(10, vec![1, 100])]);
}

#[tokio::test]
async fn rapid_edits_flush_as_one_bulk_update() {
    let mock = Arc::new(MockApi::new(listing(vec![sub_view(1, 10.0)], vec![])));
    let api: Arc<dyn BudgetApi> = Arc::clone(&mock) as Arc<dyn BudgetApi>;
    let mut session = TableSession::<SubAccountsDomain>::new(api, ParentRef::Account(1));
    session.dispatcher().mount().await.unwrap();

    for patch in [
        engine::FieldPatch::Rate(Some(1.0)),
        engine::FieldPatch::Rate(Some(2.0)),
        engine::FieldPatch::Quantity(Some(3.0)),
    ] {
        session.stage(ChangeEvent::DataChange {
            changes: vec![engine::CellChange {
                row: RowId::Model(1),
                patch,
            }],
        });
    }
    session.flush();
    session.drain().await;

    let update_calls = mock
        .calls()
        .iter()
        .filter(|call| **call == "update_subaccounts")
        .count();
    assert_eq!(update_calls, 1);

    let updates = mock.updates();
    assert_eq!(updates[0].data.len(), 1);
    assert_eq!(updates[0].data[0].id, 1);
    assert_eq!(updates[0].data[0].rate, Some(2.0));
    assert_eq!(updates[0].data[0].quantity, Some(3.0));
}

#[tokio::test]
async fn saving_holds_until_every_in_flight_flush_settles() {
    let mock = Arc::new(MockApi::new(listing(vec![sub_view(1, 10.0)], vec![])));
    let gate = mock.gate_creates();
    let dispatcher = Arc::new(mounted(&mock).await);

    let first = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher.dispatch(ChangeEvent::add_count(1)).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher.dispatch(ChangeEvent::add_count(1)).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    {
        let store = dispatcher.store();
        let store = store.lock().await;
        assert!(store.saving, "one flush is still in flight");
        drop(store);
        let detail = dispatcher.detail();
        let detail = detail.lock().await;
        assert!(detail.loading);
    }

    gate.notify_one();
    first.await.unwrap();
    second.await.unwrap();

    let store = dispatcher.store();
    let store = store.lock().await;
    assert!(!store.saving);
    assert_eq!(store.rows().len(), 3);
    let detail = dispatcher.detail();
    let detail = detail.lock().await;
    assert!(!detail.loading);
}

#[tokio::test]
async fn undo_before_settle_discards_the_in_flight_activation() {
    let mock = Arc::new(MockApi::new(listing(vec![sub_view(1, 10.0)], vec![])));
    let gate = mock.gate_creates();
    let api: Arc<dyn BudgetApi> = Arc::clone(&mock) as Arc<dyn BudgetApi>;
    let mut session =
        TableSession::<SubAccountsDomain>::new(api, ParentRef::Account(1));
    session.dispatcher().mount().await.unwrap();

    session.submit(ChangeEvent::add_count(1));
    tokio::time::sleep(Duration::from_millis(20)).await;
    {
        let store = session.dispatcher().store();
        let store = store.lock().await;
        assert_eq!(store.rows().len(), 2);
        assert!(store.rows()[1].is_placeholder());
    }

    assert!(session.dispatcher().undo().await);
    gate.notify_one();
    session.drain().await;

    let store = session.dispatcher().store();
    let store = store.lock().await;
    assert_eq!(store.rows().len(), 1);
    assert_eq!(store.rows()[0].row_id(), RowId::Model(1));
    assert!(!store.saving);
}

async fn cached_entry(rows: Vec<Row<SubAccount>>) -> CacheEntry {
    let entry = CacheEntry::new();
    entry.table.lock().await.hydrate(rows);
    entry
}

fn fringed_line(id: EntityId, fringe: EntityId) -> SubAccount {
    SubAccount {
        id,
        rate: Some(100.0),
        fringes: vec![fringe],
        ..SubAccount::default()
    }
}

fn percent_fringe(id: EntityId, rate: f64) -> Fringe {
    Fringe {
        id,
        name: Some("Benefits".to_string()),
        unit: FringeUnit::Percent,
        rate,
        cutoff: None,
        color: None,
        description: None,
    }
}

#[tokio::test]
async fn fringe_change_flags_only_tables_that_reference_it() {
    let mock = Arc::new(MockApi::new(listing(vec![], vec![])));
    let mut container = StateContainer::new();
    container.insert(
        StoreKey::account(1),
        cached_entry(generate_table_data(
            vec![fringed_line(1, 9)],
            vec![],
            vec![],
        )).await,
    );
    container.insert(
        StoreKey::account(2),
        cached_entry(generate_table_data(
            vec![SubAccount {
                id: 2,
                rate: Some(50.0),
                ..SubAccount::default()
            }],
            vec![],
            vec![],
        )).await,
    );

    let before = vec![percent_fringe(9, 0.1)];
    let after = vec![percent_fringe(9, 0.2)];
    reconcile_fringe_change(mock.as_ref(), &container, None, &before, &after)
        .await
        .unwrap();

    let touched = container.get(&StoreKey::account(1)).unwrap();
    assert!(touched.table.lock().await.invalidated);
    assert!(touched.detail.lock().await.invalidated);

    let untouched = container.get(&StoreKey::account(2)).unwrap();
    assert!(!untouched.table.lock().await.invalidated);
    assert!(!untouched.detail.lock().await.invalidated);
}

#[tokio::test]
async fn fringe_change_refreshes_the_active_table_eagerly() {
    let mock = Arc::new(MockApi::new(listing(vec![], vec![])));
    {
        let mut refreshed = sub_view(1, 100.0);
        refreshed.nominal_value = 100.0;
        refreshed.fringe_contribution = 20.0;
        refreshed.fringes = vec![9];
        *mock.refreshed.lock().unwrap() = vec![refreshed];
    }

    let mut container = StateContainer::new();
    container.insert(
        StoreKey::account(1),
        cached_entry(generate_table_data(
            vec![fringed_line(1, 9)],
            vec![],
            vec![],
        )).await,
    );

    let before = vec![percent_fringe(9, 0.1)];
    let after = vec![percent_fringe(9, 0.2)];
    reconcile_fringe_change(
        mock.as_ref(),
        &container,
        Some(StoreKey::account(1)),
        &before,
        &after,
    )
    .await
    .unwrap();

    let entry = container.get(&StoreKey::account(1)).unwrap();
    let table = entry.table.lock().await;
    assert!(!table.invalidated);
    assert_eq!(
        table.rows()[0].as_model().unwrap().fringe_contribution,
        20.0
    );
    let detail = entry.detail.lock().await;
    assert!(detail.view.is_some());
    assert!(mock.calls().contains(&"get_parent_forced"));
}

#[tokio::test]
async fn cosmetic_fringe_edit_skips_the_invalidation_pass() {
    let mock = Arc::new(MockApi::new(listing(vec![], vec![])));
    let mut container = StateContainer::new();
    container.insert(
        StoreKey::account(1),
        cached_entry(generate_table_data(
            vec![fringed_line(1, 9)],
            vec![],
            vec![],
        )).await,
    );

    let before = vec![percent_fringe(9, 0.1)];
    let mut renamed = percent_fringe(9, 0.1);
    renamed.name = Some("Fringe Benefits".to_string());
    reconcile_fringe_change(
        mock.as_ref(),
        &container,
        Some(StoreKey::account(1)),
        &before,
        &[renamed],
    )
    .await
    .unwrap();

    assert!(mock.calls().is_empty());
    let entry = container.get(&StoreKey::account(1)).unwrap();
    assert!(!entry.table.lock().await.invalidated);
}

#[tokio::test]
async fn corrupted_cache_keys_are_skipped_not_fatal() {
    let mock = Arc::new(MockApi::new(listing(vec![], vec![])));
    let mut container = StateContainer::new();
    container.insert_raw(
        "garbage-key".to_string(),
        cached_entry(generate_table_data(
            vec![fringed_line(1, 9)],
            vec![],
            vec![],
        )).await,
    );
    container.insert(
        StoreKey::account(1),
        cached_entry(generate_table_data(
            vec![fringed_line(2, 9)],
            vec![],
            vec![],
        )).await,
    );

    let before = vec![percent_fringe(9, 0.1)];
    let after = vec![percent_fringe(9, 0.3)];
    reconcile_fringe_change(mock.as_ref(), &container, None, &before, &after)
        .await
        .unwrap();

    let parseable = container.get(&StoreKey::account(1)).unwrap();
    assert!(parseable.table.lock().await.invalidated);
}
