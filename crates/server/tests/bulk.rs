use api_types::{
    FringeUnit, MarkupUnit, ParentRef,
    account::AccountWrite,
    budget::{BudgetView, BudgetWrite},
    bulk::{BulkCreate, BulkDelete, BulkUpdate, ParentView},
    fringe::FringeWrite,
    group::GroupWrite,
    markup::MarkupWrite,
    subaccount::{SubAccountUpdate, SubAccountWrite},
};
use client::Client;
use engine::{ApiError, BudgetApi};
use server::BudgetDb as Db;

async fn spawn_server() -> Client {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server::spawn_with_listener(Db::new(), listener).unwrap();
    Client::new(&format!("http://{addr}/")).unwrap()
}

async fn seeded(client: &Client) -> (BudgetView, i64) {
    let budget = client
        .create_budget(BudgetWrite {
            name: "Pilot".to_string(),
            domain: Default::default(),
        })
        .await
        .unwrap();
    let created = client
        .create_accounts(
            budget.id,
            BulkCreate::Data {
                data: vec![AccountWrite {
                    identifier: Some("100".to_string()),
                    ..AccountWrite::default()
                }],
            },
        )
        .await
        .unwrap();
    let account = created.children[0].id;
    (budget, account)
}

#[tokio::test]
async fn account_table_round_trip() {
    let client = spawn_server().await;
    let (budget, _account) = seeded(&client).await;

    client
        .create_accounts(budget.id, BulkCreate::Count { count: 2 })
        .await
        .unwrap();

    let table = client.list_accounts(budget.id).await.unwrap();
    assert_eq!(table.data.len(), 3);
    assert_eq!(table.data[0].identifier.as_deref(), Some("100"));
}

#[tokio::test]
async fn subaccount_edits_roll_up_to_the_budget() {
    let client = spawn_server().await;
    let (budget, account) = seeded(&client).await;

    let created = client
        .create_subaccounts(
            ParentRef::Account(account),
            BulkCreate::Data {
                data: vec![SubAccountWrite {
                    rate: Some(10.0),
                    ..SubAccountWrite::default()
                }],
            },
        )
        .await
        .unwrap();
    let line = created.children[0].id;

    let updated = client
        .update_subaccounts(
            ParentRef::Account(account),
            BulkUpdate {
                data: vec![SubAccountUpdate {
                    id: line,
                    quantity: Some(4.0),
                    ..SubAccountUpdate::default()
                }],
            },
        )
        .await
        .unwrap();

    let fresh_budget = updated.budget.unwrap();
    assert_eq!(fresh_budget.id, budget.id);
    assert_eq!(fresh_budget.nominal_value, 40.0);

    match updated.data {
        ParentView::Account(view) => assert_eq!(view.nominal_value, 40.0),
        other => panic!("expected account parent, got {other:?}"),
    }
}

#[tokio::test]
async fn fringe_attachment_lands_in_accumulations() {
    let client = spawn_server().await;
    let (_budget, account) = seeded(&client).await;
    let budget = _budget.id;

    let fringes = client
        .create_fringes(
            budget,
            BulkCreate::Data {
                data: vec![FringeWrite {
                    unit: Some(FringeUnit::Percent),
                    rate: Some(0.05),
                    ..FringeWrite::default()
                }],
            },
        )
        .await
        .unwrap();

    client
        .create_subaccounts(
            ParentRef::Account(account),
            BulkCreate::Data {
                data: vec![SubAccountWrite {
                    rate: Some(10.0),
                    quantity: Some(4.0),
                    fringes: vec![fringes[0].id],
                    ..SubAccountWrite::default()
                }],
            },
        )
        .await
        .unwrap();

    let parent = client
        .get_parent(ParentRef::Account(account), true)
        .await
        .unwrap();
    match parent {
        ParentView::Account(view) => {
            assert_eq!(view.nominal_value, 40.0);
            assert_eq!(view.accumulated_fringe_contribution, 2.0);
        }
        other => panic!("expected account parent, got {other:?}"),
    }
}

#[tokio::test]
async fn derived_value_edit_is_a_validation_error() {
    let client = spawn_server().await;
    let (_budget, account) = seeded(&client).await;

    let created = client
        .create_subaccounts(ParentRef::Account(account), BulkCreate::Count { count: 1 })
        .await
        .unwrap();
    let parent_line = created.children[0].id;
    client
        .create_subaccounts(
            ParentRef::Subaccount(parent_line),
            BulkCreate::Count { count: 1 },
        )
        .await
        .unwrap();

    let err = client
        .update_subaccounts(
            ParentRef::Account(account),
            BulkUpdate {
                data: vec![SubAccountUpdate {
                    id: parent_line,
                    rate: Some(5.0),
                    ..SubAccountUpdate::default()
                }],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn unknown_parent_is_a_validation_error() {
    let client = spawn_server().await;
    let err = client.list_accounts(999).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn group_with_rows_from_another_table_is_rejected() {
    let client = spawn_server().await;
    let (budget, account) = seeded(&client).await;

    let err = client
        .create_group(
            ParentRef::Budget(budget.id),
            GroupWrite {
                name: "G".to_string(),
                color: None,
                children: vec![account + 100],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn markup_create_returns_the_recalculated_parent() {
    let client = spawn_server().await;
    let (_budget, account) = seeded(&client).await;

    let created = client
        .create_subaccounts(
            ParentRef::Account(account),
            BulkCreate::Data {
                data: vec![SubAccountWrite {
                    rate: Some(100.0),
                    ..SubAccountWrite::default()
                }],
            },
        )
        .await
        .unwrap();
    let line = created.children[0].id;

    let changed = client
        .create_markup(
            ParentRef::Account(account),
            MarkupWrite {
                unit: MarkupUnit::Flat,
                rate: 50.0,
                children: vec![line],
                ..MarkupWrite::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(changed.markup.rate, 50.0);
    match changed.data {
        ParentView::Account(view) => {
            assert_eq!(view.accumulated_markup_contribution, 50.0);
        }
        other => panic!("expected account parent, got {other:?}"),
    }
}

#[tokio::test]
async fn deleting_a_fringe_drops_its_references() {
    let client = spawn_server().await;
    let (budget, account) = seeded(&client).await;

    let fringes = client
        .create_fringes(
            budget.id,
            BulkCreate::Data {
                data: vec![FringeWrite {
                    unit: Some(FringeUnit::Percent),
                    rate: Some(0.1),
                    ..FringeWrite::default()
                }],
            },
        )
        .await
        .unwrap();
    client
        .create_subaccounts(
            ParentRef::Account(account),
            BulkCreate::Data {
                data: vec![SubAccountWrite {
                    rate: Some(100.0),
                    fringes: vec![fringes[0].id],
                    ..SubAccountWrite::default()
                }],
            },
        )
        .await
        .unwrap();

    client
        .delete_fringes(
            budget.id,
            BulkDelete {
                ids: vec![fringes[0].id],
            },
        )
        .await
        .unwrap();

    let table = client
        .list_subaccounts(ParentRef::Account(account))
        .await
        .unwrap();
    assert!(table.data[0].fringes.is_empty());
    assert_eq!(table.data[0].fringe_contribution, 0.0);
}
