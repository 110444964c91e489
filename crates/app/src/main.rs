use std::sync::Arc;

use api_types::{
    FringeUnit, ParentRef,
    account::AccountWrite,
    budget::BudgetWrite,
    bulk::{BulkCreate, ParentView},
    fringe::FringeWrite,
    subaccount::SubAccountWrite,
};
use client::Client;
use engine::{BudgetApi, ChangeEvent, SubAccountsDomain, TableDispatcher};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "costsheet={level},server={level},engine={level},client={level}",
            level = settings.app.level
        ))
        .init();

    if settings.demo {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = server::spawn_with_listener(server::BudgetDb::new(), listener)?;
        return walkthrough(addr).await;
    }

    let server_settings = settings.server.ok_or("no [server] section in settings")?;
    let bind = server_settings
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listener =
        tokio::net::TcpListener::bind(format!("{bind}:{}", server_settings.port)).await?;
    server::run_with_listener(server::BudgetDb::new(), listener).await?;

    Ok(())
}

/// Builds a small budget over HTTP and drives one subaccount table
/// through the optimistic dispatch pipeline.
async fn walkthrough(
    addr: std::net::SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let api = Arc::new(Client::new(&format!("http://{addr}/"))?);

    let budget = api
        .create_budget(BudgetWrite {
            name: "Pilot".to_string(),
            domain: Default::default(),
        })
        .await?;
    tracing::info!("created budget \"{}\" ({})", budget.name, budget.id);

    let created = api
        .create_accounts(
            budget.id,
            BulkCreate::Data {
                data: vec![AccountWrite {
                    identifier: Some("100".to_string()),
                    description: Some("Props".to_string()),
                    group: None,
                }],
            },
        )
        .await?;
    let account = created.children[0].id;

    let fringes = api
        .create_fringes(
            budget.id,
            BulkCreate::Data {
                data: vec![FringeWrite {
                    name: Some("Payroll tax".to_string()),
                    unit: Some(FringeUnit::Percent),
                    rate: Some(0.05),
                    ..FringeWrite::default()
                }],
            },
        )
        .await?;

    let dispatcher: TableDispatcher<SubAccountsDomain> =
        TableDispatcher::new(api.clone(), ParentRef::Account(account));
    dispatcher.mount().await?;

    dispatcher
        .dispatch(ChangeEvent::add_rows(vec![SubAccountWrite {
            identifier: Some("100.1".to_string()),
            description: Some("Chair".to_string()),
            rate: Some(10.0),
            quantity: Some(4.0),
            fringes: vec![fringes[0].id],
            ..SubAccountWrite::default()
        }]))
        .await;

    {
        let store = dispatcher.store();
        let store = store.lock().await;
        tracing::info!("table holds {} rows after the add", store.rows().len());
        if let Some(error) = &store.error {
            tracing::warn!("dispatch reported: {error}");
        }
    }

    let detail = dispatcher.detail();
    let detail = detail.lock().await;
    if let Some(ParentView::Account(view)) = &detail.view {
        let estimated = view.nominal_value
            + view.accumulated_fringe_contribution
            + view.accumulated_markup_contribution;
        tracing::info!(
            "account {}: nominal {}, fringes {}, estimated {}",
            view.identifier.as_deref().unwrap_or("?"),
            view.nominal_value,
            view.accumulated_fringe_contribution,
            estimated
        );
    }

    Ok(())
}
