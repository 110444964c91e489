use axum::{
    Router,
    routing::{get, patch, post},
};

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{accounts, budgets, fringes, groups, markups, state::BudgetDb, subaccounts};

#[derive(Clone)]
pub struct ServerState {
    pub db: Arc<RwLock<BudgetDb>>,
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/budgets", post(budgets::create))
        .route("/budgets/{id}", get(budgets::get))
        .route(
            "/budgets/{id}/accounts",
            get(accounts::list)
                .post(accounts::create)
                .patch(accounts::update)
                .delete(accounts::delete),
        )
        .route("/accounts/{id}", get(accounts::get))
        .route(
            "/accounts/{id}/subaccounts",
            get(subaccounts::list_under_account)
                .post(subaccounts::create_under_account)
                .patch(subaccounts::update_under_account)
                .delete(subaccounts::delete_under_account),
        )
        .route(
            "/subaccounts/{id}/subaccounts",
            get(subaccounts::list_under_subaccount)
                .post(subaccounts::create_under_subaccount)
                .patch(subaccounts::update_under_subaccount)
                .delete(subaccounts::delete_under_subaccount),
        )
        .route("/subaccounts", get(subaccounts::get_many))
        .route("/subaccounts/{id}", get(subaccounts::get))
        .route(
            "/budgets/{id}/fringes",
            get(fringes::list)
                .post(fringes::create)
                .patch(fringes::update)
                .delete(fringes::delete),
        )
        .route("/budgets/{id}/groups", post(groups::create_under_budget))
        .route("/accounts/{id}/groups", post(groups::create_under_account))
        .route(
            "/subaccounts/{id}/groups",
            post(groups::create_under_subaccount),
        )
        .route(
            "/groups/{id}",
            patch(groups::update).delete(groups::delete),
        )
        .route("/budgets/{id}/markups", post(markups::create_under_budget))
        .route(
            "/accounts/{id}/markups",
            post(markups::create_under_account),
        )
        .route(
            "/subaccounts/{id}/markups",
            post(markups::create_under_subaccount),
        )
        .route(
            "/markups/{id}",
            patch(markups::update).delete(markups::delete),
        )
        .with_state(state)
}

pub async fn run(db: BudgetDb) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    db: BudgetDb,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        db: Arc::new(RwLock::new(db)),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    db: BudgetDb,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
