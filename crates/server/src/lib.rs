use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, run, run_with_listener, spawn_with_listener};
pub use state::BudgetDb;

mod accounts;
mod budgets;
mod fringes;
mod groups;
mod markups;
mod server;
mod state;
mod subaccounts;

pub mod types {
    pub mod budget {
        pub use api_types::budget::{BudgetView, BudgetWrite};
    }

    pub mod account {
        pub use api_types::account::{AccountUpdate, AccountView, AccountWrite};
    }

    pub mod subaccount {
        pub use api_types::subaccount::{SubAccountUpdate, SubAccountView, SubAccountWrite};
    }

    pub mod bulk {
        pub use api_types::bulk::{
            BulkCreate, BulkCreated, BulkDelete, BulkDeleted, BulkUpdate, BulkUpdated,
            ParentView, TableResponse,
        };
    }

    pub mod fringe {
        pub use api_types::fringe::{FringeUpdate, FringeView, FringeWrite};
    }

    pub mod group {
        pub use api_types::group::{GroupUpdate, GroupView, GroupWrite};
    }

    pub mod markup {
        pub use api_types::markup::{MarkupUpdate, MarkupView, MarkupWrite};
        pub use engine::MarkupChanged;
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateRow(_) => StatusCode::CONFLICT,
        EngineError::InvalidUpdate(_)
        | EngineError::DanglingChild(_)
        | EngineError::InvalidCacheKey(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Api(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Api(api_err) => {
            tracing::error!("upstream api error: {api_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
