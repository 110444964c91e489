//! Budget hierarchy computation and synchronization engine.
//!
//! The engine keeps optimistic local table state (rows, undo/redo history,
//! lifecycle flags), computes estimated/actual/variance values from raw
//! entity data, and reconciles every mutation with the backend through
//! bulk calls.

pub use accounts::Account;
pub use api::{ApiError, ApiResult, BudgetApi, MarkupChanged};
pub use budgets::Budget;
pub use cache::{
    CacheEntry, FringeCoordinator, StateContainer, StoreDomain, StoreKey,
    reconcile_fringe_change,
};
pub use dispatch::{
    AccountsDomain, SubAccountsDomain, TableDispatcher, TableDomain, TableSession,
};
pub use error::EngineError;
pub use events::{CellChange, ChangeEvent, FieldKey, FieldPatch, consolidate};
pub use fringes::Fringe;
pub use groups::Group;
pub use markups::Markup;
pub use rows::{PlaceholderRow, Row, RowId, TableRecord, generate_table_data};
pub use store::{DetailStore, TableStore};
pub use subaccounts::{SubAccount, SubAccountArena};

mod accounts;
mod api;
mod budgets;
mod cache;
mod dispatch;
mod error;
mod events;
mod fringes;
mod groups;
mod markups;
mod rows;
mod store;
mod subaccounts;
pub mod values;

pub type ResultEngine<T> = Result<T, EngineError>;
