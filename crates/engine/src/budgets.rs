//! The module contains the representation of a budget or template, the top
//! of the account/subaccount hierarchy.

use api_types::{BudgetDomain, EntityId, budget::BudgetView};
use serde::{Deserialize, Serialize};

/// A budget (or reusable template). Whether the record is a live budget or
/// a template is a field, not a separate type; all computation treats the
/// two identically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: EntityId,
    pub name: String,
    pub domain: BudgetDomain,
    pub nominal_value: f64,
    pub accumulated_fringe_contribution: f64,
    pub accumulated_markup_contribution: f64,
    pub actual: f64,
}

impl Budget {
    /// Top-line estimated value of the whole budget.
    pub fn estimated(&self) -> f64 {
        self.nominal_value
            + self.accumulated_fringe_contribution
            + self.accumulated_markup_contribution
    }

    pub fn variance(&self) -> f64 {
        self.estimated() - self.actual
    }
}

impl From<BudgetView> for Budget {
    fn from(view: BudgetView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            domain: view.domain,
            nominal_value: view.nominal_value,
            accumulated_fringe_contribution: view.accumulated_fringe_contribution,
            accumulated_markup_contribution: view.accumulated_markup_contribution,
            actual: view.actual,
        }
    }
}
