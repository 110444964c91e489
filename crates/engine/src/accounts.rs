//! The module contains the representation of an account, a top-level line
//! of a budget that owns a table of subaccounts.

use api_types::{
    EntityId,
    account::{AccountUpdate, AccountView, AccountWrite},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::events::FieldPatch;
use crate::rows::TableRecord;

/// An account. Accounts carry no rate/quantity of their own; every total is
/// driven by the subaccounts underneath, so only the backend's denormalized
/// copies are stored here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: EntityId,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub children: Vec<EntityId>,
    pub nominal_value: f64,
    pub accumulated_fringe_contribution: f64,
    pub accumulated_markup_contribution: f64,
    pub actual: f64,
}

impl TableRecord for Account {
    type Write = AccountWrite;
    type Update = AccountUpdate;
    type View = AccountView;

    fn id(&self) -> EntityId {
        self.id
    }

    fn children(&self) -> &[EntityId] {
        &self.children
    }

    fn stored_nominal_value(&self) -> f64 {
        self.nominal_value
    }

    fn accumulated_fringe_contribution(&self) -> f64 {
        self.accumulated_fringe_contribution
    }

    fn accumulated_markup_contribution(&self) -> f64 {
        self.accumulated_markup_contribution
    }

    fn actual(&self) -> f64 {
        self.actual
    }

    fn from_view(view: AccountView) -> Self {
        Self {
            id: view.id,
            identifier: view.identifier,
            description: view.description,
            children: view.children,
            nominal_value: view.nominal_value,
            accumulated_fringe_contribution: view.accumulated_fringe_contribution,
            accumulated_markup_contribution: view.accumulated_markup_contribution,
            actual: view.actual,
        }
    }

    fn from_write(write: &AccountWrite) -> Self {
        Self {
            identifier: write.identifier.clone(),
            description: write.description.clone(),
            ..Self::default()
        }
    }

    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<(), EngineError> {
        match patch {
            FieldPatch::Identifier(value) => {
                self.identifier = value.clone();
                Ok(())
            }
            FieldPatch::Description(value) => {
                self.description = value.clone();
                Ok(())
            }
            FieldPatch::Rate(_)
            | FieldPatch::Quantity(_)
            | FieldPatch::Multiplier(_)
            | FieldPatch::Fringes(_) => Err(EngineError::InvalidUpdate(format!(
                "accounts have no direct {:?} field",
                patch.key()
            ))),
        }
    }

    fn update_from_patches(id: EntityId, patches: &[FieldPatch]) -> AccountUpdate {
        let mut update = AccountUpdate {
            id,
            ..AccountUpdate::default()
        };
        for patch in patches {
            match patch {
                FieldPatch::Identifier(value) => update.identifier = value.clone(),
                FieldPatch::Description(value) => update.description = value.clone(),
                // Cost fields never apply to accounts; apply_patch already
                // rejected them.
                _ => {}
            }
        }
        update
    }
}
