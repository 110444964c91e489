//! The module contains the representation of a subaccount, the recursive
//! line-item type of the hierarchy, and the flat arena the tree is held in.
//!
//! Subaccounts are self-recursive: children are stored as ids into a
//! [`SubAccountArena`] rather than as nested owned structures, so a
//! partially loaded tree (only some descendants fetched) is representable
//! and ownership stays flat.

use std::collections::HashMap;

use api_types::{
    EntityId,
    subaccount::{SubAccountUpdate, SubAccountView, SubAccountWrite},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::events::FieldPatch;
use crate::markups::Markup;
use crate::rows::TableRecord;

/// A subaccount line item.
///
/// A leaf derives its nominal value from `quantity × rate × multiplier`;
/// a subaccount with materialized children never stores a directly edited
/// nominal value, only the backend's denormalized rollup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubAccount {
    pub id: EntityId,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub rate: Option<f64>,
    pub quantity: Option<f64>,
    pub multiplier: Option<f64>,
    /// Fringes applied to this line, by id.
    pub fringes: Vec<EntityId>,
    /// Nested subaccounts, by id into the arena.
    pub children: Vec<EntityId>,
    /// Markups scoped over this subaccount's own children.
    pub children_markups: Vec<Markup>,
    pub nominal_value: f64,
    pub fringe_contribution: f64,
    pub accumulated_fringe_contribution: f64,
    pub accumulated_markup_contribution: f64,
    pub actual: f64,
}

impl TableRecord for SubAccount {
    type Write = SubAccountWrite;
    type Update = SubAccountUpdate;
    type View = SubAccountView;

    fn id(&self) -> EntityId {
        self.id
    }

    fn children(&self) -> &[EntityId] {
        &self.children
    }

    fn fringes(&self) -> &[EntityId] {
        &self.fringes
    }

    fn rate(&self) -> Option<f64> {
        self.rate
    }

    fn quantity(&self) -> Option<f64> {
        self.quantity
    }

    fn multiplier(&self) -> Option<f64> {
        self.multiplier
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

    fn from_view(view: SubAccountView) -> Self {
        Self {
            id: view.id,
            identifier: view.identifier,
            description: view.description,
            rate: view.rate,
            quantity: view.quantity,
            multiplier: view.multiplier,
            fringes: view.fringes,
            children: view.children,
            children_markups: view.children_markups.into_iter().map(Markup::from).collect(),
            nominal_value: view.nominal_value,
            fringe_contribution: view.fringe_contribution,
            accumulated_fringe_contribution: view.accumulated_fringe_contribution,
            accumulated_markup_contribution: view.accumulated_markup_contribution,
            actual: view.actual,
        }
    }

    fn from_write(write: &SubAccountWrite) -> Self {
        Self {
            identifier: write.identifier.clone(),
            description: write.description.clone(),
            rate: write.rate,
            quantity: write.quantity,
            multiplier: write.multiplier,
            fringes: write.fringes.clone(),
            ..Self::default()
        }
    }

    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<(), EngineError> {
        match patch {
            FieldPatch::Identifier(value) => self.identifier = value.clone(),
            FieldPatch::Description(value) => self.description = value.clone(),
            FieldPatch::Rate(value) => self.rate = *value,
            FieldPatch::Quantity(value) => self.quantity = *value,
            FieldPatch::Multiplier(value) => self.multiplier = *value,
            FieldPatch::Fringes(ids) => self.fringes = ids.clone(),
        }
        Ok(())
    }

    fn update_from_patches(id: EntityId, patches: &[FieldPatch]) -> SubAccountUpdate {
        let mut update = SubAccountUpdate {
            id,
            ..SubAccountUpdate::default()
        };
        for patch in patches {
            match patch {
                FieldPatch::Identifier(value) => update.identifier = value.clone(),
                FieldPatch::Description(value) => update.description = value.clone(),
                FieldPatch::Rate(value) => update.rate = *value,
                FieldPatch::Quantity(value) => update.quantity = *value,
                FieldPatch::Multiplier(value) => update.multiplier = *value,
                FieldPatch::Fringes(ids) => update.fringes = Some(ids.clone()),
            }
        }
        update
    }
}

/// Flat arena of subaccounts keyed by id.
#[derive(Clone, Debug, Default)]
pub struct SubAccountArena {
    nodes: HashMap<EntityId, SubAccount>,
}

impl SubAccountArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: SubAccount) {
        self.nodes.insert(node.id, node);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<SubAccount> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&SubAccount> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SubAccount> {
        self.nodes.get_mut(&id)
    }

    /// Resolves a node's children. Ids whose nodes have not been fetched
    /// yet are silently absent from the result; a partially loaded tree is
    /// a normal state, not an error.
    pub fn children_of(&self, id: EntityId) -> Vec<&SubAccount> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        node.children
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<SubAccount> for SubAccountArena {
    fn from_iter<I: IntoIterator<Item = SubAccount>>(iter: I) -> Self {
        let mut arena = Self::new();
        for node in iter {
            arena.insert(node);
        }
        arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_resolves_only_fetched_children() {
        let parent = SubAccount {
            id: 1,
            children: vec![2, 3],
            ..SubAccount::default()
        };
        let fetched = SubAccount {
            id: 2,
            ..SubAccount::default()
        };
        let arena: SubAccountArena = [parent, fetched].into_iter().collect();

        let children = arena.children_of(1);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, 2);
    }
}
