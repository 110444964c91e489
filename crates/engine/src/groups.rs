//! The module contains the representation of a group, a subtotal over
//! contiguous sibling rows.

use api_types::{EntityId, group::GroupView};
use serde::{Deserialize, Serialize};

/// A subtotal grouping. A group never stores totals of its own; its values
/// are always derived from the children listed here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: EntityId,
    pub name: String,
    pub color: Option<String>,
    pub children: Vec<EntityId>,
}

impl Group {
    pub fn covers(&self, id: EntityId) -> bool {
        self.children.contains(&id)
    }
}

impl From<GroupView> for Group {
    fn from(view: GroupView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            color: view.color,
            children: view.children,
        }
    }
}
