//! The module contains the representation of a markup, a surcharge applied
//! over a declared set of sibling rows.

use api_types::{EntityId, MarkupUnit, markup::MarkupView};
use serde::{Deserialize, Serialize};

/// A markup over a set of sibling rows.
///
/// The flat/percent asymmetry is deliberate and must not be "simplified":
/// a `flat` markup contributes its rate exactly once regardless of how many
/// children it covers (a fixed administrative fee), while a `percent`
/// markup contributes `rate × estimated(child)` independently per covered
/// child (a percentage overhead).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Markup {
    pub id: EntityId,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub unit: MarkupUnit,
    pub rate: f64,
    pub children: Vec<EntityId>,
    pub actual: f64,
}

impl Markup {
    pub fn is_percent(&self) -> bool {
        self.unit == MarkupUnit::Percent
    }

    pub fn covers(&self, id: EntityId) -> bool {
        self.children.contains(&id)
    }
}

impl From<MarkupView> for Markup {
    fn from(view: MarkupView) -> Self {
        Self {
            id: view.id,
            identifier: view.identifier,
            description: view.description,
            unit: view.unit,
            rate: view.rate,
            children: view.children,
            actual: view.actual,
        }
    }
}
