//! The module contains the representation of a fringe, a per-line cost
//! adjustment (e.g. benefits overhead) applied to subaccounts.

use api_types::{EntityId, FringeUnit, fringe::FringeView};
use serde::{Deserialize, Serialize};

/// A fringe attached to a budget or template and referenced by id from
/// subaccounts.
///
/// For `percent` fringes the optional `cutoff` caps the **base** the rate
/// applies to, not the resulting contribution: a 20% fringe with a cutoff
/// of 500 applied to a base of 800 contributes `0.2 × 500 = 100`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fringe {
    pub id: EntityId,
    pub name: Option<String>,
    pub unit: FringeUnit,
    pub rate: f64,
    pub cutoff: Option<f64>,
    pub color: Option<String>,
    pub description: Option<String>,
}

impl Fringe {
    /// Contribution of this fringe on top of `base` (the nominal value of
    /// the line it is applied to).
    pub fn contribution(&self, base: f64) -> f64 {
        match self.unit {
            FringeUnit::Flat => self.rate,
            FringeUnit::Percent => {
                let capped = match self.cutoff {
                    Some(cutoff) => base.min(cutoff),
                    None => base,
                };
                self.rate * capped
            }
        }
    }

    /// Whether the edit from `before` to `after` touched a field that
    /// changes computed totals (`rate`, `cutoff`, `unit`). Cosmetic edits
    /// (name, color, description) return `false` and skip the whole
    /// invalidation pass.
    pub fn quantitative_change(before: &Fringe, after: &Fringe) -> bool {
        before.rate != after.rate || before.cutoff != after.cutoff || before.unit != after.unit
    }
}

impl From<FringeView> for Fringe {
    fn from(view: FringeView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            unit: view.unit,
            rate: view.rate,
            cutoff: view.cutoff,
            color: view.color,
            description: view.description,
        }
    }
}
