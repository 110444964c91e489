use serde::{Deserialize, Serialize};

/// Persisted entities are identified by integer ids assigned by the backend.
pub type EntityId = i64;

/// How a fringe rate is applied to a line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FringeUnit {
    /// `rate` is a fraction of the line's nominal value (optionally capped
    /// by a cutoff on the base).
    Percent,
    /// `rate` is an absolute amount added once.
    Flat,
}

/// How a markup surcharges the rows it covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupUnit {
    /// Contributes `rate × estimated(child)` for every covered child.
    #[default]
    Percent,
    /// Contributes `rate` exactly once, regardless of coverage.
    Flat,
}

/// Whether a top-level parent is a live budget or a reusable template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetDomain {
    #[default]
    Budget,
    Template,
}

/// Address of the entity that owns a table of children.
///
/// Account tables are owned by a budget; subaccount tables are owned by an
/// account or by another subaccount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    Budget(EntityId),
    Account(EntityId),
    Subaccount(EntityId),
}

impl ParentRef {
    /// Returns the parent's entity id.
    pub fn id(self) -> EntityId {
        match self {
            Self::Budget(id) | Self::Account(id) | Self::Subaccount(id) => id,
        }
    }

    /// URL path segment for the resource collection this parent owns.
    pub fn path_prefix(self) -> String {
        match self {
            Self::Budget(id) => format!("budgets/{id}"),
            Self::Account(id) => format!("accounts/{id}"),
            Self::Subaccount(id) => format!("subaccounts/{id}"),
        }
    }
}

pub mod budget {
    use super::*;
    use chrono::{DateTime, Utc};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: EntityId,
        pub name: String,
        pub domain: BudgetDomain,
        pub nominal_value: f64,
        pub accumulated_fringe_contribution: f64,
        pub accumulated_markup_contribution: f64,
        pub actual: f64,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct BudgetWrite {
        pub name: String,
        #[serde(default)]
        pub domain: BudgetDomain,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: EntityId,
        pub identifier: Option<String>,
        pub description: Option<String>,
        /// Ids of the subaccounts directly under this account.
        pub children: Vec<EntityId>,
        pub nominal_value: f64,
        pub accumulated_fringe_contribution: f64,
        pub accumulated_markup_contribution: f64,
        pub actual: f64,
    }

    /// Payload for creating an account (all fields optional; the backend
    /// fills defaults).
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct AccountWrite {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        /// Group to attach the new account to, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub group: Option<EntityId>,
    }

    /// One row of a bulk account update; absent fields are left untouched.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub id: EntityId,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub group: Option<EntityId>,
    }
}

pub mod subaccount {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct SubAccountView {
        pub id: EntityId,
        pub identifier: Option<String>,
        pub description: Option<String>,
        pub rate: Option<f64>,
        pub quantity: Option<f64>,
        pub multiplier: Option<f64>,
        /// Ids of the fringes applied to this line.
        pub fringes: Vec<EntityId>,
        /// Ids of nested subaccounts (empty for leaves).
        pub children: Vec<EntityId>,
        /// Markups scoped to this subaccount's own table of children.
        #[serde(default)]
        pub children_markups: Vec<crate::markup::MarkupView>,
        pub nominal_value: f64,
        pub fringe_contribution: f64,
        pub accumulated_fringe_contribution: f64,
        pub accumulated_markup_contribution: f64,
        pub actual: f64,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct SubAccountWrite {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub rate: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub quantity: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub multiplier: Option<f64>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub fringes: Vec<EntityId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub group: Option<EntityId>,
    }

    /// One row of a bulk subaccount update; absent fields are left
    /// untouched. `fringes` replaces the whole reference list when present.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct SubAccountUpdate {
        pub id: EntityId,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub rate: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub quantity: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub multiplier: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub fringes: Option<Vec<EntityId>>,
    }
}

pub mod fringe {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct FringeView {
        pub id: EntityId,
        pub name: Option<String>,
        pub unit: FringeUnit,
        pub rate: f64,
        /// Upper bound on the base a percent rate applies to.
        pub cutoff: Option<f64>,
        pub color: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct FringeWrite {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub unit: Option<FringeUnit>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub rate: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub cutoff: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
    }

    /// One row of a bulk fringe update. `unset_cutoff` clears the cutoff;
    /// a plain absent `cutoff` leaves it untouched.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct FringeUpdate {
        pub id: EntityId,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub unit: Option<FringeUnit>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub rate: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub cutoff: Option<f64>,
        #[serde(default)]
        pub unset_cutoff: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
    }
}

pub mod group {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: EntityId,
        pub name: String,
        pub color: Option<String>,
        /// Ids of the sibling rows this group subtotals.
        pub children: Vec<EntityId>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct GroupWrite {
        pub name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub children: Vec<EntityId>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct GroupUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub children: Option<Vec<EntityId>>,
    }
}

pub mod markup {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MarkupView {
        pub id: EntityId,
        pub identifier: Option<String>,
        pub description: Option<String>,
        pub unit: MarkupUnit,
        pub rate: f64,
        /// Ids of the sibling rows this markup surcharges.
        pub children: Vec<EntityId>,
        /// Markup rows can carry real invoiced amounts of their own.
        pub actual: f64,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct MarkupWrite {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        pub unit: MarkupUnit,
        pub rate: f64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub children: Vec<EntityId>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct MarkupUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub unit: Option<MarkupUnit>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub rate: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub children: Option<Vec<EntityId>>,
    }
}

pub mod bulk {
    use super::*;
    use crate::{budget::BudgetView, group::GroupView, markup::MarkupView};

    /// The recalculated owner of a table, returned by every bulk mutation.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum ParentView {
        Budget(crate::budget::BudgetView),
        Account(crate::account::AccountView),
        Subaccount(crate::subaccount::SubAccountView),
    }

    impl ParentView {
        pub fn id(&self) -> EntityId {
            match self {
                Self::Budget(b) => b.id,
                Self::Account(a) => a.id,
                Self::Subaccount(s) => s.id,
            }
        }
    }

    /// Body of a bulk create: either "make N blank children" or explicit
    /// partial payloads.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum BulkCreate<W> {
        Count { count: usize },
        Data { data: Vec<W> },
    }

    impl<W> BulkCreate<W> {
        pub fn len(&self) -> usize {
            match self {
                Self::Count { count } => *count,
                Self::Data { data } => data.len(),
            }
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BulkUpdate<U> {
        pub data: Vec<U>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BulkDelete {
        pub ids: Vec<EntityId>,
    }

    /// Response to a bulk create: recalculated parent plus the new children
    /// in creation order (used to activate placeholder rows).
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BulkCreated<C> {
        pub data: ParentView,
        pub children: Vec<C>,
    }

    /// Response to a bulk update: recalculated parent, refreshed children,
    /// and (for subaccount updates) the owning budget.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BulkUpdated<C> {
        pub data: ParentView,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub children: Option<Vec<C>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub budget: Option<BudgetView>,
    }

    /// Response to a bulk delete: just the recalculated parent.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BulkDeleted {
        pub data: ParentView,
    }

    /// Initial listing for a table mount: children plus the groups and
    /// markups scoped to the same parent.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct TableResponse<C> {
        pub data: Vec<C>,
        #[serde(default)]
        pub groups: Vec<GroupView>,
        #[serde(default)]
        pub markups: Vec<MarkupView>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::BulkCreate;
    use crate::subaccount::SubAccountWrite;

    #[test]
    fn bulk_create_count_and_data_are_distinguished() {
        let count: BulkCreate<SubAccountWrite> =
            serde_json::from_str(r#"{"count": 3}"#).unwrap();
        assert!(matches!(count, BulkCreate::Count { count: 3 }));

        let data: BulkCreate<SubAccountWrite> =
            serde_json::from_str(r#"{"data": [{"identifier": "1001"}]}"#).unwrap();
        match data {
            BulkCreate::Data { data } => {
                assert_eq!(data[0].identifier.as_deref(), Some("1001"));
            }
            BulkCreate::Count { .. } => panic!("parsed as count"),
        }
    }

    #[test]
    fn parent_view_is_internally_tagged() {
        let account = bulk::ParentView::Account(account::AccountView {
            id: 7,
            identifier: Some("7000".to_string()),
            description: None,
            children: vec![1, 2],
            nominal_value: 10.0,
            accumulated_fringe_contribution: 0.0,
            accumulated_markup_contribution: 0.0,
            actual: 0.0,
        });
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["type"], "account");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn update_payload_skips_untouched_fields() {
        let update = subaccount::SubAccountUpdate {
            id: 4,
            rate: Some(25.0),
            ..Default::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"id":4,"rate":25.0}"#);
    }
}
