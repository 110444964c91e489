//! The row model: the tagged union a table renders, and the assembly of an
//! ordered row collection from raw entities, groups, and markups.

use std::collections::HashSet;
use std::fmt;

use uuid::Uuid;

use api_types::EntityId;

use crate::error::EngineError;
use crate::events::FieldPatch;
use crate::groups::Group;
use crate::markups::Markup;

/// What a table needs from the record type it displays.
///
/// Account tables and subaccount tables share one row/store/dispatch
/// implementation through this trait; each record type also names its wire
/// payloads so the dispatcher can build bulk requests without knowing the
/// domain.
pub trait TableRecord:
    Clone + Default + fmt::Debug + PartialEq + Send + Sync + 'static
{
    /// Partial payload for creating a record of this type.
    type Write: Clone + Default + fmt::Debug + PartialEq + Send + Sync + 'static;
    /// One row of a bulk update.
    type Update: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;
    /// The server's view of a persisted record.
    type View: Clone + fmt::Debug + Send + Sync + 'static;

    fn id(&self) -> EntityId;
    fn children(&self) -> &[EntityId];
    fn fringes(&self) -> &[EntityId] {
        &[]
    }
    fn rate(&self) -> Option<f64> {
        None
    }
    fn quantity(&self) -> Option<f64> {
        None
    }
    fn multiplier(&self) -> Option<f64> {
        None
    }
    /// The backend's denormalized nominal value, used when the record has
    /// neither a rate nor materialized children.
    fn stored_nominal_value(&self) -> f64;
    fn accumulated_fringe_contribution(&self) -> f64;
    fn accumulated_markup_contribution(&self) -> f64;
    fn actual(&self) -> f64;

    fn from_view(view: Self::View) -> Self;
    /// Optimistic local record for a placeholder seeded from a write
    /// payload.
    fn from_write(write: &Self::Write) -> Self;
    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<(), EngineError>;
    /// Builds the wire update for one row from its consolidated patches.
    fn update_from_patches(id: EntityId, patches: &[FieldPatch]) -> Self::Update;
}

/// Identity of a row in a table: persisted entities, groups, and markups
/// carry backend ids; placeholders carry a client-generated UUID until the
/// server activates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowId {
    Model(EntityId),
    Group(EntityId),
    Markup(EntityId),
    Placeholder(Uuid),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(id) => write!(f, "model:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Markup(id) => write!(f, "markup:{id}"),
            Self::Placeholder(id) => write!(f, "placeholder:{id}"),
        }
    }
}

/// A locally-created row awaiting server-assigned identity.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceholderRow<E> {
    pub id: Uuid,
    pub data: E,
}

/// One row of a table: a real entity, a subtotal, a surcharge, or an
/// optimistic placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum Row<E: TableRecord> {
    Model(E),
    Group(Group),
    Markup(Markup),
    Placeholder(PlaceholderRow<E>),
}

impl<E: TableRecord> Row<E> {
    pub fn row_id(&self) -> RowId {
        match self {
            Self::Model(e) => RowId::Model(e.id()),
            Self::Group(g) => RowId::Group(g.id),
            Self::Markup(m) => RowId::Markup(m.id),
            Self::Placeholder(p) => RowId::Placeholder(p.id),
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    pub fn is_markup(&self) -> bool {
        matches!(self, Self::Markup(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    pub fn as_model(&self) -> Option<&E> {
        match self {
            Self::Model(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_markup(&self) -> Option<&Markup> {
        match self {
            Self::Markup(m) => Some(m),
            _ => None,
        }
    }

    /// The underlying record, whether persisted or still a placeholder.
    pub fn record(&self) -> Option<&E> {
        match self {
            Self::Model(e) => Some(e),
            Self::Placeholder(p) => Some(&p.data),
            Self::Group(_) | Self::Markup(_) => None,
        }
    }

    pub fn record_mut(&mut self) -> Option<&mut E> {
        match self {
            Self::Model(e) => Some(e),
            Self::Placeholder(p) => Some(&mut p.data),
            Self::Group(_) | Self::Markup(_) => None,
        }
    }
}

/// Assembles the ordered row collection for one table.
///
/// Model rows keep entity order; each group row lands immediately after the
/// last child it covers; markup rows close the scope at the end. The result
/// is deterministic for a given input and contains no two rows with the
/// same id: duplicates and references to absent children are logged and
/// skipped, never propagated.
pub fn generate_table_data<E: TableRecord>(
    entities: Vec<E>,
    groups: Vec<Group>,
    markups: Vec<Markup>,
) -> Vec<Row<E>> {
    let mut rows: Vec<Row<E>> = Vec::with_capacity(entities.len() + groups.len() + markups.len());
    let mut seen: HashSet<EntityId> = HashSet::with_capacity(entities.len());

    for entity in entities {
        if !seen.insert(entity.id()) {
            tracing::warn!(id = entity.id(), "duplicate entity in table data, skipping");
            continue;
        }
        rows.push(Row::Model(entity));
    }

    let mut seen_groups: HashSet<EntityId> = HashSet::new();
    for group in groups {
        if !seen_groups.insert(group.id) {
            tracing::warn!(id = group.id, "duplicate group in table data, skipping");
            continue;
        }
        for child in &group.children {
            if !seen.contains(child) {
                tracing::warn!(group = group.id, child, "group references missing child");
            }
        }
        let anchor = rows.iter().rposition(|row| {
            row.as_model()
                .is_some_and(|model| group.covers(model.id()))
        });
        match anchor {
            Some(index) => rows.insert(index + 1, Row::Group(group)),
            None => {
                tracing::warn!(id = group.id, "group covers no present rows, skipping");
            }
        }
    }

    let mut seen_markups: HashSet<EntityId> = HashSet::new();
    for markup in markups {
        if !seen_markups.insert(markup.id) {
            tracing::warn!(id = markup.id, "duplicate markup in table data, skipping");
            continue;
        }
        for child in &markup.children {
            if !seen.contains(child) {
                tracing::warn!(markup = markup.id, child, "markup references missing child");
            }
        }
        rows.push(Row::Markup(markup));
    }

    rows
}
