//! The closed taxonomy of user-intent events a table can emit, and the
//! consolidation step that merges bursts of edits before they are flushed.
//!
//! Events are typed commands, not string-keyed actions: each carries
//! exactly the payload its application needs, and the dispatcher matches on
//! the variant to pick the single bulk call it maps to.

use uuid::Uuid;

use api_types::EntityId;

use crate::groups::Group;
use crate::markups::Markup;
use crate::rows::{RowId, TableRecord};

/// One edited field together with its new value.
///
/// `None` payloads clear the field. A patch to a derived field on a
/// non-leaf row is an invariant violation that the store logs and skips.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldPatch {
    Identifier(Option<String>),
    Description(Option<String>),
    Rate(Option<f64>),
    Quantity(Option<f64>),
    Multiplier(Option<f64>),
    /// Replaces the full list of fringe references on the row.
    Fringes(Vec<EntityId>),
}

/// Discriminant of a [`FieldPatch`], used to merge edits per (row, field).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Identifier,
    Description,
    Rate,
    Quantity,
    Multiplier,
    Fringes,
}

impl FieldPatch {
    pub fn key(&self) -> FieldKey {
        match self {
            Self::Identifier(_) => FieldKey::Identifier,
            Self::Description(_) => FieldKey::Description,
            Self::Rate(_) => FieldKey::Rate,
            Self::Quantity(_) => FieldKey::Quantity,
            Self::Multiplier(_) => FieldKey::Multiplier,
            Self::Fringes(_) => FieldKey::Fringes,
        }
    }

    /// Whether this field feeds computed totals (and so must flip the
    /// parent's `loading` flag while the recalculation round-trips).
    pub fn affects_totals(&self) -> bool {
        matches!(
            self,
            Self::Rate(_) | Self::Quantity(_) | Self::Multiplier(_) | Self::Fringes(_)
        )
    }
}

/// A single cell edit.
#[derive(Clone, Debug, PartialEq)]
pub struct CellChange {
    pub row: RowId,
    pub patch: FieldPatch,
}

/// Everything a table can ask the engine to do.
///
/// Row-creating events carry their placeholder UUIDs in the payload so that
/// replaying a history prefix (undo) regenerates byte-identical rows.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent<E: TableRecord> {
    /// Field edits on one or more rows.
    DataChange { changes: Vec<CellChange> },
    /// N new placeholder rows, blank or seeded from explicit partial rows.
    RowAdd {
        placeholder_ids: Vec<Uuid>,
        writes: Option<Vec<E::Write>>,
    },
    /// Delete rows by id. Placeholder ids are local-only; model ids are
    /// flushed as one bulk delete.
    RowDelete { rows: Vec<RowId> },
    /// One row inserted at an explicit position. `group` is the group the
    /// row joins once the backend has assigned it an id; a placeholder has
    /// no entity id a group could reference.
    RowInsert {
        placeholder_id: Uuid,
        write: E::Write,
        previous: Option<RowId>,
        group: Option<EntityId>,
    },
    /// Row moved relative to `previous`, optionally into a new group
    /// (`None` detaches it from its current group).
    RowPositionChanged {
        row: RowId,
        previous: Option<RowId>,
        group: Option<EntityId>,
    },
    RowAddToGroup {
        group: EntityId,
        rows: Vec<EntityId>,
    },
    RowRemoveFromGroup {
        group: EntityId,
        rows: Vec<EntityId>,
    },
    RowAddToMarkup {
        markup: EntityId,
        rows: Vec<EntityId>,
    },
    RowRemoveFromMarkup {
        markup: EntityId,
        rows: Vec<EntityId>,
    },
    GroupAdded(Group),
    GroupUpdated(Group),
    MarkupAdded(Markup),
    MarkupUpdated(Markup),
    /// The server has assigned real ids to placeholder rows; `models` is
    /// parallel to `placeholder_ids`.
    PlaceholdersActivated {
        placeholder_ids: Vec<Uuid>,
        models: Vec<E>,
    },
}

impl<E: TableRecord> ChangeEvent<E> {
    /// N blank placeholder rows.
    pub fn add_count(count: usize) -> Self {
        Self::RowAdd {
            placeholder_ids: (0..count).map(|_| Uuid::new_v4()).collect(),
            writes: None,
        }
    }

    /// Placeholder rows seeded from explicit partial payloads.
    pub fn add_rows(writes: Vec<E::Write>) -> Self {
        Self::RowAdd {
            placeholder_ids: writes.iter().map(|_| Uuid::new_v4()).collect(),
            writes: Some(writes),
        }
    }

    pub fn insert_row(write: E::Write, previous: Option<RowId>, group: Option<EntityId>) -> Self {
        Self::RowInsert {
            placeholder_id: Uuid::new_v4(),
            write,
            previous,
            group,
        }
    }

    /// Whether applying this event changes the parent's computed totals.
    ///
    /// Group membership and cosmetic group/markup metadata do not; markup
    /// membership does (it moves surcharge coverage).
    pub fn affects_totals(&self) -> bool {
        match self {
            Self::DataChange { changes } => {
                changes.iter().any(|change| change.patch.affects_totals())
            }
            Self::RowAdd { .. }
            | Self::RowDelete { .. }
            | Self::RowInsert { .. }
            | Self::RowAddToMarkup { .. }
            | Self::RowRemoveFromMarkup { .. } => true,
            Self::RowPositionChanged { .. }
            | Self::RowAddToGroup { .. }
            | Self::RowRemoveFromGroup { .. }
            | Self::GroupAdded(_)
            | Self::GroupUpdated(_)
            | Self::MarkupAdded(_)
            | Self::MarkupUpdated(_)
            | Self::PlaceholdersActivated { .. } => false,
        }
    }

    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataChange { .. } => "data_change",
            Self::RowAdd { .. } => "row_add",
            Self::RowDelete { .. } => "row_delete",
            Self::RowInsert { .. } => "row_insert",
            Self::RowPositionChanged { .. } => "row_position_changed",
            Self::RowAddToGroup { .. } => "row_add_to_group",
            Self::RowRemoveFromGroup { .. } => "row_remove_from_group",
            Self::RowAddToMarkup { .. } => "row_add_to_markup",
            Self::RowRemoveFromMarkup { .. } => "row_remove_from_markup",
            Self::GroupAdded(_) => "group_added",
            Self::GroupUpdated(_) => "group_updated",
            Self::MarkupAdded(_) => "markup_added",
            Self::MarkupUpdated(_) => "markup_updated",
            Self::PlaceholdersActivated { .. } => "placeholders_activated",
        }
    }
}

/// Merges runs of `DataChange` events into one net change per (row, field).
///
/// Later edits to the same cell overwrite earlier ones in place, so the
/// first-touch position of each cell is kept and edits are never reordered
/// across rows. Any non-data event closes the current window.
pub fn consolidate<E: TableRecord>(events: Vec<ChangeEvent<E>>) -> Vec<ChangeEvent<E>> {
    let mut out: Vec<ChangeEvent<E>> = Vec::with_capacity(events.len());
    let mut window: Vec<CellChange> = Vec::new();

    for event in events {
        match event {
            ChangeEvent::DataChange { changes } => {
                for change in changes {
                    match window
                        .iter_mut()
                        .find(|held| held.row == change.row && held.patch.key() == change.patch.key())
                    {
                        Some(held) => held.patch = change.patch,
                        None => window.push(change),
                    }
                }
            }
            other => {
                if !window.is_empty() {
                    out.push(ChangeEvent::DataChange {
                        changes: std::mem::take(&mut window),
                    });
                }
                out.push(other);
            }
        }
    }

    if !window.is_empty() {
        out.push(ChangeEvent::DataChange { changes: window });
    }
    out
}
