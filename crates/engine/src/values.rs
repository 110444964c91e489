//! Pure value computation over entities and rows.
//!
//! Every function here recomputes from raw fields on each call; nothing is
//! cached, so a caller can never observe stale derived state. Children are
//! always passed explicitly (or resolved from an explicitly passed row
//! list or arena): the engine never re-fetches.

use api_types::MarkupUnit;

use crate::fringes::Fringe;
use crate::markups::Markup;
use crate::rows::{Row, TableRecord};
use crate::subaccounts::{SubAccount, SubAccountArena};

/// Nominal (pre-fringe, pre-markup) value of an entity.
///
/// With materialized children the value is always the sum of their
/// nominals, never a stored number. Child fringe and markup loads are not
/// part of it: the backend folds those into the parent's accumulated
/// fields, and [`estimated_value`] adds them exactly once from there. A
/// leaf with a rate derives `quantity × rate × multiplier`, quantity and
/// multiplier defaulting to 1; a leaf without a rate falls back to the
/// backend's denormalized copy.
pub fn nominal_value<E: TableRecord>(entity: &E, children: &[E]) -> f64 {
    if !children.is_empty() {
        return children
            .iter()
            .map(|child| nominal_value(child, &[]))
            .sum();
    }
    match entity.rate() {
        Some(rate) => {
            rate * entity.quantity().unwrap_or(1.0) * entity.multiplier().unwrap_or(1.0)
        }
        None => entity.stored_nominal_value(),
    }
}

/// Summed contribution of the fringes an entity references.
///
/// The base is the entity's nominal value; a percent fringe's cutoff caps
/// that base, not the resulting contribution. References to fringes absent
/// from `fringes` are logged and skipped.
pub fn fringe_contribution<E: TableRecord>(
    entity: &E,
    children: &[E],
    fringes: &[Fringe],
) -> f64 {
    if entity.fringes().is_empty() {
        return 0.0;
    }
    let base = nominal_value(entity, children);
    entity
        .fringes()
        .iter()
        .filter_map(|id| {
            let found = fringes.iter().find(|fringe| fringe.id == *id);
            if found.is_none() {
                tracing::warn!(entity = entity.id(), fringe = id, "unknown fringe reference");
            }
            found
        })
        .map(|fringe| fringe.contribution(base))
        .sum()
}

/// Contribution that percent markups distribute onto a covered value.
///
/// Flat markups are excluded on purpose: they are counted exactly once at
/// the markup row itself, never redistributed onto children.
pub fn contribution_from_markups(value: f64, markups: &[Markup]) -> f64 {
    markups
        .iter()
        .filter(|markup| markup.is_percent())
        .map(|markup| markup.rate * value)
        .sum()
}

/// Estimated value of a non-group entity: nominal value plus the markup and
/// fringe contributions accumulated below it plus its own fringe load.
pub fn estimated_value<E: TableRecord>(entity: &E, children: &[E], fringes: &[Fringe]) -> f64 {
    nominal_value(entity, children)
        + entity.accumulated_markup_contribution()
        + entity.accumulated_fringe_contribution()
        + fringe_contribution(entity, children, fringes)
}

/// Estimated value of a group: the sum over exactly the candidates the
/// group covers. The candidate list is a required argument because a group
/// has no value of its own to fall back to.
pub fn group_estimated_value<E: TableRecord>(
    group: &crate::groups::Group,
    candidates: &[E],
    fringes: &[Fringe],
) -> f64 {
    candidates
        .iter()
        .filter(|candidate| group.covers(candidate.id()))
        .map(|candidate| estimated_value(candidate, &[], fringes))
        .sum()
}

/// Actual (invoiced) value. A leaf reports its own stored actual; an entity
/// with materialized children sums theirs.
pub fn actual_value<E: TableRecord>(entity: &E, children: &[E]) -> f64 {
    if children.is_empty() {
        entity.actual()
    } else {
        children.iter().map(|child| child.actual()).sum()
    }
}

pub fn group_actual_value<E: TableRecord>(group: &crate::groups::Group, candidates: &[E]) -> f64 {
    candidates
        .iter()
        .filter(|candidate| group.covers(candidate.id()))
        .map(|candidate| candidate.actual())
        .sum()
}

pub fn variance_value<E: TableRecord>(entity: &E, children: &[E], fringes: &[Fringe]) -> f64 {
    estimated_value(entity, children, fringes) - actual_value(entity, children)
}

/// Recursive actual over a (possibly partially loaded) subaccount tree.
pub fn actual_value_in_tree(arena: &SubAccountArena, node: &SubAccount) -> f64 {
    let children = arena.children_of(node.id);
    if children.is_empty() {
        node.actual
    } else {
        children
            .iter()
            .map(|child| actual_value_in_tree(arena, child))
            .sum()
    }
}

/// Row-aware estimated value for table display.
///
/// Group and markup rows resolve their children by filtering `rows`, so
/// the value is re-derived bottom-up from raw fields on every call.
pub fn estimated_value_getter<E: TableRecord>(
    row: &Row<E>,
    rows: &[Row<E>],
    fringes: &[Fringe],
) -> f64 {
    match row {
        Row::Model(entity) => estimated_value(entity, &[], fringes),
        Row::Placeholder(placeholder) => estimated_value(&placeholder.data, &[], fringes),
        Row::Group(group) => covered_records(rows, &group.children)
            .map(|record| estimated_value(record, &[], fringes))
            .sum(),
        Row::Markup(markup) => match markup.unit {
            MarkupUnit::Flat => markup.rate,
            MarkupUnit::Percent => covered_records(rows, &markup.children)
                .map(|record| markup.rate * estimated_value(record, &[], fringes))
                .sum(),
        },
    }
}

/// Row-aware actual value. Model and markup rows report their stored
/// actual; groups sum their children's.
pub fn actual_value_getter<E: TableRecord>(row: &Row<E>, rows: &[Row<E>]) -> f64 {
    match row {
        Row::Model(entity) => entity.actual(),
        Row::Placeholder(placeholder) => placeholder.data.actual(),
        Row::Markup(markup) => markup.actual,
        Row::Group(group) => covered_records(rows, &group.children)
            .map(TableRecord::actual)
            .sum(),
    }
}

pub fn variance_value_getter<E: TableRecord>(
    row: &Row<E>,
    rows: &[Row<E>],
    fringes: &[Fringe],
) -> f64 {
    estimated_value_getter(row, rows, fringes) - actual_value_getter(row, rows)
}

/// Grand total of one table: model rows plus markup rows. Group rows are
/// subtotals over models already counted and are excluded; a flat markup
/// therefore lands in the total exactly once.
pub fn table_estimated_total<E: TableRecord>(rows: &[Row<E>], fringes: &[Fringe]) -> f64 {
    rows.iter()
        .filter(|row| !row.is_group())
        .map(|row| estimated_value_getter(row, rows, fringes))
        .sum()
}

fn covered_records<'a, E: TableRecord>(
    rows: &'a [Row<E>],
    children: &'a [api_types::EntityId],
) -> impl Iterator<Item = &'a E> {
    rows.iter()
        .filter_map(Row::as_model)
        .filter(|record| children.contains(&record.id()))
}
