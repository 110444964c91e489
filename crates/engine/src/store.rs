//! The table store: one table instance's ordered rows, its applied event
//! history, and its lifecycle flags.
//!
//! The store is purely local state. Event application is infallible:
//! contract violations (unknown row ids, edits to derived fields, dangling
//! references) are logged and skipped so a replayed history can never
//! diverge by erroring partway through.

use api_types::EntityId;

use crate::events::{CellChange, ChangeEvent, FieldPatch};
use crate::groups::Group;
use crate::markups::Markup;
use crate::rows::{PlaceholderRow, Row, RowId, TableRecord};

/// Loading/invalidation flags of a parent detail entry cached alongside a
/// table.
#[derive(Clone, Debug, Default)]
pub struct DetailStore {
    pub view: Option<api_types::bulk::ParentView>,
    pub loading: bool,
    pub invalidated: bool,
    recalculating: usize,
}

impl DetailStore {
    /// Marks one totals-affecting flush in flight. `loading` holds until
    /// the last one settles.
    pub fn begin_recalculation(&mut self) {
        self.recalculating += 1;
        self.loading = true;
    }

    pub fn end_recalculation(&mut self) {
        self.recalculating = self.recalculating.saturating_sub(1);
        self.loading = self.recalculating > 0;
    }
}

/// State of one mounted table.
///
/// `event_index` splits `event_history` into the applied prefix and the
/// redo tail. `generation` increases whenever local state moves on from
/// what an in-flight request knew (hydrate, undo, rollback); a response
/// whose captured generation is stale must be discarded.
#[derive(Clone, Debug)]
pub struct TableStore<E: TableRecord> {
    snapshot: Vec<Row<E>>,
    rows: Vec<Row<E>>,
    event_history: Vec<ChangeEvent<E>>,
    event_index: usize,
    generation: u64,
    in_flight: usize,
    pub loading: bool,
    pub saving: bool,
    pub invalidated: bool,
    pub error: Option<String>,
}

impl<E: TableRecord> Default for TableStore<E> {
    fn default() -> Self {
        Self {
            snapshot: Vec::new(),
            rows: Vec::new(),
            event_history: Vec::new(),
            event_index: 0,
            generation: 0,
            in_flight: 0,
            loading: false,
            saving: false,
            invalidated: false,
            error: None,
        }
    }
}

impl<E: TableRecord> TableStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row<E>] {
        &self.rows
    }

    pub fn history(&self) -> &[ChangeEvent<E>] {
        &self.event_history
    }

    pub fn event_index(&self) -> usize {
        self.event_index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidates any in-flight request's right to touch this store.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Marks one backend call in flight. `saving` holds until the last
    /// call settles, so overlapping flushes cannot clear it early.
    pub fn begin_save(&mut self) {
        self.in_flight += 1;
        self.saving = true;
    }

    pub fn end_save(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.saving = self.in_flight > 0;
    }

    /// Installs a fresh server listing as the confirmed snapshot and resets
    /// history.
    pub fn hydrate(&mut self, rows: Vec<Row<E>>) {
        self.snapshot = rows.clone();
        self.rows = rows;
        self.event_history.clear();
        self.event_index = 0;
        self.loading = false;
        self.invalidated = false;
        self.error = None;
        self.generation += 1;
    }

    /// Applies an event and appends it to history, truncating any redo
    /// tail left over from earlier undos.
    pub fn record(&mut self, event: ChangeEvent<E>) {
        self.event_history.truncate(self.event_index);
        self.apply(&event);
        self.event_history.push(event);
        self.event_index += 1;
    }

    pub fn can_undo(&self) -> bool {
        self.event_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.event_index < self.event_history.len()
    }

    /// Steps one event back by replaying the shorter history prefix over
    /// the confirmed snapshot. Replay, not inversion: the result is
    /// identical to never having applied the undone event.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.event_index -= 1;
        // An in-flight call for the undone event must not land its effects.
        self.generation += 1;
        self.replay();
        true
    }

    /// Re-applies the next event locally. Nothing is reissued to the
    /// network: a confirmed event stays confirmed, an unconfirmed one was
    /// already discarded by the generation bump in [`Self::undo`].
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        let event = self.event_history[self.event_index].clone();
        self.apply(&event);
        self.event_index += 1;
        true
    }

    /// Discards all optimistic state and forces the next mount to refetch.
    pub fn rollback(&mut self) {
        self.rows = self.snapshot.clone();
        self.event_history.clear();
        self.event_index = 0;
        self.invalidated = true;
        self.generation += 1;
    }

    fn replay(&mut self) {
        self.rows = self.snapshot.clone();
        for i in 0..self.event_index {
            let event = self.event_history[i].clone();
            self.apply(&event);
        }
    }

    /// Replaces a confirmed model row with a freshly fetched copy, outside
    /// the event history (server echo, not a user edit).
    pub fn sync_model(&mut self, model: E) {
        match self.position(RowId::Model(model.id())) {
            Some(index) => self.rows[index] = Row::Model(model),
            None => tracing::warn!(id = model.id(), "refreshed model is not in this table"),
        }
    }

    pub fn sync_group(&mut self, group: Group) {
        match self.position(RowId::Group(group.id)) {
            Some(index) => self.rows[index] = Row::Group(group),
            None => tracing::warn!(id = group.id, "refreshed group is not in this table"),
        }
    }

    pub fn sync_markup(&mut self, markup: Markup) {
        match self.position(RowId::Markup(markup.id)) {
            Some(index) => self.rows[index] = Row::Markup(markup),
            None => tracing::warn!(id = markup.id, "refreshed markup is not in this table"),
        }
    }

    fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.row_id() == id)
    }

    fn apply(&mut self, event: &ChangeEvent<E>) {
        match event {
            ChangeEvent::DataChange { changes } => {
                for change in changes {
                    self.apply_cell(change);
                }
            }
            ChangeEvent::RowAdd {
                placeholder_ids,
                writes,
            } => {
                let seeds: Vec<E> = match writes {
                    Some(writes) => writes.iter().map(E::from_write).collect(),
                    None => placeholder_ids.iter().map(|_| E::default()).collect(),
                };
                // New rows land before the markup rows so markups keep
                // closing the scope.
                let insert_at = self
                    .rows
                    .iter()
                    .position(Row::is_markup)
                    .unwrap_or(self.rows.len());
                for (offset, (id, data)) in
                    placeholder_ids.iter().zip(seeds).enumerate()
                {
                    self.rows.insert(
                        insert_at + offset,
                        Row::Placeholder(PlaceholderRow { id: *id, data }),
                    );
                }
            }
            ChangeEvent::RowDelete { rows } => {
                let deleted_models: Vec<EntityId> = rows
                    .iter()
                    .filter_map(|row| match row {
                        RowId::Model(id) => Some(*id),
                        _ => None,
                    })
                    .collect();
                self.rows.retain(|row| !rows.contains(&row.row_id()));
                for row in &mut self.rows {
                    match row {
                        Row::Group(group) => {
                            group.children.retain(|child| !deleted_models.contains(child));
                        }
                        Row::Markup(markup) => {
                            markup.children.retain(|child| !deleted_models.contains(child));
                        }
                        Row::Model(_) | Row::Placeholder(_) => {}
                    }
                }
            }
            ChangeEvent::RowInsert {
                placeholder_id,
                write,
                previous,
                group: _,
            } => {
                // Group membership waits for activation; a placeholder has
                // no entity id a group could reference yet.
                let index = previous
                    .and_then(|p| self.position(p))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                self.rows.insert(
                    index,
                    Row::Placeholder(PlaceholderRow {
                        id: *placeholder_id,
                        data: E::from_write(write),
                    }),
                );
            }
            ChangeEvent::RowPositionChanged {
                row,
                previous,
                group,
            } => {
                let Some(from) = self.position(*row) else {
                    tracing::warn!(row = %row, "cannot move a row that is not present");
                    return;
                };
                let moved = self.rows.remove(from);
                let model_id = moved.as_model().map(TableRecord::id);
                let to = previous
                    .and_then(|p| self.position(p))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                self.rows.insert(to, moved);

                if let Some(id) = model_id {
                    for other in &mut self.rows {
                        if let Row::Group(g) = other {
                            g.children.retain(|child| child != &id);
                        }
                    }
                    if let Some(group_id) = group {
                        self.add_to_group(*group_id, &[id]);
                    }
                }
            }
            ChangeEvent::RowAddToGroup { group, rows } => {
                self.add_to_group(*group, rows);
            }
            ChangeEvent::RowRemoveFromGroup { group, rows } => {
                match self.rows.iter_mut().find_map(|row| match row {
                    Row::Group(g) if g.id == *group => Some(g),
                    _ => None,
                }) {
                    Some(g) => g.children.retain(|child| !rows.contains(child)),
                    None => tracing::warn!(group, "cannot ungroup rows: group row missing"),
                }
            }
            ChangeEvent::RowAddToMarkup { markup, rows } => {
                match self.rows.iter_mut().find_map(|row| match row {
                    Row::Markup(m) if m.id == *markup => Some(m),
                    _ => None,
                }) {
                    Some(m) => {
                        for id in rows {
                            if !m.children.contains(id) {
                                m.children.push(*id);
                            }
                        }
                    }
                    None => tracing::warn!(markup, "cannot extend markup: markup row missing"),
                }
            }
            ChangeEvent::RowRemoveFromMarkup { markup, rows } => {
                match self.rows.iter_mut().find_map(|row| match row {
                    Row::Markup(m) if m.id == *markup => Some(m),
                    _ => None,
                }) {
                    Some(m) => m.children.retain(|child| !rows.contains(child)),
                    None => tracing::warn!(markup, "cannot shrink markup: markup row missing"),
                }
            }
            ChangeEvent::GroupAdded(group) => {
                if self.position(RowId::Group(group.id)).is_some() {
                    tracing::warn!(id = group.id, "group row already present");
                    return;
                }
                let anchor = self.rows.iter().rposition(|row| {
                    row.as_model()
                        .is_some_and(|model| group.covers(model.id()))
                });
                let index = anchor.map(|i| i + 1).unwrap_or_else(|| {
                    self.rows
                        .iter()
                        .position(Row::is_markup)
                        .unwrap_or(self.rows.len())
                });
                self.rows.insert(index, Row::Group(group.clone()));
            }
            ChangeEvent::GroupUpdated(group) => {
                self.sync_group(group.clone());
            }
            ChangeEvent::MarkupAdded(markup) => {
                if self.position(RowId::Markup(markup.id)).is_some() {
                    tracing::warn!(id = markup.id, "markup row already present");
                    return;
                }
                self.rows.push(Row::Markup(markup.clone()));
            }
            ChangeEvent::MarkupUpdated(markup) => {
                self.sync_markup(markup.clone());
            }
            ChangeEvent::PlaceholdersActivated {
                placeholder_ids,
                models,
            } => {
                for (placeholder, model) in placeholder_ids.iter().zip(models) {
                    match self.position(RowId::Placeholder(*placeholder)) {
                        Some(index) => self.rows[index] = Row::Model(model.clone()),
                        None => tracing::warn!(
                            placeholder = %placeholder,
                            "activated placeholder is no longer in the table"
                        ),
                    }
                }
            }
        }
    }

    fn apply_cell(&mut self, change: &CellChange) {
        let Some(row) = self.rows.iter_mut().find(|row| row.row_id() == change.row) else {
            tracing::warn!(row = %change.row, "cell edit targets a missing row");
            return;
        };
        let Some(record) = row.record_mut() else {
            tracing::warn!(row = %change.row, "cell edit targets a group or markup row");
            return;
        };
        // A row with materialized children derives its value; direct cost
        // edits would silently desynchronize it.
        if !record.children().is_empty()
            && matches!(
                change.patch,
                FieldPatch::Rate(_) | FieldPatch::Quantity(_) | FieldPatch::Multiplier(_)
            )
        {
            tracing::warn!(row = %change.row, "skipping derived-value edit on a non-leaf row");
            return;
        }
        if let Err(err) = record.apply_patch(&change.patch) {
            tracing::warn!(row = %change.row, error = %err, "skipping invalid cell edit");
        }
    }

    fn add_to_group(&mut self, group: EntityId, ids: &[EntityId]) {
        match self.rows.iter_mut().find_map(|row| match row {
            Row::Group(g) if g.id == group => Some(g),
            _ => None,
        }) {
            Some(g) => {
                for id in ids {
                    if !g.children.contains(id) {
                        g.children.push(*id);
                    }
                }
            }
            None => tracing::warn!(group, "cannot group rows: group row missing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CellChange, FieldPatch};
    use crate::subaccounts::SubAccount;
    use api_types::MarkupUnit;
    use api_types::subaccount::SubAccountWrite;

    fn line(id: EntityId, rate: f64) -> SubAccount {
        SubAccount {
            id,
            rate: Some(rate),
            ..SubAccount::default()
        }
    }

    fn store_with(rows: Vec<Row<SubAccount>>) -> TableStore<SubAccount> {
        let mut store = TableStore::new();
        store.hydrate(rows);
        store
    }

    fn edit(row: EntityId, rate: f64) -> ChangeEvent<SubAccount> {
        ChangeEvent::DataChange {
            changes: vec![CellChange {
                row: RowId::Model(row),
                patch: FieldPatch::Rate(Some(rate)),
            }],
        }
    }

    fn sample_events() -> Vec<ChangeEvent<SubAccount>> {
        vec![
            edit(1, 20.0),
            ChangeEvent::add_count(2),
            edit(2, 7.5),
            ChangeEvent::RowDelete {
                rows: vec![RowId::Model(2)],
            },
        ]
    }

    fn replay_prefix(events: &[ChangeEvent<SubAccount>], upto: usize) -> Vec<Row<SubAccount>> {
        let mut store = store_with(vec![Row::Model(line(1, 10.0)), Row::Model(line(2, 5.0))]);
        for event in &events[..upto] {
            store.record(event.clone());
        }
        store.rows().to_vec()
    }

    #[test]
    fn undo_equals_replay_of_the_shorter_prefix() {
        let events = sample_events();
        for i in 0..events.len() {
            let expected = replay_prefix(&events, i);

            let mut store =
                store_with(vec![Row::Model(line(1, 10.0)), Row::Model(line(2, 5.0))]);
            for event in &events[..=i] {
                store.record(event.clone());
            }
            assert!(store.undo());
            assert_eq!(store.rows(), &expected[..], "prefix {i}");
        }
    }

    #[test]
    fn redo_restores_what_undo_removed() {
        let events = sample_events();
        let mut store = store_with(vec![Row::Model(line(1, 10.0)), Row::Model(line(2, 5.0))]);
        for event in &events {
            store.record(event.clone());
        }
        let full = store.rows().to_vec();

        assert!(store.undo());
        assert!(store.undo());
        assert!(store.redo());
        assert!(store.redo());
        assert_eq!(store.rows(), &full[..]);
        assert!(!store.redo());
    }

    #[test]
    fn replay_is_deterministic_for_row_adds() {
        // Placeholder UUIDs live in the event payload, so replaying the
        // same prefix twice yields identical rows.
        let event: ChangeEvent<SubAccount> = ChangeEvent::add_count(3);
        let mut a = store_with(vec![]);
        let mut b = store_with(vec![]);
        a.record(event.clone());
        b.record(event);
        assert_eq!(a.rows(), b.rows());
    }

    #[test]
    fn recording_truncates_the_redo_tail() {
        let mut store = store_with(vec![Row::Model(line(1, 10.0))]);
        store.record(edit(1, 20.0));
        store.record(edit(1, 30.0));
        store.undo();
        store.record(edit(1, 40.0));
        assert!(!store.can_redo());
        assert_eq!(store.history().len(), 2);
        assert_eq!(
            store.rows()[0].as_model().unwrap().rate,
            Some(40.0)
        );
    }

    #[test]
    fn undo_bumps_the_generation() {
        let mut store = store_with(vec![Row::Model(line(1, 10.0))]);
        store.record(edit(1, 20.0));
        let generation = store.generation();
        store.undo();
        assert!(store.generation() > generation);
    }

    #[test]
    fn saving_clears_only_after_the_last_in_flight_call() {
        let mut store = store_with(vec![Row::Model(line(1, 10.0))]);
        store.begin_save();
        store.begin_save();
        store.end_save();
        assert!(store.saving);
        store.end_save();
        assert!(!store.saving);
    }

    #[test]
    fn detail_loading_clears_only_after_the_last_recalculation() {
        let mut detail = DetailStore::default();
        detail.begin_recalculation();
        detail.begin_recalculation();
        detail.end_recalculation();
        assert!(detail.loading);
        detail.end_recalculation();
        assert!(!detail.loading);
    }

    #[test]
    fn row_delete_strips_group_and_markup_references() {
        let group = Group {
            id: 10,
            name: "G".to_string(),
            color: None,
            children: vec![1, 2],
        };
        let markup = Markup {
            id: 20,
            identifier: None,
            description: None,
            unit: MarkupUnit::Percent,
            rate: 0.1,
            children: vec![1, 2],
            actual: 0.0,
        };
        let mut store = store_with(vec![
            Row::Model(line(1, 10.0)),
            Row::Model(line(2, 5.0)),
            Row::Group(group),
            Row::Markup(markup),
        ]);
        store.record(ChangeEvent::RowDelete {
            rows: vec![RowId::Model(2)],
        });

        let rows = store.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].as_group().unwrap().children, vec![1]);
        assert_eq!(rows[2].as_markup().unwrap().children, vec![1]);
    }

    #[test]
    fn new_rows_land_before_markup_rows() {
        let markup = Markup {
            id: 20,
            identifier: None,
            description: None,
            unit: MarkupUnit::Flat,
            rate: 50.0,
            children: vec![1],
            actual: 0.0,
        };
        let mut store = store_with(vec![Row::Model(line(1, 10.0)), Row::Markup(markup)]);
        store.record(ChangeEvent::add_count(1));

        let rows = store.rows();
        assert!(rows[1].is_placeholder());
        assert!(rows[2].is_markup());
    }

    #[test]
    fn activation_swaps_placeholders_for_models_in_order() {
        let mut store = store_with(vec![]);
        let event: ChangeEvent<SubAccount> = ChangeEvent::add_rows(vec![
            SubAccountWrite {
                identifier: Some("1001".to_string()),
                ..SubAccountWrite::default()
            },
            SubAccountWrite::default(),
        ]);
        let ChangeEvent::RowAdd { placeholder_ids, .. } = &event else {
            panic!("expected row add");
        };
        let ids = placeholder_ids.clone();
        store.record(event);

        store.record(ChangeEvent::PlaceholdersActivated {
            placeholder_ids: ids,
            models: vec![line(101, 1.0), line(102, 2.0)],
        });
        let rows = store.rows();
        assert_eq!(rows[0].row_id(), RowId::Model(101));
        assert_eq!(rows[1].row_id(), RowId::Model(102));
    }

    #[test]
    fn derived_value_edit_on_non_leaf_is_skipped() {
        let parent = SubAccount {
            id: 1,
            children: vec![2],
            nominal_value: 50.0,
            ..SubAccount::default()
        };
        let mut store = store_with(vec![Row::Model(parent.clone())]);
        store.record(edit(1, 99.0));
        assert_eq!(store.rows()[0].as_model().unwrap(), &parent);
    }

    #[test]
    fn row_move_reattaches_group_membership() {
        let group = Group {
            id: 10,
            name: "G".to_string(),
            color: None,
            children: vec![1],
        };
        let mut store = store_with(vec![
            Row::Model(line(1, 10.0)),
            Row::Group(group),
            Row::Model(line(2, 5.0)),
        ]);
        store.record(ChangeEvent::RowPositionChanged {
            row: RowId::Model(2),
            previous: Some(RowId::Model(1)),
            group: Some(10),
        });

        let rows = store.rows();
        assert_eq!(rows[0].row_id(), RowId::Model(1));
        assert_eq!(rows[1].row_id(), RowId::Model(2));
        assert_eq!(rows[2].as_group().unwrap().children, vec![1, 2]);
    }
}
