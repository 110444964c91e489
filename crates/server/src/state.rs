//! In-memory backing store for the bulk API.
//!
//! Every mutation recalculates the owning budget bottom-up, so each
//! response already carries the denormalized totals the engine expects
//! (`nominal_value`, `fringe_contribution`, `accumulated_*`, `actual`).

use std::collections::HashMap;

use chrono::Utc;

use api_types::{
    EntityId, ParentRef,
    account::{AccountUpdate, AccountView, AccountWrite},
    budget::{BudgetView, BudgetWrite},
    bulk::{
        BulkCreate, BulkCreated, BulkDelete, BulkDeleted, BulkUpdate, BulkUpdated, ParentView,
        TableResponse,
    },
    fringe::{FringeUpdate, FringeView, FringeWrite},
    group::{GroupUpdate, GroupView, GroupWrite},
    markup::{MarkupUpdate, MarkupView, MarkupWrite},
    subaccount::{SubAccountUpdate, SubAccountView, SubAccountWrite},
};
use engine::{EngineError, Fringe, ResultEngine};

#[derive(Default)]
pub struct BudgetDb {
    next_id: EntityId,
    budgets: HashMap<EntityId, BudgetView>,
    accounts: HashMap<EntityId, AccountView>,
    subaccounts: HashMap<EntityId, SubAccountView>,
    fringes: HashMap<EntityId, FringeView>,
    groups: HashMap<EntityId, GroupView>,
    markups: HashMap<EntityId, MarkupView>,
    /// Ordered entity rows of each table, keyed by the owning parent.
    tables: HashMap<ParentRef, Vec<EntityId>>,
    table_groups: HashMap<ParentRef, Vec<EntityId>>,
    table_markups: HashMap<ParentRef, Vec<EntityId>>,
    /// account id -> owning budget.
    account_owner: HashMap<EntityId, EntityId>,
    /// subaccount id -> owning parent (account or subaccount).
    subaccount_owner: HashMap<EntityId, ParentRef>,
    /// group/markup id -> the table parent it is scoped to.
    group_owner: HashMap<EntityId, ParentRef>,
    markup_owner: HashMap<EntityId, ParentRef>,
    /// budget id -> its fringes, in creation order.
    budget_fringes: HashMap<EntityId, Vec<EntityId>>,
}

impl BudgetDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    fn table(&self, parent: ParentRef) -> Vec<EntityId> {
        self.tables.get(&parent).cloned().unwrap_or_default()
    }

    /// Walks owner links up to the budget that ultimately owns `parent`.
    fn budget_of(&self, parent: ParentRef) -> ResultEngine<EntityId> {
        let mut current = parent;
        loop {
            match current {
                ParentRef::Budget(id) => return Ok(id),
                ParentRef::Account(id) => {
                    let budget = self
                        .account_owner
                        .get(&id)
                        .ok_or_else(|| EngineError::NotFound(format!("account {id}")))?;
                    return Ok(*budget);
                }
                ParentRef::Subaccount(id) => {
                    current = *self
                        .subaccount_owner
                        .get(&id)
                        .ok_or_else(|| EngineError::NotFound(format!("subaccount {id}")))?;
                }
            }
        }
    }

    fn ensure_parent(&self, parent: ParentRef) -> ResultEngine<()> {
        let ok = match parent {
            ParentRef::Budget(id) => self.budgets.contains_key(&id),
            ParentRef::Account(id) => self.accounts.contains_key(&id),
            ParentRef::Subaccount(id) => self.subaccounts.contains_key(&id),
        };
        if ok {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!(
                "parent {}",
                parent.path_prefix()
            )))
        }
    }

    // ---- budgets ----

    pub fn create_budget(&mut self, body: BudgetWrite) -> BudgetView {
        let id = self.next_id();
        let view = BudgetView {
            id,
            name: body.name,
            domain: body.domain,
            nominal_value: 0.0,
            accumulated_fringe_contribution: 0.0,
            accumulated_markup_contribution: 0.0,
            actual: 0.0,
            updated_at: Utc::now(),
        };
        self.budgets.insert(id, view.clone());
        view
    }

    pub fn parent_view(&self, parent: ParentRef) -> ResultEngine<ParentView> {
        match parent {
            ParentRef::Budget(id) => self
                .budgets
                .get(&id)
                .cloned()
                .map(ParentView::Budget)
                .ok_or_else(|| EngineError::NotFound(format!("budget {id}"))),
            ParentRef::Account(id) => self
                .accounts
                .get(&id)
                .cloned()
                .map(ParentView::Account)
                .ok_or_else(|| EngineError::NotFound(format!("account {id}"))),
            ParentRef::Subaccount(id) => self
                .subaccounts
                .get(&id)
                .cloned()
                .map(ParentView::Subaccount)
                .ok_or_else(|| EngineError::NotFound(format!("subaccount {id}"))),
        }
    }

    // ---- accounts ----

    pub fn list_accounts(&self, budget: EntityId) -> ResultEngine<TableResponse<AccountView>> {
        self.ensure_parent(ParentRef::Budget(budget))?;
        let parent = ParentRef::Budget(budget);
        Ok(TableResponse {
            data: self.collect_views(&self.table(parent), &self.accounts),
            groups: self.collect_table_groups(parent),
            markups: self.collect_table_markups(parent),
        })
    }

    pub fn create_accounts(
        &mut self,
        budget: EntityId,
        body: BulkCreate<AccountWrite>,
    ) -> ResultEngine<BulkCreated<AccountView>> {
        self.ensure_parent(ParentRef::Budget(budget))?;
        let writes = match body {
            BulkCreate::Count { count } => vec![AccountWrite::default(); count],
            BulkCreate::Data { data } => data,
        };
        let parent = ParentRef::Budget(budget);
        let mut children = Vec::with_capacity(writes.len());
        for write in writes {
            let id = self.next_id();
            let view = AccountView {
                id,
                identifier: write.identifier,
                description: write.description,
                children: vec![],
                nominal_value: 0.0,
                accumulated_fringe_contribution: 0.0,
                accumulated_markup_contribution: 0.0,
                actual: 0.0,
            };
            self.accounts.insert(id, view);
            self.account_owner.insert(id, budget);
            self.tables.entry(parent).or_default().push(id);
            if let Some(group) = write.group {
                self.attach_to_group(group, id);
            }
            children.push(id);
        }
        self.recalculate_budget(budget);
        Ok(BulkCreated {
            data: self.parent_view(parent)?,
            children: self.collect_views(&children, &self.accounts),
        })
    }

    pub fn update_accounts(
        &mut self,
        budget: EntityId,
        body: BulkUpdate<AccountUpdate>,
    ) -> ResultEngine<BulkUpdated<AccountView>> {
        self.ensure_parent(ParentRef::Budget(budget))?;
        let mut touched = Vec::with_capacity(body.data.len());
        for update in body.data {
            let account = self
                .accounts
                .get_mut(&update.id)
                .ok_or_else(|| EngineError::NotFound(format!("account {}", update.id)))?;
            if let Some(identifier) = update.identifier {
                account.identifier = Some(identifier);
            }
            if let Some(description) = update.description {
                account.description = Some(description);
            }
            touched.push(update.id);
            if let Some(group) = update.group {
                self.attach_to_group(group, update.id);
            }
        }
        self.recalculate_budget(budget);
        Ok(BulkUpdated {
            data: self.parent_view(ParentRef::Budget(budget))?,
            children: Some(self.collect_views(&touched, &self.accounts)),
            budget: None,
        })
    }

    pub fn delete_accounts(
        &mut self,
        budget: EntityId,
        body: BulkDelete,
    ) -> ResultEngine<BulkDeleted> {
        self.ensure_parent(ParentRef::Budget(budget))?;
        for id in body.ids {
            self.remove_account(id);
        }
        self.recalculate_budget(budget);
        Ok(BulkDeleted {
            data: self.parent_view(ParentRef::Budget(budget))?,
        })
    }

    // ---- subaccounts ----

    pub fn list_subaccounts(
        &self,
        parent: ParentRef,
    ) -> ResultEngine<TableResponse<SubAccountView>> {
        self.ensure_parent(parent)?;
        Ok(TableResponse {
            data: self.collect_views(&self.table(parent), &self.subaccounts),
            groups: self.collect_table_groups(parent),
            markups: self.collect_table_markups(parent),
        })
    }

    pub fn create_subaccounts(
        &mut self,
        parent: ParentRef,
        body: BulkCreate<SubAccountWrite>,
    ) -> ResultEngine<BulkCreated<SubAccountView>> {
        self.ensure_parent(parent)?;
        if matches!(parent, ParentRef::Budget(_)) {
            return Err(EngineError::InvalidUpdate(
                "subaccounts cannot be attached directly to a budget".to_string(),
            ));
        }
        let writes = match body {
            BulkCreate::Count { count } => vec![SubAccountWrite::default(); count],
            BulkCreate::Data { data } => data,
        };
        let mut children = Vec::with_capacity(writes.len());
        for write in writes {
            let id = self.next_id();
            let view = SubAccountView {
                id,
                identifier: write.identifier,
                description: write.description,
                rate: write.rate,
                quantity: write.quantity,
                multiplier: write.multiplier,
                fringes: write.fringes,
                children: vec![],
                children_markups: vec![],
                nominal_value: 0.0,
                fringe_contribution: 0.0,
                accumulated_fringe_contribution: 0.0,
                accumulated_markup_contribution: 0.0,
                actual: 0.0,
            };
            self.subaccounts.insert(id, view);
            self.subaccount_owner.insert(id, parent);
            self.tables.entry(parent).or_default().push(id);
            if let Some(group) = write.group {
                self.attach_to_group(group, id);
            }
            children.push(id);
        }
        let budget = self.budget_of(parent)?;
        self.recalculate_budget(budget);
        Ok(BulkCreated {
            data: self.parent_view(parent)?,
            children: self.collect_views(&children, &self.subaccounts),
        })
    }

    pub fn update_subaccounts(
        &mut self,
        parent: ParentRef,
        body: BulkUpdate<SubAccountUpdate>,
    ) -> ResultEngine<BulkUpdated<SubAccountView>> {
        self.ensure_parent(parent)?;
        let mut touched = Vec::with_capacity(body.data.len());
        for update in body.data {
            let sub = self
                .subaccounts
                .get_mut(&update.id)
                .ok_or_else(|| EngineError::NotFound(format!("subaccount {}", update.id)))?;
            if !sub.children.is_empty()
                && (update.rate.is_some()
                    || update.quantity.is_some()
                    || update.multiplier.is_some())
            {
                return Err(EngineError::InvalidUpdate(format!(
                    "subaccount {} derives its value from children",
                    update.id
                )));
            }
            if let Some(identifier) = update.identifier {
                sub.identifier = Some(identifier);
            }
            if let Some(description) = update.description {
                sub.description = Some(description);
            }
            if let Some(rate) = update.rate {
                sub.rate = Some(rate);
            }
            if let Some(quantity) = update.quantity {
                sub.quantity = Some(quantity);
            }
            if let Some(multiplier) = update.multiplier {
                sub.multiplier = Some(multiplier);
            }
            if let Some(fringes) = update.fringes {
                sub.fringes = fringes;
            }
            touched.push(update.id);
        }
        let budget = self.budget_of(parent)?;
        self.recalculate_budget(budget);
        Ok(BulkUpdated {
            data: self.parent_view(parent)?,
            children: Some(self.collect_views(&touched, &self.subaccounts)),
            budget: self.budgets.get(&budget).cloned(),
        })
    }

    pub fn delete_subaccounts(
        &mut self,
        parent: ParentRef,
        body: BulkDelete,
    ) -> ResultEngine<BulkDeleted> {
        self.ensure_parent(parent)?;
        for id in body.ids {
            self.remove_subaccount(id);
        }
        let budget = self.budget_of(parent)?;
        self.recalculate_budget(budget);
        Ok(BulkDeleted {
            data: self.parent_view(parent)?,
        })
    }

    pub fn get_subaccounts(&self, ids: &[EntityId]) -> Vec<SubAccountView> {
        self.collect_views(ids, &self.subaccounts)
    }

    // ---- fringes ----

    pub fn list_fringes(&self, budget: EntityId) -> ResultEngine<Vec<FringeView>> {
        self.ensure_parent(ParentRef::Budget(budget))?;
        let order = self.budget_fringes.get(&budget).cloned().unwrap_or_default();
        Ok(self.collect_views(&order, &self.fringes))
    }

    pub fn create_fringes(
        &mut self,
        budget: EntityId,
        body: BulkCreate<FringeWrite>,
    ) -> ResultEngine<Vec<FringeView>> {
        self.ensure_parent(ParentRef::Budget(budget))?;
        let writes = match body {
            BulkCreate::Count { count } => vec![FringeWrite::default(); count],
            BulkCreate::Data { data } => data,
        };
        let mut created = Vec::with_capacity(writes.len());
        for write in writes {
            let id = self.next_id();
            let view = FringeView {
                id,
                name: write.name,
                unit: write.unit.unwrap_or(api_types::FringeUnit::Percent),
                rate: write.rate.unwrap_or(0.0),
                cutoff: write.cutoff,
                color: write.color,
                description: write.description,
            };
            self.fringes.insert(id, view.clone());
            self.budget_fringes.entry(budget).or_default().push(id);
            created.push(view);
        }
        self.recalculate_budget(budget);
        Ok(created)
    }

    pub fn update_fringes(
        &mut self,
        budget: EntityId,
        body: BulkUpdate<FringeUpdate>,
    ) -> ResultEngine<Vec<FringeView>> {
        self.ensure_parent(ParentRef::Budget(budget))?;
        for update in body.data {
            let fringe = self
                .fringes
                .get_mut(&update.id)
                .ok_or_else(|| EngineError::NotFound(format!("fringe {}", update.id)))?;
            if let Some(name) = update.name {
                fringe.name = Some(name);
            }
            if let Some(unit) = update.unit {
                fringe.unit = unit;
            }
            if let Some(rate) = update.rate {
                fringe.rate = rate;
            }
            if let Some(cutoff) = update.cutoff {
                fringe.cutoff = Some(cutoff);
            }
            if update.unset_cutoff {
                fringe.cutoff = None;
            }
            if let Some(color) = update.color {
                fringe.color = Some(color);
            }
            if let Some(description) = update.description {
                fringe.description = Some(description);
            }
        }
        self.recalculate_budget(budget);
        self.list_fringes(budget)
    }

    pub fn delete_fringes(&mut self, budget: EntityId, body: BulkDelete) -> ResultEngine<()> {
        self.ensure_parent(ParentRef::Budget(budget))?;
        for id in &body.ids {
            self.fringes.remove(id);
            if let Some(order) = self.budget_fringes.get_mut(&budget) {
                order.retain(|held| held != id);
            }
            // Drop dangling references from every line in the budget.
            for sub in self.subaccounts.values_mut() {
                sub.fringes.retain(|held| held != id);
            }
        }
        self.recalculate_budget(budget);
        Ok(())
    }

    // ---- groups ----

    pub fn create_group(
        &mut self,
        parent: ParentRef,
        body: GroupWrite,
    ) -> ResultEngine<GroupView> {
        self.ensure_parent(parent)?;
        let table = self.table(parent);
        for child in &body.children {
            if !table.contains(child) {
                return Err(EngineError::DanglingChild(format!(
                    "row {child} is not in table {}",
                    parent.path_prefix()
                )));
            }
        }
        let id = self.next_id();
        let view = GroupView {
            id,
            name: body.name,
            color: body.color,
            children: body.children,
        };
        self.groups.insert(id, view.clone());
        self.group_owner.insert(id, parent);
        self.table_groups.entry(parent).or_default().push(id);
        Ok(view)
    }

    pub fn update_group(&mut self, id: EntityId, body: GroupUpdate) -> ResultEngine<GroupView> {
        let parent = *self
            .group_owner
            .get(&id)
            .ok_or_else(|| EngineError::NotFound(format!("group {id}")))?;
        if let Some(children) = &body.children {
            let table = self.table(parent);
            for child in children {
                if !table.contains(child) {
                    return Err(EngineError::DanglingChild(format!(
                        "row {child} is not in table {}",
                        parent.path_prefix()
                    )));
                }
            }
        }
        let group = self
            .groups
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("group {id}")))?;
        if let Some(name) = body.name {
            group.name = name;
        }
        if let Some(color) = body.color {
            group.color = Some(color);
        }
        if let Some(children) = body.children {
            group.children = children;
        }
        Ok(group.clone())
    }

    pub fn delete_group(&mut self, id: EntityId) -> ResultEngine<()> {
        let parent = self
            .group_owner
            .remove(&id)
            .ok_or_else(|| EngineError::NotFound(format!("group {id}")))?;
        self.groups.remove(&id);
        if let Some(order) = self.table_groups.get_mut(&parent) {
            order.retain(|held| *held != id);
        }
        Ok(())
    }

    // ---- markups ----

    pub fn create_markup(
        &mut self,
        parent: ParentRef,
        body: MarkupWrite,
    ) -> ResultEngine<(ParentView, MarkupView)> {
        self.ensure_parent(parent)?;
        let table = self.table(parent);
        for child in &body.children {
            if !table.contains(child) {
                return Err(EngineError::DanglingChild(format!(
                    "row {child} is not in table {}",
                    parent.path_prefix()
                )));
            }
        }
        let id = self.next_id();
        let view = MarkupView {
            id,
            identifier: body.identifier,
            description: body.description,
            unit: body.unit,
            rate: body.rate,
            children: body.children,
            actual: 0.0,
        };
        self.markups.insert(id, view.clone());
        self.markup_owner.insert(id, parent);
        self.table_markups.entry(parent).or_default().push(id);
        let budget = self.budget_of(parent)?;
        self.recalculate_budget(budget);
        Ok((self.parent_view(parent)?, view))
    }

    pub fn update_markup(
        &mut self,
        id: EntityId,
        body: MarkupUpdate,
    ) -> ResultEngine<(ParentView, MarkupView)> {
        let parent = *self
            .markup_owner
            .get(&id)
            .ok_or_else(|| EngineError::NotFound(format!("markup {id}")))?;
        if let Some(children) = &body.children {
            let table = self.table(parent);
            for child in children {
                if !table.contains(child) {
                    return Err(EngineError::DanglingChild(format!(
                        "row {child} is not in table {}",
                        parent.path_prefix()
                    )));
                }
            }
        }
        {
            let markup = self
                .markups
                .get_mut(&id)
                .ok_or_else(|| EngineError::NotFound(format!("markup {id}")))?;
            if let Some(identifier) = body.identifier {
                markup.identifier = Some(identifier);
            }
            if let Some(description) = body.description {
                markup.description = Some(description);
            }
            if let Some(unit) = body.unit {
                markup.unit = unit;
            }
            if let Some(rate) = body.rate {
                markup.rate = rate;
            }
            if let Some(children) = body.children {
                markup.children = children;
            }
        }
        let budget = self.budget_of(parent)?;
        self.recalculate_budget(budget);
        let markup = self
            .markups
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("markup {id}")))?;
        Ok((self.parent_view(parent)?, markup))
    }

    pub fn delete_markup(&mut self, id: EntityId) -> ResultEngine<BulkDeleted> {
        let parent = self
            .markup_owner
            .remove(&id)
            .ok_or_else(|| EngineError::NotFound(format!("markup {id}")))?;
        self.markups.remove(&id);
        if let Some(order) = self.table_markups.get_mut(&parent) {
            order.retain(|held| *held != id);
        }
        let budget = self.budget_of(parent)?;
        self.recalculate_budget(budget);
        Ok(BulkDeleted {
            data: self.parent_view(parent)?,
        })
    }

    // ---- internals ----

    fn collect_views<T: Clone>(&self, ids: &[EntityId], from: &HashMap<EntityId, T>) -> Vec<T> {
        ids.iter().filter_map(|id| from.get(id).cloned()).collect()
    }

    fn collect_table_groups(&self, parent: ParentRef) -> Vec<GroupView> {
        let order = self.table_groups.get(&parent).cloned().unwrap_or_default();
        self.collect_views(&order, &self.groups)
    }

    fn collect_table_markups(&self, parent: ParentRef) -> Vec<MarkupView> {
        let order = self.table_markups.get(&parent).cloned().unwrap_or_default();
        self.collect_views(&order, &self.markups)
    }

    fn attach_to_group(&mut self, group: EntityId, row: EntityId) {
        match self.groups.get_mut(&group) {
            Some(view) => {
                if !view.children.contains(&row) {
                    view.children.push(row);
                }
            }
            None => tracing::warn!(group, row, "write references an unknown group"),
        }
    }

    fn remove_account(&mut self, id: EntityId) {
        let Some(budget) = self.account_owner.remove(&id) else {
            return;
        };
        self.accounts.remove(&id);
        if let Some(order) = self.tables.get_mut(&ParentRef::Budget(budget)) {
            order.retain(|held| *held != id);
        }
        self.strip_row_references(id);
        for sub in self.table(ParentRef::Account(id)) {
            self.remove_subaccount(sub);
        }
        self.drop_table(ParentRef::Account(id));
    }

    fn remove_subaccount(&mut self, id: EntityId) {
        let Some(parent) = self.subaccount_owner.remove(&id) else {
            return;
        };
        self.subaccounts.remove(&id);
        if let Some(order) = self.tables.get_mut(&parent) {
            order.retain(|held| *held != id);
        }
        self.strip_row_references(id);
        for child in self.table(ParentRef::Subaccount(id)) {
            self.remove_subaccount(child);
        }
        self.drop_table(ParentRef::Subaccount(id));
    }

    fn drop_table(&mut self, parent: ParentRef) {
        self.tables.remove(&parent);
        for group in self.table_groups.remove(&parent).unwrap_or_default() {
            self.groups.remove(&group);
            self.group_owner.remove(&group);
        }
        for markup in self.table_markups.remove(&parent).unwrap_or_default() {
            self.markups.remove(&markup);
            self.markup_owner.remove(&markup);
        }
    }

    fn strip_row_references(&mut self, id: EntityId) {
        for group in self.groups.values_mut() {
            group.children.retain(|held| *held != id);
        }
        for markup in self.markups.values_mut() {
            markup.children.retain(|held| *held != id);
        }
    }

    fn budget_fringe_records(&self, budget: EntityId) -> Vec<Fringe> {
        self.budget_fringes
            .get(&budget)
            .map(|order| {
                order
                    .iter()
                    .filter_map(|id| self.fringes.get(id))
                    .cloned()
                    .map(Fringe::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Recomputes every denormalized total under a budget, leaves first.
    fn recalculate_budget(&mut self, budget: EntityId) {
        let fringes = self.budget_fringe_records(budget);
        let parent = ParentRef::Budget(budget);
        let account_ids = self.table(parent);

        for account in &account_ids {
            self.recalculate_subaccount_table(ParentRef::Account(*account), &fringes);
            self.recalculate_account(*account, &fringes);
        }

        let markup_total = self.table_markup_total(parent);
        let markup_actual = self.table_markup_actual(parent);
        let mut nominal = 0.0;
        let mut acc_fringe = 0.0;
        let mut acc_markup = markup_total;
        let mut actual = markup_actual;
        for account in &account_ids {
            if let Some(view) = self.accounts.get(account) {
                nominal += view.nominal_value;
                acc_fringe += view.accumulated_fringe_contribution;
                acc_markup += view.accumulated_markup_contribution;
                actual += view.actual;
            }
        }
        if let Some(view) = self.budgets.get_mut(&budget) {
            view.nominal_value = nominal;
            view.accumulated_fringe_contribution = acc_fringe;
            view.accumulated_markup_contribution = acc_markup;
            view.actual = actual;
            view.updated_at = Utc::now();
        }
    }

    fn recalculate_account(&mut self, account: EntityId, _fringes: &[Fringe]) {
        let parent = ParentRef::Account(account);
        let child_ids = self.table(parent);
        let markup_total = self.table_markup_total(parent);
        let markup_actual = self.table_markup_actual(parent);

        let mut nominal = 0.0;
        let mut acc_fringe = 0.0;
        let mut acc_markup = markup_total;
        let mut actual = markup_actual;
        for child in &child_ids {
            if let Some(view) = self.subaccounts.get(child) {
                nominal += view.nominal_value;
                acc_fringe +=
                    view.accumulated_fringe_contribution + view.fringe_contribution;
                acc_markup += view.accumulated_markup_contribution;
                actual += view.actual;
            }
        }
        if let Some(view) = self.accounts.get_mut(&account) {
            view.children = child_ids;
            view.nominal_value = nominal;
            view.accumulated_fringe_contribution = acc_fringe;
            view.accumulated_markup_contribution = acc_markup;
            view.actual = actual;
        }
    }

    /// Post-order recalculation of every subaccount reachable under
    /// `parent`'s table.
    fn recalculate_subaccount_table(&mut self, parent: ParentRef, fringes: &[Fringe]) {
        for id in self.table(parent) {
            self.recalculate_subaccount_table(ParentRef::Subaccount(id), fringes);
            self.recalculate_subaccount(id, fringes);
        }
    }

    fn recalculate_subaccount(&mut self, id: EntityId, fringes: &[Fringe]) {
        let own_table = ParentRef::Subaccount(id);
        let child_ids = self.table(own_table);
        let markup_total = self.table_markup_total(own_table);
        let markup_actual = self.table_markup_actual(own_table);
        let children_markups = self.collect_table_markups(own_table);

        let (nominal, fringe_contribution, acc_fringe, acc_markup, actual) = {
            let Some(view) = self.subaccounts.get(&id) else {
                return;
            };
            if child_ids.is_empty() {
                let nominal = match view.rate {
                    Some(rate) => {
                        rate * view.quantity.unwrap_or(1.0) * view.multiplier.unwrap_or(1.0)
                    }
                    None => view.nominal_value,
                };
                let fringe_contribution = view
                    .fringes
                    .iter()
                    .filter_map(|fid| fringes.iter().find(|f| f.id == *fid))
                    .map(|fringe| fringe.contribution(nominal))
                    .sum();
                (nominal, fringe_contribution, 0.0, 0.0, view.actual)
            } else {
                let mut nominal = 0.0;
                let mut acc_fringe = 0.0;
                let mut acc_markup = markup_total;
                let mut actual = markup_actual;
                for child in &child_ids {
                    if let Some(child_view) = self.subaccounts.get(child) {
                        nominal += child_view.nominal_value;
                        acc_fringe += child_view.accumulated_fringe_contribution
                            + child_view.fringe_contribution;
                        acc_markup += child_view.accumulated_markup_contribution;
                        actual += child_view.actual;
                    }
                }
                (nominal, 0.0, acc_fringe, acc_markup, actual)
            }
        };

        if let Some(view) = self.subaccounts.get_mut(&id) {
            view.children = child_ids;
            view.children_markups = children_markups;
            view.nominal_value = nominal;
            view.fringe_contribution = fringe_contribution;
            view.accumulated_fringe_contribution = acc_fringe;
            view.accumulated_markup_contribution = acc_markup;
            view.actual = actual;
        }
    }

    /// Total surcharge of the markups scoped to one table: flat markups
    /// count once, percent markups apply per covered child's estimated
    /// value.
    fn table_markup_total(&self, parent: ParentRef) -> f64 {
        let markups = self.collect_table_markups(parent);
        let mut total = 0.0;
        for markup in markups {
            match markup.unit {
                api_types::MarkupUnit::Flat => total += markup.rate,
                api_types::MarkupUnit::Percent => {
                    for child in &markup.children {
                        total += markup.rate * self.estimated_of_row(parent, *child);
                    }
                }
            }
        }
        total
    }

    fn table_markup_actual(&self, parent: ParentRef) -> f64 {
        self.collect_table_markups(parent)
            .iter()
            .map(|markup| markup.actual)
            .sum()
    }

    fn estimated_of_row(&self, parent: ParentRef, id: EntityId) -> f64 {
        match parent {
            ParentRef::Budget(_) => self
                .accounts
                .get(&id)
                .map(|view| {
                    view.nominal_value
                        + view.accumulated_markup_contribution
                        + view.accumulated_fringe_contribution
                })
                .unwrap_or(0.0),
            ParentRef::Account(_) | ParentRef::Subaccount(_) => self
                .subaccounts
                .get(&id)
                .map(|view| {
                    view.nominal_value
                        + view.accumulated_markup_contribution
                        + view.accumulated_fringe_contribution
                        + view.fringe_contribution
                })
                .unwrap_or(0.0),
        }
    }
}
