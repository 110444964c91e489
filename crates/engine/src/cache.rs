//! The cross-table cache and the lazy invalidation pass that runs after a
//! fringe edit.
//!
//! Tables are cached under stringly keys ("account:12", "subaccount:4") so
//! remounting a table the user already visited skips the refetch. Fringes
//! are budget-scoped while tables are parent-scoped, so one fringe edit can
//! stale any number of cached tables; only the active one is refreshed
//! eagerly, the rest are flagged and refetch on their next mount.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::Mutex;

use api_types::{
    EntityId, ParentRef,
    bulk::BulkUpdate,
    fringe::FringeUpdate,
};

use crate::api::BudgetApi;
use crate::error::EngineError;
use crate::fringes::Fringe;
use crate::rows::TableRecord;
use crate::store::{DetailStore, TableStore};
use crate::subaccounts::SubAccount;

/// Which kind of parent a cached subaccount table hangs off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreDomain {
    Account,
    SubAccount,
}

/// Parsed identity of a cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub domain: StoreDomain,
    pub parent: EntityId,
}

impl StoreKey {
    pub fn account(parent: EntityId) -> Self {
        Self {
            domain: StoreDomain::Account,
            parent,
        }
    }

    pub fn subaccount(parent: EntityId) -> Self {
        Self {
            domain: StoreDomain::SubAccount,
            parent,
        }
    }

    pub fn parent_ref(self) -> ParentRef {
        match self.domain {
            StoreDomain::Account => ParentRef::Account(self.parent),
            StoreDomain::SubAccount => ParentRef::Subaccount(self.parent),
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.domain {
            StoreDomain::Account => write!(f, "account:{}", self.parent),
            StoreDomain::SubAccount => write!(f, "subaccount:{}", self.parent),
        }
    }
}

impl FromStr for StoreKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain, id) = s
            .split_once(':')
            .ok_or_else(|| EngineError::InvalidCacheKey(s.to_string()))?;
        let parent: EntityId = id
            .parse()
            .map_err(|_| EngineError::InvalidCacheKey(s.to_string()))?;
        match domain {
            "account" => Ok(Self::account(parent)),
            "subaccount" => Ok(Self::subaccount(parent)),
            _ => Err(EngineError::InvalidCacheKey(s.to_string())),
        }
    }
}

/// One cached table plus its parent detail.
#[derive(Clone)]
pub struct CacheEntry {
    pub table: Arc<Mutex<TableStore<SubAccount>>>,
    pub detail: Arc<Mutex<DetailStore>>,
}

impl CacheEntry {
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(TableStore::new())),
            detail: Arc::new(Mutex::new(DetailStore::default())),
        }
    }
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// All cached subaccount tables, keyed by their serialized [`StoreKey`].
///
/// Keys are stored as strings because that is how they arrive from the
/// outer layer; entries whose keys fail to parse are skipped (and logged)
/// during invalidation scans rather than poisoning the pass.
#[derive(Default)]
pub struct StateContainer {
    entries: HashMap<String, CacheEntry>,
}

impl StateContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: StoreKey, entry: CacheEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    /// Inserts under an arbitrary string key. Normal callers go through
    /// [`Self::insert`]; this exists because the outer layer's keyspace is
    /// not under the engine's control.
    pub fn insert_raw(&mut self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &StoreKey) -> Option<&CacheEntry> {
        self.entries.get(&key.to_string())
    }

    pub fn remove(&mut self, key: &StoreKey) -> Option<CacheEntry> {
        self.entries.remove(&key.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }
}

/// Reconciles every cached table with an edit to the budget's fringes.
///
/// Purely cosmetic edits are a no-op. Otherwise the active table's affected
/// rows are refetched eagerly together with its parent totals; every other
/// cached table that references a changed fringe is only flagged
/// `invalidated` and will refetch lazily on its next mount. The scan is a
/// linear walk over the cache; entry counts are small (tables the user has
/// actually opened).
pub async fn reconcile_fringe_change(
    api: &dyn BudgetApi,
    container: &StateContainer,
    active: Option<StoreKey>,
    before: &[Fringe],
    after: &[Fringe],
) -> Result<(), EngineError> {
    let previous: HashMap<EntityId, &Fringe> = before.iter().map(|f| (f.id, f)).collect();
    let changed: HashSet<EntityId> = after
        .iter()
        .filter(|fringe| match previous.get(&fringe.id) {
            Some(old) => Fringe::quantitative_change(old, fringe),
            // Unknown before-state: treat as changed.
            None => true,
        })
        .map(|fringe| fringe.id)
        .collect();
    if changed.is_empty() {
        return Ok(());
    }

    let active_key = active.map(|key| key.to_string());

    for (raw_key, entry) in container.iter() {
        let references_changed = {
            let table = entry.table.lock().await;
            table.rows().iter().any(|row| {
                row.record()
                    .is_some_and(|record| record.fringes().iter().any(|id| changed.contains(id)))
            })
        };
        if !references_changed {
            continue;
        }

        if Some(raw_key) == active_key.as_ref() {
            continue;
        }

        match StoreKey::from_str(raw_key) {
            Ok(_) => {
                let mut table = entry.table.lock().await;
                table.invalidated = true;
                drop(table);
                let mut detail = entry.detail.lock().await;
                detail.invalidated = true;
            }
            Err(err) => {
                tracing::warn!(key = raw_key, error = %err, "skipping unparseable cache key");
            }
        }
    }

    // The table the user is looking at gets fresh data now, not a flag.
    if let Some(key) = active {
        if let Some(entry) = container.get(&key) {
            let affected: Vec<EntityId> = {
                let table = entry.table.lock().await;
                table
                    .rows()
                    .iter()
                    .filter_map(|row| {
                        let record = row.as_model()?;
                        record
                            .fringes()
                            .iter()
                            .any(|id| changed.contains(id))
                            .then(|| record.id())
                    })
                    .collect()
            };
            if !affected.is_empty() {
                let refreshed = api.get_subaccounts(affected).await?;
                {
                    let mut table = entry.table.lock().await;
                    for view in refreshed {
                        table.sync_model(SubAccount::from_view(view));
                    }
                }
                let parent = api.get_parent(key.parent_ref(), true).await?;
                let mut detail = entry.detail.lock().await;
                detail.view = Some(parent);
            }
        }
    }

    Ok(())
}

/// Owns the budget's fringe list and runs the invalidation pass after each
/// edit.
pub struct FringeCoordinator {
    api: Arc<dyn BudgetApi>,
    budget: EntityId,
    fringes: Arc<Mutex<Vec<Fringe>>>,
}

impl FringeCoordinator {
    pub fn new(api: Arc<dyn BudgetApi>, budget: EntityId) -> Self {
        Self {
            api,
            budget,
            fringes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fringes(&self) -> Arc<Mutex<Vec<Fringe>>> {
        Arc::clone(&self.fringes)
    }

    pub async fn load(&self) -> Result<(), EngineError> {
        let views = self.api.list_fringes(self.budget).await?;
        let mut fringes = self.fringes.lock().await;
        *fringes = views.into_iter().map(Fringe::from).collect();
        Ok(())
    }

    /// Applies a bulk fringe update and reconciles every cached table with
    /// the result.
    pub async fn update(
        &self,
        container: &StateContainer,
        active: Option<StoreKey>,
        body: BulkUpdate<FringeUpdate>,
    ) -> Result<(), EngineError> {
        let before = {
            let fringes = self.fringes.lock().await;
            fringes.clone()
        };
        let views = self.api.update_fringes(self.budget, body).await?;
        let after: Vec<Fringe> = views.into_iter().map(Fringe::from).collect();

        reconcile_fringe_change(self.api.as_ref(), container, active, &before, &after).await?;

        let mut fringes = self.fringes.lock().await;
        *fringes = after;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_display() {
        let key = StoreKey::account(12);
        assert_eq!(key.to_string(), "account:12");
        assert_eq!("account:12".parse::<StoreKey>().unwrap(), key);
        assert_eq!(
            "subaccount:4".parse::<StoreKey>().unwrap(),
            StoreKey::subaccount(4)
        );
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!("account".parse::<StoreKey>().is_err());
        assert!("budget:1".parse::<StoreKey>().is_err());
        assert!("account:x".parse::<StoreKey>().is_err());
    }

    #[test]
    fn key_parent_refs_carry_the_domain() {
        assert_eq!(StoreKey::account(7).parent_ref(), ParentRef::Account(7));
        assert_eq!(
            StoreKey::subaccount(7).parent_ref(),
            ParentRef::Subaccount(7)
        );
    }
}
