use std::collections::HashMap;

use tracing::debug;

use crate::error::{PennywiseError, Result};
use crate::events::{BudgetEvent, EventKind};
use crate::models::Budget;

/// Which cached budgets an event may have made stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    None,
    Budget(String),
    All,
}

impl Invalidation {
    pub fn affects(&self, budget_id: &str) -> bool {
        match self {
            Invalidation::None => false,
            Invalidation::Budget(id) => id == budget_id,
            Invalidation::All => true,
        }
    }
}

/// Fetched budget documents keyed by (id, version).
///
/// A lookup only hits when the stored version matches the one the caller
/// currently sees, so a stale copy is never served even if an event was lost.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: HashMap<String, Budget>,
    hits: u64,
    misses: u64,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str, version: &str) -> Option<&Budget> {
        self.entries.get(id).filter(|b| b.version == version)
    }

    pub fn insert(&mut self, budget: Budget) {
        self.entries.insert(budget.id.clone(), budget);
    }

    /// Cached copy of `id` at `version`, or whatever `load` returns.
    pub fn fetch<F>(&mut self, id: &str, version: &str, load: F) -> Result<&Budget>
    where
        F: FnOnce() -> Result<Budget>,
    {
        if self.get(id, version).is_some() {
            self.hits += 1;
            debug!(budget = %id, version = %version, "cache hit");
        } else {
            self.misses += 1;
            debug!(budget = %id, version = %version, "cache miss");
            let budget = load()?;
            self.entries.insert(id.to_string(), budget);
        }
        self.entries
            .get(id)
            .ok_or_else(|| PennywiseError::UnknownBudget(id.to_string()))
    }

    pub fn invalidate(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Re-check `id` against the version the store reports now. `None` means
    /// the budget is gone and its entry is dropped; otherwise the cached copy
    /// is served when its version still matches and replaced when it does not.
    pub fn revalidate<F>(&mut self, id: &str, current: Option<&str>, load: F) -> Result<Option<&Budget>>
    where
        F: FnOnce() -> Result<Budget>,
    {
        match current {
            Some(version) => self.fetch(id, version, load).map(Some),
            None => {
                if self.invalidate(id) {
                    debug!(budget = %id, "evicted deleted budget");
                }
                Ok(None)
            }
        }
    }

    /// Scope of a push event. Entries are only dropped outright for a
    /// deleted budget; anything else is left for [`Self::revalidate`], since
    /// the version key already keeps stale copies from being served.
    pub fn apply(&mut self, event: &BudgetEvent) -> Invalidation {
        match (&event.budget_id, event.kind) {
            (Some(id), EventKind::BudgetDeleted) => {
                self.invalidate(id);
                Invalidation::Budget(id.clone())
            }
            (Some(id), _) => Invalidation::Budget(id.clone()),
            (None, EventKind::HouseholdUpdated) => Invalidation::None,
            (None, _) => Invalidation::All,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
