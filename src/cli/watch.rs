use std::io::BufRead;

use tracing::{debug, info};

use crate::cache::DocumentCache;
use crate::db::{budget_version, load_budget};
use crate::error::Result;
use crate::events::{parse_event, EventKind};

use super::summary::print_budget;
use super::{open_store, resolve_budget, today};

/// Fetch, aggregate and render the budget, then do it again for every push
/// event that touches it. Events are read one per line from stdin until EOF.
pub fn run(selector: Option<&str>) -> Result<()> {
    let conn = open_store()?;
    let initial = resolve_budget(&conn, selector)?;
    let id = initial.id.clone();
    let mut rendered_version = initial.version.clone();

    let mut cache = DocumentCache::new();
    print_budget(&initial, today());
    cache.insert(initial);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let Some(event) = parse_event(&line) else {
            continue;
        };
        let scope = cache.apply(&event);
        if !scope.affects(&id) {
            debug!(?event, "event does not touch the watched budget");
            continue;
        }
        if event.kind == EventKind::BudgetDeleted && event.budget_id.as_deref() == Some(id.as_str()) {
            println!("\nBudget {id} was deleted.");
            break;
        }

        let current = budget_version(&conn, &id)?;
        let Some(budget) = cache.revalidate(&id, current.as_deref(), || load_budget(&conn, &id))? else {
            println!("\nBudget {id} no longer exists.");
            break;
        };
        if budget.version == rendered_version {
            debug!(budget = %id, "unchanged after event");
            continue;
        }
        info!(budget = %id, version = %budget.version, "re-rendering after event");
        rendered_version = budget.version.clone();
        println!();
        print_budget(budget, today());
    }

    debug!(
        hits = cache.hits(),
        misses = cache.misses(),
        cached = cache.len(),
        "watch finished"
    );
    Ok(())
}
