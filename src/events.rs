//! Push events from the live-update channel.
//!
//! One event per line, either as JSON
//! (`{"event": "budget:updated", "data": {"budgetId": "..."}}`) or as plain
//! text (`budget:updated <budget-id>`). Delivery may repeat or arrive out of
//! order; consumers only ever use an event to decide what to refetch.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    BudgetUpdated,
    BudgetDeleted,
    CategoryUpdated,
    PaymentCreated,
    PaymentUpdated,
    PaymentDeleted,
    TransactionCreated,
    HouseholdUpdated,
}

impl EventKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if matches!(c, ':' | '_' | '.' | ' ' | '-') { ':' } else { c })
            .collect();
        match normalized.as_str() {
            "budget:updated" | "budget:created" => Some(EventKind::BudgetUpdated),
            "budget:deleted" => Some(EventKind::BudgetDeleted),
            "category:updated" | "category:created" | "category:deleted" => {
                Some(EventKind::CategoryUpdated)
            }
            "payment:created" => Some(EventKind::PaymentCreated),
            "payment:updated" | "payment:paid" => Some(EventKind::PaymentUpdated),
            "payment:deleted" => Some(EventKind::PaymentDeleted),
            "transaction:created" => Some(EventKind::TransactionCreated),
            "household:updated" => Some(EventKind::HouseholdUpdated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetEvent {
    pub kind: EventKind,
    /// The budget the event concerns. `None` means any budget may be stale.
    pub budget_id: Option<String>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(alias = "type", alias = "name")]
    event: String,
    #[serde(default)]
    data: Value,
}

fn budget_id_from(data: &Value) -> Option<String> {
    for key in ["budgetId", "budget_id", "weeklyBudgetId"] {
        if let Some(Value::String(id)) = data.get(key) {
            return Some(id.clone());
        }
    }
    // budget:* payloads may carry the budget itself
    match data.get("budget") {
        Some(Value::Object(budget)) => ["_id", "id"]
            .iter()
            .find_map(|k| budget.get(*k).and_then(Value::as_str).map(str::to_string)),
        Some(Value::String(id)) => Some(id.clone()),
        _ => None,
    }
}

/// Parse one line from the channel. Blank lines, malformed lines and unknown
/// event names yield `None`.
pub fn parse_event(line: &str) -> Option<BudgetEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (name, budget_id) = if line.starts_with('{') {
        match serde_json::from_str::<RawEvent>(line) {
            Ok(raw) => {
                let id = budget_id_from(&raw.data);
                (raw.event, id)
            }
            Err(e) => {
                debug!(error = %e, "ignoring malformed event line");
                return None;
            }
        }
    } else {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_string();
        (name, parts.next().map(str::to_string))
    };

    match EventKind::from_name(&name) {
        Some(kind) => Some(BudgetEvent { kind, budget_id }),
        None => {
            debug!(event = %name, "ignoring unknown event");
            None
        }
    }
}
