//! Ingestion of budget documents as the server sends them.
//!
//! The server is loose about shapes: a category reference may be a plain id
//! or an embedded category object, ids live under `_id` or `id`, and flags
//! come in camelCase or snake_case. Everything is normalized here, once, into
//! the canonical [`Budget`]; nothing downstream looks at raw JSON.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{PennywiseError, Result};
use crate::models::{Budget, CategoryAllocation, Payment, PaymentStatus};

pub fn parse_budget(json: &str) -> Result<Budget> {
    let value: Value = serde_json::from_str(json)?;
    parse_budget_value(value)
}

pub fn parse_budget_value(value: Value) -> Result<Budget> {
    let root = value
        .as_object()
        .ok_or_else(|| PennywiseError::malformed("$", "expected a JSON object"))?;

    let id = required_id(root, "$")?;
    let week_start = required_date(root, "weekStartDate", "$")?;
    let week_end = required_date(root, "weekEndDate", "$")?;
    if week_end < week_start {
        return Err(PennywiseError::malformed(
            "weekEndDate",
            format!("{week_end} is before weekStartDate {week_start}"),
        ));
    }

    let total_budget = match root.get("totalBudget") {
        Some(v) if !v.is_null() => amount(v, "totalBudget")?,
        _ => return Err(PennywiseError::malformed("totalBudget", "missing")),
    };

    let raw_categories = match root.get("categories") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(PennywiseError::malformed("categories", "expected an array")),
        None => return Err(PennywiseError::malformed("categories", "missing")),
    };

    let mut categories = Vec::with_capacity(raw_categories.len());
    let mut seen_categories = HashSet::new();
    let mut seen_payments = HashSet::new();
    for (i, raw) in raw_categories.iter().enumerate() {
        let path = format!("categories[{i}]");
        let category = parse_category(raw, &path, &mut seen_payments)?;
        if !seen_categories.insert(category.category_id.clone()) {
            return Err(PennywiseError::malformed(
                format!("{path}.categoryId"),
                format!("duplicate category '{}'", category.category_id),
            ));
        }
        categories.push(category);
    }

    let household_id = optional_string(root, "householdId", "$")?;
    let is_shared_with_household = optional_bool(root, &["isSharedWithHousehold", "is_shared_with_household"], "$")?;

    let mut budget = Budget {
        id,
        week_start,
        week_end,
        total_budget,
        categories,
        is_shared_with_household,
        household_id,
        version: String::new(),
    };
    budget.version = match optional_string(root, "updatedAt", "$")? {
        Some(stamp) if !stamp.is_empty() => stamp,
        _ => content_version(&budget)?,
    };
    Ok(budget)
}

fn parse_category(
    raw: &Value,
    path: &str,
    seen_payments: &mut HashSet<String>,
) -> Result<CategoryAllocation> {
    let obj = raw
        .as_object()
        .ok_or_else(|| PennywiseError::malformed(path, "expected an object"))?;

    let sibling_name = match optional_string(obj, "displayName", path)? {
        Some(name) => Some(name),
        None => optional_string(obj, "name", path)?,
    };
    let mut color = optional_string(obj, "color", path)?;
    let mut icon = optional_string(obj, "icon", path)?;

    let ref_path = format!("{path}.categoryId");
    let (category_id, embedded_name) = match obj.get("categoryId") {
        Some(Value::String(id)) if !id.is_empty() => (id.clone(), None),
        Some(Value::Object(embedded)) => {
            let id = required_id(embedded, &ref_path)?;
            if color.is_none() {
                color = optional_string(embedded, "color", &ref_path)?;
            }
            if icon.is_none() {
                icon = optional_string(embedded, "icon", &ref_path)?;
            }
            (id, optional_string(embedded, "name", &ref_path)?)
        }
        Some(_) => {
            return Err(PennywiseError::malformed(
                ref_path,
                "expected a category id or category object",
            ))
        }
        None => return Err(PennywiseError::malformed(ref_path, "missing")),
    };

    let allocated_amount = match obj.get("allocatedAmount") {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(v) => amount(v, &format!("{path}.allocatedAmount"))?,
    };

    let payments = match obj.get("payments") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut payments = Vec::with_capacity(items.len());
            for (j, item) in items.iter().enumerate() {
                let ppath = format!("{path}.payments[{j}]");
                let payment = parse_payment(item, &ppath)?;
                if !seen_payments.insert(payment.id.clone()) {
                    return Err(PennywiseError::malformed(
                        format!("{ppath}.id"),
                        format!("duplicate payment '{}'", payment.id),
                    ));
                }
                payments.push(payment);
            }
            payments
        }
        Some(_) => {
            return Err(PennywiseError::malformed(
                format!("{path}.payments"),
                "expected an array",
            ))
        }
    };

    let display_name = embedded_name
        .or(sibling_name)
        .unwrap_or_else(|| category_id.clone());

    Ok(CategoryAllocation {
        category_id,
        display_name,
        color,
        icon,
        allocated_amount,
        payments,
    })
}

fn parse_payment(raw: &Value, path: &str) -> Result<Payment> {
    let obj = raw
        .as_object()
        .ok_or_else(|| PennywiseError::malformed(path, "expected an object"))?;

    let id = required_id(obj, path)?;
    let name = optional_string(obj, "name", path)?.unwrap_or_default();
    let amount = match obj.get("amount") {
        Some(v) if !v.is_null() => amount(v, &format!("{path}.amount"))?,
        _ => return Err(PennywiseError::malformed(format!("{path}.amount"), "missing")),
    };
    let scheduled_date = required_date(obj, "scheduledDate", path)?;
    let status = match optional_string(obj, "status", path)? {
        None => PaymentStatus::Pending,
        Some(s) => s
            .parse()
            .map_err(|e: String| PennywiseError::malformed(format!("{path}.status"), e))?,
    };
    let is_recurring = optional_bool(obj, &["isRecurring", "is_recurring"], path)?;
    let notes = optional_string(obj, "notes", path)?.filter(|n| !n.is_empty());

    Ok(Payment {
        id,
        name,
        amount,
        scheduled_date,
        status,
        is_recurring,
        notes,
    })
}

/// Canonical pretty JSON, re-ingestible by [`parse_budget`].
pub fn to_json(budget: &Budget) -> Result<String> {
    Ok(serde_json::to_string_pretty(budget)?)
}

/// Hex SHA-256 of the canonical document with its version blanked.
pub fn content_version(budget: &Budget) -> Result<String> {
    let mut unversioned = budget.clone();
    unversioned.version.clear();
    let bytes = serde_json::to_vec(&unversioned)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Largest accepted money amount. Anything above is rejected so that sums and
/// percentages over a whole budget stay inside `Decimal` range.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Parse a user- or server-supplied money amount into two-decimal fixed point.
/// Amounts are capped at [`MAX_AMOUNT`], so the result always carries exactly
/// two decimal places.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let trimmed = text.trim().trim_start_matches('$').replace(',', "");
    let value = Decimal::from_str(&trimmed)
        .or_else(|_| Decimal::from_scientific(&trimmed))
        .map_err(|_| PennywiseError::InvalidAmount(format!("'{text}' is not a number")))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(PennywiseError::InvalidAmount(format!("'{text}' is negative")));
    }
    if value > Decimal::from(MAX_AMOUNT) {
        return Err(PennywiseError::InvalidAmount(format!(
            "'{text}' is above the limit of {MAX_AMOUNT}"
        )));
    }
    let mut cents = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    Ok(cents)
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc().date()))
}

fn amount(value: &Value, path: &str) -> Result<Decimal> {
    let text = match value {
        // serde_json renders floats in shortest round-trip form, so 0.1 stays "0.1"
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(PennywiseError::malformed(
                path,
                format!("expected a number, got {}", kind(other)),
            ))
        }
    };
    parse_amount(&text).map_err(|e| match e {
        PennywiseError::InvalidAmount(reason) => PennywiseError::malformed(path, reason),
        other => other,
    })
}

fn required_id(obj: &Map<String, Value>, path: &str) -> Result<String> {
    for key in ["_id", "id"] {
        match obj.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Ok(s.clone()),
            Some(Value::Number(n)) => return Ok(n.to_string()),
            _ => {}
        }
    }
    Err(PennywiseError::malformed(path, "missing id"))
}

fn required_date(obj: &Map<String, Value>, key: &str, path: &str) -> Result<NaiveDate> {
    let field = field_path(path, key);
    match obj.get(key) {
        Some(Value::String(s)) => parse_date(s)
            .ok_or_else(|| PennywiseError::malformed(field, format!("'{s}' is not a date"))),
        Some(other) => Err(PennywiseError::malformed(
            field,
            format!("expected a date string, got {}", kind(other)),
        )),
        None => Err(PennywiseError::malformed(field, "missing")),
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(PennywiseError::malformed(
            field_path(path, key),
            format!("expected a string, got {}", kind(other)),
        )),
    }
}

fn optional_bool(obj: &Map<String, Value>, keys: &[&str], path: &str) -> Result<bool> {
    for key in keys {
        match obj.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Bool(b)) => return Ok(*b),
            Some(other) => {
                return Err(PennywiseError::malformed(
                    field_path(path, key),
                    format!("expected true or false, got {}", kind(other)),
                ))
            }
        }
    }
    Ok(false)
}

fn field_path(path: &str, key: &str) -> String {
    if path == "$" {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
