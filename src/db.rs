use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{PennywiseError, Result};
use crate::models::{Budget, CategoryAllocation, Payment, PaymentStatus};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS budgets (
    id TEXT PRIMARY KEY,
    week_start TEXT NOT NULL,
    week_end TEXT NOT NULL,
    total_budget TEXT NOT NULL,
    is_shared INTEGER DEFAULT 0,
    household_id TEXT,
    version TEXT NOT NULL,
    saved_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    budget_id TEXT NOT NULL,
    category_id TEXT NOT NULL,
    display_name TEXT NOT NULL,
    color TEXT,
    icon TEXT,
    allocated_amount TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (budget_id, category_id),
    FOREIGN KEY (budget_id) REFERENCES budgets(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS payments (
    id TEXT NOT NULL,
    budget_id TEXT NOT NULL,
    category_id TEXT NOT NULL,
    name TEXT NOT NULL,
    amount TEXT NOT NULL,
    scheduled_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    is_recurring INTEGER DEFAULT 0,
    notes TEXT,
    position INTEGER NOT NULL,
    PRIMARY KEY (budget_id, id),
    FOREIGN KEY (budget_id, category_id) REFERENCES categories(budget_id, category_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_budgets_period ON budgets(week_start, week_end);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn decimal(text: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .map_err(|_| PennywiseError::Other(format!("Corrupt {column} in database: '{text}'")))
}

fn date(text: &str, column: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| PennywiseError::Other(format!("Corrupt {column} in database: '{text}'")))
}

/// Replace the stored copy of `budget` with this one, in one transaction.
pub fn save_budget(conn: &mut Connection, budget: &Budget) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM budgets WHERE id = ?1", [&budget.id])?;
    tx.execute(
        "INSERT INTO budgets (id, week_start, week_end, total_budget, is_shared, household_id, version) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            budget.id,
            budget.week_start.to_string(),
            budget.week_end.to_string(),
            budget.total_budget.to_string(),
            budget.is_shared_with_household,
            budget.household_id,
            budget.version,
        ],
    )?;
    for (pos, category) in budget.categories.iter().enumerate() {
        tx.execute(
            "INSERT INTO categories (budget_id, category_id, display_name, color, icon, allocated_amount, position) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                budget.id,
                category.category_id,
                category.display_name,
                category.color,
                category.icon,
                category.allocated_amount.to_string(),
                pos as i64,
            ],
        )?;
        for (ppos, payment) in category.payments.iter().enumerate() {
            tx.execute(
                "INSERT INTO payments (id, budget_id, category_id, name, amount, scheduled_date, status, is_recurring, notes, position) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    payment.id,
                    budget.id,
                    category.category_id,
                    payment.name,
                    payment.amount.to_string(),
                    payment.scheduled_date.to_string(),
                    payment.status.as_str(),
                    payment.is_recurring,
                    payment.notes,
                    ppos as i64,
                ],
            )?;
        }
    }
    tx.commit()?;
    debug!(budget = %budget.id, version = %budget.version, "saved budget");
    Ok(())
}

pub fn load_budget(conn: &Connection, id: &str) -> Result<Budget> {
    let row: Option<(String, String, String, String, bool, Option<String>, String)> = conn
        .query_row(
            "SELECT id, week_start, week_end, total_budget, is_shared, household_id, version \
             FROM budgets WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )
        .optional()?;
    let (id, week_start, week_end, total, is_shared, household_id, version) =
        row.ok_or_else(|| PennywiseError::UnknownBudget(id.to_string()))?;

    let mut cat_stmt = conn.prepare(
        "SELECT category_id, display_name, color, icon, allocated_amount FROM categories \
         WHERE budget_id = ?1 ORDER BY position",
    )?;
    let raw_categories: Vec<(String, String, Option<String>, Option<String>, String)> = cat_stmt
        .query_map([&id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut pay_stmt = conn.prepare(
        "SELECT id, name, amount, scheduled_date, status, is_recurring, notes FROM payments \
         WHERE budget_id = ?1 AND category_id = ?2 ORDER BY position",
    )?;
    let mut categories = Vec::with_capacity(raw_categories.len());
    for (category_id, display_name, color, icon, allocated) in raw_categories {
        let raw_payments: Vec<(String, String, String, String, String, bool, Option<String>)> =
            pay_stmt
                .query_map(rusqlite::params![id, category_id], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut payments = Vec::with_capacity(raw_payments.len());
        for (pid, name, amount, scheduled, status, is_recurring, notes) in raw_payments {
            payments.push(Payment {
                id: pid,
                name,
                amount: decimal(&amount, "payment amount")?,
                scheduled_date: date(&scheduled, "scheduled date")?,
                status: PaymentStatus::from_str(&status).map_err(PennywiseError::Other)?,
                is_recurring,
                notes,
            });
        }

        categories.push(CategoryAllocation {
            allocated_amount: decimal(&allocated, "allocated amount")?,
            category_id,
            display_name,
            color,
            icon,
            payments,
        });
    }

    Ok(Budget {
        week_start: date(&week_start, "week start")?,
        week_end: date(&week_end, "week end")?,
        total_budget: decimal(&total, "total budget")?,
        id,
        categories,
        is_shared_with_household: is_shared,
        household_id,
        version,
    })
}

/// The budget whose period contains `day`, if one has been set.
pub fn find_budget_for_date(conn: &Connection, day: NaiveDate) -> Result<Option<Budget>> {
    let id: Option<String> = conn
        .query_row(
            "SELECT id FROM budgets WHERE week_start <= ?1 AND week_end >= ?1 \
             ORDER BY week_start DESC LIMIT 1",
            [day.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match id {
        Some(id) => Ok(Some(load_budget(conn, &id)?)),
        None => Ok(None),
    }
}

/// Ids of stored budgets whose period shares at least one day with `start..=end`.
pub fn overlapping_budgets(conn: &Connection, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM budgets WHERE week_start <= ?2 AND week_end >= ?1 ORDER BY week_start",
    )?;
    let ids = stmt
        .query_map([start.to_string(), end.to_string()], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

pub fn budget_version(conn: &Connection, id: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT version FROM budgets WHERE id = ?1", [id], |row| row.get(0))
        .optional()?)
}

pub struct BudgetRow {
    pub id: String,
    pub week_start: String,
    pub week_end: String,
    pub total_budget: Decimal,
    pub category_count: i64,
    pub payment_count: i64,
    pub is_shared: bool,
}

pub fn list_budgets(conn: &Connection) -> Result<Vec<BudgetRow>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.week_start, b.week_end, b.total_budget, b.is_shared, \
         (SELECT count(*) FROM categories c WHERE c.budget_id = b.id), \
         (SELECT count(*) FROM payments p WHERE p.budget_id = b.id) \
         FROM budgets b ORDER BY b.week_start DESC",
    )?;
    let raw: Vec<(String, String, String, String, bool, i64, i64)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(id, week_start, week_end, total, is_shared, category_count, payment_count)| {
            Ok(BudgetRow {
                total_budget: decimal(&total, "total budget")?,
                id,
                week_start,
                week_end,
                category_count,
                payment_count,
                is_shared,
            })
        })
        .collect()
}

/// Deletes the budget; its categories and payments go with it.
pub fn delete_budget(conn: &Connection, id: &str) -> Result<()> {
    let deleted = conn.execute("DELETE FROM budgets WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(PennywiseError::UnknownBudget(id.to_string()));
    }
    debug!(budget = %id, "deleted budget");
    Ok(())
}
