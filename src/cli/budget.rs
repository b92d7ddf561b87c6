use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::aggregator::budget_totals;
use crate::db::{delete_budget, find_budget_for_date, list_budgets, overlapping_budgets, save_budget};
use crate::document::{parse_amount, parse_budget, to_json};
use crate::error::{PennywiseError, Result};
use crate::fmt::money;
use crate::lifecycle::{new_budget, set_total};
use crate::settings::load_settings;

use super::{as_of, edit_budget, open_store, resolve_budget};

pub fn new(total: &str, date: Option<&str>, household: Option<String>) -> Result<()> {
    let total = parse_amount(total)?;
    let day = as_of(date)?;
    let week_start = load_settings().week_start_day()?;
    let mut conn = open_store()?;

    if let Some(existing) = find_budget_for_date(&conn, day)? {
        return Err(PennywiseError::BudgetExists(format!(
            "{} ({})",
            existing.week_start, existing.id
        )));
    }

    let budget = new_budget(day, week_start, total, household)?;
    save_budget(&mut conn, &budget)?;
    println!(
        "Set budget {} for {} to {}: {}",
        budget.id,
        budget.week_start,
        budget.week_end,
        money(budget.total_budget)
    );
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_store()?;
    let rows = list_budgets(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Week", "Total", "Categories", "Payments", "Shared"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(format!("{} to {}", row.week_start, row.week_end)),
            Cell::new(money(row.total_budget)),
            Cell::new(row.category_count),
            Cell::new(row.payment_count),
            Cell::new(if row.is_shared { "yes" } else { "" }),
        ]);
    }
    println!("Budgets\n{table}");
    Ok(())
}

pub fn total(amount: &str, selector: Option<&str>) -> Result<()> {
    let amount = parse_amount(amount)?;
    let budget = edit_budget(selector, |b| set_total(b, amount))?;
    let totals = budget_totals(&budget);
    println!(
        "Budget for {} is now {} ({} unallocated)",
        budget.week_start,
        money(totals.total_budget),
        money(totals.remaining_budget)
    );
    if totals.is_over_budget {
        println!(
            "{} {} already scheduled",
            "Over budget:".red().bold(),
            money(totals.total_scheduled)
        );
    }
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let conn = open_store()?;
    delete_budget(&conn, id)?;
    println!("Deleted budget {id} with its categories and payments");
    Ok(())
}

pub fn import(file: &str) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let budget = parse_budget(&content)?;
    let mut conn = open_store()?;

    let clash = overlapping_budgets(&conn, budget.week_start, budget.week_end)?
        .into_iter()
        .find(|id| *id != budget.id);
    if let Some(other) = clash {
        return Err(PennywiseError::BudgetExists(format!("{} ({other})", budget.week_start)));
    }

    save_budget(&mut conn, &budget)?;
    let payments: usize = budget.categories.iter().map(|c| c.payments.len()).sum();
    println!(
        "Imported budget {} for {}: {} categories, {} payments",
        budget.id,
        budget.week_start,
        budget.categories.len(),
        payments
    );
    Ok(())
}

pub fn export(selector: Option<&str>, output: Option<&str>) -> Result<()> {
    let conn = open_store()?;
    let budget = resolve_budget(&conn, selector)?;
    let json = to_json(&budget)?;
    match output {
        Some(path) => {
            std::fs::write(Path::new(path), format!("{json}\n"))?;
            println!("Exported budget {} to {path}", budget.id);
        }
        None => println!("{json}"),
    }
    Ok(())
}
