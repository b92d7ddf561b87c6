use comfy_table::{Cell, Table};

use crate::aggregator::category_stats;
use crate::document::parse_amount;
use crate::error::Result;
use crate::fmt::{money, pct};
use crate::lifecycle::{add_category, remove_category, set_allocation};
use crate::models::CategoryAllocation;

use super::{edit_budget, open_store, resolve_budget};

pub fn add(
    id: &str,
    name: Option<&str>,
    allocated: &str,
    color: Option<String>,
    icon: Option<String>,
    selector: Option<&str>,
) -> Result<()> {
    let allocation = CategoryAllocation {
        category_id: id.to_string(),
        display_name: name.unwrap_or(id).to_string(),
        color,
        icon,
        allocated_amount: parse_amount(allocated)?,
        payments: Vec::new(),
    };
    let display = allocation.display_name.clone();
    let amount = allocation.allocated_amount;
    let budget = edit_budget(selector, |b| add_category(b, allocation))?;
    println!(
        "Added category {display} ({}) for the week of {}",
        money(amount),
        budget.week_start
    );
    Ok(())
}

pub fn allocate(id: &str, amount: &str, selector: Option<&str>) -> Result<()> {
    let amount = parse_amount(amount)?;
    let budget = edit_budget(selector, |b| set_allocation(b, id, amount))?;
    let stats = category_stats(&budget, id)?;
    println!(
        "{} now has {} allocated ({} remaining)",
        stats.name,
        money(stats.allocated),
        money(stats.remaining)
    );
    Ok(())
}

pub fn show(id: &str, selector: Option<&str>) -> Result<()> {
    let conn = open_store()?;
    let budget = resolve_budget(&conn, selector)?;
    let stats = category_stats(&budget, id)?;

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![Cell::new("Allocated"), Cell::new(money(stats.allocated))]);
    table.add_row(vec![Cell::new("Scheduled"), Cell::new(money(stats.scheduled))]);
    table.add_row(vec![Cell::new("Spent"), Cell::new(money(stats.spent))]);
    table.add_row(vec![Cell::new("Remaining"), Cell::new(money(stats.remaining))]);
    table.add_row(vec![Cell::new("Used"), Cell::new(pct(stats.percentage_used))]);
    println!("{}\n{table}", stats.name);
    Ok(())
}

pub fn remove(id: &str, selector: Option<&str>) -> Result<()> {
    let mut removed = None;
    edit_budget(selector, |b| {
        removed = Some(remove_category(b, id)?);
        Ok(())
    })?;
    if let Some(category) = removed {
        println!(
            "Removed category {} and {} payment(s)",
            category.display_name,
            category.payments.len()
        );
    }
    Ok(())
}
