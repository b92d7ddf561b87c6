use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::aggregator::{aggregate, effective_status, warnings as budget_warnings, Warning};
use crate::error::Result;
use crate::fmt::{money, pct};
use crate::models::{Budget, PaymentStatus};

use super::{as_of, open_store, resolve_budget};

fn signed_money(val: Decimal) -> Cell {
    if val.is_sign_negative() && !val.is_zero() {
        Cell::new(money(val).red())
    } else {
        Cell::new(money(val))
    }
}

fn status_cell(status: PaymentStatus) -> Cell {
    match status {
        PaymentStatus::Paid => Cell::new("paid".green()),
        PaymentStatus::Pending => Cell::new("pending"),
        PaymentStatus::Overdue => Cell::new("overdue".red().bold()),
    }
}

pub fn print_warnings(warnings: &[Warning]) {
    for w in warnings {
        println!("{} {w}", "!".yellow().bold());
    }
}

pub fn print_budget(budget: &Budget, today: NaiveDate) {
    let summary = aggregate(budget, today);

    let mut heading = format!(
        "Week of {} to {} ({})",
        budget.week_start, budget.week_end, budget.id
    );
    if let Some(household) = &budget.household_id {
        heading.push_str(&format!(" shared with household {household}"));
    }
    println!("{}", heading.bold());

    let mut table = Table::new();
    table.set_header(vec!["ID", "Category", "Allocated", "Scheduled", "Spent", "Remaining", "Used"]);
    for stats in &summary.categories {
        table.add_row(vec![
            Cell::new(&stats.category_id),
            Cell::new(&stats.name),
            Cell::new(money(stats.allocated)),
            Cell::new(money(stats.scheduled)),
            Cell::new(money(stats.spent)),
            signed_money(stats.remaining),
            Cell::new(pct(stats.percentage_used)),
        ]);
    }
    let t = &summary.totals;
    table.add_row(vec![
        Cell::new(""),
        Cell::new("Total".bold()),
        Cell::new(money(t.total_allocated)),
        Cell::new(money(t.total_scheduled)),
        Cell::new(money(t.total_spent)),
        signed_money(t.total_allocated - t.total_scheduled),
        Cell::new(""),
    ]);
    println!("{table}");

    let budget_label = if t.is_over_budget {
        "OVER BUDGET".red().bold()
    } else {
        "within budget".green()
    };
    println!(
        "Budget {}  Unallocated {}  {}",
        money(t.total_budget),
        money(t.remaining_budget),
        budget_label
    );

    let has_payments = budget.categories.iter().any(|c| !c.payments.is_empty());
    if has_payments {
        let mut ptable = Table::new();
        ptable.set_header(vec!["ID", "Category", "Payment", "Amount", "Due", "Status", "Recurring"]);
        for category in &budget.categories {
            for payment in &category.payments {
                ptable.add_row(vec![
                    Cell::new(&payment.id),
                    Cell::new(&category.display_name),
                    Cell::new(&payment.name),
                    Cell::new(money(payment.amount)),
                    Cell::new(payment.scheduled_date),
                    status_cell(effective_status(payment, today)),
                    Cell::new(if payment.is_recurring { "yes" } else { "" }),
                ]);
            }
        }
        println!(
            "\nPayments ({} paid, {} pending, {} overdue)\n{ptable}",
            summary.paid_count, summary.pending_count, summary.overdue_count
        );
    }

    if !summary.warnings.is_empty() {
        println!();
        print_warnings(&summary.warnings);
    }
}

pub fn show(selector: Option<&str>, date: Option<&str>) -> Result<()> {
    let today = as_of(date)?;
    let conn = open_store()?;
    let budget = resolve_budget(&conn, selector)?;
    print_budget(&budget, today);
    Ok(())
}

pub fn warnings(selector: Option<&str>, date: Option<&str>) -> Result<()> {
    let today = as_of(date)?;
    let conn = open_store()?;
    let budget = resolve_budget(&conn, selector)?;
    let warnings = budget_warnings(&budget, today);
    if warnings.is_empty() {
        println!("No warnings for the week of {}.", budget.week_start);
    } else {
        print_warnings(&warnings);
    }
    Ok(())
}
