use colored::Colorize;

use crate::document::parse_amount;
use crate::error::Result;
use crate::fmt::money;
use crate::lifecycle::{add_payment, mark_paid, new_id, remove_payment, reset_status};
use crate::models::{Payment, PaymentStatus};

use super::{edit_budget, parse_day};

pub struct NewPayment<'a> {
    pub category: &'a str,
    pub name: &'a str,
    pub amount: &'a str,
    pub date: &'a str,
    pub recurring: bool,
    pub notes: Option<String>,
}

pub fn add(new: NewPayment<'_>, selector: Option<&str>) -> Result<()> {
    let payment = Payment {
        id: new_id(),
        name: new.name.to_string(),
        amount: parse_amount(new.amount)?,
        scheduled_date: parse_day(new.date)?,
        status: PaymentStatus::Pending,
        is_recurring: new.recurring,
        notes: new.notes.filter(|n| !n.is_empty()),
    };
    let id = payment.id.clone();
    let due = payment.scheduled_date;
    let amount = payment.amount;
    let budget = edit_budget(selector, |b| add_payment(b, new.category, payment))?;
    println!("Added payment {id}: {} {} due {due}", new.name, money(amount));
    if !budget.contains(due) {
        println!(
            "{} due date is outside the week of {} to {}",
            "Note:".yellow(),
            budget.week_start,
            budget.week_end
        );
    }
    Ok(())
}

pub fn pay(id: &str, selector: Option<&str>) -> Result<()> {
    let budget = edit_budget(selector, |b| mark_paid(b, id))?;
    if let Some((category, payment)) = budget.payment(id) {
        println!(
            "Paid {} ({}) from {}",
            payment.name,
            money(payment.amount),
            category.display_name
        );
    }
    Ok(())
}

pub fn reset(id: &str, selector: Option<&str>) -> Result<()> {
    edit_budget(selector, |b| reset_status(b, id))?;
    println!("Payment {id} is pending again");
    Ok(())
}

pub fn remove(id: &str, selector: Option<&str>) -> Result<()> {
    let mut removed = None;
    edit_budget(selector, |b| {
        removed = Some(remove_payment(b, id)?);
        Ok(())
    })?;
    if let Some(payment) = removed {
        println!("Removed payment {} ({})", payment.name, money(payment.amount));
    }
    Ok(())
}
