use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::Decimal;

use crate::document::content_version;
use crate::error::{PennywiseError, Result};
use crate::models::{Budget, CategoryAllocation, Payment, PaymentStatus};

/// Fresh 24-character hex id, the same width the server uses.
pub fn new_id() -> String {
    hex::encode(rand::random::<[u8; 12]>())
}

/// The seven-day period that contains `date`, starting on `week_start`.
pub fn week_bounds(date: NaiveDate, week_start: Weekday) -> (NaiveDate, NaiveDate) {
    let offset = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    let start = date - Duration::days(offset as i64);
    (start, start + Duration::days(6))
}

fn check_amount(amount: Decimal, what: &str) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PennywiseError::InvalidAmount(format!(
            "{what} cannot be negative ({amount})"
        )));
    }
    Ok(())
}

fn touch(budget: &mut Budget) -> Result<()> {
    budget.version = content_version(budget)?;
    Ok(())
}

pub fn new_budget(
    date: NaiveDate,
    week_start: Weekday,
    total: Decimal,
    household_id: Option<String>,
) -> Result<Budget> {
    check_amount(total, "Budget total")?;
    let (start, end) = week_bounds(date, week_start);
    let mut budget = Budget {
        id: new_id(),
        week_start: start,
        week_end: end,
        total_budget: total,
        categories: Vec::new(),
        is_shared_with_household: household_id.is_some(),
        household_id,
        version: String::new(),
    };
    touch(&mut budget)?;
    Ok(budget)
}

pub fn set_total(budget: &mut Budget, total: Decimal) -> Result<()> {
    check_amount(total, "Budget total")?;
    budget.total_budget = total;
    touch(budget)
}

pub fn add_category(budget: &mut Budget, allocation: CategoryAllocation) -> Result<()> {
    if budget.category(&allocation.category_id).is_some() {
        return Err(PennywiseError::DuplicateCategory(allocation.category_id));
    }
    check_amount(allocation.allocated_amount, "Allocation")?;
    for payment in &allocation.payments {
        if budget.payment(&payment.id).is_some() {
            return Err(PennywiseError::DuplicatePayment(payment.id.clone()));
        }
    }
    budget.categories.push(allocation);
    touch(budget)
}

pub fn set_allocation(budget: &mut Budget, category_id: &str, amount: Decimal) -> Result<()> {
    check_amount(amount, "Allocation")?;
    let category = budget
        .category_mut(category_id)
        .ok_or_else(|| PennywiseError::UnknownCategory(category_id.to_string()))?;
    category.allocated_amount = amount;
    touch(budget)
}

/// Removes the allocation together with all of its payments.
pub fn remove_category(budget: &mut Budget, category_id: &str) -> Result<CategoryAllocation> {
    let pos = budget
        .categories
        .iter()
        .position(|c| c.category_id == category_id)
        .ok_or_else(|| PennywiseError::UnknownCategory(category_id.to_string()))?;
    let removed = budget.categories.remove(pos);
    touch(budget)?;
    Ok(removed)
}

pub fn add_payment(budget: &mut Budget, category_id: &str, payment: Payment) -> Result<()> {
    check_amount(payment.amount, "Payment amount")?;
    if budget.payment(&payment.id).is_some() {
        return Err(PennywiseError::DuplicatePayment(payment.id));
    }
    let category = budget
        .category_mut(category_id)
        .ok_or_else(|| PennywiseError::UnknownCategory(category_id.to_string()))?;
    category.payments.push(payment);
    touch(budget)
}

/// pending -> paid, or a late (overdue) payment -> paid. Paying twice is rejected.
pub fn mark_paid(budget: &mut Budget, payment_id: &str) -> Result<()> {
    let payment = budget
        .payment_mut(payment_id)
        .ok_or_else(|| PennywiseError::UnknownPayment(payment_id.to_string()))?;
    if payment.status == PaymentStatus::Paid {
        return Err(PennywiseError::InvalidTransition {
            payment: payment_id.to_string(),
            from: PaymentStatus::Paid.to_string(),
            to: PaymentStatus::Paid.to_string(),
        });
    }
    payment.status = PaymentStatus::Paid;
    touch(budget)
}

pub fn reset_status(budget: &mut Budget, payment_id: &str) -> Result<()> {
    let payment = budget
        .payment_mut(payment_id)
        .ok_or_else(|| PennywiseError::UnknownPayment(payment_id.to_string()))?;
    payment.status = PaymentStatus::Pending;
    touch(budget)
}

pub fn remove_payment(budget: &mut Budget, payment_id: &str) -> Result<Payment> {
    let (ci, pi) = budget
        .categories
        .iter()
        .enumerate()
        .find_map(|(ci, c)| c.payments.iter().position(|p| p.id == payment_id).map(|pi| (ci, pi)))
        .ok_or_else(|| PennywiseError::UnknownPayment(payment_id.to_string()))?;
    let removed = budget.categories[ci].payments.remove(pi);
    touch(budget)?;
    Ok(removed)
}
