//! Derived numbers and warnings for one budget period.
//!
//! Everything here is a pure function of a [`Budget`] snapshot and the
//! current date. Nothing is cached and the input is never mutated, so the
//! same snapshot always yields the same summary no matter how many times a
//! push event triggers a recompute.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{PennywiseError, Result};
use crate::fmt::money;
use crate::models::{Budget, CategoryAllocation, Payment, PaymentStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category_id: String,
    pub name: String,
    pub allocated: Decimal,
    pub scheduled: Decimal,
    pub spent: Decimal,
    /// allocated - scheduled; negative when the category is overcommitted.
    pub remaining: Decimal,
    /// spent / allocated * 100, two decimals. Zero when nothing is allocated.
    pub percentage_used: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetTotals {
    pub total_budget: Decimal,
    pub total_allocated: Decimal,
    pub total_scheduled: Decimal,
    pub total_spent: Decimal,
    /// total_budget - total_allocated.
    pub remaining_budget: Decimal,
    pub is_over_budget: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    CategoryOverAllocation {
        category: String,
        scheduled: Decimal,
        allocated: Decimal,
    },
    OverBudget {
        scheduled: Decimal,
        total_budget: Decimal,
    },
    PaymentOverdue {
        payment: String,
        category: String,
        due: NaiveDate,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::CategoryOverAllocation {
                category,
                scheduled,
                allocated,
            } => write!(
                f,
                "Category \"{category}\" exceeds its allocation by {} ({} scheduled of {})",
                money(scheduled - allocated),
                money(*scheduled),
                money(*allocated)
            ),
            Warning::OverBudget {
                scheduled,
                total_budget,
            } => write!(
                f,
                "Scheduled payments of {} exceed the budget of {} by {}",
                money(*scheduled),
                money(*total_budget),
                money(scheduled - total_budget)
            ),
            Warning::PaymentOverdue {
                payment,
                category,
                due,
            } => write!(f, "Payment \"{payment}\" is overdue (due {due}, {category})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub categories: Vec<CategoryStats>,
    pub totals: BudgetTotals,
    pub warnings: Vec<Warning>,
    pub pending_count: usize,
    pub paid_count: usize,
    pub overdue_count: usize,
}

/// Status as it should be shown on `today`. A pending payment whose date has
/// passed reads as overdue; the stored status is left alone.
pub fn effective_status(payment: &Payment, today: NaiveDate) -> PaymentStatus {
    match payment.status {
        PaymentStatus::Pending if payment.scheduled_date < today => PaymentStatus::Overdue,
        status => status,
    }
}

pub fn is_overdue(payment: &Payment, today: NaiveDate) -> bool {
    effective_status(payment, today) == PaymentStatus::Overdue
}

fn stats_for(category: &CategoryAllocation) -> CategoryStats {
    let allocated = category.allocated_amount;
    let scheduled: Decimal = category.payments.iter().map(|p| p.amount).sum();
    let spent: Decimal = category
        .payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Paid)
        .map(|p| p.amount)
        .sum();
    let percentage_used = if allocated.is_zero() {
        Decimal::ZERO
    } else {
        (spent / allocated * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    };

    CategoryStats {
        category_id: category.category_id.clone(),
        name: category.display_name.clone(),
        allocated,
        scheduled,
        spent,
        remaining: allocated - scheduled,
        percentage_used,
    }
}

pub fn category_stats(budget: &Budget, category_id: &str) -> Result<CategoryStats> {
    budget
        .category(category_id)
        .map(stats_for)
        .ok_or_else(|| PennywiseError::UnknownCategory(category_id.to_string()))
}

pub fn budget_totals(budget: &Budget) -> BudgetTotals {
    totals_from(budget, &all_stats(budget))
}

fn all_stats(budget: &Budget) -> Vec<CategoryStats> {
    budget.categories.iter().map(stats_for).collect()
}

fn totals_from(budget: &Budget, stats: &[CategoryStats]) -> BudgetTotals {
    let total_allocated: Decimal = stats.iter().map(|s| s.allocated).sum();
    let total_scheduled: Decimal = stats.iter().map(|s| s.scheduled).sum();
    let total_spent: Decimal = stats.iter().map(|s| s.spent).sum();

    BudgetTotals {
        total_budget: budget.total_budget,
        total_allocated,
        total_scheduled,
        total_spent,
        remaining_budget: budget.total_budget - total_allocated,
        is_over_budget: total_scheduled > budget.total_budget,
    }
}

/// Advisory warnings: over-allocated categories first, then the budget as a
/// whole, then overdue payments, each in document order.
pub fn warnings(budget: &Budget, today: NaiveDate) -> Vec<Warning> {
    let stats = all_stats(budget);
    let totals = totals_from(budget, &stats);
    warnings_from(budget, &stats, &totals, today)
}

fn warnings_from(
    budget: &Budget,
    stats: &[CategoryStats],
    totals: &BudgetTotals,
    today: NaiveDate,
) -> Vec<Warning> {
    let mut out: Vec<Warning> = stats
        .iter()
        .filter(|s| s.scheduled > s.allocated)
        .map(|s| Warning::CategoryOverAllocation {
            category: s.name.clone(),
            scheduled: s.scheduled,
            allocated: s.allocated,
        })
        .collect();

    if totals.is_over_budget {
        out.push(Warning::OverBudget {
            scheduled: totals.total_scheduled,
            total_budget: totals.total_budget,
        });
    }

    for category in &budget.categories {
        for payment in &category.payments {
            if is_overdue(payment, today) {
                out.push(Warning::PaymentOverdue {
                    payment: payment.name.clone(),
                    category: category.display_name.clone(),
                    due: payment.scheduled_date,
                });
            }
        }
    }
    out
}

pub fn aggregate(budget: &Budget, today: NaiveDate) -> BudgetSummary {
    let stats = all_stats(budget);
    let totals = totals_from(budget, &stats);
    let warnings = warnings_from(budget, &stats, &totals, today);

    let (mut pending_count, mut paid_count, mut overdue_count) = (0, 0, 0);
    for payment in budget.categories.iter().flat_map(|c| &c.payments) {
        match effective_status(payment, today) {
            PaymentStatus::Pending => pending_count += 1,
            PaymentStatus::Paid => paid_count += 1,
            PaymentStatus::Overdue => overdue_count += 1,
        }
    }

    BudgetSummary {
        categories: stats,
        totals,
        warnings,
        pending_count,
        paid_count,
        overdue_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn payment(id: &str, amount: &str, due: &str, status: PaymentStatus) -> Payment {
        Payment {
            id: id.to_string(),
            name: format!("Payment {id}"),
            amount: d(amount),
            scheduled_date: date(due),
            status,
            is_recurring: false,
            notes: None,
        }
    }

    fn category(id: &str, allocated: &str, payments: Vec<Payment>) -> CategoryAllocation {
        CategoryAllocation {
            category_id: id.to_string(),
            display_name: id.to_uppercase(),
            color: None,
            icon: None,
            allocated_amount: d(allocated),
            payments,
        }
    }

    fn budget(total: &str, categories: Vec<CategoryAllocation>) -> Budget {
        Budget {
            id: "b1".to_string(),
            week_start: date("2026-10-12"),
            week_end: date("2026-10-18"),
            total_budget: d(total),
            categories,
            is_shared_with_household: false,
            household_id: None,
            version: "v1".to_string(),
        }
    }

    fn sample() -> Budget {
        budget(
            "500",
            vec![
                category(
                    "food",
                    "200",
                    vec![
                        payment("p1", "80.25", "2026-10-13", PaymentStatus::Paid),
                        payment("p2", "60.00", "2026-10-16", PaymentStatus::Pending),
                    ],
                ),
                category(
                    "rent",
                    "150",
                    vec![payment("p3", "175.00", "2026-10-12", PaymentStatus::Pending)],
                ),
            ],
        )
    }

    #[test]
    fn test_category_stats() {
        let stats = category_stats(&sample(), "food").unwrap();
        assert_eq!(stats.allocated, d("200"));
        assert_eq!(stats.scheduled, d("140.25"));
        assert_eq!(stats.spent, d("80.25"));
        assert_eq!(stats.remaining, d("59.75"));
        assert_eq!(stats.percentage_used, d("40.13"));
    }

    #[test]
    fn test_category_stats_unknown_category() {
        let err = category_stats(&sample(), "travel").unwrap_err();
        assert!(matches!(err, PennywiseError::UnknownCategory(ref id) if id == "travel"));
    }

    #[test]
    fn test_remaining_can_go_negative() {
        let stats = category_stats(&sample(), "rent").unwrap();
        assert_eq!(stats.remaining, d("-25"));
    }

    #[test]
    fn test_budget_totals() {
        let totals = budget_totals(&sample());
        assert_eq!(totals.total_allocated, d("350"));
        assert_eq!(totals.total_scheduled, d("315.25"));
        assert_eq!(totals.total_spent, d("80.25"));
        assert_eq!(totals.remaining_budget, d("150"));
        assert!(!totals.is_over_budget);
    }

    #[test]
    fn test_totals_are_sums_of_category_stats() {
        let b = sample();
        let totals = budget_totals(&b);
        let scheduled: Decimal = b
            .categories
            .iter()
            .map(|c| category_stats(&b, &c.category_id).unwrap().scheduled)
            .sum();
        let spent: Decimal = b
            .categories
            .iter()
            .map(|c| category_stats(&b, &c.category_id).unwrap().spent)
            .sum();
        assert_eq!(totals.total_scheduled, scheduled);
        assert_eq!(totals.total_spent, spent);
    }

    #[test]
    fn test_empty_budget_has_zero_totals_and_no_warnings() {
        let b = budget("250", vec![]);
        let totals = budget_totals(&b);
        assert_eq!(totals.total_allocated, Decimal::ZERO);
        assert_eq!(totals.total_scheduled, Decimal::ZERO);
        assert_eq!(totals.total_spent, Decimal::ZERO);
        assert!(!totals.is_over_budget);
        assert!(warnings(&b, date("2026-10-20")).is_empty());
    }

    #[test]
    fn test_zero_allocation_reports_zero_percent() {
        let b = budget(
            "100",
            vec![category(
                "gifts",
                "0",
                vec![payment("p1", "50", "2026-10-14", PaymentStatus::Paid)],
            )],
        );
        let stats = category_stats(&b, "gifts").unwrap();
        assert_eq!(stats.percentage_used, Decimal::ZERO);
        assert_eq!(stats.spent, d("50"));
        // The spend still surfaces as an over-allocation warning.
        let w = warnings(&b, date("2026-10-14"));
        assert_eq!(w.len(), 1);
        assert!(matches!(w[0], Warning::CategoryOverAllocation { .. }));
    }

    #[test]
    fn test_over_budget_detection() {
        let b = budget(
            "100",
            vec![category(
                "home",
                "150",
                vec![
                    payment("p1", "100", "2026-10-15", PaymentStatus::Pending),
                    payment("p2", "50", "2026-10-16", PaymentStatus::Pending),
                ],
            )],
        );
        let totals = budget_totals(&b);
        assert!(totals.is_over_budget);
        assert_eq!(totals.total_scheduled, d("150"));
        assert_eq!(totals.remaining_budget, d("-50"));

        let w = warnings(&b, date("2026-10-12"));
        assert_eq!(w.len(), 1);
        assert_eq!(
            w[0].to_string(),
            "Scheduled payments of $150.00 exceed the budget of $100.00 by $50.00"
        );
    }

    #[test]
    fn test_overdue_derivation() {
        let today = date("2026-10-15");
        let pending = payment("p1", "20", "2026-10-14", PaymentStatus::Pending);
        let paid = payment("p2", "20", "2026-10-14", PaymentStatus::Paid);
        let due_today = payment("p3", "20", "2026-10-15", PaymentStatus::Pending);

        assert_eq!(effective_status(&pending, today), PaymentStatus::Overdue);
        assert_eq!(effective_status(&paid, today), PaymentStatus::Paid);
        assert_eq!(effective_status(&due_today, today), PaymentStatus::Pending);

        let b = budget("500", vec![category("misc", "100", vec![pending, paid, due_today])]);
        let w = warnings(&b, today);
        assert_eq!(w.len(), 1);
        assert_eq!(
            w[0].to_string(),
            "Payment \"Payment p1\" is overdue (due 2026-10-14, MISC)"
        );
        // Derivation never writes back.
        assert_eq!(b.categories[0].payments[0].status, PaymentStatus::Pending);
    }

    #[test]
    fn test_persisted_overdue_stays_overdue() {
        let p = payment("p1", "20", "2026-10-20", PaymentStatus::Overdue);
        assert!(is_overdue(&p, date("2026-10-12")));
    }

    #[test]
    fn test_warning_order_is_categories_then_budget_then_payments() {
        let b = budget(
            "100",
            vec![
                category(
                    "a",
                    "10",
                    vec![payment("p1", "60", "2026-10-12", PaymentStatus::Pending)],
                ),
                category(
                    "b",
                    "10",
                    vec![payment("p2", "60", "2026-10-13", PaymentStatus::Pending)],
                ),
            ],
        );
        let w = warnings(&b, date("2026-10-18"));
        assert_eq!(w.len(), 5);
        assert!(matches!(&w[0], Warning::CategoryOverAllocation { category, .. } if category == "A"));
        assert!(matches!(&w[1], Warning::CategoryOverAllocation { category, .. } if category == "B"));
        assert!(matches!(w[2], Warning::OverBudget { .. }));
        assert!(matches!(&w[3], Warning::PaymentOverdue { payment, .. } if payment == "Payment p1"));
        assert!(matches!(&w[4], Warning::PaymentOverdue { payment, .. } if payment == "Payment p2"));
        assert_eq!(
            w[0].to_string(),
            "Category \"A\" exceeds its allocation by $50.00 ($60.00 scheduled of $10.00)"
        );
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let b = sample();
        let before = b.clone();
        let today = date("2026-10-15");
        let first = aggregate(&b, today);
        let second = aggregate(&b, today);
        assert_eq!(first, second);
        assert_eq!(b, before);
    }

    #[test]
    fn test_aggregate_counts_effective_statuses() {
        let summary = aggregate(&sample(), date("2026-10-15"));
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.categories.len(), 2);
        assert_eq!(summary.totals, budget_totals(&sample()));
        assert_eq!(summary.warnings, warnings(&sample(), date("2026-10-15")));
    }

    #[test]
    fn test_ten_cents_three_times_is_exactly_thirty_cents() {
        let b = budget(
            "1",
            vec![category(
                "snacks",
                "1",
                vec![
                    payment("p1", "0.10", "2026-10-12", PaymentStatus::Paid),
                    payment("p2", "0.10", "2026-10-13", PaymentStatus::Paid),
                    payment("p3", "0.10", "2026-10-14", PaymentStatus::Paid),
                ],
            )],
        );
        let stats = category_stats(&b, "snacks").unwrap();
        assert_eq!(stats.spent, d("0.30"));
        assert_eq!(money(stats.spent), "$0.30");
        assert_eq!(stats.percentage_used, d("30"));

        let mut repeated = Decimal::ZERO;
        for _ in 0..1000 {
            repeated = budget_totals(&b).total_scheduled;
        }
        assert_eq!(repeated.to_string(), "0.30");
    }

    #[test]
    fn test_largest_accepted_amounts_aggregate_without_overflow() {
        let max = crate::document::parse_amount("1000000000000000").unwrap();
        let max = max.to_string();
        let mut categories = vec![category(
            "tiny",
            "0.01",
            vec![payment("p0", &max, "2026-10-12", PaymentStatus::Paid)],
        )];
        for i in 1..=50 {
            categories.push(category(
                &format!("c{i}"),
                &max,
                vec![
                    payment(&format!("a{i}"), &max, "2026-10-13", PaymentStatus::Pending),
                    payment(&format!("b{i}"), &max, "2026-10-14", PaymentStatus::Paid),
                ],
            ));
        }
        let b = budget(&max, categories);

        let summary = aggregate(&b, date("2026-10-20"));
        assert_eq!(summary.categories[0].percentage_used, d("10000000000000000000"));
        assert_eq!(summary.totals.total_scheduled, d("101000000000000000"));
        assert!(summary.totals.is_over_budget);
        assert_eq!(summary.overdue_count, 50);
    }
}
