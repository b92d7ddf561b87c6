use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

/// A single scheduled or completed expense inside one category allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
    pub scheduled_date: NaiveDate,
    pub status: PaymentStatus,
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Planned spend for one category within one budget period. Owns its payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAllocation {
    pub category_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub allocated_amount: Decimal,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

/// One budget period (a week) with its category allocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    #[serde(rename = "weekStartDate")]
    pub week_start: NaiveDate,
    #[serde(rename = "weekEndDate")]
    pub week_end: NaiveDate,
    pub total_budget: Decimal,
    pub categories: Vec<CategoryAllocation>,
    pub is_shared_with_household: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household_id: Option<String>,
    /// Content revision: the server's `updatedAt` stamp or a local content hash.
    #[serde(rename = "updatedAt")]
    pub version: String,
}

impl Budget {
    pub fn category(&self, category_id: &str) -> Option<&CategoryAllocation> {
        self.categories.iter().find(|c| c.category_id == category_id)
    }

    pub fn category_mut(&mut self, category_id: &str) -> Option<&mut CategoryAllocation> {
        self.categories.iter_mut().find(|c| c.category_id == category_id)
    }

    pub fn payment(&self, payment_id: &str) -> Option<(&CategoryAllocation, &Payment)> {
        self.categories.iter().find_map(|c| {
            c.payments
                .iter()
                .find(|p| p.id == payment_id)
                .map(|p| (c, p))
        })
    }

    pub fn payment_mut(&mut self, payment_id: &str) -> Option<&mut Payment> {
        self.categories
            .iter_mut()
            .flat_map(|c| c.payments.iter_mut())
            .find(|p| p.id == payment_id)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.week_start <= date && date <= self.week_end
    }
}
