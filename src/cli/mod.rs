pub mod budget;
pub mod categories;
pub mod init;
pub mod load;
pub mod payments;
pub mod status;
pub mod summary;
pub mod watch;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{find_budget_for_date, get_connection, load_budget, save_budget};
use crate::document::parse_date;
use crate::error::{PennywiseError, Result};
use crate::models::Budget;
use crate::settings::load_settings;

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn parse_day(text: &str) -> Result<NaiveDate> {
    parse_date(text).ok_or_else(|| PennywiseError::Other(format!("Invalid date '{text}' (expected YYYY-MM-DD)")))
}

pub(crate) fn as_of(date: Option<&str>) -> Result<NaiveDate> {
    date.map(parse_day).unwrap_or_else(|| Ok(today()))
}

pub(crate) fn open_store() -> Result<Connection> {
    let path = load_settings().db_path();
    if !path.exists() {
        return Err(PennywiseError::Settings(format!(
            "No database found at {}\nRun `pennywise init` to create one.",
            path.display()
        )));
    }
    get_connection(&path)
}

/// A budget id, or any date inside the budget's week. `None` means this week.
pub(crate) fn resolve_budget(conn: &Connection, selector: Option<&str>) -> Result<Budget> {
    let day = match selector {
        Some(s) => match parse_date(s) {
            Some(day) => day,
            None => return load_budget(conn, s),
        },
        None => today(),
    };
    find_budget_for_date(conn, day)?.ok_or_else(|| PennywiseError::NoBudgetForPeriod(day.to_string()))
}

/// Load the selected budget, apply `edit`, and store the result.
pub(crate) fn edit_budget<F>(selector: Option<&str>, edit: F) -> Result<Budget>
where
    F: FnOnce(&mut Budget) -> Result<()>,
{
    let mut conn = open_store()?;
    let mut budget = resolve_budget(&conn, selector)?;
    edit(&mut budget)?;
    save_budget(&mut conn, &budget)?;
    Ok(budget)
}

#[derive(Parser)]
#[command(name = "pennywise", about = "Weekly household budgets: allocations, scheduled payments, warnings.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up pennywise: choose a data directory and initialize the database.
    Init {
        /// Path for pennywise data (default: ~/Documents/pennywise)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// First day of the budget week, e.g. monday or sunday
        #[arg(long = "week-start")]
        week_start: Option<String>,
    },
    /// Switch to an existing pennywise data directory.
    Load {
        /// Path to data directory containing pennywise.db
        path: String,
    },
    /// Show current database and summary statistics.
    Status,
    /// Manage weekly budgets.
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
    /// Manage category allocations within a budget.
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Manage scheduled payments within a budget.
    Payment {
        #[command(subcommand)]
        command: PaymentCommands,
    },
    /// List warnings for a budget.
    Warnings {
        /// Budget id or any date in its week (default: this week)
        #[arg(long)]
        budget: Option<String>,
        /// Evaluate overdue payments as of this date: YYYY-MM-DD
        #[arg(long = "as-of")]
        as_of: Option<String>,
    },
    /// Show a budget and re-render it whenever a push event arrives on stdin.
    Watch {
        /// Budget id or any date in its week (default: this week)
        #[arg(long)]
        budget: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the budget for the week containing a date.
    New {
        /// Total spending limit for the week
        #[arg(long)]
        total: String,
        /// Any date in the week (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Share the budget with this household
        #[arg(long)]
        household: Option<String>,
    },
    /// List all budgets, newest week first.
    List,
    /// Show allocations, payments, totals and warnings.
    Show {
        /// Budget id or any date in its week (default: this week)
        #[arg(long)]
        budget: Option<String>,
        /// Evaluate overdue payments as of this date: YYYY-MM-DD
        #[arg(long = "as-of")]
        as_of: Option<String>,
    },
    /// Change the weekly total.
    Total {
        /// New total
        amount: String,
        #[arg(long)]
        budget: Option<String>,
    },
    /// Delete a budget with all of its categories and payments.
    Delete {
        /// Budget id
        id: String,
    },
    /// Import a budget document (JSON) as sent by the server.
    Import {
        /// Path to the JSON document
        file: String,
    },
    /// Export a budget as canonical JSON.
    Export {
        #[arg(long)]
        budget: Option<String>,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category allocation.
    Add {
        /// Category id, e.g. groceries
        id: String,
        /// Display name (default: the id)
        #[arg(long)]
        name: Option<String>,
        /// Planned spend for the week
        #[arg(long, default_value = "0")]
        allocated: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        budget: Option<String>,
    },
    /// Change a category's allocation.
    Allocate {
        /// Category id
        id: String,
        /// New allocation
        amount: String,
        #[arg(long)]
        budget: Option<String>,
    },
    /// Show the figures for one category.
    Show {
        /// Category id
        id: String,
        #[arg(long)]
        budget: Option<String>,
    },
    /// Remove a category and all of its payments.
    Remove {
        /// Category id
        id: String,
        #[arg(long)]
        budget: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Schedule a payment in a category.
    Add {
        /// Category id
        #[arg(long)]
        category: String,
        /// Payment name, e.g. 'Electric bill'
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        /// Due date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        recurring: bool,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        budget: Option<String>,
    },
    /// Mark a payment as paid.
    Pay {
        /// Payment id (shown in `pennywise budget show`)
        id: String,
        #[arg(long)]
        budget: Option<String>,
    },
    /// Reset a payment back to pending.
    Reset {
        /// Payment id
        id: String,
        #[arg(long)]
        budget: Option<String>,
    },
    /// Remove a payment.
    Remove {
        /// Payment id
        id: String,
        #[arg(long)]
        budget: Option<String>,
    },
}
