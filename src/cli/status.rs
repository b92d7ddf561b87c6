use crate::aggregator::aggregate;
use crate::db::{find_budget_for_date, get_connection};
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;

use super::today;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("User:        {}", if settings.user_name.is_empty() { "(not set)" } else { &settings.user_name });
    println!("Data dir:    {}", settings.data_dir);
    println!("Database:    {}", db_path.display());
    println!("Week starts: {}", settings.week_start);

    if db_path.exists() {
        let conn = get_connection(&db_path)?;

        let budgets: i64 = conn.query_row("SELECT count(*) FROM budgets", [], |r| r.get(0))?;
        let categories: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0))?;
        let payments: i64 = conn.query_row("SELECT count(*) FROM payments", [], |r| r.get(0))?;
        let unpaid: i64 = conn.query_row(
            "SELECT count(*) FROM payments WHERE status != 'paid'",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Budgets:     {budgets}");
        println!("Categories:  {categories}");
        println!("Payments:    {payments} ({unpaid} unpaid)");

        let today = today();
        match find_budget_for_date(&conn, today)? {
            Some(budget) => {
                let summary = aggregate(&budget, today);
                println!();
                println!(
                    "This week:   {} of {} spent, {} warning(s)",
                    money(summary.totals.total_spent),
                    money(summary.totals.total_budget),
                    summary.warnings.len()
                );
            }
            None => {
                println!();
                println!("No budget set for this week. Run `pennywise budget new --total <amount>`.");
            }
        }
    } else {
        println!();
        println!("Database not found. Run `pennywise init` to set up.");
    }

    Ok(())
}
