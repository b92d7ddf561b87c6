mod aggregator;
mod cache;
mod cli;
mod db;
mod document;
mod error;
mod events;
mod fmt;
mod lifecycle;
mod models;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::payments::NewPayment;
use cli::{BudgetCommands, CategoryCommands, Cli, Commands, PaymentCommands};

fn init_logging() {
    let filter = EnvFilter::try_from_env("PENNYWISE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::summary::show(None, None),
        Some(Commands::Init {
            data_dir,
            week_start,
        }) => cli::init::run(data_dir, week_start),
        Some(Commands::Load { path }) => cli::load::run(&path),
        Some(Commands::Status) => cli::status::run(),
        Some(Commands::Budget { command }) => match command {
            BudgetCommands::New {
                total,
                date,
                household,
            } => cli::budget::new(&total, date.as_deref(), household),
            BudgetCommands::List => cli::budget::list(),
            BudgetCommands::Show { budget, as_of } => {
                cli::summary::show(budget.as_deref(), as_of.as_deref())
            }
            BudgetCommands::Total { amount, budget } => {
                cli::budget::total(&amount, budget.as_deref())
            }
            BudgetCommands::Delete { id } => cli::budget::delete(&id),
            BudgetCommands::Import { file } => cli::budget::import(&file),
            BudgetCommands::Export { budget, output } => {
                cli::budget::export(budget.as_deref(), output.as_deref())
            }
        },
        Some(Commands::Category { command }) => match command {
            CategoryCommands::Add {
                id,
                name,
                allocated,
                color,
                icon,
                budget,
            } => cli::categories::add(&id, name.as_deref(), &allocated, color, icon, budget.as_deref()),
            CategoryCommands::Allocate { id, amount, budget } => {
                cli::categories::allocate(&id, &amount, budget.as_deref())
            }
            CategoryCommands::Show { id, budget } => cli::categories::show(&id, budget.as_deref()),
            CategoryCommands::Remove { id, budget } => {
                cli::categories::remove(&id, budget.as_deref())
            }
        },
        Some(Commands::Payment { command }) => match command {
            PaymentCommands::Add {
                category,
                name,
                amount,
                date,
                recurring,
                notes,
                budget,
            } => cli::payments::add(
                NewPayment {
                    category: &category,
                    name: &name,
                    amount: &amount,
                    date: &date,
                    recurring,
                    notes,
                },
                budget.as_deref(),
            ),
            PaymentCommands::Pay { id, budget } => cli::payments::pay(&id, budget.as_deref()),
            PaymentCommands::Reset { id, budget } => cli::payments::reset(&id, budget.as_deref()),
            PaymentCommands::Remove { id, budget } => cli::payments::remove(&id, budget.as_deref()),
        },
        Some(Commands::Warnings { budget, as_of }) => {
            cli::summary::warnings(budget.as_deref(), as_of.as_deref())
        }
        Some(Commands::Watch { budget }) => cli::watch::run(budget.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
