use thiserror::Error;

#[derive(Error, Debug)]
pub enum PennywiseError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document does not have the shape of a budget. Distinct from
    /// well-formed but empty data, which is never an error.
    #[error("Malformed budget document at {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Unknown budget: {0}")]
    UnknownBudget(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown payment: {0}")]
    UnknownPayment(String),

    #[error("Category {0} is already in this budget")]
    DuplicateCategory(String),

    #[error("Payment {0} is already in this budget")]
    DuplicatePayment(String),

    #[error("Payment {payment} cannot go from {from} to {to}")]
    InvalidTransition {
        payment: String,
        from: String,
        to: String,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("A budget already exists for the week of {0}")]
    BudgetExists(String),

    #[error("No budget for the week of {0}. Run `pennywise budget new --total <amount>` first.")]
    NoBudgetForPeriod(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl PennywiseError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PennywiseError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PennywiseError>;
