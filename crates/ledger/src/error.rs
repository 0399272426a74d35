//! The module contains the errors the ledger can throw.
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A non-positive value where a positive one is required.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    /// A commitment would exceed the dotação ceiling.
    #[error("Budget exceeded: {0}")]
    BudgetExceeded(String),
    /// A posting would exceed the balance of its parent aggregate.
    #[error("Exceeds available balance: {0}")]
    ExceedsBalance(String),
    /// A referenced entity belongs to another municipio or exercicio.
    #[error("Cross-tenant reference: {0}")]
    CrossTenantReference(String),
    /// Posting into a closed fiscal year.
    #[error("Exercicio is closed: {0}")]
    ExercicioFechado(String),
    /// A date string no recognized statement format matches.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    /// Statement import could not identify the mandatory columns.
    #[error("Missing required columns: {0}")]
    MissingRequiredColumns(String),
    /// Statement import yielded zero parseable rows.
    #[error("No transactions found in statement")]
    NoTransactionsFound,
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::BudgetExceeded(a), Self::BudgetExceeded(b)) => a == b,
            (Self::ExceedsBalance(a), Self::ExceedsBalance(b)) => a == b,
            (Self::CrossTenantReference(a), Self::CrossTenantReference(b)) => a == b,
            (Self::ExercicioFechado(a), Self::ExercicioFechado(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::MissingRequiredColumns(a), Self::MissingRequiredColumns(b)) => a == b,
            (Self::NoTransactionsFound, Self::NoTransactionsFound) => true,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
