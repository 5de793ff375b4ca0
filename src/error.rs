use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("loan {loan_id}{}: invalid {field} {value:?}", payment_label(.payment_id))]
    InvalidDate {
        loan_id: i64,
        payment_id: Option<i64>,
        field: &'static str,
        value: String,
    },
}

fn payment_label(payment_id: &Option<i64>) -> String {
    match payment_id {
        Some(id) => format!(", payment {}", id),
        None => String::new(),
    }
}

// Messages match what the payment endpoint has always returned; callers map
// them to friendlier text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid value format (check loan ID, amount or date)")]
    InvalidValue,

    #[error("Amount must be positive")]
    NonPositiveAmount,

    #[error("Loan with ID {0} does not exist")]
    UnknownLoan(i64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("loan term must be at least one month")]
    ZeroTerm,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Loan(#[from] LoanError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
