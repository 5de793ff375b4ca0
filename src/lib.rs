//! Loans, their payments, and how timely each payment was.

pub mod book;
pub mod error;
pub mod loan;
pub mod quote;
pub mod status;

pub use error::{Error, Result};
