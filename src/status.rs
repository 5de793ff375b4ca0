use crate::error::LoanError;
use crate::loan::{Loan, RawLoan};
use chrono::NaiveDate;
use log::{debug, trace};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Payments up to this many days past due still count as on time.
pub const ON_TIME_GRACE_DAYS: i64 = 5;

/// Payments more than this many days past due count as defaulted.
pub const DEFAULT_AFTER_DAYS: i64 = 30;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PaymentStatus {
    #[cfg_attr(feature = "serde", serde(rename = "On Time"))]
    OnTime,
    Late,
    Defaulted,
    Unpaid,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::OnTime => "On Time",
            PaymentStatus::Late => "Late",
            PaymentStatus::Defaulted => "Defaulted",
            PaymentStatus::Unpaid => "Unpaid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the status listing: a single payment of a loan, or the
/// placeholder for a loan nobody has paid yet.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategorizedRecord {
    pub id: i64,
    pub name: String,
    pub interest_rate: f64,
    pub principal: f64,
    #[cfg_attr(feature = "serde", serde(rename = "dueDate"))]
    pub due_date: NaiveDate,
    #[cfg_attr(feature = "serde", serde(rename = "paymentDate"))]
    pub payment_date: Option<NaiveDate>,
    pub status: PaymentStatus,
}

impl CategorizedRecord {
    fn new(loan: &Loan, payment_date: Option<NaiveDate>, status: PaymentStatus) -> Self {
        Self {
            id: loan.id,
            name: loan.name.clone(),
            interest_rate: loan.interest_rate,
            principal: loan.principal,
            due_date: loan.due_date,
            payment_date,
            status,
        }
    }
}

impl fmt::Display for CategorizedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loan {} ({}), principal ${:.2}, rate {}%, due {}, paid ",
            self.id, self.name, self.principal, self.interest_rate, self.due_date
        )?;
        match self.payment_date {
            Some(date) => write!(f, "{}", date)?,
            None => write!(f, "not paid")?,
        }
        write!(f, ", status {}", self.status)
    }
}

/// Whole calendar days from `due` to `paid`; negative when paid early.
pub fn days_past_due(due: NaiveDate, paid: NaiveDate) -> i64 {
    paid.signed_duration_since(due).num_days()
}

pub fn classify(diff_days: i64) -> PaymentStatus {
    if diff_days <= ON_TIME_GRACE_DAYS {
        PaymentStatus::OnTime
    } else if diff_days <= DEFAULT_AFTER_DAYS {
        PaymentStatus::Late
    } else {
        PaymentStatus::Defaulted
    }
}

/// Flattens loans into one record per payment, in loan order then payment
/// order. A loan without payments gets a single `Unpaid` record; a payment
/// without a date inside a non-empty list also yields `Unpaid`.
pub fn categorize(loans: &[Loan]) -> Vec<CategorizedRecord> {
    let mut records = Vec::with_capacity(loans.iter().map(|l| l.payments.len().max(1)).sum());

    for loan in loans {
        for pmt in &loan.payments {
            let status = match pmt.payment_date {
                Some(paid) => {
                    let diff_days = days_past_due(loan.due_date, paid);
                    let status = classify(diff_days);
                    trace!(
                        "loan {}, pmt {}, {} days past due, {}",
                        loan.id,
                        pmt.id,
                        diff_days,
                        status
                    );
                    status
                }
                None => PaymentStatus::Unpaid,
            };
            records.push(CategorizedRecord::new(loan, pmt.payment_date, status));
        }

        if loan.payments.is_empty() {
            trace!("loan {} has no payments", loan.id);
            records.push(CategorizedRecord::new(loan, None, PaymentStatus::Unpaid));
        }
    }

    debug!("categorized {} loans into {} records", loans.len(), records.len());
    records
}

/// Parses every loan before categorizing anything, so a single malformed
/// date fails the whole call.
pub fn categorize_raw(loans: &[RawLoan]) -> Result<Vec<CategorizedRecord>, LoanError> {
    let loans = loans
        .iter()
        .map(RawLoan::parse)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categorize(&loans))
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct StatusSummary {
    pub on_time: usize,
    pub late: usize,
    pub defaulted: usize,
    pub unpaid: usize,
}

impl StatusSummary {
    pub fn total(&self) -> usize {
        self.on_time + self.late + self.defaulted + self.unpaid
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records: {} on time, {} late, {} defaulted, {} unpaid",
            self.total(),
            self.on_time,
            self.late,
            self.defaulted,
            self.unpaid
        )
    }
}

pub fn summarize(records: &[CategorizedRecord]) -> StatusSummary {
    records
        .iter()
        .fold(StatusSummary::default(), |mut summary, rec| {
            match rec.status {
                PaymentStatus::OnTime => summary.on_time += 1,
                PaymentStatus::Late => summary.late += 1,
                PaymentStatus::Defaulted => summary.defaulted += 1,
                PaymentStatus::Unpaid => summary.unpaid += 1,
            }
            summary
        })
}
