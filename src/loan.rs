use crate::error::LoanError;
use chrono::NaiveDate;
use log::warn;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Calendar dates on the wire are ISO 8601 date-only strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Payment {
    pub id: i64,
    pub payment_date: Option<NaiveDate>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub amount: Option<f64>,
}

impl Payment {
    pub fn new(id: i64, payment_date: Option<NaiveDate>) -> Self {
        Self {
            id,
            payment_date,
            amount: None,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn is_paid(&self) -> bool {
        self.payment_date.is_some()
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pmt id {}, date ", self.id)?;
        match self.payment_date {
            Some(date) => write!(f, "{}", date)?,
            None => write!(f, "not paid")?,
        }
        if let Some(amount) = self.amount {
            write!(f, ", amount ${:.2}", amount)?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Loan {
    pub id: i64,
    pub name: String,
    pub interest_rate: f64,
    pub principal: f64,
    pub due_date: NaiveDate,
    pub payments: Vec<Payment>,
}

impl Loan {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        interest_rate: f64,
        principal: f64,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            interest_rate,
            principal,
            due_date,
            payments: Vec::new(),
        }
    }

    pub fn with_payment(mut self, payment: Payment) -> Self {
        self.payments.push(payment);
        self
    }

    pub fn get_pmt_count(&self) -> usize {
        self.payments.len()
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loan {} ({}), principal ${:.2}, rate {}%, due {}, {} payment(s)",
            self.id,
            self.name,
            self.principal,
            self.interest_rate,
            self.due_date,
            self.payments.len()
        )
    }
}

/// A payment as the query layer returns it, date still a string.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RawPayment {
    pub id: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub payment_date: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub amount: Option<f64>,
}

/// A loan as the query layer returns it (`loans { id name interestRate
/// principal dueDate loanPayments { id paymentDate } }`).
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RawLoan {
    pub id: i64,
    pub name: String,
    pub interest_rate: f64,
    pub principal: f64,
    pub due_date: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "null_as_empty")
    )]
    pub loan_payments: Vec<RawPayment>,
}

impl RawLoan {
    /// Validates every date on the loan and its payments. The first malformed
    /// date aborts the whole loan.
    pub fn parse(&self) -> Result<Loan, LoanError> {
        let due_date = parse_date(&self.due_date).ok_or_else(|| {
            warn!("loan {} has malformed due date {:?}", self.id, self.due_date);
            LoanError::InvalidDate {
                loan_id: self.id,
                payment_id: None,
                field: "dueDate",
                value: self.due_date.clone(),
            }
        })?;

        let payments = self
            .loan_payments
            .iter()
            .map(|pmt| self.parse_payment(pmt))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Loan {
            id: self.id,
            name: self.name.clone(),
            interest_rate: self.interest_rate,
            principal: self.principal,
            due_date,
            payments,
        })
    }

    fn parse_payment(&self, pmt: &RawPayment) -> Result<Payment, LoanError> {
        // an empty string means "not yet paid", same as null
        let payment_date = match pmt.payment_date.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(parse_date(raw).ok_or_else(|| {
                warn!(
                    "loan {} payment {} has malformed payment date {:?}",
                    self.id, pmt.id, raw
                );
                LoanError::InvalidDate {
                    loan_id: self.id,
                    payment_id: Some(pmt.id),
                    field: "paymentDate",
                    value: raw.to_string(),
                }
            })?),
        };

        Ok(Payment {
            id: pmt.id,
            payment_date,
            amount: pmt.amount,
        })
    }
}

/// Either a bare list of loans or the `{"data": {"loans": [...]}}` envelope
/// the query endpoint wraps it in.
#[cfg(feature = "serde")]
#[derive(Clone, PartialEq, Debug)]
pub enum LoansDocument {
    Envelope { data: LoansData },
    List(Vec<RawLoan>),
}

#[cfg(feature = "serde")]
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct LoansData {
    pub loans: Vec<RawLoan>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct Envelope {
    data: LoansData,
}

#[cfg(feature = "serde")]
impl LoansDocument {
    /// Picks the shape from the first token, so a malformed file reports the
    /// offending field and position.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        if text.trim_start().starts_with('{') {
            let Envelope { data } = serde_json::from_str(text)?;
            Ok(LoansDocument::Envelope { data })
        } else {
            serde_json::from_str(text).map(LoansDocument::List)
        }
    }

    pub fn into_loans(self) -> Vec<RawLoan> {
        match self {
            LoansDocument::Envelope { data } => data.loans,
            LoansDocument::List(loans) => loans,
        }
    }
}

// GraphQL lists may come back as null
#[cfg(feature = "serde")]
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}
