use crate::error::{LoanError, PaymentError};
use crate::loan::{Loan, Payment, RawLoan};
use crate::status::{categorize, CategorizedRecord};
use chrono::NaiveDate;
use log::{debug, info, warn};

#[cfg(feature = "serde")]
use crate::loan::parse_date;

/// A payment submission for an existing loan.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct NewPayment {
    pub loan_id: i64,
    pub payment_date: NaiveDate,
    pub amount: f64,
}

#[cfg(feature = "serde")]
impl NewPayment {
    const REQUIRED: [&'static str; 3] = ["loan_id", "payment_date", "amount"];

    /// Validates a `{loan_id, payment_date, amount}` body. Numbers given as
    /// strings are accepted.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, PaymentError> {
        let fields = body.as_object().ok_or(PaymentError::InvalidJson)?;

        let missing: Vec<String> = Self::REQUIRED
            .iter()
            .filter(|f| !fields.contains_key(**f))
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PaymentError::MissingFields(missing));
        }

        let loan_id = json_i64(&fields["loan_id"]).ok_or(PaymentError::InvalidValue)?;
        let amount = json_f64(&fields["amount"]).ok_or(PaymentError::InvalidValue)?;
        if !(amount > 0.) {
            return Err(PaymentError::NonPositiveAmount);
        }
        let payment_date = fields["payment_date"]
            .as_str()
            .and_then(parse_date)
            .ok_or(PaymentError::InvalidValue)?;

        Ok(Self {
            loan_id,
            payment_date,
            amount,
        })
    }
}

#[cfg(feature = "serde")]
fn json_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        // whole floats like 2.0 pass, as `int()` would take them
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(feature = "serde")]
fn json_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// In-memory store of loans and their payments.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct LoanBook {
    loans: Vec<Loan>,
}

impl LoanBook {
    pub fn new(loans: Vec<Loan>) -> Self {
        Self { loans }
    }

    pub fn from_raw(raw: &[RawLoan]) -> Result<Self, LoanError> {
        let loans = raw
            .iter()
            .map(RawLoan::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(loans))
    }

    /// Four loans due 2025-03-01; the last one has never been paid.
    pub fn demo() -> Self {
        let due = ymd(2025, 3, 1);
        Self::new(vec![
            Loan::new(1, "Tom's Loan", 5.0, 10000., due)
                .with_payment(Payment::new(1, Some(ymd(2025, 3, 4)))),
            Loan::new(2, "Chris Wailaka", 3.5, 500000., due)
                .with_payment(Payment::new(2, Some(ymd(2025, 3, 15)))),
            Loan::new(3, "NP Mobile Money", 4.5, 30000., due)
                .with_payment(Payment::new(3, Some(ymd(2025, 4, 5)))),
            Loan::new(4, "Esther's Autoparts", 1.5, 40000., due),
        ])
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn loan(&self, id: i64) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id == id)
    }

    pub fn get_pmt_count(&self) -> usize {
        self.loans.iter().map(Loan::get_pmt_count).sum()
    }

    pub fn statuses(&self) -> Vec<CategorizedRecord> {
        categorize(&self.loans)
    }

    /// Records a payment against an existing loan and returns it with its
    /// assigned id, one past the highest payment id anywhere in the book.
    pub fn add_payment(&mut self, new_pmt: NewPayment) -> Result<&Payment, PaymentError> {
        if !(new_pmt.amount > 0.) {
            warn!(
                "rejected payment for loan {}: amount {}",
                new_pmt.loan_id, new_pmt.amount
            );
            return Err(PaymentError::NonPositiveAmount);
        }

        let id = self
            .loans
            .iter()
            .flat_map(|loan| &loan.payments)
            .map(|pmt| pmt.id)
            .max()
            .unwrap_or(0)
            + 1;
        let Some(loan) = self.loans.iter_mut().find(|loan| loan.id == new_pmt.loan_id) else {
            warn!("rejected payment for unknown loan {}", new_pmt.loan_id);
            return Err(PaymentError::UnknownLoan(new_pmt.loan_id));
        };

        let pmt = Payment::new(id, Some(new_pmt.payment_date)).with_amount(new_pmt.amount);
        info!("recorded payment {} for loan {}: {}", id, loan.id, pmt);
        loan.payments.push(pmt);
        debug!("loan {} now has {} payment(s)", loan.id, loan.payments.len());

        Ok(&loan.payments[loan.payments.len() - 1])
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid seed date")
}

#[cfg(test)]
mod tests {
    use super::{LoanBook, NewPayment};
    use crate::error::PaymentError;
    use crate::loan::{Payment, RawLoan, RawPayment};
    use crate::status::PaymentStatus;
    use chrono::NaiveDate;
    use test_log::test;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_demo_book() {
        let book = LoanBook::demo();

        assert_eq!(book.loans().len(), 4);
        assert_eq!(book.get_pmt_count(), 3);
        assert_eq!(
            book.statuses().iter().map(|r| r.status).collect::<Vec<_>>(),
            vec![
                PaymentStatus::OnTime,
                PaymentStatus::Late,
                PaymentStatus::Defaulted,
                PaymentStatus::Unpaid,
            ]
        );
    }

    #[test]
    fn test_add_payment() {
        let mut book = LoanBook::demo();
        let pmt = book
            .add_payment(NewPayment {
                loan_id: 4,
                payment_date: date(2025, 3, 5),
                amount: 1250.5,
            })
            .unwrap()
            .clone();

        assert_eq!(pmt, Payment::new(4, Some(date(2025, 3, 5))).with_amount(1250.5));
        assert_eq!(book.loan(4).unwrap().payments, vec![pmt]);

        // the placeholder is gone once the loan has a payment
        let records = book.statuses();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].status, PaymentStatus::OnTime);
        assert_eq!(records[3].payment_date, Some(date(2025, 3, 5)));
    }

    #[test]
    fn test_add_payment_ids_are_sequential() {
        let mut book = LoanBook::demo();
        for (expected, loan_id) in [(4, 1), (5, 1), (6, 3)] {
            let pmt = book
                .add_payment(NewPayment {
                    loan_id,
                    payment_date: date(2025, 5, 1),
                    amount: 10.,
                })
                .unwrap();
            assert_eq!(pmt.id, expected);
        }
        assert_eq!(book.loan(1).unwrap().get_pmt_count(), 3);
        assert_eq!(book.statuses().len(), 7);
    }

    #[test]
    fn test_add_payment_ids_skip_past_gaps() {
        let raw = vec![RawLoan {
            id: 10,
            name: "Chris Wailaka".to_string(),
            interest_rate: 3.5,
            principal: 500000.,
            due_date: "2025-03-01".to_string(),
            loan_payments: vec![
                RawPayment {
                    id: 2,
                    payment_date: Some("2025-03-02".to_string()),
                    amount: None,
                },
                RawPayment {
                    id: 3,
                    payment_date: None,
                    amount: None,
                },
            ],
        }];
        let mut book = LoanBook::from_raw(&raw).unwrap();

        let pmt = book
            .add_payment(NewPayment {
                loan_id: 10,
                payment_date: date(2025, 3, 20),
                amount: 50.,
            })
            .unwrap();
        assert_eq!(pmt.id, 4);
        assert_eq!(
            book.loan(10)
                .unwrap()
                .payments
                .iter()
                .map(|p| p.id)
                .collect::<Vec<_>>(),
            vec![2, 3, 4]
        );

        // an empty book starts at 1
        let mut book = LoanBook::new(vec![crate::loan::Loan::new(
            1,
            "Tom's Loan",
            5.0,
            10000.,
            date(2025, 3, 1),
        )]);
        let pmt = book
            .add_payment(NewPayment {
                loan_id: 1,
                payment_date: date(2025, 3, 4),
                amount: 50.,
            })
            .unwrap();
        assert_eq!(pmt.id, 1);
    }

    #[test]
    fn test_add_payment_rejects() {
        let mut book = LoanBook::demo();
        let before = book.clone();

        let unknown = NewPayment {
            loan_id: 99,
            payment_date: date(2025, 3, 5),
            amount: 10.,
        };
        let err = book.add_payment(unknown).unwrap_err();
        assert_eq!(err, PaymentError::UnknownLoan(99));
        assert_eq!(err.to_string(), "Loan with ID 99 does not exist");

        for amount in [0., -5., f64::NAN] {
            let bad = NewPayment {
                loan_id: 1,
                payment_date: date(2025, 3, 5),
                amount,
            };
            assert_eq!(
                book.add_payment(bad).unwrap_err(),
                PaymentError::NonPositiveAmount
            );
        }

        assert_eq!(book, before);
    }

    #[test]
    fn test_from_raw() {
        let raw = vec![RawLoan {
            id: 1,
            name: "Tom's Loan".to_string(),
            interest_rate: 5.0,
            principal: 10000.,
            due_date: "March 1st".to_string(),
            loan_payments: vec![],
        }];
        assert!(LoanBook::from_raw(&raw).is_err());

        let raw = vec![RawLoan {
            due_date: "2025-03-01".to_string(),
            ..raw[0].clone()
        }];
        let book = LoanBook::from_raw(&raw).unwrap();
        assert_eq!(book.loan(1).unwrap().due_date, date(2025, 3, 1));
        assert!(book.loan(2).is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_new_payment_from_json() {
        use serde_json::json;

        let pmt = NewPayment::from_json(&json!({
            "loan_id": 2,
            "payment_date": "2025-03-15",
            "amount": 99.95
        }))
        .unwrap();
        assert_eq!(
            pmt,
            NewPayment {
                loan_id: 2,
                payment_date: date(2025, 3, 15),
                amount: 99.95,
            }
        );

        let pmt = NewPayment::from_json(&json!({
            "loan_id": 2.0,
            "payment_date": "2025-03-15",
            "amount": 10
        }))
        .unwrap();
        assert_eq!(pmt.loan_id, 2);

        // form inputs arrive as strings
        let pmt = NewPayment::from_json(&json!({
            "loan_id": "3",
            "payment_date": "2025-04-05",
            "amount": "12.5"
        }))
        .unwrap();
        assert_eq!(pmt.loan_id, 3);
        assert_eq!(pmt.amount, 12.5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_new_payment_from_json_errors() {
        use serde_json::json;

        assert_eq!(
            NewPayment::from_json(&json!([1, 2, 3])),
            Err(PaymentError::InvalidJson)
        );

        let err = NewPayment::from_json(&json!({"payment_date": "2025-03-15"})).unwrap_err();
        assert_eq!(
            err,
            PaymentError::MissingFields(vec!["loan_id".to_string(), "amount".to_string()])
        );
        assert_eq!(err.to_string(), "Missing required fields: loan_id, amount");

        let err = NewPayment::from_json(&json!({
            "loan_id": "one",
            "payment_date": "2025-03-15",
            "amount": 10
        }))
        .unwrap_err();
        assert_eq!(err, PaymentError::InvalidValue);
        assert_eq!(
            err.to_string(),
            "Invalid value format (check loan ID, amount or date)"
        );

        assert_eq!(
            NewPayment::from_json(&json!({
                "loan_id": 2.5,
                "payment_date": "2025-03-15",
                "amount": 10
            })),
            Err(PaymentError::InvalidValue)
        );

        assert_eq!(
            NewPayment::from_json(&json!({
                "loan_id": 1,
                "payment_date": "2025-03-15",
                "amount": -1
            })),
            Err(PaymentError::NonPositiveAmount)
        );

        assert_eq!(
            NewPayment::from_json(&json!({
                "loan_id": 1,
                "payment_date": "15/03/2025",
                "amount": 1
            })),
            Err(PaymentError::InvalidValue)
        );

        assert_eq!(
            NewPayment::from_json(&json!({
                "loan_id": 1,
                "payment_date": null,
                "amount": 1
            })),
            Err(PaymentError::InvalidValue)
        );
    }
}
