use crate::error::QuoteError;
use log::trace;
use std::fmt;

/// Simple (non-compounding) interest over a term given in months.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct SimpleInterestQuote {
    pub principal: f64,
    pub annual_rate: f64,
    pub months: u32,
    pub total_interest: f64,
    pub monthly_pmt: f64,
}

impl SimpleInterestQuote {
    pub fn new(principal: f64, annual_rate: f64, months: u32) -> Result<Self, QuoteError> {
        if months == 0 {
            return Err(QuoteError::ZeroTerm);
        }
        let term = f64::from(months);
        let total_interest = principal * (annual_rate / 100.) * (term / 12.);
        let monthly_pmt = (principal + total_interest) / term;
        trace!(
            "quote: principal {}, rate {}, {} months -> interest {}, monthly {}",
            principal,
            annual_rate,
            months,
            total_interest,
            monthly_pmt
        );

        Ok(Self {
            principal,
            annual_rate,
            months,
            total_interest: round(total_interest, 2.),
            monthly_pmt: round(monthly_pmt, 2.),
        })
    }
}

impl fmt::Display for SimpleInterestQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "principal ${:.2}, annual rate {}%, term {} months, total interest ${:.2}, monthly payment ${:.2}",
            self.principal, self.annual_rate, self.months, self.total_interest, self.monthly_pmt
        )
    }
}

fn round(amt: f64, dec: f64) -> f64 {
    if amt == 0. {
        0.
    } else {
        (amt * 10_f64.powf(dec)).round() / 10_f64.powf(dec)
    }
}
