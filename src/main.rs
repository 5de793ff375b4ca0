use clap::{Parser, Subcommand};
use loan_status::book::{LoanBook, NewPayment};
use loan_status::loan::LoansDocument;
use loan_status::quote::SimpleInterestQuote;
use loan_status::status::{summarize, CategorizedRecord};
use loan_status::Result;
use log::{debug, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "loans", about = "Show loans and how timely their payments were.")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Categorize every payment as On Time, Late, Defaulted or Unpaid.
    Status {
        /// JSON file with the loan list (default: built-in demo loans)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a payment, then show the refreshed statuses.
    Pay {
        #[arg(long = "loan-id")]
        loan_id: i64,
        /// Payment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Estimate simple interest and the monthly payment.
    Quote {
        #[arg(long)]
        principal: f64,
        /// Annual interest rate in percent
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        months: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("Error: {e}");
    }

    let result = match cli.command {
        Commands::Status { file, json } => status(file.as_deref(), json),
        Commands::Pay {
            loan_id,
            date,
            amount,
            file,
            json,
        } => pay(loan_id, &date, &amount, file.as_deref(), json),
        Commands::Quote {
            principal,
            rate,
            months,
        } => quote(principal, rate, months),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_book(file: Option<&Path>) -> Result<LoanBook> {
    match file {
        Some(path) => {
            debug!("loading loans from {}", path.display());
            let text = std::fs::read_to_string(path)?;
            let raw = LoansDocument::from_json(&text)?.into_loans();
            Ok(LoanBook::from_raw(&raw)?)
        }
        None => Ok(LoanBook::demo()),
    }
}

fn show(records: &[CategorizedRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No loans found.");
        return Ok(());
    }
    for rec in records {
        println!("{}", rec);
    }
    println!("{}", summarize(records));
    Ok(())
}

fn status(file: Option<&Path>, json: bool) -> Result<()> {
    let book = load_book(file)?;
    show(&book.statuses(), json)
}

fn pay(loan_id: i64, date: &str, amount: &str, file: Option<&Path>, json: bool) -> Result<()> {
    let mut book = load_book(file)?;
    // same validation path as a submitted form body
    let new_pmt = NewPayment::from_json(&serde_json::json!({
        "loan_id": loan_id,
        "payment_date": date,
        "amount": amount,
    }))?;
    let pmt = book.add_payment(new_pmt)?;
    if !json {
        println!("Payment added successfully: {}", pmt);
    }
    show(&book.statuses(), json)
}

fn quote(principal: f64, rate: f64, months: u32) -> Result<()> {
    let quote = SimpleInterestQuote::new(principal, rate, months)?;
    println!("{}", quote);
    Ok(())
}

// verifies that types can implement the gated traits below
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<loan_status::loan::Loan>();
    is_normal::<loan_status::loan::RawLoan>();
    is_normal::<CategorizedRecord>();
    is_normal::<LoanBook>();
    is_normal::<NewPayment>();
    is_normal::<SimpleInterestQuote>();
}
