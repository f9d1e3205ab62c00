//! Command-line harness for the loan application flow.
//!
//! Drives the wizard from a JSON answer file (step id -> field -> raw
//! value), assembles the submission record and sends it through the
//! Supabase gateway. Useful for exercising the full flow without a UI.
//!
//! ```json
//! {
//!   "personal":   { "first_name": "John", "last_name": "Doe", "email": "john@x.com" },
//!   "employment": { "monthly_income": "5000" },
//!   "loan":       { "loan_amount": "10000", "loan_term": "24" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use loan_core::gateway::{CredentialProvider, FileUpload, NoCredentials, StaticCredentials};
use loan_core::models::SubmissionRecord;
use loan_core::submit::{FileOutcome, submit_application};
use loan_core::wizard::{Wizard, loan_steps};
use loan_core::{assemble, csv_import};
use loan_supabase::{SupabaseConfig, SupabaseGateway};

type Answers = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Parser, Debug)]
#[command(name = "loan-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the wizard's step and field definitions.
    Steps,

    /// Run the wizard and assembler against an answer file without
    /// submitting; prints the assembled record as JSON.
    Validate {
        /// Path to the JSON answer file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Submit an application, optionally with a transaction CSV.
    Submit {
        /// Path to the JSON answer file
        #[arg(short, long)]
        input: PathBuf,

        /// Transaction CSV to upload and attach after submission
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Also parse the CSV and store its rows as transaction records
        #[arg(long, default_value_t = false)]
        store_transactions: bool,
    },

    /// List submitted applications for an email address, newest first.
    List {
        #[arg(short, long)]
        email: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Bearer credential from `SUPABASE_BEARER_TOKEN`; absent means every call
/// fails with an auth error, which is the correct surface for "not signed
/// in".
fn credentials_from_env() -> Arc<dyn CredentialProvider> {
    match std::env::var("SUPABASE_BEARER_TOKEN") {
        Ok(token) if !token.is_empty() => Arc::new(StaticCredentials(token)),
        _ => Arc::new(NoCredentials),
    }
}

fn build_gateway() -> Result<SupabaseGateway> {
    let config = SupabaseConfig::from_env()?;
    SupabaseGateway::new(config, credentials_from_env())
}

fn read_answers(path: &PathBuf) -> Result<Answers> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer file '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a valid answer file", path.display()))
}

/// Drives the wizard through every step and assembles the record, printing
/// validation failures per step.
fn run_wizard(answers: &Answers) -> Result<SubmissionRecord> {
    let mut wizard = Wizard::new(loan_steps());

    loop {
        let def = wizard.current_def();
        let step_id = def.id;
        let input = answers.get(step_id).cloned().unwrap_or_default();

        match wizard.advance(&input) {
            Ok(loan_core::wizard::Advance::Next(_)) => {}
            Ok(loan_core::wizard::Advance::ReadyToSubmit) => break,
            Err(errors) => {
                eprintln!("Step '{step_id}' failed validation:");
                for error in &errors {
                    eprintln!("  {}: {}", error.field, error.message);
                }
                bail!("answer file does not pass step '{step_id}'");
            }
        }
    }

    assemble(&wizard.flattened()).map_err(Into::into)
}

fn print_steps() {
    for (index, step) in loan_steps().iter().enumerate() {
        println!("{}. {} ({})", index + 1, step.title, step.id);
        for field in &step.fields {
            let rules: Vec<String> = field
                .rules
                .iter()
                .map(|rule| match rule {
                    loan_core::validate::FieldRule::Required => "required".to_string(),
                    loan_core::validate::FieldRule::Pattern { regex, .. } => {
                        format!("pattern {regex}")
                    }
                    loan_core::validate::FieldRule::Min(bound) => format!("min {bound}"),
                    loan_core::validate::FieldRule::Max(bound) => format!("max {bound}"),
                })
                .collect();
            if rules.is_empty() {
                println!("   {} — {}", field.name, field.label);
            } else {
                println!("   {} — {} [{}]", field.name, field.label, rules.join(", "));
            }
        }
    }
}

async fn run_submit(
    input: PathBuf,
    file: Option<PathBuf>,
    store_transactions: bool,
) -> Result<()> {
    let answers = read_answers(&input)?;
    let record = run_wizard(&answers)?;

    let upload = match &file {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "transactions.csv".to_string());
            Some(FileUpload::csv(name, bytes))
        }
        None => None,
    };

    let gateway = build_gateway()?;
    let outcome = submit_application(&gateway, &record, upload).await?;

    println!("Application submitted: {}", outcome.application.id);
    match &outcome.file {
        FileOutcome::NotRequested => {}
        FileOutcome::Attached(stored) => {
            println!("Transaction file attached: {}", stored.url);
        }
        FileOutcome::Pending { file, error } => {
            println!("Submitted, file pending: '{file}' failed ({error})");
        }
    }

    if store_transactions && !outcome.file.is_pending() {
        if let Some(path) = &file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            let rows = csv_import::load_from_str(&text)?;
            use loan_core::gateway::SubmissionGateway;
            let stored = gateway
                .store_transactions(&outcome.application.id, &rows)
                .await?;
            println!("Stored {} transaction records", stored.len());
        }
    }

    Ok(())
}

async fn run_list(email: String) -> Result<()> {
    use loan_core::gateway::SubmissionGateway;

    let gateway = build_gateway()?;
    let applications = gateway.applications_for(&email).await?;

    if applications.is_empty() {
        println!("No applications for {email}");
        return Ok(());
    }

    for app in applications {
        let status = app
            .status
            .map(|s| format!("{s:?}").to_lowercase())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {} over {} months  [{}]",
            app.id, app.record.email, app.record.loan_amount, app.record.loan_term, status
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Steps => {
            print_steps();
            Ok(())
        }
        Command::Validate { input } => {
            let answers = read_answers(&input)?;
            let record = run_wizard(&answers)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Command::Submit {
            input,
            file,
            store_transactions,
        } => run_submit(input, file, store_transactions).await,
        Command::List { email } => run_list(email).await,
    }
}
