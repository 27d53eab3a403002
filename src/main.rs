use cashcard::application::cashcard::Cashcard;
use cashcard::domain::account::Balance;
use cashcard::domain::operation::Pin;
use cashcard::infrastructure::in_memory::InMemoryPinVerifier;
use cashcard::interfaces::csv::operation_reader::OperationReader;
use cashcard::interfaces::csv::outcome_writer::{OutcomeWriter, ReportFormat};
use cashcard::interfaces::script::ScriptRunner;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Operations CSV file with the columns `op, pin, amount, timeout_ms`
    input: PathBuf,

    /// PIN accepted by the verifier. Repeat to accept several; omit to accept any PIN.
    #[arg(long = "pin")]
    pins: Vec<Pin>,

    /// Time the verifier takes to answer, in milliseconds
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Submit every operation at once instead of one after another
    #[arg(long)]
    concurrent: bool,

    /// Report layout
    #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
    format: ReportFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let verifier = if cli.pins.is_empty() {
        InMemoryPinVerifier::accept_all()
    } else {
        InMemoryPinVerifier::accept_only(cli.pins)
    }
    .with_latency(Duration::from_millis(cli.latency_ms));
    let card = Arc::new(Cashcard::new(Arc::new(verifier)));

    // Malformed rows are reported and skipped
    let file = File::open(&cli.input).into_diagnostic()?;
    let mut operations = Vec::new();
    for (index, result) in OperationReader::new(file).operations().enumerate() {
        let seq = index + 1;
        match result {
            Ok(operation) => operations.push((seq, operation)),
            Err(e) => eprintln!("Error reading operation {}: {}", seq, e),
        }
    }

    let runner = ScriptRunner::new(Arc::clone(&card), cli.concurrent);
    let records = runner.run(operations).await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock(), cli.format);
    writer
        .write_report(&records, Balance::new(card.get_balance()))
        .into_diagnostic()?;

    Ok(())
}
