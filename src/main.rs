use chainroute::application::engine::{EngineSettings, RoutingEngine};
use chainroute::domain::config::RoutingPreferences;
use chainroute::domain::network::NetworkId;
use chainroute::domain::ports::{TransactionLog, TransactionLogRef};
use chainroute::domain::query::{LogQuery, NetworkFilter, SortDirection, SortKey};
use chainroute::domain::session::Session;
use chainroute::domain::transaction::TransactionRecord;
use chainroute::infrastructure::advisor::CongestionAwareAdvisor;
use chainroute::infrastructure::in_memory::InMemoryTransactionLog;
use chainroute::interfaces::csv::transaction_reader::TransactionReader;
use chainroute::interfaces::csv::transaction_writer::TransactionWriter;
use chainroute::interfaces::json::{load_configs, load_metrics};
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route one payment and print the decision as JSON
    Decide(DecideArgs),
    /// Search, filter and sort a transaction log CSV
    Query(QueryArgs),
    /// Print usage totals and averages of a transaction log CSV as JSON
    Stats(StatsArgs),
}

#[derive(Args)]
struct DecideArgs {
    /// Merchant routing configs (JSON keyed by merchant id)
    #[arg(long)]
    configs: PathBuf,

    /// Network metrics snapshot (JSON keyed by network)
    #[arg(long)]
    metrics: PathBuf,

    #[arg(long)]
    merchant: String,

    /// Bearer token forwarded with the session
    #[arg(long, env = "CHAINROUTE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, default_value = "5")]
    max_fee_percent: Decimal,

    /// Longest acceptable confirmation time
    #[arg(long, default_value = "30")]
    max_confirmation_seconds: Decimal,

    /// Consult the AI advisor when the merchant has it enabled
    #[arg(long)]
    use_ai: bool,

    /// Restrict routing to these networks
    #[arg(long, value_delimiter = ',')]
    prefer: Vec<NetworkId>,

    #[arg(long, default_value = "0")]
    amount: Decimal,

    /// Transaction log CSV; existing records seed the log and it is rewritten afterwards
    #[arg(long)]
    log: Option<PathBuf>,

    #[arg(long, env = "CHAINROUTE_METRICS_TIMEOUT_MS", default_value_t = 2000)]
    metrics_timeout_ms: u64,

    #[arg(long, env = "CHAINROUTE_AI_TIMEOUT_MS", default_value_t = 3000)]
    ai_timeout_ms: u64,

    #[arg(long, env = "CHAINROUTE_DEADLINE_MS", default_value_t = 5000)]
    deadline_ms: u64,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long)]
    log: PathBuf,

    #[arg(long, default_value = "")]
    search: String,

    /// A network, or `all`
    #[arg(long, default_value = "all")]
    network: NetworkFilter,

    /// timestamp, fee or confirmation-time
    #[arg(long, default_value = "timestamp")]
    sort: SortKey,

    #[arg(long, default_value = "desc")]
    direction: SortDirection,
}

#[derive(Args)]
struct StatsArgs {
    #[arg(long)]
    log: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Decide(args) => decide(args).await,
        Command::Query(args) => query(args).await,
        Command::Stats(args) => stats(args).await,
    }
}

fn read_log(path: &Path) -> Result<InMemoryTransactionLog> {
    let file = File::open(path).into_diagnostic()?;
    let records = TransactionReader::new(file).read_all().into_diagnostic()?;
    let count = records.len();
    let log = InMemoryTransactionLog::with_records(records).into_diagnostic()?;
    info!(records = count, path = %path.display(), "loaded transaction log");
    Ok(log)
}

fn seed_log(path: Option<&Path>) -> Result<InMemoryTransactionLog> {
    match path {
        Some(path) if path.exists() => read_log(path),
        _ => Ok(InMemoryTransactionLog::new()),
    }
}

/// Replaces the log file only once the new contents are fully written.
fn rewrite_log(path: &Path, records: &[TransactionRecord]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir).into_diagnostic()?;
    TransactionWriter::new(&mut staged)
        .write_records(records)
        .into_diagnostic()?;
    staged.as_file().sync_all().into_diagnostic()?;
    staged.persist(path).into_diagnostic()?;
    Ok(())
}

async fn decide(args: DecideArgs) -> Result<()> {
    let configs = load_configs(File::open(&args.configs).into_diagnostic()?).into_diagnostic()?;
    let metrics =
        Arc::new(load_metrics(File::open(&args.metrics).into_diagnostic()?).into_diagnostic()?);
    let log: TransactionLogRef = Arc::new(seed_log(args.log.as_deref())?);

    let settings = EngineSettings {
        metrics_timeout: Duration::from_millis(args.metrics_timeout_ms),
        ai_timeout: Duration::from_millis(args.ai_timeout_ms),
        deadline: Duration::from_millis(args.deadline_ms),
        ..EngineSettings::default()
    };
    let engine = RoutingEngine::new(Arc::new(configs), metrics.clone(), log.clone(), settings)
        .with_advisor(Arc::new(CongestionAwareAdvisor::new(metrics)));

    let preferences = RoutingPreferences {
        max_fee_percent: args.max_fee_percent,
        max_confirmation_seconds: args.max_confirmation_seconds,
        use_ai_fallback: args.use_ai,
        preferred_networks: args.prefer,
        amount: args.amount,
    };
    let mut session = Session::new(args.merchant);
    if let Some(token) = args.token {
        session = session.with_token(token);
    }

    let decision = engine.decide(&session, &preferences).await.into_diagnostic()?;

    if let Some(path) = &args.log {
        let records = log.snapshot().await.into_diagnostic()?;
        rewrite_log(path, &records)?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &decision).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;
    Ok(())
}

async fn query(args: QueryArgs) -> Result<()> {
    let log = read_log(&args.log)?;
    let query = LogQuery::new()
        .search(args.search)
        .network(args.network)
        .sort_by(args.sort, args.direction);
    let records = log.query(&query).await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = TransactionWriter::new(stdout.lock());
    writer.write_records(&records).into_diagnostic()?;
    Ok(())
}

async fn stats(args: StatsArgs) -> Result<()> {
    let log = read_log(&args.log)?;
    let summary = log.summary().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &summary).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;
    Ok(())
}
