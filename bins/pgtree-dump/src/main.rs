mod capture;
mod error;

use clap::{Parser, ValueEnum};
use pgtree_api::arena::Arena;
use pgtree_api::result::DecodeMode;
use pgtree_engine::ResultMarshaler;
use pgtree_engine::config::PgTreeConfig;
use pgtree_engine::envelope::{QueryOutcome, envelope};

use capture::Capture;
use error::DumpError;

#[derive(Parser)]
#[command(name = "pgtree-dump", about = "Marshal a captured PostgreSQL result set to JSON")]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, env = "PGTREE_CONFIG")]
    config: Option<String>,

    /// Wire mode of the captured cells; overrides the configuration.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,

    /// Captured result set (JSON).
    capture: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Text,
    Binary,
}

impl From<ModeArg> for DecodeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Text => DecodeMode::Text,
            ModeArg::Binary => DecodeMode::Binary,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "pgtree-dump failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), DumpError> {
    let config = match &cli.config {
        Some(path) => {
            tracing::info!(config = %path, "loading configuration");
            PgTreeConfig::load(path)?
        }
        None => PgTreeConfig::default(),
    };
    let mode = cli.mode.map(DecodeMode::from).unwrap_or(config.mode);
    let registry = config.registry()?;

    let capture = Capture::load(&cli.capture)?;
    let cells = capture.cells(mode);
    let outcome = capture.outcome(&cells)?;
    let payload = match &outcome {
        QueryOutcome::Tuples(result) => result.payload_bytes(),
        _ => 0,
    };
    tracing::info!(capture = %cli.capture, %mode, payload, "marshaling capture");

    let arena = Arena::with_capacity(payload * 2);
    let value = envelope(
        &arena,
        &ResultMarshaler::new(&registry),
        &config.server_info(),
        &outcome,
        mode,
    )?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{json}");

    tracing::info!(
        nodes = arena.nodes(),
        bytes = arena.allocated_bytes(),
        "releasing arena"
    );
    arena.release();
    Ok(())
}
