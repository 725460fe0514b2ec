use crate::scoring::{run_batch, run_info, run_predict, BatchArgs, InfoArgs, PredictArgs};
use crate::server;
use cardio_severity::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Cardio Severity",
    about = "Serve and run the heart disease severity model from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single patient record stored as JSON
    Predict(PredictArgs),
    /// Score every row of a CSV export and summarise the outcome
    Batch(BatchArgs),
    /// Print metadata for the loaded model bundle
    Info(InfoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) model: ModelArgs,
}

/// Bundle selection shared by every command.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ModelArgs {
    /// Model bundle to load instead of MODEL_BUNDLE_PATH
    #[arg(long)]
    pub(crate) bundle: Option<PathBuf>,
    /// Override the bundle's low-confidence threshold
    #[arg(long)]
    pub(crate) low_confidence_threshold: Option<f64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::Batch(args) => run_batch(args),
        Command::Info(args) => run_info(args),
    }
}
