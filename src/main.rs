use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use delta_adapt::api::{self, RunArgs, ServeArgs};

/// Evaluates coastal adaptation strategies for river deltas.
#[derive(Parser)]
#[command(name = "delta-adapt", version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate scenario tables and print the category counts
    Run(RunArgs),
    /// Serve the evaluator over HTTP
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging disabled: {e}");
    }

    let result = match cli.command {
        Commands::Run(args) => api::run_pipeline(args).await,
        Commands::Serve(args) => api::run_http_server(args)
            .await
            .map_err(|e| format!("Server error: {e}")),
    };
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
