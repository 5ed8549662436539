use clap::{Parser, Subcommand};
use pollution_sentinel::{
    cmd::{CheckArgs, check},
    config::AppConfig,
    supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the pollution monitoring loop.
    Run {
        /// Directory containing `app.yaml`. Defaults to `configs`.
        #[arg(short, long, env = "SENTINEL_CONFIG_DIR")]
        config_dir: Option<String>,
    },
    /// Evaluates a single cycle and prints what would be sent.
    Check(CheckArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config_dir } => run_supervisor(config_dir.as_deref()).await?,
        Commands::Check(args) => check::execute(args).await?,
    }

    Ok(())
}

async fn run_supervisor(config_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(config_dir)?;
    tracing::debug!(
        metrics_url = %config.metrics.url,
        polling_interval = ?config.polling_interval,
        substances = %config.substances_path.display(),
        "Configuration loaded."
    );

    let supervisor = Supervisor::builder().config(config).build().await?;

    tracing::info!("Supervisor initialized, starting monitoring...");

    supervisor.run().await?;

    Ok(())
}
