mod api;
mod cli;
mod router;
mod startup;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn load_config() -> hourload_core::Config {
    hourload_core::config::load_dotenv();
    hourload_core::Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = load_config();

    // RUST_LOG wins over APP_LOG_LEVEL.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(config.log.filter_directive()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();

    cli::dispatch(cli, config).await
}
