//! CLI argument parsing and subcommand dispatch.

use clap::{Parser, Subcommand};

use hourload_core::Config;

use crate::startup;

/// Triggers and polls BigQuery load jobs for hourly GCS partitions.
#[derive(Parser, Debug)]
#[command(name = "hourload-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve {
        /// Override `HOST`.
        #[arg(long)]
        host: Option<String>,
        /// Override `PORT`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the resolved configuration as JSON and exit.
    Config,
}

/// Run the selected subcommand. No subcommand means `serve`.
pub async fn dispatch(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            startup::serve(&config).await
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["hourload-server"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn serve_overrides() {
        let cli =
            Cli::try_parse_from(["hourload-server", "serve", "--host", "127.0.0.1", "--port", "9000"])
                .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Serve {
                host: Some("127.0.0.1".into()),
                port: Some(9000),
            })
        );
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(Cli::try_parse_from(["hourload-server", "serve", "--port", "eighty"]).is_err());
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::try_parse_from(["hourload-server", "config"]).unwrap();
        assert_eq!(cli.command, Some(Command::Config));
    }
}
