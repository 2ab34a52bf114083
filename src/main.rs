//! `lambda-local`: serve a handler module behind locally simulated HTTP, queue
//! and pub/sub triggers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lambda_local::lifecycle::{self, Shutdown};
use lambda_local::observability::logging;
use lambda_local::SimulatorConfig;

#[derive(Debug, Parser)]
#[command(name = "lambda-local")]
#[command(about = "Run a serverless handler locally behind simulated triggers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the simulator
    Start {
        /// Route definition file (JSON, or TOML by extension)
        api_info: PathBuf,

        /// Name of the export to invoke
        handler: String,

        /// Handler module location
        entrypoint: PathBuf,

        /// Environment variables file for the handler
        #[arg(short = 'e', long = "env")]
        env: Option<PathBuf>,

        /// Type-checking project configuration forwarded to the handler runtime
        #[arg(short = 't', long = "project")]
        project: Option<PathBuf>,

        /// Additional route definition files, merged after API_INFO
        #[arg(short = 'p', long = "paths")]
        paths: Vec<PathBuf>,

        /// Decode bearer token claims into the request context
        #[arg(long)]
        claims: bool,

        /// Program used to run the handler module
        #[arg(long)]
        interpreter: Option<String>,

        /// Listening port (defaults to PORT, then 3000)
        #[arg(long)]
        port: Option<u16>,

        /// Expose Prometheus metrics on this address
        #[arg(long)]
        metrics_address: Option<SocketAddr>,
    },
}

impl Commands {
    fn into_config(self) -> SimulatorConfig {
        match self {
            Commands::Start {
                api_info,
                handler,
                entrypoint,
                env,
                project,
                paths,
                claims,
                interpreter,
                port,
                metrics_address,
            } => {
                let mut config = SimulatorConfig::new(api_info, handler, entrypoint);
                config.route_sources.extend(paths);
                config.environment_file = env;
                config.project = project;
                config.claims = claims;
                config.interpreter = interpreter;
                config.port = port;
                config.metrics_address = metrics_address;
                config
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();

    let cli = Cli::parse();
    let config = cli.command.into_config();

    tracing::info!(
        handler = %config.handler,
        entrypoint = %config.entrypoint.display(),
        routes = config.route_sources.len(),
        claims = config.claims,
        "lambda-local v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    match lifecycle::run(config, shutdown.subscribe()).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to start");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_arguments() {
        let cli = Cli::try_parse_from([
            "lambda-local",
            "start",
            "api.json",
            "handler",
            "handler.sh",
            "-e",
            "env.json",
            "-t",
            "tsconfig.json",
            "-p",
            "more.json",
            "-p",
            "extra.toml",
            "--claims",
            "--metrics-address",
            "127.0.0.1:9100",
        ])
        .unwrap();

        let config = cli.command.into_config();
        assert_eq!(
            config.route_sources,
            vec![PathBuf::from("api.json"), PathBuf::from("more.json"), PathBuf::from("extra.toml")]
        );
        assert_eq!(config.handler, "handler");
        assert_eq!(config.entrypoint, PathBuf::from("handler.sh"));
        assert_eq!(config.environment_file, Some(PathBuf::from("env.json")));
        assert_eq!(config.project, Some(PathBuf::from("tsconfig.json")));
        assert!(config.claims);
        assert_eq!(config.port, None);
        assert_eq!(config.metrics_address, Some("127.0.0.1:9100".parse().unwrap()));
    }

    #[test]
    fn test_missing_positionals_rejected() {
        assert!(Cli::try_parse_from(["lambda-local", "start", "api.json"]).is_err());
        assert!(Cli::try_parse_from(["lambda-local"]).is_err());
    }
}
