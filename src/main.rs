//! Aarogya CLI - disease-risk inference service and API gateway
//!
//! # Commands
//!
//! - `serve` - Start the inference service
//! - `gateway` - Start the token-authenticated proxy in front of it
//! - `inspect` - Load a model bundle and print what it serves
//! - `demo-artifacts` - Write the demo model and corpus to disk

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use aarogya::{
    api::{create_router, AppState},
    config::{
        GatewayConfig, ServeConfig, UpstreamTimeouts, DEFAULT_CORPUS_PATH, DEFAULT_ENVIRONMENT,
        DEFAULT_GATEWAY_PORT, DEFAULT_MODEL_PATH, DEFAULT_SERVE_PORT, DEFAULT_UPSTREAM_URL,
    },
    error::{AarogyaError, Result},
    fixtures,
    gateway::{create_gateway_router, GatewayState},
    logging,
    service::ServiceContext,
};
use axum::Router;
use clap::{builder::BoolishValueParser, Parser, Subcommand};
use tracing::{error, info};

/// Aarogya - disease-risk inference for weekly location indicators
#[derive(Parser, Debug)]
#[command(name = "aarogya")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the inference service
    ///
    /// Examples:
    ///   aarogya serve --demo
    ///   aarogya serve -m disease_model.json -c delhi_disease_data_10000.csv
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_SERVE_PORT)]
        port: u16,

        /// Path to the model artifact (JSON)
        #[arg(short, long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Path to the training corpus (CSV)
        #[arg(short, long, env = "CORPUS_PATH", default_value = DEFAULT_CORPUS_PATH)]
        corpus: PathBuf,

        /// Serve the built-in demo model instead of files
        #[arg(long)]
        demo: bool,

        /// Environment label reported by /health
        #[arg(long, env = "ENVIRONMENT", default_value = DEFAULT_ENVIRONMENT)]
        environment: String,

        /// Verbose logging
        #[arg(long, env = "DEBUG", value_parser = BoolishValueParser::new())]
        debug: bool,
    },
    /// Start the API gateway
    ///
    /// Examples:
    ///   aarogya gateway --token secret
    ///   aarogya gateway --upstream http://localhost:5001 --token a,b
    Gateway {
        /// Host to bind to
        #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to
        #[arg(short, long, env = "GATEWAY_PORT", default_value_t = DEFAULT_GATEWAY_PORT)]
        port: u16,

        /// Base URL of the inference service
        #[arg(short, long, env = "PREDICTION_SERVICE_URL", default_value = DEFAULT_UPSTREAM_URL)]
        upstream: String,

        /// Accepted API token (repeatable or comma separated)
        #[arg(short, long = "token", env = "API_TOKENS", value_delimiter = ',')]
        tokens: Vec<String>,

        /// Upstream timeout for single predictions, in seconds
        #[arg(long, default_value_t = 30)]
        predict_timeout: u64,

        /// Upstream timeout for batch predictions, in seconds
        #[arg(long, default_value_t = 60)]
        batch_timeout: u64,

        /// Upstream timeout for model info, in seconds
        #[arg(long, default_value_t = 10)]
        info_timeout: u64,

        /// Upstream timeout for health checks, in seconds
        #[arg(long, default_value_t = 5)]
        health_timeout: u64,

        /// Verbose logging
        #[arg(long, env = "DEBUG", value_parser = BoolishValueParser::new())]
        debug: bool,
    },
    /// Load a model bundle and print its /info payload
    Inspect {
        /// Path to the model artifact (JSON)
        #[arg(short, long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Path to the training corpus (CSV)
        #[arg(short, long, env = "CORPUS_PATH", default_value = DEFAULT_CORPUS_PATH)]
        corpus: PathBuf,

        /// Inspect the built-in demo model
        #[arg(long)]
        demo: bool,
    },
    /// Write the demo model and corpus to a directory
    DemoArtifacts {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            model,
            corpus,
            demo,
            environment,
            debug,
        } => {
            logging::init(debug)?;
            let config = ServeConfig {
                host,
                port,
                model_path: model,
                corpus_path: corpus,
                demo,
                environment,
            };
            serve(&config).await?;
        },
        Commands::Gateway {
            host,
            port,
            upstream,
            tokens,
            predict_timeout,
            batch_timeout,
            info_timeout,
            health_timeout,
            debug,
        } => {
            logging::init(debug)?;
            let config = GatewayConfig {
                host,
                port,
                upstream_url: upstream,
                tokens,
                timeouts: UpstreamTimeouts::from_secs(
                    predict_timeout,
                    batch_timeout,
                    info_timeout,
                    health_timeout,
                ),
            };
            gateway(&config).await?;
        },
        Commands::Inspect {
            model,
            corpus,
            demo,
        } => {
            let context = load_context(demo, &model, &corpus)?;
            let info = serde_json::to_string_pretty(&context.info()).map_err(|e| {
                AarogyaError::FormatError {
                    reason: format!("Failed to render model info: {e}"),
                }
            })?;
            println!("{info}");
        },
        Commands::DemoArtifacts { out } => {
            let (model, corpus) = fixtures::write_demo_artifacts(&out)?;
            println!("Wrote {}", model.display());
            println!("Wrote {}", corpus.display());
        },
    }

    Ok(())
}

fn load_context(demo: bool, model: &Path, corpus: &Path) -> Result<ServiceContext> {
    if demo {
        ServiceContext::demo()
    } else {
        ServiceContext::load(model, corpus)
    }
}

async fn serve(config: &ServeConfig) -> Result<()> {
    config.validate()?;
    let addr = config.socket_addr()?;

    let context = load_context(config.demo, &config.model_path, &config.corpus_path)
        .inspect_err(|e| error!("Failed to load model bundle: {e}"))?;
    info!(
        source = context.model_source(),
        locations = context.known_locations().len(),
        weeks = context.known_weeks().len(),
        "model bundle loaded"
    );

    let app = create_router(AppState::new(context, config.environment.as_str()));

    println!("Aarogya inference service listening on http://{addr}");
    println!();
    println!("Endpoints:");
    println!("  GET  /health        - Health check");
    println!("  GET  /info          - Model vocabularies and features");
    println!("  GET  /metrics       - Prometheus metrics");
    println!("  POST /predict       - Score one record");
    println!("  POST /predict/batch - Score a list of records");
    println!();

    run(addr, app).await
}

async fn gateway(config: &GatewayConfig) -> Result<()> {
    config.validate()?;
    let addr = config.socket_addr()?;
    let state = GatewayState::from_config(config)?;
    info!(
        upstream = state.upstream().base_url(),
        tokens = config.tokens.len(),
        "gateway configured"
    );

    let app = create_gateway_router(state);

    println!("Aarogya gateway listening on http://{addr}");
    println!("Forwarding to {}", config.upstream_url);
    println!();

    run(addr, app).await
}

async fn run(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AarogyaError::IoError {
            message: format!("Failed to bind {addr}: {e}"),
        })?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AarogyaError::IoError {
            message: format!("Server error: {e}"),
        })?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!("failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from([
            "aarogya", "serve", "--demo", "-p", "6001", "--environment", "staging",
        ])
        .expect("parse");
        match cli.command {
            Commands::Serve {
                port,
                demo,
                environment,
                ..
            } => {
                assert_eq!(port, 6001);
                assert!(demo);
                assert_eq!(environment, "staging");
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_gateway_tokens_accept_comma_list() {
        let cli = Cli::try_parse_from([
            "aarogya",
            "gateway",
            "--token",
            "a,b",
            "--token",
            "c",
            "--batch-timeout",
            "90",
        ])
        .expect("parse");
        match cli.command {
            Commands::Gateway {
                tokens,
                batch_timeout,
                ..
            } => {
                assert_eq!(tokens, vec!["a", "b", "c"]);
                assert_eq!(batch_timeout, 90);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_debug_env_accepts_boolish_values() {
        let debug_for = |value: &str| {
            std::env::set_var("DEBUG", value);
            let cli = Cli::try_parse_from(["aarogya", "serve", "--demo"]);
            std::env::remove_var("DEBUG");
            match cli.expect("parse").command {
                Commands::Serve { debug, .. } => debug,
                other => panic!("unexpected command: {other:?}"),
            }
        };

        assert!(debug_for("true"));
        assert!(debug_for("True"));
        assert!(debug_for("1"));
        assert!(!debug_for("False"));
        assert!(!debug_for("false"));
        assert!(!debug_for("0"));
    }

    #[test]
    fn test_debug_flag_without_env() {
        let cli = Cli::try_parse_from(["aarogya", "gateway", "--token", "t", "--debug"])
            .expect("parse");
        match cli.command {
            Commands::Gateway { debug, .. } => assert!(debug),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_inspect_demo_loads() {
        let context = load_context(true, Path::new(""), Path::new("")).expect("demo");
        assert_eq!(context.known_locations().len(), 10);
    }

    #[test]
    fn test_inspect_missing_files_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_context(
            false,
            &dir.path().join("missing.json"),
            &dir.path().join("missing.csv"),
        );
        assert!(result.is_err());
    }
}
