//! Git History Reader - query file history of hosted repositories
//!
//! # Usage
//! ```bash
//! git-history-reader serve --port 3001                      # Start HTTP API
//! git-history-reader history records 2.json               # Commits of a file
//! git-history-reader content records <commit> 2.json      # File at a commit
//! git-history-reader diff records <old> <new> 2.json      # HTML diff
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gitreader::{routes, Config, HistoryService};

/// Git History Reader - file history, contents and diffs of hosted repositories
#[derive(Parser)]
#[command(name = "git-history-reader")]
#[command(about = "Query the history of files in hosted git repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "gitreader.toml")]
    config: PathBuf,

    /// Query tool executable, overrides `query.tool`
    #[arg(long, global = true)]
    tool: Option<String>,

    /// Directory for query exports, overrides `query.artifact_dir`
    #[arg(long, global = true)]
    artifact_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Port to run the server on
        #[arg(short, long, default_value = "3001")]
        port: u16,
    },
    /// List ids of the commits touching a file
    Commits { repo: String, path: String },
    /// Show full metadata of the commits touching a file
    History { repo: String, path: String },
    /// Print a file as recorded at a commit
    Content {
        repo: String,
        commit: String,
        path: String,
    },
    /// Render the HTML diff of a file between two commits
    Diff {
        repo: String,
        from: String,
        to: String,
        path: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(&cli.config)?;
    if let Some(tool) = &cli.tool {
        config.query.tool = tool.clone();
    }
    if let Some(dir) = &cli.artifact_dir {
        config.query.artifact_dir = dir.clone();
    }
    Ok(config)
}

async fn serve(service: HistoryService, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(Arc::new(service)))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(
        component = "main process",
        phase = "starting",
        "Starting git history service on port {}",
        port
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
        tracing::info!("Shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let service = HistoryService::new(load_config(&cli)?);

    match cli.command {
        Commands::Serve { port } => serve(service, port).await?,
        Commands::Commits { repo, path } => {
            let ids = tokio::task::spawn_blocking(move || {
                service.list_commits_for_file(&path, &repo)
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&ids)?);
        }
        Commands::History { repo, path } => {
            let commits =
                tokio::task::spawn_blocking(move || service.history(&path, &repo)).await??;
            println!("{}", serde_json::to_string_pretty(&commits)?);
        }
        Commands::Content { repo, commit, path } => {
            let contents = tokio::task::spawn_blocking(move || {
                service.content_at_commit(&commit, &path, &repo)
            })
            .await??;
            println!("{}", contents);
        }
        Commands::Diff {
            repo,
            from,
            to,
            path,
        } => {
            let html = tokio::task::spawn_blocking(move || service.diff(&from, &to, &path, &repo))
                .await??;
            println!("{}", html);
        }
    }

    Ok(())
}
