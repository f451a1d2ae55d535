//! diffscope daemon entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use diffscope::git::find_git_repos;
use diffscope::server::{handle_connection, ConnectionRegistry};

/// Git diffs in your browser
#[derive(Parser, Debug)]
#[command(name = "diffscope")]
#[command(about = "Browse git history and diffs over a live WebSocket view")]
struct Args {
    /// Only git repositories below this root are served
    #[arg(value_name = "PATH", env = "DIFFSCOPE_ROOT")]
    root: PathBuf,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port on which the server listens
    #[arg(short, long, default_value = "8765")]
    port: u16,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("diffscope={}", level).parse()?),
        )
        .init();

    // Repository discovery failures are fatal to startup, not to sessions
    let root = std::fs::canonicalize(&args.root)?;
    let repos = Arc::new(find_git_repos(&root)?);
    tracing::info!(
        "discovered {} git repositories under {}",
        repos.len(),
        root.display()
    );

    let registry = Arc::new(ConnectionRegistry::new());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("diffscope listening on ws://{}/ws", addr);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::info!("accepted connection from {}", peer);
                let repos = Arc::clone(&repos);
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    handle_connection(stream, repos, registry).await;
                });
            }
            Err(e) => {
                tracing::error!("failed to accept connection: {}", e);
            }
        }
    }
}
