use anyhow::Result;
use axum::Router;
use clap::Parser;
use engine::MatchMode;
use server::build_app;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Products JSONL corpus path
    #[arg(long, default_value = "./products.jsonl")]
    products: String,
    /// Candidate retrieval mode: "or" (any token) or "and" (all tokens)
    #[arg(long, default_value = "or")]
    mode: String,
    /// Per-request search deadline in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mode = match args.mode.as_str() {
        "and" | "all" => MatchMode::All,
        _ => MatchMode::Any,
    };
    let app: Router = build_app(
        &args.index,
        &args.products,
        mode,
        Duration::from_secs(args.timeout_secs),
    )?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
