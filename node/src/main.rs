//! Mandi marketplace node.
//!
//! Serves the supply/order lifecycle engines, the payment gate and the
//! traceability reconstructor over HTTP. All state lives in the in-memory
//! versioned store; clients display fetched snapshots and re-fetch after
//! every mutating call.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mandi_node::routes;
use mandi_node::store::MarketStore;

#[derive(Parser)]
#[command(name = "mandi-node", about = "Millet supply-chain marketplace node")]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// HTTP port to listen on.
    #[arg(long, default_value_t = 3100)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = Arc::new(MarketStore::new());
    let app = routes::router(store);

    let addr = format!("{}:{}", cli.bind, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mandi node listening");
    axum::serve(listener, app).await?;
    Ok(())
}
