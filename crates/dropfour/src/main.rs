//! Server binary: bind an address and run until terminated.

use dropfour::{DropfourError, DropfourServer, MemoryStats};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DropfourError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DROPFOUR_ADDR").ok())
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let server = DropfourServer::<MemoryStats>::builder()
        .bind(&addr)
        .build(MemoryStats::new())
        .await?;
    server.run().await
}
