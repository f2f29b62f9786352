//! Standalone mock 3DEXPERIENCE platform for local development.
//!
//! Accepts `SERVICE_NAME=svc`, `SERVICE_SECRET=sec`, `ENOVIA_USER=alice` and
//! serves one document, so the CLI can be pointed at it with
//! `BASE_URL=http://localhost:4100`.

use mock_3dx::MockConfig;
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,mock_3dx=debug")),
        )
        .init();

    let port: u16 = std::env::var("MOCK_3DX_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4100);

    let config = MockConfig::default()
        .with_file("DOC-0001", "FILE-0001", b"hello from mock-3dx\n".to_vec())
        .with_file("DOC-0001", "FILE-0002", vec![0x01, 0x02]);

    let running = mock_3dx::spawn_on(&format!("0.0.0.0:{port}"), config).await?;
    info!(
        base_url = %running.base_url,
        service_name = "svc",
        user = "alice",
        "mock 3DEXPERIENCE platform listening"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
