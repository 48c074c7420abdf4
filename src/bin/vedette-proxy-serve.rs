//! Plain-HTTP version of the vedette proxy.
//!
//! This executable binds the configured port and serves the router directly,
//! which is what you want locally and in container deployments. The cloud
//! flavor, `vedette-proxy-lambda`, serves the very same router behind AWS
//! API Gateway.

use std::net::SocketAddr;
use std::sync::Arc;

use vedette_proxy::{routes, Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let services = Services::init()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], services.config().port));
    let app = routes::router(Arc::new(services))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("vedette proxy listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
