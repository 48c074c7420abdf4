//! "Oneshot" version of the vedette proxy.
//!
//! This executable runs one aggregation based on an optional scope argument
//! and prints the resulting JSON to stdout. No server, no shuffle -- items
//! come out in upstream page order, which makes this the handy flavor for
//! eyeballing what the upstream actually returns.

use serde_json::json;
use std::env;

use vedette_proxy::Services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = env::args();
    args.next(); // skip argv[0]
    let scope = args.next();

    let services = Services::init()?;
    let items = services.featured_items(scope.as_deref()).await?;

    serde_json::to_writer(std::io::stdout().lock(), &json!({ "items": items }))?;
    Ok(())
}
