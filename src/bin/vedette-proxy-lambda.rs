//! "Proxy event" version of the vedette proxy.
//!
//! This executable expects to be interacted with according to AWS API
//! Gateway's "proxy event" protocol. `lambda_http` translates those events
//! into the same HTTP requests the plain server sees, so the router is
//! shared wholesale. Logging goes to stderr for CloudWatch; leave
//! `VEDETTE_LOG_PATH` unset here.

use lambda_http::{run, Error};
use std::sync::Arc;

use vedette_proxy::{routes, Services};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let services = Services::init()?;
    let app = routes::router(Arc::new(services))?;
    run(app).await
}
