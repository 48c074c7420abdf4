//! The HTTP surface of the proxy.
//!
//! One router, served two ways: locally through `axum::serve` and on Lambda
//! through `lambda_http`. Route handling follows the two-tier error policy:
//! a bad request parameter is the caller's problem (400, and only the limit
//! variant can produce one); anything that goes wrong upstream is a generic
//! French 500 with the real cause logged server-side only.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::present;
use crate::vedette::FeaturedPageError;
use crate::Services;

/// Build the proxy's router. The CORS layer admits exactly the configured
/// front-end origin; anything not matching a route falls through to the
/// French 404.
pub fn router(services: Arc<Services>) -> anyhow::Result<Router> {
    let origin: HeaderValue = services.config().frontend_origin.parse()?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE]);

    Ok(Router::new()
        .route("/api/vedette", get(all_featured))
        .route("/api/vedette/:scope", get(scoped_featured))
        .route("/api/vedette/:limit/:scope", get(limited_featured))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(services))
}

enum ApiError {
    InvalidParam(&'static str),
    Internal(FeaturedPageError),
}

impl From<FeaturedPageError> for ApiError {
    fn from(err: FeaturedPageError) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidParam(name) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Paramètre {name} invalide") })),
            )
                .into_response(),

            ApiError::Internal(err) => {
                error!("featured-items aggregation failed: {err:?}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Erreur serveur" })),
                )
                    .into_response()
            }
        }
    }
}

/// `GET /api/vedette` -- every featured item, globally scoped, shuffled.
async fn all_featured(State(services): State<Arc<Services>>) -> Result<Json<Value>, ApiError> {
    let mut items = services.featured_items(None).await?;
    present::shuffle(&mut items);

    Ok(Json(json!({ "items": items })))
}

/// `GET /api/vedette/:scope` -- featured items within one collection or
/// community, shuffled, each item tagged with the scope.
async fn scoped_featured(
    State(services): State<Arc<Services>>,
    Path(scope): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut items = services.featured_items(Some(&scope)).await?;
    present::shuffle(&mut items);

    Ok(Json(json!({ "items": items })))
}

/// `GET /api/vedette/:limit/:scope` -- same as the scoped variant, truncated
/// to `limit` items after shuffling. `totalCount` reports how many items
/// there were before truncation.
async fn limited_featured(
    State(services): State<Arc<Services>>,
    Path((limit, scope)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let limit: usize = limit.parse().map_err(|_| ApiError::InvalidParam("limit"))?;

    let mut items = services.featured_items(Some(&scope)).await?;
    present::shuffle(&mut items);

    let total = items.len();
    let items = present::limit(items, limit);

    Ok(Json(json!({ "items": items, "totalCount": total })))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "service": env!("CARGO_PKG_NAME"),
    }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route non trouvée" })),
    )
}
