mod etag_middleware;
mod health;
mod page;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tracing::{error, info, warn};

use crate::{
    caching::CacheKey,
    env::EnvConfig,
    health::HealthCheckable,
    log,
    supply::{SupplyError, SupplyService, SupplySnapshot},
};

pub use health::ServeHealth;
pub use page::format_thousands;

const CACHE_CONTROL: &str = "public, max-age=60";

pub type StateExtension = Extension<Arc<State>>;

pub struct State {
    pub health: ServeHealth,
    pub supply: SupplyService,
    pub token_contract: String,
    pub token_symbol: String,
}

fn error_response(err: &SupplyError) -> Response {
    match err {
        SupplyError::Upstream(err) => {
            warn!(%err, "answering with service unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "Error fetching data").into_response()
        }
        SupplyError::Anomaly(anomaly) => {
            error!(%anomaly, "refusing to serve inconsistent supply");
            (StatusCode::INTERNAL_SERVER_ERROR, "Inconsistent supply data").into_response()
        }
    }
}

fn cacheable(body: impl IntoResponse) -> Response {
    ([(header::CACHE_CONTROL, CACHE_CONTROL)], body).into_response()
}

/// Every route reads the same key, so one fetch pass serves them all.
async fn get_snapshot(state: &State) -> Result<Arc<SupplySnapshot>, Response> {
    match state.supply.get_snapshot(&CacheKey::Supply).await {
        Ok(snapshot) => {
            state.health.set_supply_served();
            Ok(snapshot)
        }
        Err(err) => {
            state.health.set_supply_failed();
            Err(error_response(&err))
        }
    }
}

async fn supply_page(Extension(state): StateExtension) -> Response {
    match get_snapshot(&state).await {
        Ok(snapshot) => cacheable(Html(page::render_supply_page(
            &snapshot,
            &state.token_symbol,
            &state.token_contract,
        ))),
        Err(response) => response,
    }
}

async fn circulating_supply(Extension(state): StateExtension) -> Response {
    match get_snapshot(&state).await {
        Ok(snapshot) => cacheable(snapshot.metrics.circulating_supply.to_string()),
        Err(response) => response,
    }
}

async fn total_supply(Extension(state): StateExtension) -> Response {
    match get_snapshot(&state).await {
        Ok(snapshot) => cacheable(snapshot.metrics.total_supply_minus_burn.to_string()),
        Err(response) => response,
    }
}

async fn burnt_tokens(Extension(state): StateExtension) -> Response {
    match get_snapshot(&state).await {
        Ok(snapshot) => cacheable(format_thousands(snapshot.metrics.burnt_tokens)),
        Err(response) => response,
    }
}

async fn supply_snapshot(Extension(state): StateExtension) -> Response {
    match get_snapshot(&state).await {
        Ok(snapshot) => cacheable(Json(snapshot.as_ref())),
        Err(response) => response,
    }
}

pub fn make_router(state: Arc<State>) -> Router {
    Router::new()
        .route("/", get(supply_page))
        .route("/supply", get(circulating_supply))
        .route("/totalsupply", get(total_supply))
        .route("/burn", get(burnt_tokens))
        .route("/api/supply", get(supply_snapshot))
        .route(
            "/healthz",
            get(|state: StateExtension| async move {
                state.health.health_status().into_response()
            }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(etag_middleware::middleware_fn))
                .layer(CompressionLayer::new())
                .layer(Extension(state)),
        )
}

pub async fn start_server() -> anyhow::Result<()> {
    log::init();

    let started_on = Utc::now();

    let config = EnvConfig::from_env()?;
    let supply = SupplyService::from_env_config(&config)?;

    info!(
        addresses = supply.registry().len(),
        token_contract = %config.token_contract,
        cache_ttl = ?config.cache_ttl,
        "supply service ready"
    );

    let shared_state = Arc::new(State {
        health: ServeHealth::new(started_on),
        supply,
        token_contract: config.token_contract.clone(),
        token_symbol: config.token_symbol.clone(),
    });

    let app = make_router(shared_state);

    let socket_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(port = config.port, "server listening");
    axum::Server::bind(&socket_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
