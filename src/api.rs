//! HTTP API Server for the Bull Feed
//!
//! Serves ranked pages over the stored snapshot, stateless ranking of a
//! caller-supplied snapshot, snapshot replacement and reactions.

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::{
    record_reaction, ContentRecord, ContentTypeFilter, FeedEngine, FeedPage, FeedQuery,
    FeedStrategy, MarketFilter, ReactionType, Snapshot, SnapshotStore,
};

/// Shared application state
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: FeedEngine,
    pub store: SnapshotStore,
    #[cfg(feature = "prometheus")]
    pub prometheus: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: SnapshotStore) -> Self {
        Self {
            engine: FeedEngine::from_config(&config.feed),
            config,
            store,
            #[cfg(feature = "prometheus")]
            prometheus: None,
        }
    }

    #[cfg(feature = "prometheus")]
    pub fn with_prometheus(mut self, handle: metrics_exporter_prometheus::PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    fn resolve_strategy(&self, raw: Option<&str>) -> Result<FeedStrategy> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.parse(),
            None => Ok(self.config.feed.default_strategy),
        }
    }
}

/// Query params for the feed endpoint
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub strategy: Option<String>,
    /// Comma separated markets, `all` for every market
    pub markets: Option<String>,
    /// Comma separated content types
    pub types: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Request body for stateless ranking
#[derive(Debug, Deserialize)]
pub struct RankRequest {
    #[serde(default)]
    pub records: Vec<Value>,
    pub strategy: Option<String>,
    #[serde(default)]
    pub markets: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
    /// RFC 3339 reference instant for the hot tab; defaults to now
    pub now: Option<String>,
}

/// Request body for reactions
#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub reaction: String,
}

/// Response for feed endpoints
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub items: Vec<ContentRecord>,
    pub total: usize,
    pub has_more: bool,
    pub strategy: FeedStrategy,
}

impl From<FeedPage> for FeedResponse {
    fn from(page: FeedPage) -> Self {
        Self {
            items: page.items,
            total: page.total,
            has_more: page.has_more,
            strategy: page.strategy,
        }
    }
}

/// Response for snapshot replacement
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub records: usize,
    pub skipped: usize,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub records: usize,
}

/// Build the router with all middleware applied
pub fn router(state: Arc<AppState>) -> Router {
    let api = &state.config.api;

    let mut app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Feed endpoints
        .route("/api/v1/feed", get(get_feed))
        .route("/api/v1/feed/rank", post(rank_records))
        .route("/api/v1/feed/:id/reactions", post(react))
        // Snapshot management
        .route("/api/v1/snapshot", put(replace_snapshot));

    #[cfg(feature = "prometheus")]
    {
        app = app.route("/metrics", get(render_metrics));
    }

    app = app
        .layer(DefaultBodyLimit::max(api.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(api.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if api.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app.with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn start_server<F>(state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", state.config.api.host, state.config.api.port);
    let app = router(state);

    info!("🚀 Starting Bull Feed API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(Error::internal)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::internal)?;

    Ok(())
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        records: state.store.len(),
    })
}

/// Ranked page over the stored snapshot
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>> {
    let query = FeedQuery {
        markets: match params.markets.as_deref() {
            Some(raw) => MarketFilter::parse_list(raw)?,
            None => MarketFilter::All,
        },
        content_types: match params.types.as_deref() {
            Some(raw) => ContentTypeFilter::parse_list(raw)?,
            None => ContentTypeFilter::All,
        },
        search: params.search.unwrap_or_default(),
        strategy: state.resolve_strategy(params.strategy.as_deref())?,
        offset: params.offset,
        limit: Some(params.limit.unwrap_or(state.config.feed.page_size)),
    };
    query.validate()?;

    let snapshot = state.store.load();
    let page = state.engine.select(&snapshot, &query, Utc::now());
    Ok(Json(page.into()))
}

/// Rank a caller-supplied snapshot without touching the stored one
async fn rank_records(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RankRequest>,
) -> Result<Json<FeedResponse>> {
    let now = match req.now.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| Error::InvalidTimestamp {
                value: raw.to_string(),
            })?,
        None => Utc::now(),
    };

    let query = FeedQuery {
        markets: MarketFilter::parse_items(req.markets.iter().map(String::as_str))?,
        content_types: ContentTypeFilter::parse_items(req.types.iter().map(String::as_str))?,
        search: req.search,
        strategy: state.resolve_strategy(req.strategy.as_deref())?,
        offset: req.offset,
        limit: req.limit,
    };
    query.validate()?;

    let snapshot = Snapshot::from_value(Value::Array(req.records))?;
    let page = state.engine.select(&snapshot.records, &query, now);
    Ok(Json(page.into()))
}

/// Replace the stored snapshot
async fn replace_snapshot(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<SnapshotResponse>> {
    let snapshot = Snapshot::from_value(body)?;
    let response = SnapshotResponse {
        records: snapshot.len(),
        skipped: snapshot.skipped,
    };

    state.store.replace(snapshot.records);
    info!(
        "📦 Snapshot replaced: {} records ({} skipped)",
        response.records, response.skipped
    );

    Ok(Json(response))
}

/// Count a reaction against a stored record
async fn react(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReactionRequest>,
) -> Result<Json<ContentRecord>> {
    let kind: ReactionType = req.reaction.parse()?;
    let weights = *state.engine.weights();

    state
        .store
        .update(&id, |record| record_reaction(record, kind, &weights))
        .map(Json)
        .ok_or_else(|| Error::not_found("analysis", id))
}

#[cfg(feature = "prometheus")]
async fn render_metrics(State(state): State<Arc<AppState>>) -> Result<String> {
    state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| Error::not_found("metrics recorder", "prometheus"))
}
