//! HTTP API server

use crate::config::PersonalizationConfig;
use crate::error::PharosError;
use crate::personalization::{PersonalizationEngine, RankParams};
use crate::settings::resolver::EffectiveSettings;
use crate::settings::{ScopeOverride, SettingsStore};
use crate::types::{Candidate, FeedbackEvent, FeedId, Pattern, RankedArticle, Scope, UserId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 7040).into(),
        }
    }
}

/// API server state
#[derive(Clone)]
struct AppState {
    settings: Arc<SettingsStore>,
    engine: Arc<PersonalizationEngine>,
    defaults: PersonalizationConfig,
}

/// Error wrapper mapping domain errors to HTTP responses.
///
/// Validation errors surface synchronously to the caller; they are never
/// coerced into a default, because settings values govern
/// resource-consuming background behavior.
#[derive(Debug)]
struct ApiError(PharosError);

impl From<PharosError> for ApiError {
    fn from(err: PharosError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PharosError::OutOfBounds { .. } | PharosError::InvalidRecencyParameters(_) => {
                StatusCode::BAD_REQUEST
            }
            PharosError::InvalidId(_) => StatusCode::BAD_REQUEST,
            PharosError::UnknownScope(_) | PharosError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new API server over the shared stores
    pub fn new(
        config: ApiServerConfig,
        settings: Arc<SettingsStore>,
        engine: Arc<PersonalizationEngine>,
        defaults: PersonalizationConfig,
    ) -> Self {
        Self {
            config,
            state: AppState {
                settings,
                engine,
                defaults,
            },
        }
    }

    /// Build router
    fn build_router(state: AppState) -> Router {
        Router::new()
            // Settings
            .route(
                "/feeds/:feed_id/effective-settings",
                get(effective_settings_handler),
            )
            .route(
                "/settings/:scope/:scope_id",
                put(put_settings_handler)
                    .get(get_settings_handler)
                    .delete(delete_settings_handler),
            )
            // Personalization
            .route("/feedback", post(feedback_handler))
            .route("/users/:user_id/reset-learning", post(reset_learning_handler))
            .route("/users/:user_id/patterns", get(patterns_handler))
            .route("/rank", post(rank_handler))
            // Health check
            .route("/health", get(health_handler))
            // State
            .with_state(state)
            // Middleware
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start serving
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = Self::build_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!("API server listening on http://{}", self.config.addr);
        axum::serve(listener, router).await?;
        Ok(())
    }
}

fn parse_scope(raw: &str) -> Result<Scope, ApiError> {
    match Scope::parse(raw) {
        Some(Scope::System) | None => Err(ApiError(PharosError::UnknownScope(raw.to_string()))),
        Some(scope) => Ok(scope),
    }
}

/// Effective settings for one feed, with provenance per field
async fn effective_settings_handler(
    State(state): State<AppState>,
    Path(feed_id): Path<String>,
) -> ApiResult<Json<EffectiveSettings>> {
    let feed_id = FeedId::from_string(&feed_id).map_err(PharosError::from)?;
    let effective = state.settings.effective_for_feed(feed_id).await?;
    Ok(Json(effective))
}

/// Effective settings of one affected feed after a settings write
#[derive(Debug, Serialize)]
struct AffectedFeed {
    feed_id: FeedId,
    settings: EffectiveSettings,
}

#[derive(Debug, Serialize)]
struct SettingsWriteResponse {
    affected_feeds: Vec<AffectedFeed>,
}

async fn collect_affected(
    state: &AppState,
    scope: Scope,
    scope_id: &str,
) -> Result<SettingsWriteResponse, ApiError> {
    let feeds = state.settings.feeds_affected_by(scope, scope_id).await?;
    let mut affected_feeds = Vec::with_capacity(feeds.len());
    for feed in feeds {
        let settings = state.settings.effective_for_feed_record(&feed).await?;
        affected_feeds.push(AffectedFeed {
            feed_id: feed.id,
            settings,
        });
    }
    Ok(SettingsWriteResponse { affected_feeds })
}

/// Store a scope override; responds with effective settings of every
/// affected feed
async fn put_settings_handler(
    State(state): State<AppState>,
    Path((scope, scope_id)): Path<(String, String)>,
    Json(overrides): Json<ScopeOverride>,
) -> ApiResult<Json<SettingsWriteResponse>> {
    let scope = parse_scope(&scope)?;
    state
        .settings
        .put_override(scope, &scope_id, &overrides)
        .await?;

    let response = collect_affected(&state, scope, &scope_id).await?;
    Ok(Json(response))
}

/// Raw (unresolved) override record for a scope; null when nothing is set
async fn get_settings_handler(
    State(state): State<AppState>,
    Path((scope, scope_id)): Path<(String, String)>,
) -> ApiResult<Json<Option<ScopeOverride>>> {
    let scope = parse_scope(&scope)?;
    let overrides = state.settings.get_override(scope, &scope_id).await?;
    Ok(Json(overrides))
}

/// Revert a scope to inherit everything
async fn delete_settings_handler(
    State(state): State<AppState>,
    Path((scope, scope_id)): Path<(String, String)>,
) -> ApiResult<Json<SettingsWriteResponse>> {
    let scope = parse_scope(&scope)?;
    state.settings.clear_override(scope, &scope_id).await?;

    let response = collect_affected(&state, scope, &scope_id).await?;
    Ok(Json(response))
}

/// Ingest one feedback event
async fn feedback_handler(
    State(state): State<AppState>,
    Json(event): Json<FeedbackEvent>,
) -> ApiResult<StatusCode> {
    debug!(
        "Feedback {} from user {} for article {}",
        event.kind, event.user_id, event.article_id
    );
    state.engine.ingest(&event).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Delete all learned patterns for a user
async fn reset_learning_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::from_string(&user_id).map_err(PharosError::from)?;
    let deleted = state.engine.reset_learning(user_id).await?;
    info!("Reset learning for user {} ({} patterns)", user_id, deleted);
    Ok(StatusCode::NO_CONTENT)
}

/// A user's learned patterns, strongest first
async fn patterns_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Pattern>>> {
    let user_id = UserId::from_string(&user_id).map_err(PharosError::from)?;
    let patterns = state.engine.patterns(user_id).await?;
    Ok(Json(patterns))
}

#[derive(Debug, Deserialize)]
struct RankRequest {
    user_id: UserId,
    candidates: Vec<Candidate>,
    /// Defaults to the configured recency weight when omitted
    recency_weight: Option<f64>,
    /// Defaults to the configured decay period when omitted
    recency_decay_days: Option<u32>,
}

#[derive(Debug, Serialize)]
struct RankResponse {
    articles: Vec<RankedArticle>,
    personalization_active: bool,
}

/// Rank candidates for a user, returning per-article score components
async fn rank_handler(
    State(state): State<AppState>,
    Json(request): Json<RankRequest>,
) -> ApiResult<Json<RankResponse>> {
    let params = RankParams {
        recency_weight: request
            .recency_weight
            .unwrap_or(state.defaults.default_recency_weight),
        recency_decay_days: request
            .recency_decay_days
            .unwrap_or(state.defaults.default_recency_decay_days),
    };

    let personalization_active = state.engine.is_active(request.user_id).await?;
    let articles = state
        .engine
        .rank_for_user(request.user_id, &request.candidates, &params, Utc::now())
        .await?;

    Ok(Json(RankResponse {
        articles,
        personalization_active,
    }))
}

/// Health check handler
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::catalog::{Catalog, FeedRecord};
    use crate::storage::test_utils::test_db;
    use crate::types::{ArticleId, FeedbackKind};

    async fn test_state() -> (AppState, FeedId, UserId) {
        let db = test_db().await;

        let catalog = Catalog::new(db.clone());
        let user = UserId::new();
        catalog.register_user(user).await.unwrap();

        let feed = FeedRecord {
            id: FeedId::new(),
            user_id: user,
            category_id: None,
            title: "Example".to_string(),
            url: "https://example.com/rss".to_string(),
        };
        catalog.register_feed(&feed).await.unwrap();

        let defaults = PersonalizationConfig::default();
        let state = AppState {
            settings: Arc::new(SettingsStore::new(db.clone(), catalog)),
            engine: Arc::new(PersonalizationEngine::new(db, &defaults)),
            defaults,
        };
        (state, feed.id, user)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = health_handler().await;
        assert_eq!(response.0.status, "ok");
        assert_eq!(response.0.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_effective_settings_roundtrip() {
        let (state, feed_id, _) = test_state().await;

        let overrides = ScopeOverride {
            refresh_interval_minutes: Some(30),
            ..Default::default()
        };
        let response = put_settings_handler(
            State(state.clone()),
            Path(("feed".to_string(), feed_id.to_string())),
            Json(overrides),
        )
        .await
        .unwrap();
        assert_eq!(response.0.affected_feeds.len(), 1);
        assert_eq!(
            response.0.affected_feeds[0]
                .settings
                .refresh_interval_minutes
                .value,
            30
        );

        let effective =
            effective_settings_handler(State(state), Path(feed_id.to_string()))
                .await
                .unwrap();
        assert_eq!(effective.0.refresh_interval_minutes.value, 30);
        assert_eq!(effective.0.refresh_interval_minutes.source, Scope::Feed);
    }

    #[tokio::test]
    async fn test_put_rejects_out_of_bounds() {
        let (state, feed_id, _) = test_state().await;

        let overrides = ScopeOverride {
            refresh_interval_minutes: Some(2),
            ..Default::default()
        };
        let result = put_settings_handler(
            State(state),
            Path(("feed".to_string(), feed_id.to_string())),
            Json(overrides),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_put_rejects_system_scope() {
        let (state, _, _) = test_state().await;

        let result = put_settings_handler(
            State(state),
            Path(("system".to_string(), "system".to_string())),
            Json(ScopeOverride::default()),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_feedback_then_rank() {
        let (state, _, user) = test_state().await;

        for _ in 0..10 {
            let status = feedback_handler(
                State(state.clone()),
                Json(FeedbackEvent {
                    user_id: user,
                    article_id: ArticleId::new(),
                    keywords: vec!["rust".to_string()],
                    kind: FeedbackKind::ThumbsUp,
                    occurred_at: Utc::now(),
                }),
            )
            .await
            .unwrap();
            assert_eq!(status, StatusCode::ACCEPTED);
        }

        let now = Utc::now();
        let response = rank_handler(
            State(state),
            Json(RankRequest {
                user_id: user,
                candidates: vec![
                    Candidate {
                        article_id: ArticleId::new(),
                        published_at: now,
                        keywords: vec!["cooking".to_string()],
                        base_score: 0.5,
                    },
                    Candidate {
                        article_id: ArticleId::new(),
                        published_at: now,
                        keywords: vec!["rust".to_string()],
                        base_score: 0.5,
                    },
                ],
                recency_weight: Some(0.2),
                recency_decay_days: None,
            }),
        )
        .await
        .unwrap();

        assert!(response.0.personalization_active);
        let top = &response.0.articles[0];
        assert!(top.pattern_score > 0.0);
        let expected = 0.8 * (top.base_score + top.pattern_score) + 0.2 * top.recency_score;
        assert!((top.final_score - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rank_rejects_bad_params() {
        let (state, _, user) = test_state().await;

        let result = rank_handler(
            State(state),
            Json(RankRequest {
                user_id: user,
                candidates: vec![],
                recency_weight: Some(1.5),
                recency_decay_days: Some(7),
            }),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reset_learning_endpoint() {
        let (state, _, user) = test_state().await;

        feedback_handler(
            State(state.clone()),
            Json(FeedbackEvent {
                user_id: user,
                article_id: ArticleId::new(),
                keywords: vec!["rust".to_string()],
                kind: FeedbackKind::ThumbsUp,
                occurred_at: Utc::now(),
            }),
        )
        .await
        .unwrap();

        let status = reset_learning_handler(State(state.clone()), Path(user.to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let patterns = patterns_handler(State(state), Path(user.to_string()))
            .await
            .unwrap();
        assert!(patterns.0.is_empty());
    }
}
