use crate::config::Config;
use crate::error::{ChemkgError, Result};
use crate::graphdb::Repository;
use crate::services::{
    self, CompoundRoleReaction, CompoundRoleStats, CompoundSelector, FindPathsOptions, ReactionSearchFilters,
};
use crate::sparql::build_multi_set_path_query;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// JSON API over the knowledge graph services
pub struct ApiServer {
    state: AppState,
    allowed_origins: Vec<String>,
}

#[derive(Clone)]
struct AppState {
    repo: Repository,
    default_max_steps: usize,
}

impl ApiServer {
    pub fn new(repo: Repository, config: &Config) -> Self {
        Self {
            state: AppState {
                repo,
                default_max_steps: config.paths.default_max_steps,
            },
            allowed_origins: config.http_server.allowed_origins.clone(),
        }
    }

    /// Run the HTTP server
    pub async fn run(&self, port: u16) -> Result<()> {
        let app = self.create_router();

        let addr = format!("127.0.0.1:{}", port);
        log::info!("Starting chemkg API on http://{}", addr);
        log::info!("Health check: http://{}/health", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            let message = if e.kind() == std::io::ErrorKind::AddrInUse {
                format!(
                    "Port {} is already in use. Stop the other process or set http_server.port in config.toml.",
                    port
                )
            } else {
                format!("Failed to bind to {}: {}", addr, e)
            };
            ChemkgError::Io(std::io::Error::new(e.kind(), message))
        })?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ChemkgError::Io(std::io::Error::new(std::io::ErrorKind::Other, format!("HTTP server error: {}", e))))?;

        Ok(())
    }

    fn create_router(&self) -> Router {
        // Build CORS layer. No configured origins means any origin.
        let cors = if self.allowed_origins.is_empty() {
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        log::warn!("Ignoring invalid allowed origin: {}", o);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(handle_health))
            .route("/api/stats", get(handle_stats))
            .route("/api/solvents/top", get(handle_top_solvents))
            .route("/api/reactions/recent", get(handle_recent_reactions))
            .route("/api/reactions/search", get(handle_search_reactions))
            .route("/api/reactions/:id/participants", get(handle_reaction_participants))
            .route("/api/compounds/popular", get(handle_popular_compounds))
            .route("/api/compounds/search", get(handle_search_compounds))
            .route("/api/compounds/roles", get(handle_compound_roles))
            .route("/api/paths", post(handle_find_paths))
            .route("/api/paths/detailed", post(handle_detailed_paths))
            .route("/api/paths/query", post(handle_path_query))
            .fallback(handle_not_found)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
            .with_state(self.state.clone())
    }
}

/// Service error rendered as `{"error": kind, "message": text}`
struct ApiError(ChemkgError);

impl From<ChemkgError> for ApiError {
    fn from(e: ChemkgError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChemkgError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ChemkgError::EngineQueryFailed(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("API request failed: {}", self.0);
        } else {
            log::warn!("API request rejected: {}", self.0);
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.0.kind(),
                "message": self.0.to_string()
            })),
        )
            .into_response()
    }
}

// Extractor rejections (bad body, query string or path) become 400s in the
// same JSON shape as service errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ChemkgError::InvalidArgument(format!("Invalid JSON body: {}", rejection.body_text())))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(ChemkgError::InvalidArgument(format!("Invalid query string: {}", rejection.body_text())))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(ChemkgError::InvalidArgument(format!("Invalid path: {}", rejection.body_text())))
    }
}

#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
struct ApiQuery<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
struct ApiPath<T>(T);

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Handle health check endpoint
async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "chemkg",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
        .into_response()
}

async fn handle_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "not_found",
            "message": "No such route"
        })),
    )
        .into_response()
}

async fn handle_stats(State(state): State<AppState>) -> ApiResult<services::DashboardStats> {
    Ok(Json(services::get_dashboard_stats(&state.repo).await?))
}

async fn handle_top_solvents(State(state): State<AppState>) -> ApiResult<Vec<services::TopSolvent>> {
    Ok(Json(services::get_top_solvents(&state.repo).await?))
}

async fn handle_recent_reactions(State(state): State<AppState>) -> ApiResult<Vec<services::RecentReaction>> {
    Ok(Json(services::get_recent_reactions(&state.repo).await?))
}

async fn handle_popular_compounds(State(state): State<AppState>) -> ApiResult<Vec<services::PopularCompound>> {
    Ok(Json(services::get_popular_compounds(&state.repo).await?))
}

#[derive(Debug, Deserialize)]
struct CompoundSearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn handle_search_compounds(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CompoundSearchParams>,
) -> ApiResult<Vec<services::CompoundSearchResult>> {
    let limit = params.limit.unwrap_or(services::compound::DEFAULT_SEARCH_LIMIT);
    Ok(Json(services::search_compounds(&state.repo, &params.q, limit).await?))
}

#[derive(Debug, Deserialize)]
struct CompoundRolesParams {
    iri: Option<String>,
    identifier: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompoundRolesResponse {
    stats: Option<CompoundRoleStats>,
    reactions: Vec<CompoundRoleReaction>,
}

async fn handle_compound_roles(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CompoundRolesParams>,
) -> ApiResult<CompoundRolesResponse> {
    // IRI wins when both are given
    let selector = match (params.iri, params.identifier) {
        (Some(iri), _) if !iri.trim().is_empty() => CompoundSelector::Iri(iri),
        (_, Some(id)) if !id.trim().is_empty() => CompoundSelector::Identifier(id.trim().to_string()),
        _ => {
            return Err(ChemkgError::InvalidArgument("either iri or identifier is required".to_string()).into());
        }
    };

    let (stats, reactions) = tokio::try_join!(
        services::get_compound_role_stats(&state.repo, &selector),
        services::get_compound_role_reactions(&state.repo, &selector),
    )?;

    Ok(Json(CompoundRolesResponse { stats, reactions }))
}

#[derive(Debug, Deserialize)]
struct ReactionSearchParams {
    text: Option<String>,
    reactant: Option<String>,
    product: Option<String>,
    catalyst: Option<bool>,
    solvent: Option<bool>,
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn handle_search_reactions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ReactionSearchParams>,
) -> ApiResult<Vec<services::ReactionSearchResult>> {
    let defaults = ReactionSearchFilters::default();
    let filters = ReactionSearchFilters {
        text: params.text,
        reactant: params.reactant,
        product: params.product,
        require_catalyst: params.catalyst,
        require_solvent: params.solvent,
        limit: params.limit.unwrap_or(defaults.limit),
        offset: params.offset.unwrap_or(defaults.offset),
    };
    Ok(Json(services::search_reactions(&state.repo, &filters).await?))
}

async fn handle_reaction_participants(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Vec<services::ReactionParticipant>> {
    Ok(Json(services::get_reaction_participants(&state.repo, &id).await?))
}

/// Body shared by the path endpoints. `max_steps` falls back to
/// `paths.default_max_steps`.
#[derive(Debug, Deserialize)]
struct PathRequest {
    starts: Vec<String>,
    targets: Vec<String>,
    max_steps: Option<usize>,
    #[serde(default)]
    shortest_only: bool,
}

impl PathRequest {
    fn max_steps(&self, state: &AppState) -> usize {
        self.max_steps.unwrap_or(state.default_max_steps)
    }
}

async fn handle_find_paths(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PathRequest>,
) -> ApiResult<Vec<services::PathSummary>> {
    let max_steps = req.max_steps(&state);
    let options = FindPathsOptions {
        starts: req.starts,
        targets: req.targets,
        max_steps,
        shortest_only: req.shortest_only,
    };
    Ok(Json(services::find_paths(&state.repo, &options).await?))
}

async fn handle_detailed_paths(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PathRequest>,
) -> ApiResult<Vec<services::DetailedPath>> {
    let max_steps = req.max_steps(&state);
    Ok(Json(
        services::get_multi_set_paths(&state.repo, &req.starts, &req.targets, max_steps).await?,
    ))
}

#[derive(Debug, Serialize)]
struct PathQueryResponse {
    query: String,
}

async fn handle_path_query(State(state): State<AppState>, ApiJson(req): ApiJson<PathRequest>) -> ApiResult<PathQueryResponse> {
    let max_steps = req.max_steps(&state);
    let query = build_multi_set_path_query(&req.starts, &req.targets, max_steps)?;
    Ok(Json(PathQueryResponse { query }))
}
