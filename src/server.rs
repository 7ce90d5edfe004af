//! HTTP surface for the review harness.
//!
//! Exposes the pipeline, the report browser, the Q&A pass-through, and the
//! flat-file user gate as a small JSON API. Collaborator handles (model
//! clients, index, report store) are constructed once at startup and
//! shared through [`AppState`]; handlers never build their own clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/reviews` | Clone a repository and run the review pipeline |
//! | `GET`  | `/reports` | List saved reports for a scope |
//! | `GET`  | `/reports/{n}` | Fetch one report by sequence id |
//! | `POST` | `/ask` | Ask a question over the indexed reviews |
//! | `POST` | `/users/register` | Register a user |
//! | `POST` | `/users/login` | Verify credentials |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! # Concurrency
//!
//! A review run executes inline in its request handler. Runs against the
//! same scope are not locked; callers serialize them.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser
//! front ends.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::clone;
use crate::collect;
use crate::config::Config;
use crate::embedding::{create_embedder, Embedder};
use crate::index::ReviewIndex;
use crate::llm::{OllamaGenerator, TextGenerator};
use crate::models::{ReviewRecord, RunResult, ScopeKey};
use crate::progress::NoProgress;
use crate::qa;
use crate::reports::{ReportReadError, ReportStore};
use crate::review::{run_review, RunOptions};
use crate::users::{UserStore, UserStoreError};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    generator: Arc<dyn TextGenerator>,
    embedder: Arc<dyn Embedder>,
    index: Arc<ReviewIndex>,
    reports: Arc<ReportStore>,
    users: Arc<UserStore>,
}

/// Start the HTTP server on the configured bind address.
///
/// Builds every collaborator once — generation client, embedder, index
/// pool, report store, user store — and serves until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let pool = crate::db::connect(config).await?;
    crate::migrate::apply_schema(&pool).await?;

    let state = AppState {
        generator: Arc::new(OllamaGenerator::new(&config.llm)?),
        embedder: Arc::from(create_embedder(&config.embedding)?),
        index: Arc::new(ReviewIndex::new(pool)),
        reports: Arc::new(ReportStore::new(
            &config.store.data_root,
            &config.store.user_root,
        )),
        users: Arc::new(UserStore::new(&config.store.user_root)),
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/reviews", post(handle_run_review))
        .route("/reports", get(handle_list_reports))
        .route("/reports/{n}", get(handle_get_report))
        .route("/ask", post(handle_ask))
        .route("/users/register", post(handle_register))
        .route("/users/login", post(handle_login))
        .layer(cors)
        .with_state(state);

    println!("review server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<ReportReadError> for AppError {
    fn from(err: ReportReadError) -> Self {
        match err {
            ReportReadError::Missing(_) => not_found(err.to_string()),
            _ => internal(err.to_string()),
        }
    }
}

// ============ Scope parameters ============

/// Optional user/project scope carried by query string or request body.
#[derive(Debug, Default, Deserialize)]
struct ScopeParams {
    user: Option<String>,
    project: Option<String>,
}

impl ScopeParams {
    fn into_scope(self) -> ScopeKey {
        ScopeKey::resolve(self.user, self.project)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /reviews ============

#[derive(Deserialize)]
struct RunReviewRequest {
    /// Repository URL to clone, or a local directory to review in place.
    repo_url: String,
    user: Option<String>,
    project: Option<String>,
}

#[derive(Serialize)]
struct RunReviewResponse {
    run_id: String,
    scope: String,
    total_files: usize,
    completed: usize,
    failed: usize,
    timed_out: usize,
}

async fn handle_run_review(
    State(state): State<AppState>,
    Json(req): Json<RunReviewRequest>,
) -> Result<Json<RunReviewResponse>, AppError> {
    if req.repo_url.trim().is_empty() {
        return Err(bad_request("repo_url must not be empty"));
    }

    // Default the project scope to the repository name so multi-user runs
    // land under a meaningful directory.
    let project = req
        .project
        .or_else(|| req.user.as_ref().map(|_| clone::project_name(&req.repo_url)));
    let scope = ScopeKey::resolve(req.user, project);

    let result = execute_review(&state, &req.repo_url, scope.clone())
        .await
        .map_err(|e| bad_request(format!("review run failed: {:#}", e)))?;

    Ok(Json(RunReviewResponse {
        run_id: result.run_id.to_string(),
        scope: scope.collection(),
        total_files: result.total_files,
        completed: result.completed,
        failed: result.failed,
        timed_out: result.timed_out,
    }))
}

/// Clone (or accept a local root), collect, and run the pipeline.
/// Shared between the HTTP handler and any future trigger surface.
async fn execute_review(
    state: &AppState,
    target: &str,
    scope: ScopeKey,
) -> anyhow::Result<RunResult> {
    let root = if clone::looks_like_url(target) {
        clone::clone_repo(target, &state.config.store.clone_dir)?
    } else {
        std::path::PathBuf::from(target)
    };

    let files = collect::collect(&root, &state.config.review.extensions)?;

    let opts = RunOptions {
        scope,
        prompt_template: state.config.review.prompt_template.clone(),
        max_content_chars: state.config.review.max_content_chars,
        per_call_timeout: std::time::Duration::from_secs(
            state.config.review.per_call_timeout_secs,
        ),
    };

    run_review(
        files,
        &opts,
        state.generator.clone(),
        state.embedder.as_ref(),
        &state.index,
        &state.reports,
        &NoProgress,
    )
    .await
}

// ============ GET /reports ============

#[derive(Serialize)]
struct ReportListResponse {
    scope: String,
    reports: Vec<ReviewRecord>,
}

async fn handle_list_reports(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<ReportListResponse>, AppError> {
    let scope = params.into_scope();
    let reports = state.reports.list(&scope)?;
    Ok(Json(ReportListResponse {
        scope: scope.collection(),
        reports,
    }))
}

async fn handle_get_report(
    State(state): State<AppState>,
    Path(n): Path<u32>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<ReviewRecord>, AppError> {
    let scope = params.into_scope();
    let path = state.reports.report_path(&scope, n);
    let record = state.reports.load(&path)?;
    Ok(Json(record))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    top_k: Option<usize>,
    user: Option<String>,
    project: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let scope = ScopeKey::resolve(req.user, req.project);
    let top_k = req.top_k.unwrap_or(qa::DEFAULT_TOP_K);

    let answer = qa::answer_question(
        &scope,
        &req.question,
        top_k,
        state.generator.as_ref(),
        state.embedder.as_ref(),
        &state.index,
    )
    .await
    .map_err(|e| bad_request(e.to_string()))?;

    Ok(Json(AskResponse { answer }))
}

// ============ POST /users/register, /users/login ============

#[derive(Deserialize)]
struct CredentialsRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<OkResponse>, AppError> {
    match state.users.register(&req.username, &req.password) {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e @ UserStoreError::Duplicate(_))
        | Err(e @ UserStoreError::EmptyUsername)
        | Err(e @ UserStoreError::EmptyPassword) => Err(bad_request(e.to_string())),
        Err(e) => Err(internal(e.to_string())),
    }
}

async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<OkResponse>, AppError> {
    let ok = state
        .users
        .verify(&req.username, &req.password)
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(OkResponse { ok }))
}
