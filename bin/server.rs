// Transit Insights - Web Server
// REST API with Axum: dataset slots + dashboard bundle

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use transit_insights::{
    load_source, parse_csv_reader, FileData, FilterSelection, HeatmapView, InsightsEngine,
    PipelineConfig, SourceKind,
};

#[derive(Parser, Debug)]
#[command(name = "transit-server")]
#[command(about = "HTTP API for the transit insights pipeline")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:3000", env = "TRANSIT_BIND")]
    bind: String,

    /// JSON file with extra column aliases and/or pass types
    #[arg(long, env = "TRANSIT_CONFIG")]
    config: Option<PathBuf>,

    /// Source files to load at start-up (detected by file name)
    files: Vec<PathBuf>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    files: Arc<Mutex<FileData>>,
    engine: Arc<InsightsEngine>,
}

impl AppState {
    fn new(engine: InsightsEngine, files: FileData) -> Self {
        Self {
            files: Arc::new(Mutex::new(files)),
            engine: Arc::new(engine),
        }
    }

    fn lock_files(&self) -> MutexGuard<'_, FileData> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Clone the slots under the lock; the pipeline runs outside it
    fn snapshot(&self) -> FileData {
        self.lock_files().clone()
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

fn parse_kind(kind: &str) -> Result<SourceKind, Response> {
    SourceKind::from_code(kind).ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown dataset '{}', expected tickets, servicios or validaciones", kind),
        )
    })
}

#[derive(Serialize)]
struct DatasetStatus {
    kind: SourceKind,
    name: String,
    rows: Option<usize>,
}

/// Slot overview: whether anything is loaded and whether the dashboard can run
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetsResponse {
    has_data: bool,
    complete: bool,
    slots: Vec<DatasetStatus>,
}

fn dataset_status(files: &FileData) -> DatasetsResponse {
    let slots = SourceKind::ALL
        .iter()
        .map(|kind| DatasetStatus {
            kind: *kind,
            name: kind.name().to_string(),
            rows: files.slot(*kind).map(Vec::len),
        })
        .collect();

    DatasetsResponse {
        has_data: files.has_data(),
        complete: files.is_complete(),
        slots,
    }
}

fn all() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeatmapQuery {
    #[serde(default = "all")]
    year: String,
    #[serde(default = "all")]
    month: String,
    #[serde(default = "all")]
    user_type: String,
    #[serde(default = "all")]
    route: String,
}

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    files: FileData,
    #[serde(default)]
    filters: FilterSelection,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/datasets - Which slots are loaded
async fn list_datasets(State(state): State<AppState>) -> impl IntoResponse {
    let files = state.lock_files();
    Json(ApiResponse::ok(dataset_status(&files)))
}

/// PUT /api/datasets/:kind - Replace one slot with a CSV body
async fn upload_dataset(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    body: String,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let records = match parse_csv_reader(body.as_bytes(), kind.code()) {
        Ok(records) => records,
        Err(e) => {
            warn!(source = kind.code(), "Rejected upload: {:#}", e);
            return error_response(StatusCode::BAD_REQUEST, format!("{:#}", e));
        }
    };

    let rows = records.len();
    let mut files = state.lock_files();
    let replaced = files.set(kind, records);
    info!(source = kind.code(), rows, replaced, "Dataset uploaded");

    (StatusCode::OK, Json(ApiResponse::ok(dataset_status(&files)))).into_response()
}

/// DELETE /api/datasets/:kind - Clear one slot
async fn clear_dataset(State(state): State<AppState>, Path(kind): Path<String>) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let mut files = state.lock_files();
    if !files.clear(kind) {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("Dataset '{}' is not loaded", kind.code()),
        );
    }
    info!(source = kind.code(), "Dataset cleared");

    (StatusCode::OK, Json(ApiResponse::ok(dataset_status(&files)))).into_response()
}

/// GET /api/dashboard?year=&month=&userType= - Bundle over the stored slots
async fn dashboard(
    State(state): State<AppState>,
    Query(selection): Query<FilterSelection>,
) -> impl IntoResponse {
    let files = state.snapshot();
    Json(ApiResponse::ok(state.engine.process(&files, &selection)))
}

/// GET /api/heatmap?year=&month=&userType=&route= - Grid for one route
async fn heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> impl IntoResponse {
    let files = state.snapshot();
    let selection = FilterSelection::new(&query.year, &query.month, &query.user_type);
    let data = state.engine.process(&files, &selection);

    let route = HeatmapView::resolve_route(&query.route, &data.filter_options);
    Json(ApiResponse::ok(HeatmapView::build(&data.heatmap_data, &route)))
}

/// POST /api/process - Stateless: files + filters in, bundle out
async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> impl IntoResponse {
    Json(ApiResponse::ok(
        state.engine.process(&request.files, &request.filters),
    ))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/datasets", get(list_datasets))
        .route("/datasets/:kind", put(upload_dataset).delete(clear_dataset))
        .route("/dashboard", get(dashboard))
        .route("/heatmap", get(heatmap))
        .route("/process", post(process))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transit_insights=info,transit_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    let mut files = FileData::new();
    for path in &args.files {
        let (kind, records) = load_source(path)?;
        files.set(kind, records);
    }

    let state = AppState::new(InsightsEngine::with_config(config), files);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    info!("Server running on http://{}", args.bind);
    info!("API: http://{}/api/dashboard", args.bind);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
