use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::batch::BatchReport;
use super::domain::Location;
use super::repository::ProspectRepository;
use super::service::{ProspectQualificationService, QualificationServiceError};

const DEFAULT_QUALIFIED_LIMIT: usize = 100;

/// Router builder exposing batch runs, stored results, and region lookups.
pub fn qualification_router<R>(service: Arc<ProspectQualificationService<R>>) -> Router
where
    R: ProspectRepository + 'static,
{
    Router::new()
        .route("/", get(root_handler))
        .route("/qualify", get(run_handler::<R>))
        .route("/api/v1/qualify", post(upload_handler::<R>))
        .route(
            "/api/v1/prospects/qualified",
            get(qualified_handler::<R>),
        )
        .route("/api/v1/regions", get(regions_handler::<R>))
        .with_state(service)
}

/// Counts returned to callers after a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyResponse {
    pub total_processed: usize,
    pub qualified: usize,
    pub not_qualified: usize,
}

impl From<&BatchReport> for QualifyResponse {
    fn from(report: &BatchReport) -> Self {
        Self {
            total_processed: report.summary.total,
            qualified: report.summary.qualified,
            not_qualified: report.summary.unqualified,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QualifiedQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegionQuery {
    country: Option<String>,
    state: Option<String>,
}

pub(crate) async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the Prospect Qualification API" }))
}

pub(crate) async fn run_handler<R>(
    State(service): State<Arc<ProspectQualificationService<R>>>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    match run_blocking(move || service.run()).await {
        Ok(report) => batch_response(&report),
        Err(response) => response,
    }
}

/// Takes raw bytes so an undecodable row reaches the CSV reader instead of failing the request.
pub(crate) async fn upload_handler<R>(
    State(service): State<Arc<ProspectQualificationService<R>>>,
    body: Bytes,
) -> Response
where
    R: ProspectRepository + 'static,
{
    match run_blocking(move || service.run_reader(Cursor::new(body))).await {
        Ok(report) => batch_response(&report),
        Err(response) => response,
    }
}

pub(crate) async fn qualified_handler<R>(
    State(service): State<Arc<ProspectQualificationService<R>>>,
    Query(query): Query<QualifiedQuery>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_QUALIFIED_LIMIT);
    match run_blocking(move || service.qualified(limit)).await {
        Ok(prospects) => (
            StatusCode::OK,
            Json(json!({
                "count": prospects.len(),
                "prospects": prospects,
            })),
        )
            .into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn regions_handler<R>(
    State(service): State<Arc<ProspectQualificationService<R>>>,
    Query(query): Query<RegionQuery>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    let location = Location::new(query.country, query.state);
    let payload = json!({
        "location": location.canonical(),
        "regions": service.regions_for(&location),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

fn batch_response(report: &BatchReport) -> Response {
    (StatusCode::OK, Json(QualifyResponse::from(report))).into_response()
}

/// File reads and repository writes are blocking; keep them off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, QualificationServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(error_response(err)),
        Err(err) => {
            error!(error = %err, "qualification task did not complete");
            let payload = json!({
                "error": format!("qualification task failed: {err}"),
            });
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response())
        }
    }
}

fn error_response(err: QualificationServiceError) -> Response {
    let status = match err {
        QualificationServiceError::Ingest(_) => StatusCode::BAD_REQUEST,
        QualificationServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
