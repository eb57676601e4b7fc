//! Report HTTP server
//!
//! Serves the export page of a course and accepts the report form:
//!
//! - `GET /health`
//! - `GET /courses/:id/export` - report, action download or selector page
//! - `POST /courses/:id/export` - same, with the posted form merged into the query
//!
//! The acting user comes from the `X-User-Id` header, or `server.default_user`.
//! Pages are HTML unless `format=json` or `format=text` is requested.

use crate::config::AppConfig;
use crate::core::export::{ExportCoordinator, ExportRequest, ExportResponse};
use crate::core::report::{render, OutputFormat};
use crate::domain::ids::{CourseId, UserId};
use crate::domain::GradeExportError;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Header carrying the acting user id
pub const USER_HEADER: &str = "x-user-id";

type Params = Vec<(String, String)>;

#[derive(Clone)]
struct AppState {
    coordinator: Arc<ExportCoordinator>,
    default_user: Option<UserId>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<GradeExportError> for ApiError {
    fn from(err: GradeExportError) -> Self {
        let status = match &err {
            GradeExportError::Validation(_) | GradeExportError::UnknownAction(_) => {
                StatusCode::BAD_REQUEST
            }
            GradeExportError::Permission(_) => StatusCode::FORBIDDEN,
            GradeExportError::NotFound(_) => StatusCode::NOT_FOUND,
            GradeExportError::ExternalSystem(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "Export request failed");
        } else {
            tracing::warn!(error = %err, "Export request rejected");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Build the router around a coordinator
pub fn router(coordinator: Arc<ExportCoordinator>, default_user: Option<UserId>) -> Router {
    let state = AppState {
        coordinator,
        default_user,
    };

    Router::new()
        .route("/health", get(health))
        .route("/courses/:id/export", get(export_page).post(export_form))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until it fails
///
/// # Errors
///
/// Fails when the coordinator cannot be built or the address cannot be bound.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let coordinator = Arc::new(ExportCoordinator::from_config(config)?);
    let default_user = config
        .server
        .default_user
        .map(UserId::new)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let addr: SocketAddr = config.server.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %addr,
        drivers = %config.drivers.enabled.join(","),
        "Report server listening"
    );

    axum::serve(listener, router(coordinator, default_user)).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn export_page(
    State(state): State<AppState>,
    Path(course_id): Path<u64>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Result<Response, ApiError> {
    handle(&state, course_id, &headers, params).await
}

async fn export_form(
    State(state): State<AppState>,
    Path(course_id): Path<u64>,
    headers: HeaderMap,
    Query(mut params): Query<Params>,
    Form(form): Form<Params>,
) -> Result<Response, ApiError> {
    params.extend(form);
    handle(&state, course_id, &headers, params).await
}

async fn handle(
    state: &AppState,
    course_id: u64,
    headers: &HeaderMap,
    params: Params,
) -> Result<Response, ApiError> {
    let user = acting_user(headers, state.default_user)?;
    let course = CourseId::new(course_id).map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e))?;
    let format = match params.iter().find(|(key, _)| key == "format") {
        Some((_, value)) => value.parse::<OutputFormat>()?,
        None => OutputFormat::Html,
    };

    let request = ExportRequest::from_params(course, &params)?;
    match state.coordinator.handle(user, request).await? {
        ExportResponse::Page(page) => {
            let base_url = format!("/courses/{course_id}/export");
            let body = render(&page, format, &base_url)?;
            let content_type = match format {
                OutputFormat::Html => "text/html; charset=utf-8",
                OutputFormat::Json => "application/json",
                OutputFormat::Text => "text/plain; charset=utf-8",
            };
            Ok(([(header::CONTENT_TYPE, content_type.to_string())], body).into_response())
        }
        ExportResponse::Action(output) => Ok((
            [
                (header::CONTENT_TYPE, output.content_type),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", output.filename),
                ),
            ],
            output.body,
        )
            .into_response()),
    }
}

fn acting_user(headers: &HeaderMap, default_user: Option<UserId>) -> Result<UserId, ApiError> {
    match headers.get(USER_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "Invalid X-User-Id header"))?
            .parse::<UserId>()
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e)),
        None => default_user
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Missing X-User-Id header")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::drivers::{DriverRegistry, SampleDriverFactory, SubmissionLog};
    use crate::adapters::host::{HostSnapshot, InMemoryHost};
    use crate::config::SampleConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SNAPSHOT: &str = r#"{
        "courses": [{"id": 2, "shortname": "MAT101", "fullname": "Calculus I"}],
        "users": [{"id": 10, "username": "u1", "firstname": "Ana", "lastname": "Silva"}],
        "enrolments": [{"course": 2, "user": 10}],
        "grade_items": [{"id": 100, "course_id": 2}],
        "grades": [{"item_id": 100, "user_id": 10, "final_grade": 64.0}],
        "grants": [{"user": 20, "capabilities": [
            "gradeexport:view", "grade:export", "gradeexport:publish", "site:accessallgroups"
        ]}]
    }"#;

    struct TestServer {
        _external: NamedTempFile,
        log: SubmissionLog,
        base: String,
    }

    async fn start(default_user: Option<u64>) -> TestServer {
        let mut external = NamedTempFile::new().unwrap();
        external
            .write_all(br#"[{"ident": "u1", "fullname": "Ana Silva", "grade": 60}]"#)
            .unwrap();

        let log = SubmissionLog::new();
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(SampleDriverFactory::new(
            SampleConfig {
                external_data_path: external.path().to_string_lossy().to_string(),
            },
            log.clone(),
        )));
        let host = InMemoryHost::new(HostSnapshot::from_json(SNAPSHOT).unwrap());
        let coordinator = Arc::new(ExportCoordinator::new(
            Arc::new(registry),
            Arc::new(host),
            vec!["sample".to_string()],
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(coordinator, default_user.map(|id| UserId::new(id).unwrap()));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            _external: external,
            log,
            base: format!("http://{addr}"),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let server = start(None).await;
        let body: serde_json::Value = reqwest::get(format!("{}/health", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_page_requires_user() {
        let server = start(None).await;
        let response = reqwest::get(format!("{}/courses/2/export", server.base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_html_page() {
        let server = start(Some(20)).await;
        let response = reqwest::get(format!("{}/courses/2/export", server.base))
            .await
            .unwrap();
        assert!(response.status().is_success());
        let html = response.text().await.unwrap();
        assert!(html.contains("Ana Silva"));
        assert!(html.contains("name=\"send[10]\" value=\"u1\" checked"));
    }

    #[tokio::test]
    async fn test_json_page_and_unknown_course() {
        let server = start(None).await;
        let client = reqwest::Client::new();

        let page: serde_json::Value = client
            .get(format!("{}/courses/2/export?format=json", server.base))
            .header(USER_HEADER, "20")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(page["course_id"], 2);
        assert_eq!(page["report"]["rows"].as_array().unwrap().len(), 1);

        let response = client
            .get(format!("{}/courses/99/export", server.base))
            .header(USER_HEADER, "20")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_form_sends_grades() {
        let server = start(Some(20)).await;
        let response = reqwest::Client::new()
            .post(format!("{}/courses/2/export", server.base))
            .form(&[
                ("id", "2"),
                ("groupid", "0"),
                ("send[10]", "u1"),
                ("sendgrades", "Send selected grades"),
            ])
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert!(response.text().await.unwrap().contains("notifysuccess"));

        let sent = server.log.entries().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].grade, Some(64.0));
    }

    #[tokio::test]
    async fn test_action_download() {
        let server = start(Some(20)).await;
        let response = reqwest::get(format!("{}/courses/2/export?action=export_csv", server.base))
            .await
            .unwrap();
        assert_eq!(response.headers()["content-type"], "text/csv");
        assert!(response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("MAT101_grades.csv"));
    }
}
