//! API service routes

use std::collections::HashMap;

use auth::{CurrentUser, Role, auth_middleware, service::require_admin};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::Field},
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::request::{DecisionPayload, DecisionResponse, RequestResponse},
    state::AppState,
    workflow::UploadedDocument,
};

/// Create the router for the whole service
///
/// `/health`, `/token` and the stored documents are public; everything
/// else requires a bearer token.
pub fn create_router(state: AppState, cors_origins: &[String], max_body_bytes: usize) -> Router {
    let protected_routes = Router::new()
        .route("/api/solicitudes", post(submit_request))
        .route("/api/solicitudes/", post(submit_request))
        .route("/api/solicitudes/resumen", get(request_summary))
        .route("/api/solicitudes/pendientes/:role", get(pending_requests))
        .route("/api/solicitudes/usuario/:email", get(agent_requests))
        .route("/api/solicitudes/:id/aprobar", put(decide_request))
        .route("/api/solicitudes/:id/archivar", post(archive_request))
        .route("/api/archivo", get(list_archive))
        .route("/api/upload/documento", post(upload_document))
        .route("/api/upload/sepa", post(upload_document))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let documents = ServeDir::new(state.documents.dir());
    let documents_prefix = state.documents.url_prefix().to_string();
    let auth_routes = auth::routes::create_router(state.auth.clone());

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
        .merge(auth_routes)
        .nest_service(&documents_prefix, documents)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "onboarding-api"
    }))
}

fn multipart_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::Validation(format!("Invalid multipart body: {}", err))
}

async fn read_file(field: Field<'_>) -> ApiResult<Option<UploadedDocument>> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;

    if filename.is_empty() && bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedDocument {
        filename,
        bytes: bytes.to_vec(),
    }))
}

/// Submit a new onboarding request
pub async fn submit_request(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let mut fields = HashMap::new();
    let mut sepa = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "sepa" {
            sepa = read_file(field).await?;
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
        }
    }

    let record = state.workflow.submit(&me, &fields, sepa).await?;
    Ok((StatusCode::CREATED, Json(RequestResponse::from(record))))
}

/// Requests waiting on a role
pub async fn pending_requests(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    WithRejection(Path(role), _): WithRejection<Path<Role>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let requests = state.workflow.pending_for_role(&me, role).await?;
    let requests: Vec<RequestResponse> = requests.into_iter().map(RequestResponse::from).collect();
    Ok(Json(requests))
}

/// Approve or reject a request
pub async fn decide_request(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<DecisionPayload>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let record = state.workflow.decide(&me, id, &payload).await?;

    Ok(Json(DecisionResponse {
        id: record.id,
        estado: record.state,
        mensaje: "Request processed successfully".to_string(),
    }))
}

pub async fn request_summary(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.summary_for_agent(&me).await?))
}

pub async fn agent_requests(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    WithRejection(Path(email), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let requests = state.workflow.requests_for_agent(&me, &email).await?;
    let requests: Vec<RequestResponse> = requests.into_iter().map(RequestResponse::from).collect();
    Ok(Json(requests))
}

/// Move a completed request into the archive
pub async fn archive_request(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&me, "archive requests")?;
    let archived = state.archive.archive(id).await?;
    Ok((StatusCode::CREATED, Json(archived)))
}

pub async fn list_archive(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    require_admin(&me, "view the archive")?;
    Ok(Json(state.archive.list().await?))
}

/// Store a standalone document and return its URL
pub async fn upload_document(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let Some(document) = read_file(field).await? else {
            break;
        };
        let stored = state
            .documents
            .save(&document.filename, &document.bytes)
            .await?;

        info!("User {} uploaded {}", me.email, stored.url);
        return Ok(Json(stored));
    }

    Err(ApiError::Validation("Field 'file' is required".to_string()))
}
