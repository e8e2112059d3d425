//! HTTP处理器

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use carepulse_core::{CarePulseError, UploadedFile};
use carepulse_forms::{FieldValue, FormController, RegistrationField, ValueKind};
use carepulse_workflow::{load_confirmation, ConfirmationView, SubmissionOutcome};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::pages;
use crate::server::AppState;

/// 错误响应
#[derive(Debug)]
pub struct ApiError(pub CarePulseError);

impl From<CarePulseError> for ApiError {
    fn from(error: CarePulseError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CarePulseError::NotFound(_) => StatusCode::NOT_FOUND,
            CarePulseError::Validation(_) => StatusCode::BAD_REQUEST,
            CarePulseError::SubmissionInFlight(_) => StatusCode::CONFLICT,
            CarePulseError::Backend(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// 根路径处理器
pub async fn api_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "metrics": "/metrics",
            "register": "/patients/{userId}/register",
            "confirmation": "/patients/{userId}/new-appointment/success?appointmentId={id}"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus指标
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let text = state
        .metrics
        .gather()
        .map_err(|e| CarePulseError::Internal(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

/// 登记表单页面
pub async fn register_page(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Html<String> {
    let form = FormController::new(state.schema.clone());
    Html(pages::registration_page(&state.layout, &form, &user_id))
}

/// 提交登记表单
///
/// 成功时303跳转到新建预约页；校验失败返回422，后端失败返回502，
/// 两者都重新渲染表单并显示错误。
pub async fn submit_registration(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = FormController::new(state.schema.clone());
    for (field, value) in read_form_values(multipart).await? {
        form.set_field(field, value)?;
    }

    let outcome = state.orchestrator.submit(&user_id, &mut form).await?;
    state.metrics.record_registration(outcome.label());

    match outcome {
        SubmissionOutcome::Navigate(route) => {
            info!("Registration complete for user {}, redirecting to {}", user_id, route);
            Ok(Redirect::to(&route.href()).into_response())
        }
        SubmissionOutcome::Rejected(result) => {
            debug!("Re-rendering form for user {} with {} errors", user_id, result.error_count());
            let html = pages::registration_page(&state.layout, &form, &user_id);
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        SubmissionOutcome::Failed { .. } => {
            let html = pages::registration_page(&state.layout, &form, &user_id);
            Ok((StatusCode::BAD_GATEWAY, Html(html)).into_response())
        }
        SubmissionOutcome::AlreadySubmitting => Err(CarePulseError::SubmissionInFlight(format!(
            "registration for user {} is already being submitted",
            user_id
        ))
        .into()),
    }
}

/// 读取multipart表单，未知字段忽略，同名文件字段合并
async fn read_form_values(
    mut multipart: Multipart,
) -> Result<Vec<(RegistrationField, FieldValue)>, ApiError> {
    let mut values: BTreeMap<RegistrationField, FieldValue> = BTreeMap::new();

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| CarePulseError::Validation(format!("invalid form data: {}", e)))?
    {
        let name = part.name().unwrap_or_default().to_string();
        let Ok(field) = name.parse::<RegistrationField>() else {
            debug!("Ignoring unknown form field {:?}", name);
            continue;
        };

        match field.value_kind() {
            ValueKind::Files => {
                let file_name = part.file_name().unwrap_or_default().to_string();
                let content_type = part
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = part
                    .bytes()
                    .await
                    .map_err(|e| CarePulseError::Validation(format!("invalid upload: {}", e)))?;
                // 未选择文件时浏览器仍会发送空的文件部分
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                let file = UploadedFile::new(file_name, content_type, bytes.to_vec());
                match values.entry(field).or_insert_with(|| FieldValue::Files(Vec::new())) {
                    FieldValue::Files(files) => files.push(file),
                    other => *other = FieldValue::Files(vec![file]),
                }
            }
            ValueKind::Flag => {
                let text = read_text(part).await?;
                let checked = matches!(text.trim(), "true" | "on" | "1");
                values.insert(field, FieldValue::Flag(checked));
            }
            ValueKind::Text => {
                let text = read_text(part).await?;
                values.insert(field, FieldValue::Text(text));
            }
        }
    }

    Ok(values.into_iter().collect())
}

async fn read_text(part: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    part.text()
        .await
        .map_err(|e| CarePulseError::Validation(format!("invalid form value: {}", e)).into())
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationQuery {
    #[serde(rename = "appointmentId", default)]
    pub appointment_id: String,
}

/// 预约确认页面
pub async fn confirmation_page(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ConfirmationQuery>,
) -> Result<Response, ApiError> {
    let view = load_confirmation(
        state.appointments.as_ref(),
        &state.reference,
        &user_id,
        &query.appointment_id,
    )
    .await?;

    let html = Html(pages::confirmation_page(&view));
    match &view {
        ConfirmationView::Found(summary) => {
            state.metrics.record_confirmation("found");
            if !summary.doctor_matched {
                state.metrics.record_confirmation("doctor_fallback");
            }
            Ok(html.into_response())
        }
        ConfirmationView::NotFound { appointment_id, .. } => {
            warn!("Confirmation for missing appointment {:?} (user {})", appointment_id, user_id);
            state.metrics.record_confirmation("not_found");
            Ok((StatusCode::NOT_FOUND, html).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::create_app;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use carepulse_admin::Metrics;
    use carepulse_core::{Appointment, AppointmentStatus, ReferenceData};
    use carepulse_integration::MemoryBackend;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "carepulse-test-boundary";

    fn app(backend: Arc<MemoryBackend>) -> (Router, Metrics) {
        let metrics = Metrics::new().unwrap();
        let state = AppState::new(
            "CarePulse",
            ReferenceData::default(),
            backend.clone(),
            backend,
            metrics.clone(),
        )
        .unwrap();
        (create_app(state), metrics)
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"identificationDocument\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, file_name, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn jane_doe() -> Vec<(&'static str, &'static str)> {
        vec![
            ("name", "Jane Doe"),
            ("email", "jane@example.com"),
            ("phone", "+15551234567"),
            ("birthDate", "1990-01-01"),
            ("gender", "female"),
            ("treatmentConsent", "true"),
            ("disclosureConsent", "true"),
            ("privacyConsent", "true"),
        ]
    }

    fn post_form(user_id: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/patients/{}/register", user_id))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |error: CarePulseError| ApiError(error).status();
        assert_eq!(status(CarePulseError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(CarePulseError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(CarePulseError::SubmissionInFlight("x".into())), StatusCode::CONFLICT);
        assert_eq!(status(CarePulseError::Backend("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(CarePulseError::Internal("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(Arc::new(MemoryBackend::new()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("healthy"));
    }

    #[tokio::test]
    async fn test_register_page_renders_form() {
        let (app, _) = app(Arc::new(MemoryBackend::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/patients/user-1/register")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Personal Information"));
        assert!(html.contains("name=\"treatmentConsent\""));
    }

    #[tokio::test]
    async fn test_valid_submission_redirects() {
        let backend = Arc::new(MemoryBackend::new());
        let (app, metrics) = app(backend.clone());

        let response = app
            .oneshot(post_form("user-1", multipart_body(&jane_doe(), None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/patients/user-1/new-appointment"
        );
        let calls = backend.register_calls().await;
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].is_multipart());
        assert_eq!(metrics.registrations("registered"), 1);
    }

    #[tokio::test]
    async fn test_redirect_escapes_user_id() {
        let backend = Arc::new(MemoryBackend::new());
        let (app, _) = app(backend.clone());

        let response = app
            .clone()
            .oneshot(post_form("a%2Fb", multipart_body(&jane_doe(), None)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/patients/a%2Fb/new-appointment"
        );
        assert_eq!(backend.register_calls().await[0].patient().user_id, "a/b");

        let response = app
            .oneshot(post_form("%C3%A9", multipart_body(&jane_doe(), None)))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/patients/%C3%A9/new-appointment"
        );
    }

    #[tokio::test]
    async fn test_uploaded_document_reaches_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let (app, _) = app(backend.clone());

        let body = multipart_body(&jane_doe(), Some(("id.png", "image/png", &[137, 80, 78, 71])));
        let response = app.oneshot(post_form("user-1", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let calls = backend.register_calls().await;
        let document = calls[0].document().unwrap();
        assert_eq!(document.file_name, "id.png");
        assert_eq!(document.blob.content_type, "image/png");
        assert_eq!(document.blob.bytes, vec![137, 80, 78, 71]);
    }

    #[tokio::test]
    async fn test_missing_consent_rerenders_form() {
        let backend = Arc::new(MemoryBackend::new());
        let (app, metrics) = app(backend.clone());

        let fields: Vec<_> = jane_doe()
            .into_iter()
            .filter(|(name, _)| *name != "privacyConsent")
            .collect();
        let response = app
            .oneshot(post_form("user-1", multipart_body(&fields, None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains("You must consent to privacy in order to proceed"));
        assert!(html.contains("value=\"Jane Doe\""));
        assert_eq!(backend.register_call_count().await, 0);
        assert_eq!(metrics.registrations("rejected"), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_shows_submission_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_fail_registrations(true);
        let (app, _) = app(backend);

        let response = app
            .oneshot(post_form("user-1", multipart_body(&jane_doe(), None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let html = body_text(response).await;
        assert!(html.contains("role=\"alert\""));
        assert!(html.contains("Please try again."));
        assert!(!html.contains(" disabled>"));
    }

    #[tokio::test]
    async fn test_confirmation_without_id_is_not_found() {
        let (app, metrics) = app(Arc::new(MemoryBackend::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/patients/user-1/new-appointment/success")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Appointment not found"));
        assert_eq!(metrics.confirmations("not_found"), 1);
    }

    #[tokio::test]
    async fn test_confirmation_page() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .insert_appointment(Appointment {
                id: "appt-1".to_string(),
                user_id: "user-1".to_string(),
                patient_id: None,
                schedule: Utc.with_ymd_and_hms(2023, 10, 17, 8, 0, 0).unwrap(),
                primary_physician: "John Green".to_string(),
                reason: "Check-up".to_string(),
                note: None,
                status: AppointmentStatus::Pending,
                cancellation_reason: None,
            })
            .await;
        let (app, _) = app(backend);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/patients/user-1/new-appointment/success?appointmentId=appt-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Dr. John Green"));
        assert!(html.contains("/assets/images/dr-green.png"));
        assert!(html.contains("Oct 17, 2023, 8:00 AM"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (app, metrics) = app(Arc::new(MemoryBackend::new()));
        metrics.record_registration("registered");

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("carepulse_registrations_total"));
    }
}
