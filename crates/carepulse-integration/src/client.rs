//! 后端HTTP客户端
//!
//! 通过reqwest访问患者登记与预约查询接口：
//! - `POST {endpoint}/patients`：JSON或multipart请求体
//! - `GET {endpoint}/appointments/{id}`：查询预约

use async_trait::async_trait;
use carepulse_core::{Appointment, CarePulseError, PatientRecord, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::payload::{PartValue, RegisterPatientPayload};
use crate::service::{AppointmentService, PatientService};

/// 认证配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthenticationConfig {
    #[default]
    None,
    ApiKey { key: String, header: Option<String> },
    BearerToken { token: String },
}

/// 客户端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendClientConfig {
    pub endpoint: String,
    #[serde(default)]
    pub authentication: AuthenticationConfig,
    pub timeout_secs: u64,
}

impl BackendClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            authentication: AuthenticationConfig::None,
            timeout_secs: 30,
        }
    }
}

/// 基于HTTP的后端实现
#[derive(Debug, Clone)]
pub struct BackendClient {
    base: Url,
    authentication: AuthenticationConfig,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: BackendClientConfig) -> Result<Self> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| CarePulseError::Config(format!("invalid backend endpoint {}: {}", config.endpoint, e)))?;
        if base.cannot_be_a_base() {
            return Err(CarePulseError::Config(format!(
                "backend endpoint {} cannot carry a path",
                config.endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(backend_error)?;

        info!("Backend client configured for {}", base);
        Ok(Self {
            base,
            authentication: config.authentication,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// 检查后端健康状态
    pub async fn check_connection(&self) -> Result<bool> {
        let request = self.add_auth_headers(self.client.get(self.url(&["health"])?));
        match request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Backend health check failed: {}", e);
                Ok(false)
            }
        }
    }

    /// 添加认证头
    fn add_auth_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.authentication {
            AuthenticationConfig::None => request,
            AuthenticationConfig::ApiKey { key, header } => {
                let header_name = header.as_deref().unwrap_or("X-API-Key");
                request.header(header_name, key)
            }
            AuthenticationConfig::BearerToken { token } => request.bearer_auth(token),
        }
    }

    /// 在基础地址后追加路径段，段内字符按需转义
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CarePulseError::Config(format!("backend endpoint {} cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn multipart_form(payload: &RegisterPatientPayload) -> Result<Form> {
        let mut form = Form::new();
        for part in payload.multipart_parts()? {
            form = match part.value {
                PartValue::Text(text) => form.text(part.name, text),
                PartValue::Blob {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let blob = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&content_type)
                        .map_err(backend_error)?;
                    form.part(part.name, blob)
                }
            };
        }
        Ok(form)
    }
}

fn backend_error(error: reqwest::Error) -> CarePulseError {
    CarePulseError::Backend(error.to_string())
}

#[async_trait]
impl PatientService for BackendClient {
    async fn register_patient(&self, payload: RegisterPatientPayload) -> Result<Option<PatientRecord>> {
        let url = self.url(&["patients"])?;
        let request = match &payload {
            RegisterPatientPayload::Json(patient) => self.client.post(url).json(patient),
            RegisterPatientPayload::Multipart { .. } => {
                self.client.post(url).multipart(Self::multipart_form(&payload)?)
            }
        };

        debug!(
            "Registering patient for user {} (multipart: {})",
            payload.patient().user_id,
            payload.is_multipart()
        );
        let response = self.add_auth_headers(request).send().await.map_err(backend_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CarePulseError::Backend(format!("Failed to register patient: {}", status)));
        }

        let body = response.text().await.map_err(backend_error)?;
        let body = body.trim();
        if body.is_empty() || body == "null" {
            warn!("Backend returned no patient record for user {}", payload.patient().user_id);
            return Ok(None);
        }

        let record: PatientRecord = serde_json::from_str(body)?;
        info!("Patient {} registered for user {}", record.id, record.user_id);
        Ok(Some(record))
    }
}

#[async_trait]
impl AppointmentService for BackendClient {
    async fn get_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>> {
        if appointment_id.is_empty() {
            return Ok(None);
        }

        let request = self.client.get(self.url(&["appointments", appointment_id])?);
        let response = self.add_auth_headers(request).send().await.map_err(backend_error)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().await.map_err(backend_error)?;
                let body = body.trim();
                if body.is_empty() || body == "null" {
                    return Ok(None);
                }
                Ok(Some(serde_json::from_str(body)?))
            }
            status => Err(CarePulseError::Backend(format!(
                "Failed to fetch appointment {}: {}",
                appointment_id, status
            ))),
        }
    }
}
