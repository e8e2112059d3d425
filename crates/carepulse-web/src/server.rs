//! Web服务器

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use carepulse_admin::Metrics;
use carepulse_core::{ReferenceData, Result};
use carepulse_forms::{registration_form, FormLayout, RegistrationSchema};
use carepulse_integration::{AppointmentService, PatientService};
use carepulse_workflow::SubmissionOrchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{
    api_root, confirmation_page, health, metrics, register_page, submit_registration,
};

/// 证件文件上传上限
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub reference: Arc<ReferenceData>,
    pub schema: Arc<RegistrationSchema>,
    pub layout: Arc<FormLayout>,
    pub orchestrator: Arc<SubmissionOrchestrator>,
    pub appointments: Arc<dyn AppointmentService>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        service_name: impl Into<String>,
        reference: ReferenceData,
        patients: Arc<dyn PatientService>,
        appointments: Arc<dyn AppointmentService>,
        metrics: Metrics,
    ) -> Result<Self> {
        let reference = Arc::new(reference);
        let schema = Arc::new(RegistrationSchema::new(Arc::clone(&reference))?);
        let layout = Arc::new(registration_form(&reference));

        Ok(Self {
            service_name: service_name.into(),
            reference,
            schema,
            layout,
            orchestrator: Arc::new(SubmissionOrchestrator::new(patients)),
            appointments,
            metrics,
        })
    }
}

/// 构建路由
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // 根路径
        .route("/", get(api_root))

        // 健康检查与指标
        .route("/health", get(health))
        .route("/metrics", get(metrics))

        // 患者登记
        .route(
            "/patients/:user_id/register",
            get(register_page).post(submit_registration),
        )

        // 预约确认
        .route(
            "/patients/:user_id/new-appointment/success",
            get(confirmation_page),
        )
        .with_state(state)

        // 全局中间件
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            app: create_app(state),
        }
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}
