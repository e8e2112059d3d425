//! CarePulse服务器主程序

use anyhow::{Context, Result};
use carepulse_admin::{
    init_logging, AppConfig, BackendConfig, BackendKind, ConfigManager, ConfigValidator, Metrics,
};
use carepulse_integration::{
    AppointmentService, AuthenticationConfig, BackendClient, BackendClientConfig, MemoryBackend,
    PatientService,
};
use carepulse_web::{AppState, WebServer};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 后端实现
#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Memory,
    Http,
}

/// CarePulse服务器命令行参数，指定时覆盖配置文件
#[derive(Parser, Debug)]
#[command(name = "carepulse-server")]
#[command(about = "CarePulse 患者登记与预约确认服务")]
struct Args {
    /// 监听主机
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long)]
    log_level: Option<String>,

    /// 后端实现
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// HTTP后端地址
    #[arg(long)]
    backend_url: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = self.backend {
            config.backend.kind = match backend {
                BackendArg::Memory => BackendKind::Memory,
                BackendArg::Http => BackendKind::Http,
            };
        }
        if let Some(url) = &self.backend_url {
            config.backend.endpoint = Some(url.clone());
        }
    }
}

type Services = (Arc<dyn PatientService>, Arc<dyn AppointmentService>);

async fn build_services(config: &BackendConfig) -> Result<Services> {
    match config.kind {
        BackendKind::Memory => {
            info!("Using in-memory backend");
            let backend = Arc::new(MemoryBackend::new());
            let patients: Arc<dyn PatientService> = backend.clone();
            let appointments: Arc<dyn AppointmentService> = backend;
            Ok((patients, appointments))
        }
        BackendKind::Http => {
            let endpoint = config
                .endpoint
                .clone()
                .context("HTTP backend requires an endpoint")?;
            let authentication = match &config.api_key {
                Some(key) => AuthenticationConfig::ApiKey {
                    key: key.clone(),
                    header: config.api_key_header.clone(),
                },
                None => AuthenticationConfig::None,
            };

            let client = Arc::new(BackendClient::new(BackendClientConfig {
                endpoint,
                authentication,
                timeout_secs: config.timeout_secs,
            })?);
            if !client.check_connection().await? {
                warn!("Backend at {} is not reachable yet", client.endpoint());
            }
            let patients: Arc<dyn PatientService> = client.clone();
            let appointments: Arc<dyn AppointmentService> = client;
            Ok((patients, appointments))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let manager = ConfigManager::new(args.config.as_deref()).context("Failed to load configuration")?;
    let mut config = manager.get_config().await;
    args.apply(&mut config);
    ConfigValidator::new().validate(&config)?;

    init_logging(&config.logging, args.log_level.as_deref())?;

    info!("启动CarePulse服务器...");
    info!("  服务名称: {}", config.server.name);
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  后端类型: {:?}", config.backend.kind);
    info!("  医生数量: {}", config.reference.doctors.len());

    let (patients, appointments) = build_services(&config.backend).await?;
    let metrics = Metrics::new()?;
    let state = AppState::new(
        config.server.name.clone(),
        config.reference.clone(),
        patients,
        appointments,
        metrics,
    )?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    WebServer::new(addr, state).run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("服务器启动失败: {:#}", e);
        return Err(e);
    }

    Ok(())
}
