//! # CarePulse管理模块
//!
//! 提供配置管理、日志初始化和Prometheus指标等运维功能

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::{
    AppConfig, BackendConfig, BackendKind, ConfigManager, ConfigValidator, LoggingConfig,
    ServerConfig,
};
pub use logging::{build_filter, init_logging};
pub use metrics::Metrics;
