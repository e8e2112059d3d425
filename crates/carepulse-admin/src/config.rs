//! 配置管理
//!
//! 配置按以下顺序叠加，后者覆盖前者：
//! 1. 内置默认值
//! 2. TOML配置文件（可选）
//! 3. `CAREPULSE` 前缀的环境变量，层级分隔符为 `__`，
//!    例如 `CAREPULSE__SERVER__PORT=8080`

use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use tracing::{debug, error, info};
use config::{Config, Environment, File};

use carepulse_core::ReferenceData;

pub const ENV_PREFIX: &str = "CAREPULSE";
pub const ENV_SEPARATOR: &str = "__";

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: Arc<RwLock<AppConfig>>,
    /// 配置文件路径
    config_path: Option<String>,
    /// 配置验证器
    validator: ConfigValidator,
}

/// 服务完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 后端服务配置
    pub backend: BackendConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 医生列表、性别选项和证件类型
    pub reference: ReferenceData,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务名称
    pub name: String,
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 后端实现
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// 进程内存储
    #[default]
    Memory,
    /// 远程HTTP服务
    Http,
}

/// 后端服务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// 服务地址，`http` 后端必填
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// API密钥请求头，默认 `X-API-Key`
    pub api_key_header: Option<String>,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令，如 `info,carepulse_web=debug`
    pub level: String,
    /// 是否输出目标模块名
    pub with_target: bool,
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数
    validator: fn(&AppConfig) -> Result<()>,
    /// 错误消息
    error_message: &'static str,
}

impl ConfigManager {
    /// 加载并验证配置，未指定文件时只使用默认值和环境变量
    pub fn new(config_path: Option<&str>) -> Result<Self> {
        let config = Self::load_config(config_path, ENV_PREFIX)?;
        Self::with_config(config, config_path)
    }

    /// 使用已有配置创建管理器
    pub fn with_config(config: AppConfig, config_path: Option<&str>) -> Result<Self> {
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.map(str::to_string),
            validator,
        })
    }

    /// 从默认值、文件和环境变量加载配置
    fn load_config(config_path: Option<&str>, env_prefix: &str) -> Result<AppConfig> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to build default configuration")?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        match config_path {
            Some(path) => info!("Configuration loaded successfully from: {}", path),
            None => info!("Configuration loaded from defaults and environment"),
        }
        Ok(config)
    }

    /// 获取配置
    pub async fn get_config(&self) -> AppConfig {
        let config = self.config.read().await;
        config.clone()
    }

    /// 更新配置，有配置文件时同时写回文件
    pub async fn update_config(&self, new_config: AppConfig) -> Result<()> {
        self.validator.validate(&new_config)?;

        {
            let mut config = self.config.write().await;
            *config = new_config;
        }

        if let Some(path) = &self.config_path {
            self.save_to(path).await?;
        }

        info!("Configuration updated successfully");
        Ok(())
    }

    /// 保存配置到指定文件
    pub async fn save_to(&self, path: &str) -> Result<()> {
        let config = self.config.read().await;
        let config_str = toml::to_string_pretty(&*config)
            .context("Failed to serialize configuration")?;

        tokio::fs::write(path, config_str)
            .await
            .context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path);
        Ok(())
    }
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "server.port",
                validator: |config| {
                    if config.server.port == 0 {
                        Err(anyhow::anyhow!("Server port cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid server port",
            },
            ValidationRule {
                field_path: "backend.endpoint",
                validator: |config| {
                    let missing = config
                        .backend
                        .endpoint
                        .as_deref()
                        .map_or(true, |endpoint| endpoint.trim().is_empty());
                    if config.backend.kind == BackendKind::Http && missing {
                        Err(anyhow::anyhow!("HTTP backend requires an endpoint"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid backend endpoint",
            },
            ValidationRule {
                field_path: "backend.timeout_secs",
                validator: |config| {
                    if config.backend.timeout_secs == 0 {
                        Err(anyhow::anyhow!("Backend timeout cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid backend timeout",
            },
            ValidationRule {
                field_path: "reference.doctors",
                validator: |config| {
                    if config.reference.doctors.is_empty() {
                        Err(anyhow::anyhow!("Doctor list cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid reference data",
            },
            ValidationRule {
                field_path: "reference.gender_options",
                validator: |config| {
                    if config.reference.gender_options.is_empty() {
                        Err(anyhow::anyhow!("Gender options cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid reference data",
            },
            ValidationRule {
                field_path: "reference.identification_types",
                validator: |config| {
                    if config.reference.identification_types.is_empty() {
                        Err(anyhow::anyhow!("Identification types cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid reference data",
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &AppConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(anyhow::anyhow!("{}: {}", rule.error_message, e));
            }
        }

        debug!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "CarePulse".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            endpoint: None,
            api_key: None,
            api_key_header: None,
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("carepulse-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(ConfigValidator::new().validate(&config).is_ok());
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.reference.doctors.len(), 9);
    }

    #[test]
    fn test_validator_rules() {
        let validator = ConfigValidator::new();

        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validator.validate(&config).is_err());

        let mut config = AppConfig::default();
        config.backend.kind = BackendKind::Http;
        assert!(validator.validate(&config).is_err());
        config.backend.endpoint = Some("http://localhost:9000".to_string());
        assert!(validator.validate(&config).is_ok());

        let mut config = AppConfig::default();
        config.reference.doctors.clear();
        let error = validator.validate(&config).unwrap_err().to_string();
        assert!(error.contains("Doctor list cannot be empty"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = temp_path("file");
        std::fs::write(
            &path,
            "[server]\nport = 8088\n\n[backend]\nkind = \"http\"\nendpoint = \"http://backend:9000\"\n",
        )
        .unwrap();

        let config = ConfigManager::load_config(path.to_str(), "CAREPULSE_TEST_FILE").unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.backend.kind, BackendKind::Http);
        assert_eq!(config.backend.endpoint.as_deref(), Some("http://backend:9000"));
        assert_eq!(config.reference, ReferenceData::default());
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("CAREPULSE_TEST_ENV__SERVER__PORT", "9099");
        std::env::set_var("CAREPULSE_TEST_ENV__LOGGING__LEVEL", "debug");

        let config = ConfigManager::load_config(None, "CAREPULSE_TEST_ENV").unwrap();

        assert_eq!(config.server.port, 9099);
        assert_eq!(config.logging.level, "debug");
    }

    #[tokio::test]
    async fn test_update_saves_file() {
        let path = temp_path("save");
        let path_str = path.to_str().unwrap().to_string();
        let manager = ConfigManager::with_config(AppConfig::default(), Some(&path_str)).unwrap();

        let mut updated = manager.get_config().await;
        updated.server.port = 4000;
        manager.update_config(updated).await.unwrap();

        let saved: AppConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(saved.server.port, 4000);

        let mut invalid = manager.get_config().await;
        invalid.server.port = 0;
        assert!(manager.update_config(invalid).await.is_err());
        assert_eq!(manager.get_config().await.server.port, 4000);
    }
}
