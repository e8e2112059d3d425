//! 错误定义模块

use thiserror::Error;

/// CarePulse统一错误类型
#[derive(Error, Debug)]
pub enum CarePulseError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("外部服务错误: {0}")]
    Backend(String),

    #[error("网络错误: {0}")]
    Network(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("提交进行中: {0}")]
    SubmissionInFlight(String),

    #[error("系统内部错误: {0}")]
    Internal(String),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },
}

/// CarePulse统一结果类型
pub type Result<T> = std::result::Result<T, CarePulseError>;
