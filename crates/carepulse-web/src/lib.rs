//! # CarePulse Web模块
//!
//! 基于axum的HTTP服务：登记表单页面与提交、预约确认页、健康检查和指标

pub mod handlers;
pub mod pages;
pub mod server;

pub use handlers::ApiError;
pub use server::{create_app, AppState, WebServer};
