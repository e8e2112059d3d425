//! # CarePulse集成模块
//!
//! 与外部后端服务的集成，包括：
//! - 服务接口：患者登记与预约查询的协作方契约
//! - 登记请求体：JSON或携带证件文件的multipart表单
//! - HTTP客户端：基于reqwest的后端实现
//! - 内存后端：用于演示和测试的进程内实现

pub mod client;
pub mod memory;
pub mod payload;
pub mod service;

pub use client::{AuthenticationConfig, BackendClient, BackendClientConfig};
pub use memory::MemoryBackend;
pub use payload::{
    BlobFile, DocumentUpload, MultipartPart, PartValue, PatientSubmission, RegisterPatientPayload,
};
pub use service::{AppointmentService, PatientService};
