//! # CarePulse工作流模块
//!
//! 患者登记与预约确认的流程编排，包括：
//! - 提交状态机：约束表单提交状态的合法转换
//! - 提交编排：校验、组装请求体、调用后端、决定跳转
//! - 预约确认：查询预约并解析医生信息
//! - 页面路由：流程中各页面的地址

pub mod confirmation;
pub mod navigation;
pub mod state_machine;
pub mod submission;

// 重新导出主要类型
pub use confirmation::{
    doctor_display_name, load_confirmation, AppointmentSummary, ConfirmationView,
    FALLBACK_DOCTOR_IMAGE,
};
pub use navigation::Route;
pub use state_machine::{SubmissionEvent, SubmissionStateMachine};
pub use submission::{SubmissionOrchestrator, SubmissionOutcome, SUBMISSION_FAILED_MESSAGE};
