//! # CarePulse
//!
//! 患者登记与预约确认服务的汇总入口，重新导出各子模块。

pub use carepulse_core;
pub use carepulse_forms;
pub use carepulse_integration;
pub use carepulse_workflow;

pub use carepulse_core::{CarePulseError, ReferenceData, Result};
