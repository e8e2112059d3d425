//! 外部服务接口

use async_trait::async_trait;
use carepulse_core::{Appointment, PatientRecord, Result};

use crate::payload::RegisterPatientPayload;

/// 患者登记服务
#[async_trait]
pub trait PatientService: Send + Sync {
    /// 登记患者；后端未返回记录时为 `None`
    async fn register_patient(&self, payload: RegisterPatientPayload) -> Result<Option<PatientRecord>>;
}

/// 预约查询服务
#[async_trait]
pub trait AppointmentService: Send + Sync {
    /// 按标识查询预约；不存在或标识为空时为 `None`
    async fn get_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>>;
}
