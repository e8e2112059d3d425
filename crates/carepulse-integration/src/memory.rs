//! 进程内后端
//!
//! 用于演示与测试：登记结果和预约都保存在内存中，
//! 可以注入延迟、失败和空结果来模拟后端行为。

use async_trait::async_trait;
use carepulse_core::utils::generate_id;
use carepulse_core::{Appointment, CarePulseError, PatientRecord, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::payload::RegisterPatientPayload;
use crate::service::{AppointmentService, PatientService};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    patients: RwLock<HashMap<String, PatientRecord>>,
    appointments: RwLock<HashMap<String, Appointment>>,
    register_calls: RwLock<Vec<RegisterPatientPayload>>,
    fail_registrations: AtomicBool,
    return_nothing: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次调用前等待指定时长
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.appointments
            .write()
            .await
            .insert(appointment.id.clone(), appointment);
    }

    /// 之后的登记调用返回后端错误
    pub fn set_fail_registrations(&self, fail: bool) {
        self.fail_registrations.store(fail, Ordering::SeqCst);
    }

    /// 之后的登记调用成功但不返回记录
    pub fn set_return_nothing(&self, nothing: bool) {
        self.return_nothing.store(nothing, Ordering::SeqCst);
    }

    /// 已收到的登记请求
    pub async fn register_calls(&self) -> Vec<RegisterPatientPayload> {
        self.register_calls.read().await.clone()
    }

    pub async fn register_call_count(&self) -> usize {
        self.register_calls.read().await.len()
    }

    pub async fn patient_for_user(&self, user_id: &str) -> Option<PatientRecord> {
        self.patients
            .read()
            .await
            .values()
            .find(|record| record.user_id == user_id)
            .cloned()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PatientService for MemoryBackend {
    async fn register_patient(&self, payload: RegisterPatientPayload) -> Result<Option<PatientRecord>> {
        self.register_calls.write().await.push(payload.clone());
        self.simulate_latency().await;

        if self.fail_registrations.load(Ordering::SeqCst) {
            return Err(CarePulseError::Backend("patient registration rejected".to_string()));
        }
        if self.return_nothing.load(Ordering::SeqCst) {
            debug!("Memory backend returning no record for {}", payload.patient().user_id);
            return Ok(None);
        }

        let patient = payload.patient();
        let document_id = payload.document().map(|_| generate_id());
        let record = PatientRecord {
            id: generate_id(),
            user_id: patient.user_id.clone(),
            name: patient.name.clone(),
            email: patient.email.clone(),
            phone: patient.phone.clone(),
            identification_document_url: document_id
                .as_ref()
                .map(|id| format!("memory://documents/{}", id)),
            identification_document_id: document_id,
            created_at: Utc::now(),
        };

        info!("Stored patient {} for user {}", record.id, record.user_id);
        self.patients
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(Some(record))
    }
}

#[async_trait]
impl AppointmentService for MemoryBackend {
    async fn get_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>> {
        self.simulate_latency().await;
        Ok(self.appointments.read().await.get(appointment_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carepulse_core::{AppointmentStatus, Gender, PatientRegistration, UploadedFile};
    use chrono::{NaiveDate, TimeZone};

    fn payload(document: Option<UploadedFile>) -> RegisterPatientPayload {
        let registration = PatientRegistration {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+15551234567".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: Gender::Female,
            address: None,
            occupation: None,
            emergency_contact_name: None,
            emergency_contact_number: None,
            primary_physician: None,
            insurance_provider: None,
            insurance_policy_number: None,
            allergies: None,
            current_medication: None,
            family_medical_history: None,
            past_medical_history: None,
            identification_type: None,
            identification_number: None,
            identification_document: document,
            treatment_consent: true,
            disclosure_consent: true,
            privacy_consent: true,
        };
        RegisterPatientPayload::build("user-1", &registration)
    }

    #[tokio::test]
    async fn test_register_records_calls() {
        let backend = MemoryBackend::new();
        let record = backend
            .register_patient(payload(Some(UploadedFile::new("id.pdf", "application/pdf", vec![1]))))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.user_id, "user-1");
        assert!(record.identification_document_id.is_some());
        assert_eq!(backend.register_call_count().await, 1);
        assert!(backend.register_calls().await[0].is_multipart());
        assert_eq!(backend.patient_for_user("user-1").await.unwrap().id, record.id);
    }

    #[tokio::test]
    async fn test_failure_and_empty_toggles() {
        let backend = MemoryBackend::new();
        backend.set_fail_registrations(true);
        assert!(matches!(
            backend.register_patient(payload(None)).await,
            Err(CarePulseError::Backend(_))
        ));

        backend.set_fail_registrations(false);
        backend.set_return_nothing(true);
        assert!(backend.register_patient(payload(None)).await.unwrap().is_none());
        assert_eq!(backend.register_call_count().await, 2);
    }

    #[tokio::test]
    async fn test_get_appointment() {
        let backend = MemoryBackend::new();
        backend
            .insert_appointment(Appointment {
                id: "appt-1".to_string(),
                user_id: "user-1".to_string(),
                patient_id: None,
                schedule: Utc.with_ymd_and_hms(2023, 10, 17, 8, 0, 0).unwrap(),
                primary_physician: "John Green".to_string(),
                reason: "Check-up".to_string(),
                note: None,
                status: AppointmentStatus::Scheduled,
                cancellation_reason: None,
            })
            .await;

        assert!(backend.get_appointment("appt-1").await.unwrap().is_some());
        assert!(backend.get_appointment("appt-2").await.unwrap().is_none());
    }
}
