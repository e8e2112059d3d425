//! 登记提交编排
//!
//! 每次用户点击提交调用一次 [`SubmissionOrchestrator::submit`]：
//!
//! 1. 按用户标识占用提交标记，已被占用时直接返回，不调用后端
//! 2. 校验整个表单，失败时返回错误表
//! 3. 组装请求体（带证件文件时为multipart）并调用登记接口
//! 4. 返回记录则跳转到新建预约页，否则在表单上显示提交错误
//!
//! 提交标记在所有路径上都会释放。失败后只能手动重新提交。

use carepulse_core::Result;
use carepulse_forms::{FormController, SubmissionStatus, ValidationResult};
use carepulse_integration::{PatientService, RegisterPatientPayload};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

use crate::navigation::Route;
use crate::state_machine::{SubmissionEvent, SubmissionStateMachine};

/// 提交失败时在表单上显示的提示
pub const SUBMISSION_FAILED_MESSAGE: &str =
    "We couldn't complete your registration. Please try again.";

/// 一次提交的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// 登记成功，跳转到下一页
    Navigate(Route),
    /// 表单校验未通过，未调用后端
    Rejected(ValidationResult),
    /// 后端失败或未返回记录，可重新提交
    Failed { message: String },
    /// 同一用户已有提交在进行中
    AlreadySubmitting,
}

impl SubmissionOutcome {
    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Navigate(_) => "registered",
            SubmissionOutcome::Rejected(_) => "rejected",
            SubmissionOutcome::Failed { .. } => "failed",
            SubmissionOutcome::AlreadySubmitting => "duplicate",
        }
    }
}

type InFlight = Arc<Mutex<HashSet<String>>>;

/// 提交标记，离开作用域时释放
struct InFlightGuard {
    in_flight: InFlight,
    user_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&self.user_id);
    }
}

/// 登记提交编排器，在所有表单实例间共享
pub struct SubmissionOrchestrator {
    patients: Arc<dyn PatientService>,
    state_machine: SubmissionStateMachine,
    in_flight: InFlight,
}

impl SubmissionOrchestrator {
    pub fn new(patients: Arc<dyn PatientService>) -> Self {
        Self {
            patients,
            state_machine: SubmissionStateMachine::new(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// 该用户是否有提交在进行中
    pub fn is_in_flight(&self, user_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(user_id)
    }

    fn claim(&self, user_id: &str) -> Option<InFlightGuard> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(user_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            user_id: user_id.to_string(),
        })
    }

    /// 提交登记表单
    pub async fn submit(&self, user_id: &str, form: &mut FormController) -> Result<SubmissionOutcome> {
        if form.is_loading() {
            warn!("Form for user {} is already submitting", user_id);
            return Ok(SubmissionOutcome::AlreadySubmitting);
        }
        // 已登记成功的表单不再调用后端，直接回到新建预约页
        if form.submission_status() == SubmissionStatus::Succeeded {
            info!("Registration for user {} already completed", user_id);
            return Ok(SubmissionOutcome::Navigate(Route::NewAppointment {
                user_id: user_id.to_string(),
            }));
        }
        let Some(_guard) = self.claim(user_id) else {
            warn!("Duplicate registration submit for user {}", user_id);
            return Ok(SubmissionOutcome::AlreadySubmitting);
        };

        let registration = match form.submit() {
            Ok(registration) => registration,
            Err(result) => {
                warn!(
                    "Registration for user {} rejected: {}",
                    user_id,
                    result.get_summary()
                );
                return Ok(SubmissionOutcome::Rejected(result));
            }
        };

        let submitting = self
            .state_machine
            .transition(form.submission_status(), SubmissionEvent::Submit)?;
        form.set_submission(submitting, None);

        let payload = RegisterPatientPayload::build(user_id, &registration);
        info!(
            "Submitting registration for user {} (document attached: {})",
            user_id,
            payload.is_multipart()
        );

        match self.patients.register_patient(payload).await {
            Ok(Some(record)) => {
                let succeeded = self
                    .state_machine
                    .transition(form.submission_status(), SubmissionEvent::Succeed)?;
                form.set_submission(succeeded, None);
                info!("Registered patient {} for user {}", record.id, user_id);
                Ok(SubmissionOutcome::Navigate(Route::NewAppointment {
                    user_id: user_id.to_string(),
                }))
            }
            Ok(None) => {
                error!("Registration for user {} returned no patient record", user_id);
                self.fail(form)
            }
            Err(e) => {
                error!("Registration for user {} failed: {}", user_id, e);
                self.fail(form)
            }
        }
    }

    fn fail(&self, form: &mut FormController) -> Result<SubmissionOutcome> {
        let failed = self
            .state_machine
            .transition(form.submission_status(), SubmissionEvent::Fail)?;
        form.set_submission(failed, Some(SUBMISSION_FAILED_MESSAGE.to_string()));
        Ok(SubmissionOutcome::Failed {
            message: SUBMISSION_FAILED_MESSAGE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carepulse_core::{ReferenceData, UploadedFile};
    use carepulse_forms::{RegistrationField, RegistrationSchema, SubmissionStatus};
    use carepulse_integration::{MemoryBackend, PartValue};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn form() -> FormController {
        let schema = RegistrationSchema::new(Arc::new(ReferenceData::default())).unwrap();
        FormController::with_today(Arc::new(schema), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn jane_doe() -> FormController {
        let mut form = form();
        form.set_field(RegistrationField::Name, "Jane Doe".into()).unwrap();
        form.set_field(RegistrationField::Email, "jane@example.com".into()).unwrap();
        form.set_field(RegistrationField::Phone, "+15551234567".into()).unwrap();
        form.set_field(RegistrationField::BirthDate, "1990-01-01".into()).unwrap();
        form.set_field(RegistrationField::Gender, "female".into()).unwrap();
        form.set_field(RegistrationField::TreatmentConsent, true.into()).unwrap();
        form.set_field(RegistrationField::DisclosureConsent, true.into()).unwrap();
        form.set_field(RegistrationField::PrivacyConsent, true.into()).unwrap();
        form
    }

    #[tokio::test]
    async fn test_jane_doe_registers_with_json_payload() {
        let backend = Arc::new(MemoryBackend::new());
        let orchestrator = SubmissionOrchestrator::new(backend.clone());
        let mut form = jane_doe();

        let outcome = orchestrator.submit("user-42", &mut form).await.unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::Navigate(Route::NewAppointment {
                user_id: "user-42".to_string()
            })
        );
        assert_eq!(form.submission_status(), SubmissionStatus::Succeeded);

        let calls = backend.register_calls().await;
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].is_multipart());
        assert_eq!(calls[0].patient().user_id, "user-42");
        assert!(!orchestrator.is_in_flight("user-42"));
    }

    #[tokio::test]
    async fn test_document_is_sent_as_multipart() {
        let backend = Arc::new(MemoryBackend::new());
        let orchestrator = SubmissionOrchestrator::new(backend.clone());
        let mut form = jane_doe();
        form.set_field(
            RegistrationField::IdentificationDocument,
            UploadedFile::new("id.png", "image/png", vec![137, 80, 78, 71]).into(),
        )
        .unwrap();

        orchestrator.submit("user-42", &mut form).await.unwrap();

        let calls = backend.register_calls().await;
        let parts = calls[0].multipart_parts().unwrap();
        assert!(parts
            .iter()
            .any(|part| part.name == "fileName" && part.value == PartValue::Text("id.png".to_string())));
        assert!(parts.iter().any(|part| part.name == "blobFile"
            && matches!(&part.value, PartValue::Blob { content_type, .. } if content_type == "image/png")));
    }

    #[tokio::test]
    async fn test_missing_consent_never_calls_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let orchestrator = SubmissionOrchestrator::new(backend.clone());
        let mut form = jane_doe();
        form.set_field(RegistrationField::DisclosureConsent, false.into()).unwrap();

        let outcome = orchestrator.submit("user-42", &mut form).await.unwrap();
        match outcome {
            SubmissionOutcome::Rejected(result) => {
                assert!(result.error(RegistrationField::DisclosureConsent).is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(backend.register_call_count().await, 0);
        assert_eq!(form.submission_status(), SubmissionStatus::Idle);
        assert!(!orchestrator.is_in_flight("user-42"));
    }

    #[tokio::test]
    async fn test_backend_failure_allows_manual_retry() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_fail_registrations(true);
        let orchestrator = SubmissionOrchestrator::new(backend.clone());
        let mut form = jane_doe();

        let outcome = orchestrator.submit("user-42", &mut form).await.unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::Failed {
                message: SUBMISSION_FAILED_MESSAGE.to_string()
            }
        );
        assert_eq!(form.submission_error(), Some(SUBMISSION_FAILED_MESSAGE));
        assert!(!form.is_loading());

        backend.set_fail_registrations(false);
        let outcome = orchestrator.submit("user-42", &mut form).await.unwrap();
        assert!(matches!(outcome, SubmissionOutcome::Navigate(_)));
        assert_eq!(form.submission_error(), None);
        assert_eq!(backend.register_call_count().await, 2);
    }

    #[tokio::test]
    async fn test_absent_record_is_a_failure() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_return_nothing(true);
        let orchestrator = SubmissionOrchestrator::new(backend);
        let mut form = jane_doe();

        let outcome = orchestrator.submit("user-42", &mut form).await.unwrap();
        assert_eq!(outcome.label(), "failed");
        assert_eq!(form.submission_status(), SubmissionStatus::Failed);
    }

    #[tokio::test]
    async fn test_resubmitting_succeeded_form_navigates_without_backend_call() {
        let backend = Arc::new(MemoryBackend::new());
        let orchestrator = SubmissionOrchestrator::new(backend.clone());
        let mut form = jane_doe();

        let first = orchestrator.submit("user-42", &mut form).await.unwrap();
        assert_eq!(form.submission_status(), SubmissionStatus::Succeeded);

        let second = orchestrator.submit("user-42", &mut form).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(
            second,
            SubmissionOutcome::Navigate(Route::NewAppointment {
                user_id: "user-42".to_string()
            })
        );
        assert_eq!(backend.register_call_count().await, 1);
        assert!(!orchestrator.is_in_flight("user-42"));
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_rejected() {
        let backend = Arc::new(MemoryBackend::new().with_latency(Duration::from_millis(50)));
        let orchestrator = SubmissionOrchestrator::new(backend.clone());
        let mut first = jane_doe();
        let mut second = jane_doe();

        let (a, b) = tokio::join!(
            orchestrator.submit("user-42", &mut first),
            orchestrator.submit("user-42", &mut second)
        );

        assert!(matches!(a.unwrap(), SubmissionOutcome::Navigate(_)));
        assert_eq!(b.unwrap(), SubmissionOutcome::AlreadySubmitting);
        assert_eq!(backend.register_call_count().await, 1);
        assert!(!orchestrator.is_in_flight("user-42"));
    }
}
