//! 患者登记流程演示程序
//!
//! 使用内存后端走完一遍登记与预约确认：逐字段填写、校验失败、成功提交、
//! 带证件文件提交以及确认页的各种状态

use carepulse_core::{Appointment, AppointmentStatus, ReferenceData, UploadedFile};
use carepulse_forms::{FormController, FormEvent, RegistrationField, RegistrationSchema};
use carepulse_integration::MemoryBackend;
use carepulse_workflow::{
    load_confirmation, ConfirmationView, Route, SubmissionOrchestrator, SubmissionOutcome,
};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("🚀 CarePulse 患者登记演示\n");

    let reference = Arc::new(ReferenceData::default());
    let schema = Arc::new(RegistrationSchema::new(reference.clone())?);
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = SubmissionOrchestrator::new(backend.clone());
    let user_id = "demo-user";

    // 1. 逐字段填写，订阅者收到每次变更
    let mut form = FormController::new(schema.clone());
    let mut events = form.subscribe();

    form.set_field(RegistrationField::Name, "Jane Doe".into())?;
    form.set_field(RegistrationField::Email, "jane@example".into())?;
    while let Ok(event) = events.try_recv() {
        if let FormEvent::FieldChanged { field, error } = event {
            println!("✏️  {} -> {}", field, error.as_deref().unwrap_or("ok"));
        }
    }

    // 2. 缺少同意项时提交被拒绝，不会调用后端
    form.set_field(RegistrationField::Email, "jane@example.com".into())?;
    form.set_field(RegistrationField::Phone, "+15551234567".into())?;
    form.set_field(RegistrationField::BirthDate, "1990-01-01".into())?;
    form.set_field(RegistrationField::Gender, "female".into())?;

    if let SubmissionOutcome::Rejected(result) = orchestrator.submit(user_id, &mut form).await? {
        println!("\n❌ 校验未通过:\n{}", result.get_summary());
    }
    println!("   后端调用次数: {}", backend.register_call_count().await);

    // 3. 补齐同意项后提交
    form.set_field(RegistrationField::TreatmentConsent, true.into())?;
    form.set_field(RegistrationField::DisclosureConsent, true.into())?;
    form.set_field(RegistrationField::PrivacyConsent, true.into())?;

    let outcome = orchestrator.submit(user_id, &mut form).await?;
    if let SubmissionOutcome::Navigate(route) = &outcome {
        println!("\n✅ 登记成功，跳转到 {}", route);
    }

    // 4. 带证件文件的登记以multipart发送
    let mut with_document = FormController::new(schema);
    for (field, value) in [
        (RegistrationField::Name, "John Doe"),
        (RegistrationField::Email, "john@example.com"),
        (RegistrationField::Phone, "+15557654321"),
        (RegistrationField::BirthDate, "1985-05-20"),
        (RegistrationField::PrimaryPhysician, "Leila Cameron"),
    ] {
        with_document.set_field(field, value.into())?;
    }
    for field in [
        RegistrationField::TreatmentConsent,
        RegistrationField::DisclosureConsent,
        RegistrationField::PrivacyConsent,
    ] {
        with_document.set_field(field, true.into())?;
    }
    with_document.set_field(
        RegistrationField::IdentificationDocument,
        UploadedFile::new("id.png", "image/png", vec![137, 80, 78, 71]).into(),
    )?;
    orchestrator.submit("demo-user-2", &mut with_document).await?;

    for call in backend.register_calls().await {
        println!(
            "📨 {} ({})",
            call.patient().user_id,
            if call.is_multipart() { "multipart" } else { "json" }
        );
        for part in call.multipart_parts()? {
            println!("   - part {}", part.name);
        }
    }

    // 5. 预约确认页
    backend
        .insert_appointment(Appointment {
            id: "appt-1".to_string(),
            user_id: user_id.to_string(),
            patient_id: None,
            schedule: Utc
                .with_ymd_and_hms(2023, 10, 17, 8, 0, 0)
                .single()
                .ok_or_else(|| anyhow::anyhow!("invalid schedule"))?,
            primary_physician: "John Green".to_string(),
            reason: "Annual check-up".to_string(),
            note: None,
            status: AppointmentStatus::Pending,
            cancellation_reason: None,
        })
        .await;

    for appointment_id in ["appt-1", "missing", ""] {
        let page = Route::AppointmentSuccess {
            user_id: user_id.to_string(),
            appointment_id: appointment_id.to_string(),
        };
        println!("\n🌐 {}", page);
        match load_confirmation(backend.as_ref(), &reference, user_id, appointment_id).await? {
            ConfirmationView::Found(summary) => println!(
                "📅 {} 与 {} 的预约: {}",
                summary.appointment_id, summary.doctor_name, summary.schedule.date_time
            ),
            ConfirmationView::NotFound { appointment_id, .. } => {
                println!("🔍 未找到预约 {:?}", appointment_id)
            }
        }
    }

    println!("\n🎉 演示完成");
    Ok(())
}
