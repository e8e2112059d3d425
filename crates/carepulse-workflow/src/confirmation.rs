//! 预约确认
//!
//! 根据预约标识查询预约，并按医生姓名精确匹配医生列表（取第一个匹配）。
//! 找不到预约时返回明确的未找到状态；找不到医生时使用预约中保存的
//! 医生姓名和默认头像。

use carepulse_core::utils::{escape_html, format_date_time, FormattedDateTime};
use carepulse_core::{AppointmentStatus, ReferenceData, Result};
use carepulse_integration::AppointmentService;
use tracing::{debug, warn};

use crate::navigation::Route;

/// 未匹配到医生时的头像
pub const FALLBACK_DOCTOR_IMAGE: &str = "/assets/icons/user.svg";

/// 确认页展示的预约信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentSummary {
    pub appointment_id: String,
    pub user_id: String,
    /// 带 "Dr. " 前缀的医生姓名
    pub doctor_name: String,
    pub doctor_image: String,
    pub doctor_matched: bool,
    pub schedule: FormattedDateTime,
    pub status: AppointmentStatus,
    pub reason: String,
}

impl AppointmentSummary {
    pub fn new_appointment_route(&self) -> Route {
        Route::NewAppointment {
            user_id: self.user_id.clone(),
        }
    }
}

/// 确认页状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationView {
    Found(AppointmentSummary),
    NotFound { user_id: String, appointment_id: String },
}

impl ConfirmationView {
    pub fn is_found(&self) -> bool {
        matches!(self, ConfirmationView::Found(_))
    }

    /// 渲染页面主体
    pub fn to_html(&self) -> String {
        match self {
            ConfirmationView::Found(summary) => {
                let new_appointment = summary.new_appointment_route().href();
                format!(
                    concat!(
                        r#"<section class="success"><img src="/assets/gifs/success.gif" alt="success" width="300" height="280"/>"#,
                        r#"<h2 class="header">Your <span class="text-green-500">appointment request</span> has been successfully submitted!</h2>"#,
                        r#"<p>We will be in touch shortly to confirm.</p></section>"#,
                        r#"<section class="request-details"><p>Requested appointment details:</p>"#,
                        r#"<div class="doctor"><img src="{image}" alt="doctor" width="24" height="24"/><p>{doctor}</p></div>"#,
                        r#"<div class="schedule"><img src="/assets/icons/calendar.svg" alt="calendar" width="24" height="24"/><p>{schedule}</p></div>"#,
                        r#"</section><a class="shad-primary-btn" href="{href}">New Appointment</a>"#
                    ),
                    image = escape_html(&summary.doctor_image),
                    doctor = escape_html(&summary.doctor_name),
                    schedule = escape_html(&summary.schedule.date_time),
                    href = escape_html(&new_appointment),
                )
            }
            ConfirmationView::NotFound { user_id, .. } => {
                let new_appointment = Route::NewAppointment {
                    user_id: user_id.clone(),
                };
                format!(
                    concat!(
                        r#"<section class="not-found"><h2 class="header">Appointment not found</h2>"#,
                        r#"<p>We couldn't find the appointment you are looking for.</p></section>"#,
                        r#"<a class="shad-primary-btn" href="{href}">New Appointment</a>"#
                    ),
                    href = escape_html(&new_appointment.href()),
                )
            }
        }
    }
}

/// 医生展示名，已带 "Dr." 前缀时保持不变
pub fn doctor_display_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("Dr.") {
        name.to_string()
    } else {
        format!("Dr. {}", name)
    }
}

/// 加载预约确认信息
pub async fn load_confirmation(
    appointments: &dyn AppointmentService,
    reference: &ReferenceData,
    user_id: &str,
    appointment_id: &str,
) -> Result<ConfirmationView> {
    let not_found = || ConfirmationView::NotFound {
        user_id: user_id.to_string(),
        appointment_id: appointment_id.to_string(),
    };

    if appointment_id.is_empty() {
        debug!("Confirmation requested without appointment id for user {}", user_id);
        return Ok(not_found());
    }

    let Some(appointment) = appointments.get_appointment(appointment_id).await? else {
        debug!("Appointment {} not found", appointment_id);
        return Ok(not_found());
    };

    if appointment.user_id != user_id {
        warn!(
            "Appointment {} belongs to user {}, requested by {}",
            appointment.id, appointment.user_id, user_id
        );
    }

    let (doctor_name, doctor_image, doctor_matched) =
        match reference.find_doctor(&appointment.primary_physician) {
            Some(doctor) => (doctor.name.clone(), doctor.image.clone(), true),
            None => {
                warn!(
                    "No doctor matches physician {:?} on appointment {}",
                    appointment.primary_physician, appointment.id
                );
                (
                    appointment.primary_physician.clone(),
                    FALLBACK_DOCTOR_IMAGE.to_string(),
                    false,
                )
            }
        };

    Ok(ConfirmationView::Found(AppointmentSummary {
        appointment_id: appointment.id.clone(),
        user_id: user_id.to_string(),
        doctor_name: doctor_display_name(&doctor_name),
        doctor_image,
        doctor_matched,
        schedule: format_date_time(&appointment.schedule),
        status: appointment.status,
        reason: appointment.reason,
    }))
}
