//! 页面路由

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;

/// 路径段中需要转义的字符
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// 查询参数值中需要转义的字符
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`');

/// 流程中的页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Register { user_id: String },
    NewAppointment { user_id: String },
    AppointmentSuccess { user_id: String, appointment_id: String },
}

impl Route {
    /// 站内链接，标识符按路径段或查询参数转义
    pub fn href(&self) -> String {
        match self {
            Route::Register { user_id } => {
                format!("/patients/{}/register", utf8_percent_encode(user_id, PATH_SEGMENT))
            }
            Route::NewAppointment { user_id } => format!(
                "/patients/{}/new-appointment",
                utf8_percent_encode(user_id, PATH_SEGMENT)
            ),
            Route::AppointmentSuccess {
                user_id,
                appointment_id,
            } => format!(
                "/patients/{}/new-appointment/success?appointmentId={}",
                utf8_percent_encode(user_id, PATH_SEGMENT),
                utf8_percent_encode(appointment_id, QUERY_VALUE)
            ),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}
