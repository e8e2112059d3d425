//! 核心数据模型定义

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CarePulseError;

/// 性别枚举
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = CarePulseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(CarePulseError::Validation(format!("Unknown gender: {}", value))),
        }
    }
}

/// 身份证件类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IdentificationType {
    #[serde(rename = "Birth Certificate")]
    BirthCertificate,
    #[serde(rename = "Driver's License")]
    DriversLicense,
    #[serde(rename = "Medical Insurance Card/Policy")]
    MedicalInsuranceCard,
    #[serde(rename = "Military ID Card")]
    MilitaryIdCard,
    #[serde(rename = "National Identity Card")]
    NationalIdentityCard,
    #[serde(rename = "Passport")]
    Passport,
    #[serde(rename = "Resident Alien Card (Green Card)")]
    ResidentAlienCard,
    #[serde(rename = "Social Security Card")]
    SocialSecurityCard,
    #[serde(rename = "State ID Card")]
    StateIdCard,
    #[serde(rename = "Student ID Card")]
    StudentIdCard,
    #[serde(rename = "Voter ID Card")]
    VoterIdCard,
}

impl IdentificationType {
    /// 所有证件类型，按表单展示顺序
    pub const ALL: [IdentificationType; 11] = [
        IdentificationType::BirthCertificate,
        IdentificationType::DriversLicense,
        IdentificationType::MedicalInsuranceCard,
        IdentificationType::MilitaryIdCard,
        IdentificationType::NationalIdentityCard,
        IdentificationType::Passport,
        IdentificationType::ResidentAlienCard,
        IdentificationType::SocialSecurityCard,
        IdentificationType::StateIdCard,
        IdentificationType::StudentIdCard,
        IdentificationType::VoterIdCard,
    ];

    /// 展示用标签，同时也是提交值
    pub fn label(&self) -> &'static str {
        match self {
            Self::BirthCertificate => "Birth Certificate",
            Self::DriversLicense => "Driver's License",
            Self::MedicalInsuranceCard => "Medical Insurance Card/Policy",
            Self::MilitaryIdCard => "Military ID Card",
            Self::NationalIdentityCard => "National Identity Card",
            Self::Passport => "Passport",
            Self::ResidentAlienCard => "Resident Alien Card (Green Card)",
            Self::SocialSecurityCard => "Social Security Card",
            Self::StateIdCard => "State ID Card",
            Self::StudentIdCard => "Student ID Card",
            Self::VoterIdCard => "Voter ID Card",
        }
    }
}

impl fmt::Display for IdentificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IdentificationType {
    type Err = CarePulseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.label() == value)
            .ok_or_else(|| {
                CarePulseError::Validation(format!("Unknown identification type: {}", value))
            })
    }
}

/// 用户上传的文件
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// 通过校验的患者登记信息
///
/// 只能由表单校验产生，三个同意项在此处恒为 `true`。
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_number: Option<String>,
    pub primary_physician: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub family_medical_history: Option<String>,
    pub past_medical_history: Option<String>,
    pub identification_type: Option<IdentificationType>,
    pub identification_number: Option<String>,
    pub identification_document: Option<UploadedFile>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
}

/// 外部服务返回的患者记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub identification_document_id: Option<String>,
    #[serde(default)]
    pub identification_document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 预约状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,   // 待确认
    Scheduled, // 已预约
    Cancelled, // 已取消
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

/// 预约信息（只读）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    pub schedule: DateTime<Utc>,
    pub primary_physician: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub note: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}
