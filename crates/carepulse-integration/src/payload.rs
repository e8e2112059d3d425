//! 患者登记请求体
//!
//! 没有证件文件时请求体为纯JSON；带文件时为multipart表单，
//! 文件以 `blobFile` 部分发送（保留媒体类型），原始文件名以 `fileName` 发送。

use carepulse_core::utils::normalize_date;
use carepulse_core::{Gender, IdentificationType, PatientRegistration, Result, UploadedFile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PATIENT_PART: &str = "patient";
pub const BLOB_FILE_PART: &str = "blobFile";
pub const FILE_NAME_PART: &str = "fileName";

/// 合并了用户标识的登记数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientSubmission {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// 规范化为当天零点 (UTC)
    pub birth_date: DateTime<Utc>,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_physician: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_policy_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_medication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_type: Option<IdentificationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_number: Option<String>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
}

impl PatientSubmission {
    pub fn from_registration(user_id: &str, registration: &PatientRegistration) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: registration.name.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            birth_date: normalize_date(registration.birth_date),
            gender: registration.gender,
            address: registration.address.clone(),
            occupation: registration.occupation.clone(),
            emergency_contact_name: registration.emergency_contact_name.clone(),
            emergency_contact_number: registration.emergency_contact_number.clone(),
            primary_physician: registration.primary_physician.clone(),
            insurance_provider: registration.insurance_provider.clone(),
            insurance_policy_number: registration.insurance_policy_number.clone(),
            allergies: registration.allergies.clone(),
            current_medication: registration.current_medication.clone(),
            family_medical_history: registration.family_medical_history.clone(),
            past_medical_history: registration.past_medical_history.clone(),
            identification_type: registration.identification_type,
            identification_number: registration.identification_number.clone(),
            treatment_consent: registration.treatment_consent,
            disclosure_consent: registration.disclosure_consent,
            privacy_consent: registration.privacy_consent,
        }
    }
}

/// 带媒体类型的二进制数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobFile {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 证件文件上传
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub blob: BlobFile,
}

impl From<&UploadedFile> for DocumentUpload {
    fn from(file: &UploadedFile) -> Self {
        Self {
            file_name: file.file_name.clone(),
            blob: BlobFile {
                content_type: file.content_type.clone(),
                bytes: file.bytes.clone(),
            },
        }
    }
}

/// multipart表单中的单个部分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    Blob {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: &'static str,
    pub value: PartValue,
}

/// 患者登记请求体
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterPatientPayload {
    Json(PatientSubmission),
    Multipart {
        patient: PatientSubmission,
        document: DocumentUpload,
    },
}

impl RegisterPatientPayload {
    /// 合并表单值、用户标识和规范化后的出生日期
    pub fn build(user_id: &str, registration: &PatientRegistration) -> Self {
        let patient = PatientSubmission::from_registration(user_id, registration);
        match &registration.identification_document {
            Some(file) => Self::Multipart {
                patient,
                document: DocumentUpload::from(file),
            },
            None => Self::Json(patient),
        }
    }

    pub fn patient(&self) -> &PatientSubmission {
        match self {
            Self::Json(patient) => patient,
            Self::Multipart { patient, .. } => patient,
        }
    }

    pub fn document(&self) -> Option<&DocumentUpload> {
        match self {
            Self::Json(_) => None,
            Self::Multipart { document, .. } => Some(document),
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }

    /// multipart表单的各部分；JSON请求体返回空列表
    pub fn multipart_parts(&self) -> Result<Vec<MultipartPart>> {
        let (patient, document) = match self {
            Self::Json(_) => return Ok(Vec::new()),
            Self::Multipart { patient, document } => (patient, document),
        };

        Ok(vec![
            MultipartPart {
                name: PATIENT_PART,
                value: PartValue::Text(serde_json::to_string(patient)?),
            },
            MultipartPart {
                name: BLOB_FILE_PART,
                value: PartValue::Blob {
                    file_name: document.file_name.clone(),
                    content_type: document.blob.content_type.clone(),
                    bytes: document.blob.bytes.clone(),
                },
            },
            MultipartPart {
                name: FILE_NAME_PART,
                value: PartValue::Text(document.file_name.clone()),
            },
        ])
    }
}
