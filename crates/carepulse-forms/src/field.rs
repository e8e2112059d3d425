//! 登记表单字段目录

use carepulse_core::{CarePulseError, Result, UploadedFile};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 登记表单的全部字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegistrationField {
    Name,
    Email,
    Phone,
    BirthDate,
    Gender,
    Address,
    Occupation,
    EmergencyContactName,
    EmergencyContactNumber,
    PrimaryPhysician,
    InsuranceProvider,
    InsurancePolicyNumber,
    Allergies,
    CurrentMedication,
    FamilyMedicalHistory,
    PastMedicalHistory,
    IdentificationType,
    IdentificationNumber,
    IdentificationDocument,
    TreatmentConsent,
    DisclosureConsent,
    PrivacyConsent,
}

/// 字段取值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Flag,
    Files,
}

impl RegistrationField {
    pub const ALL: [RegistrationField; 22] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::BirthDate,
        Self::Gender,
        Self::Address,
        Self::Occupation,
        Self::EmergencyContactName,
        Self::EmergencyContactNumber,
        Self::PrimaryPhysician,
        Self::InsuranceProvider,
        Self::InsurancePolicyNumber,
        Self::Allergies,
        Self::CurrentMedication,
        Self::FamilyMedicalHistory,
        Self::PastMedicalHistory,
        Self::IdentificationType,
        Self::IdentificationNumber,
        Self::IdentificationDocument,
        Self::TreatmentConsent,
        Self::DisclosureConsent,
        Self::PrivacyConsent,
    ];

    /// 控件与提交数据中使用的字段名
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::BirthDate => "birthDate",
            Self::Gender => "gender",
            Self::Address => "address",
            Self::Occupation => "occupation",
            Self::EmergencyContactName => "emergencyContactName",
            Self::EmergencyContactNumber => "emergencyContactNumber",
            Self::PrimaryPhysician => "primaryPhysician",
            Self::InsuranceProvider => "insuranceProvider",
            Self::InsurancePolicyNumber => "insurancePolicyNumber",
            Self::Allergies => "allergies",
            Self::CurrentMedication => "currentMedication",
            Self::FamilyMedicalHistory => "familyMedicalHistory",
            Self::PastMedicalHistory => "pastMedicalHistory",
            Self::IdentificationType => "identificationType",
            Self::IdentificationNumber => "identificationNumber",
            Self::IdentificationDocument => "identificationDocument",
            Self::TreatmentConsent => "treatmentConsent",
            Self::DisclosureConsent => "disclosureConsent",
            Self::PrivacyConsent => "privacyConsent",
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::TreatmentConsent | Self::DisclosureConsent | Self::PrivacyConsent => ValueKind::Flag,
            Self::IdentificationDocument => ValueKind::Files,
            _ => ValueKind::Text,
        }
    }

    fn default_value(&self) -> FieldValue {
        match self {
            Self::Gender => FieldValue::Text(carepulse_core::Gender::default().as_str().to_string()),
            _ => match self.value_kind() {
                ValueKind::Text => FieldValue::Text(String::new()),
                ValueKind::Flag => FieldValue::Flag(false),
                ValueKind::Files => FieldValue::Files(Vec::new()),
            },
        }
    }
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationField {
    type Err = CarePulseError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| CarePulseError::Validation(format!("Unknown form field: {}", value)))
    }
}

/// 字段当前值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Files(Vec<UploadedFile>),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Flag(_) => ValueKind::Flag,
            FieldValue::Files(_) => ValueKind::Files,
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(text) => text,
            _ => "",
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    pub fn as_files(&self) -> &[UploadedFile] {
        match self {
            FieldValue::Files(files) => files,
            _ => &[],
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<UploadedFile> for FieldValue {
    fn from(value: UploadedFile) -> Self {
        FieldValue::Files(vec![value])
    }
}

/// 未经校验的表单草稿
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDraft {
    values: BTreeMap<RegistrationField, FieldValue>,
}

impl RegistrationDraft {
    pub fn new() -> Self {
        let values = RegistrationField::ALL
            .iter()
            .map(|field| (*field, field.default_value()))
            .collect();
        Self { values }
    }

    /// 写入字段值，值类型必须与字段声明一致
    pub fn set(&mut self, field: RegistrationField, value: FieldValue) -> Result<()> {
        if value.kind() != field.value_kind() {
            return Err(CarePulseError::Validation(format!(
                "Field {} expects {:?}, got {:?}",
                field,
                field.value_kind(),
                value.kind()
            )));
        }
        self.values.insert(field, value);
        Ok(())
    }

    pub fn get(&self, field: RegistrationField) -> &FieldValue {
        // 构造时已为每个字段填充默认值
        &self.values[&field]
    }

    /// 去除首尾空白后的文本值
    pub fn text(&self, field: RegistrationField) -> &str {
        self.get(field).as_text().trim()
    }

    /// 非空文本值
    pub fn optional_text(&self, field: RegistrationField) -> Option<String> {
        let text = self.text(field);
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    pub fn flag(&self, field: RegistrationField) -> bool {
        self.get(field).as_flag()
    }

    pub fn files(&self, field: RegistrationField) -> &[UploadedFile] {
        self.get(field).as_files()
    }
}

impl Default for RegistrationDraft {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in RegistrationField::ALL {
            assert_eq!(field.as_str().parse::<RegistrationField>().unwrap(), field);
        }
        assert!("firstName".parse::<RegistrationField>().is_err());
    }

    #[test]
    fn test_draft_defaults() {
        let draft = RegistrationDraft::new();
        assert_eq!(draft.text(RegistrationField::Gender), "male");
        assert_eq!(draft.text(RegistrationField::Name), "");
        assert!(!draft.flag(RegistrationField::PrivacyConsent));
        assert!(draft.files(RegistrationField::IdentificationDocument).is_empty());
        assert_eq!(draft.optional_text(RegistrationField::Address), None);
    }

    #[test]
    fn test_draft_rejects_mismatched_kind() {
        let mut draft = RegistrationDraft::new();
        assert!(draft.set(RegistrationField::Name, FieldValue::Flag(true)).is_err());
        assert!(draft.set(RegistrationField::TreatmentConsent, "yes".into()).is_err());
        assert!(draft.set(RegistrationField::TreatmentConsent, true.into()).is_ok());
        assert!(draft.flag(RegistrationField::TreatmentConsent));
    }
}
