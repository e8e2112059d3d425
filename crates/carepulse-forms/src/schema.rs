//! 登记表单校验规则
//!
//! 每个字段对应一组声明式规则，按顺序执行，遇到第一条失败的规则即停止。
//! 校验是纯函数：输入草稿与参考日期，输出错误映射或类型化的登记信息。

use carepulse_core::utils::parse_date;
use carepulse_core::{
    CarePulseError, Gender, IdentificationType, PatientRegistration, ReferenceData, Result,
};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::field::{RegistrationDraft, RegistrationField};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const PHONE_PATTERN: &str = r"^\+\d{10,15}$";

/// 单条校验规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// 必填，附带错误提示
    Required(&'static str),
    /// 最大长度（按字符计）
    MaxLength(usize),
    Email,
    Phone,
    /// 可解析且早于参考日期
    PastDate,
    GenderOption,
    KnownDoctor,
    IdentificationTypeOption,
    /// 另一个字段有值时本字段必填
    RequiredWith(RegistrationField, &'static str),
    /// 最多一个文件
    SingleFile,
    /// 同意项必须勾选
    MustConsent(&'static str),
}

/// 字段及其规则
#[derive(Debug, Clone)]
struct FieldRules {
    field: RegistrationField,
    rules: Vec<Rule>,
}

/// 校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// 字段错误，按字段声明顺序排列
    pub errors: BTreeMap<RegistrationField, String>,
    /// 是否通过验证
    pub is_valid: bool,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
            is_valid: true,
        }
    }

    /// 添加字段错误
    pub fn add_error(&mut self, field: RegistrationField, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.insert(field, message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn error(&self, field: RegistrationField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// 获取验证报告摘要
    pub fn get_summary(&self) -> String {
        if self.is_valid {
            "validation passed".to_string()
        } else {
            let fields: Vec<&str> = self.errors.keys().map(|field| field.as_str()).collect();
            format!("{} invalid field(s): {}", self.error_count(), fields.join(", "))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// 患者登记校验规则集
#[derive(Debug)]
pub struct RegistrationSchema {
    reference: Arc<ReferenceData>,
    fields: Vec<FieldRules>,
    email_pattern: Regex,
    phone_pattern: Regex,
}

impl RegistrationSchema {
    /// 基于参考数据创建规则集
    pub fn new(reference: Arc<ReferenceData>) -> Result<Self> {
        use RegistrationField as F;

        let email_pattern = Regex::new(EMAIL_PATTERN)
            .map_err(|e| CarePulseError::Internal(format!("email pattern: {}", e)))?;
        let phone_pattern = Regex::new(PHONE_PATTERN)
            .map_err(|e| CarePulseError::Internal(format!("phone pattern: {}", e)))?;

        let rules = |field, rules: Vec<Rule>| FieldRules { field, rules };
        let fields = vec![
            rules(F::Name, vec![Rule::Required("Name is required"), Rule::MaxLength(50)]),
            rules(F::Email, vec![Rule::Required("Email is required"), Rule::Email]),
            rules(F::Phone, vec![Rule::Required("Phone number is required"), Rule::Phone]),
            rules(F::BirthDate, vec![Rule::Required("Date of birth is required"), Rule::PastDate]),
            rules(F::Gender, vec![Rule::GenderOption]),
            rules(F::Address, vec![Rule::MaxLength(500)]),
            rules(F::Occupation, vec![Rule::MaxLength(500)]),
            rules(F::EmergencyContactName, vec![Rule::MaxLength(50)]),
            rules(F::EmergencyContactNumber, vec![Rule::Phone]),
            rules(F::PrimaryPhysician, vec![Rule::KnownDoctor]),
            rules(F::InsuranceProvider, vec![Rule::MaxLength(50)]),
            rules(F::InsurancePolicyNumber, vec![Rule::MaxLength(50)]),
            rules(F::Allergies, vec![Rule::MaxLength(1000)]),
            rules(F::CurrentMedication, vec![Rule::MaxLength(1000)]),
            rules(F::FamilyMedicalHistory, vec![Rule::MaxLength(1000)]),
            rules(F::PastMedicalHistory, vec![Rule::MaxLength(1000)]),
            rules(F::IdentificationType, vec![Rule::IdentificationTypeOption]),
            rules(
                F::IdentificationNumber,
                vec![
                    Rule::RequiredWith(
                        F::IdentificationType,
                        "Identification number is required for the selected identification type",
                    ),
                    Rule::MaxLength(50),
                ],
            ),
            rules(F::IdentificationDocument, vec![Rule::SingleFile]),
            rules(
                F::TreatmentConsent,
                vec![Rule::MustConsent("You must consent to treatment in order to proceed")],
            ),
            rules(
                F::DisclosureConsent,
                vec![Rule::MustConsent("You must consent to disclosure in order to proceed")],
            ),
            rules(
                F::PrivacyConsent,
                vec![Rule::MustConsent("You must consent to privacy in order to proceed")],
            ),
        ];

        Ok(Self {
            reference,
            fields,
            email_pattern,
            phone_pattern,
        })
    }

    /// 字段声明的规则
    pub fn rules_for(&self, field: RegistrationField) -> &[Rule] {
        self.fields
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.rules.as_slice())
            .unwrap_or(&[])
    }

    /// 校验单个字段
    pub fn validate_field(
        &self,
        field: RegistrationField,
        draft: &RegistrationDraft,
        today: NaiveDate,
    ) -> Option<String> {
        self.rules_for(field)
            .iter()
            .find_map(|rule| self.check(rule, field, draft, today))
    }

    /// 以当天日期校验整个草稿
    pub fn validate(&self, draft: &RegistrationDraft) -> ValidationResult {
        self.validate_at(draft, Utc::now().date_naive())
    }

    /// 以指定参考日期校验整个草稿
    pub fn validate_at(&self, draft: &RegistrationDraft, today: NaiveDate) -> ValidationResult {
        let mut result = ValidationResult::new();
        for entry in &self.fields {
            if let Some(message) = self.validate_field(entry.field, draft, today) {
                result.add_error(entry.field, message);
            }
        }

        debug!("Registration draft validated: {}", result.get_summary());
        result
    }

    /// 校验并转换为类型化的登记信息
    pub fn parse_at(
        &self,
        draft: &RegistrationDraft,
        today: NaiveDate,
    ) -> std::result::Result<PatientRegistration, ValidationResult> {
        use RegistrationField as F;

        let mut result = self.validate_at(draft, today);
        if !result.is_valid {
            return Err(result);
        }

        let birth_date = parse_date(draft.text(F::BirthDate));
        let gender = draft.text(F::Gender).parse::<Gender>().ok();
        let identification_type = match draft.optional_text(F::IdentificationType) {
            Some(label) => match label.parse::<IdentificationType>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    result.add_error(F::IdentificationType, "Select a valid identification type");
                    None
                }
            },
            None => None,
        };

        let (birth_date, gender) = match (birth_date, gender) {
            (Some(birth_date), Some(gender)) if result.is_valid => (birth_date, gender),
            (birth_date, gender) => {
                if birth_date.is_none() {
                    result.add_error(F::BirthDate, "Invalid date");
                }
                if gender.is_none() {
                    result.add_error(F::Gender, "Select a valid gender");
                }
                return Err(result);
            }
        };

        Ok(PatientRegistration {
            name: draft.text(F::Name).to_string(),
            email: draft.text(F::Email).to_string(),
            phone: draft.text(F::Phone).to_string(),
            birth_date,
            gender,
            address: draft.optional_text(F::Address),
            occupation: draft.optional_text(F::Occupation),
            emergency_contact_name: draft.optional_text(F::EmergencyContactName),
            emergency_contact_number: draft.optional_text(F::EmergencyContactNumber),
            primary_physician: draft.optional_text(F::PrimaryPhysician),
            insurance_provider: draft.optional_text(F::InsuranceProvider),
            insurance_policy_number: draft.optional_text(F::InsurancePolicyNumber),
            allergies: draft.optional_text(F::Allergies),
            current_medication: draft.optional_text(F::CurrentMedication),
            family_medical_history: draft.optional_text(F::FamilyMedicalHistory),
            past_medical_history: draft.optional_text(F::PastMedicalHistory),
            identification_type,
            identification_number: draft.optional_text(F::IdentificationNumber),
            identification_document: draft.files(F::IdentificationDocument).first().cloned(),
            treatment_consent: draft.flag(F::TreatmentConsent),
            disclosure_consent: draft.flag(F::DisclosureConsent),
            privacy_consent: draft.flag(F::PrivacyConsent),
        })
    }

    /// 执行单条规则，失败时返回错误提示
    fn check(
        &self,
        rule: &Rule,
        field: RegistrationField,
        draft: &RegistrationDraft,
        today: NaiveDate,
    ) -> Option<String> {
        let text = draft.text(field);

        match rule {
            Rule::Required(message) => text.is_empty().then(|| message.to_string()),
            Rule::MaxLength(max) => (text.chars().count() > *max)
                .then(|| format!("Must be at most {} characters", max)),
            Rule::Email => (!text.is_empty() && !self.email_pattern.is_match(text))
                .then(|| "Invalid email address".to_string()),
            Rule::Phone => (!text.is_empty() && !self.phone_pattern.is_match(text))
                .then(|| "Invalid phone number".to_string()),
            Rule::PastDate => {
                if text.is_empty() {
                    return None;
                }
                match parse_date(text) {
                    Some(date) if date < today => None,
                    Some(_) => Some("Date of birth must be in the past".to_string()),
                    None => Some("Invalid date".to_string()),
                }
            }
            Rule::GenderOption => match text.parse::<Gender>() {
                Ok(gender) if self.reference.allows_gender(gender) => None,
                _ => Some("Select a valid gender".to_string()),
            },
            Rule::KnownDoctor => (!text.is_empty() && !self.reference.is_known_doctor(text))
                .then(|| "Select a physician from the list".to_string()),
            Rule::IdentificationTypeOption => {
                if text.is_empty() {
                    return None;
                }
                match text.parse::<IdentificationType>() {
                    Ok(kind) if self.reference.allows_identification_type(kind) => None,
                    _ => Some("Select a valid identification type".to_string()),
                }
            }
            Rule::RequiredWith(other, message) => {
                (!draft.text(*other).is_empty() && text.is_empty()).then(|| message.to_string())
            }
            Rule::SingleFile => (draft.files(field).len() > 1)
                .then(|| "Upload exactly one identification document".to_string()),
            Rule::MustConsent(message) => (!draft.flag(field)).then(|| message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use carepulse_core::UploadedFile;

    fn schema() -> RegistrationSchema {
        RegistrationSchema::new(Arc::new(ReferenceData::default())).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn valid_draft() -> RegistrationDraft {
        let mut draft = RegistrationDraft::new();
        draft.set(RegistrationField::Name, "Jane Doe".into()).unwrap();
        draft.set(RegistrationField::Email, "jane@example.com".into()).unwrap();
        draft.set(RegistrationField::Phone, "+15551234567".into()).unwrap();
        draft.set(RegistrationField::BirthDate, "1990-01-01".into()).unwrap();
        draft.set(RegistrationField::TreatmentConsent, true.into()).unwrap();
        draft.set(RegistrationField::DisclosureConsent, true.into()).unwrap();
        draft.set(RegistrationField::PrivacyConsent, true.into()).unwrap();
        draft
    }

    #[test]
    fn test_valid_draft_passes() {
        let result = schema().validate_at(&valid_draft(), today());
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(result.get_summary(), "validation passed");
    }

    #[test]
    fn test_parse_builds_registration() {
        let registration = schema().parse_at(&valid_draft(), today()).unwrap();
        assert_eq!(registration.name, "Jane Doe");
        assert_eq!(registration.birth_date, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(registration.gender, Gender::Male);
        assert!(registration.address.is_none());
        assert!(registration.identification_document.is_none());
        assert!(registration.treatment_consent && registration.disclosure_consent && registration.privacy_consent);
    }

    #[test]
    fn test_empty_draft_reports_required_fields() {
        let result = schema().validate_at(&RegistrationDraft::new(), today());
        assert!(!result.is_valid);
        assert_eq!(result.error(RegistrationField::Name), Some("Name is required"));
        assert_eq!(result.error(RegistrationField::Email), Some("Email is required"));
        assert_eq!(result.error(RegistrationField::Phone), Some("Phone number is required"));
        assert_eq!(
            result.error(RegistrationField::TreatmentConsent),
            Some("You must consent to treatment in order to proceed")
        );
        assert!(result.error(RegistrationField::Address).is_none());
        assert!(result.error(RegistrationField::Gender).is_none());
    }

    #[test]
    fn test_format_rules() {
        let schema = schema();
        let mut draft = valid_draft();
        draft.set(RegistrationField::Email, "jane.example.com".into()).unwrap();
        draft.set(RegistrationField::Phone, "5551234567".into()).unwrap();
        draft.set(RegistrationField::EmergencyContactNumber, "+1 555".into()).unwrap();

        let result = schema.validate_at(&draft, today());
        assert_eq!(result.error(RegistrationField::Email), Some("Invalid email address"));
        assert_eq!(result.error(RegistrationField::Phone), Some("Invalid phone number"));
        assert_eq!(
            result.error(RegistrationField::EmergencyContactNumber),
            Some("Invalid phone number")
        );
    }

    #[test]
    fn test_birth_date_must_be_in_the_past() {
        let schema = schema();
        let mut draft = valid_draft();

        draft.set(RegistrationField::BirthDate, "2024-06-01".into()).unwrap();
        assert_eq!(
            schema.validate_field(RegistrationField::BirthDate, &draft, today()),
            Some("Date of birth must be in the past".to_string())
        );

        draft.set(RegistrationField::BirthDate, "not a date".into()).unwrap();
        assert_eq!(
            schema.validate_field(RegistrationField::BirthDate, &draft, today()),
            Some("Invalid date".to_string())
        );

        draft.set(RegistrationField::BirthDate, "2024-05-31".into()).unwrap();
        assert_eq!(schema.validate_field(RegistrationField::BirthDate, &draft, today()), None);
    }

    #[test]
    fn test_identification_number_required_with_type() {
        let schema = schema();
        let mut draft = valid_draft();
        draft.set(RegistrationField::IdentificationType, "Passport".into()).unwrap();

        let result = schema.validate_at(&draft, today());
        assert!(result.error(RegistrationField::IdentificationNumber).is_some());

        draft.set(RegistrationField::IdentificationNumber, "X1234567".into()).unwrap();
        let registration = schema.parse_at(&draft, today()).unwrap();
        assert_eq!(registration.identification_type, Some(IdentificationType::Passport));
        assert_eq!(registration.identification_number.as_deref(), Some("X1234567"));
    }

    #[test]
    fn test_reference_backed_rules() {
        let schema = schema();
        let mut draft = valid_draft();
        draft.set(RegistrationField::PrimaryPhysician, "Dr. Nobody".into()).unwrap();
        draft.set(RegistrationField::IdentificationType, "Library Card".into()).unwrap();
        draft.set(RegistrationField::Gender, "unknown".into()).unwrap();

        let result = schema.validate_at(&draft, today());
        assert_eq!(
            result.error(RegistrationField::PrimaryPhysician),
            Some("Select a physician from the list")
        );
        assert_eq!(
            result.error(RegistrationField::IdentificationType),
            Some("Select a valid identification type")
        );
        assert_eq!(result.error(RegistrationField::Gender), Some("Select a valid gender"));
    }

    #[test]
    fn test_identification_document_single_file() {
        let schema = schema();
        let mut draft = valid_draft();
        let file = UploadedFile::new("id.png", "image/png", vec![0u8; 4]);
        draft
            .set(
                RegistrationField::IdentificationDocument,
                FieldValue::Files(vec![file.clone(), file.clone()]),
            )
            .unwrap();
        assert!(schema
            .validate_field(RegistrationField::IdentificationDocument, &draft, today())
            .is_some());

        draft.set(RegistrationField::IdentificationDocument, file.into()).unwrap();
        let registration = schema.parse_at(&draft, today()).unwrap();
        assert_eq!(registration.identification_document.unwrap().file_name, "id.png");
    }

    #[test]
    fn test_missing_consent_blocks_parse() {
        let schema = schema();
        let mut draft = valid_draft();
        draft.set(RegistrationField::DisclosureConsent, false.into()).unwrap();

        let result = schema.parse_at(&draft, today()).unwrap_err();
        assert_eq!(result.error_count(), 1);
        assert!(result.error(RegistrationField::DisclosureConsent).is_some());
    }

    #[test]
    fn test_validation_is_repeatable() {
        let schema = schema();
        let draft = valid_draft();
        let first = schema.validate_at(&draft, today());
        let second = schema.validate_at(&draft, today());
        assert_eq!(first, second);
    }
}
