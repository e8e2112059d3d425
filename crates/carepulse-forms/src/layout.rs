//! 患者登记表单布局

use carepulse_core::ReferenceData;

use crate::field::RegistrationField as F;
use crate::render::{render_file_uploader, render_radio_group, FieldDescriptor, FieldKind, SelectOption};

/// 表单分组，每行可并排放置多个字段
#[derive(Debug, Clone)]
pub struct FormSection {
    pub title: String,
    pub rows: Vec<Vec<FieldDescriptor>>,
}

/// 完整表单布局
#[derive(Debug, Clone)]
pub struct FormLayout {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<FormSection>,
    pub submit_label: String,
}

impl FormLayout {
    /// 按展示顺序遍历所有字段
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.sections
            .iter()
            .flat_map(|section| section.rows.iter())
            .flat_map(|row| row.iter())
    }
}

fn section(title: &str, rows: Vec<Vec<FieldDescriptor>>) -> FormSection {
    FormSection {
        title: title.to_string(),
        rows,
    }
}

/// 构建患者登记表单
pub fn registration_form(reference: &ReferenceData) -> FormLayout {
    let gender_options = reference
        .gender_options
        .iter()
        .map(|gender| SelectOption::new(gender.as_str()))
        .collect();
    let doctor_options = reference
        .doctors
        .iter()
        .map(|doctor| SelectOption::new(doctor.name.as_str()).with_image(doctor.image.as_str()))
        .collect();
    let identification_options = reference
        .identification_types
        .iter()
        .map(|kind| SelectOption::new(kind.label()))
        .collect();

    let personal = section(
        "Personal Information",
        vec![
            vec![FieldDescriptor::new(F::Name, FieldKind::Input, "Full name")
                .placeholder("John Doe")
                .icon("/assets/icons/user.svg", "user")],
            vec![
                FieldDescriptor::new(F::Email, FieldKind::Input, "Email")
                    .placeholder("johndoe@jsmastery.pro")
                    .icon("/assets/icons/email.svg", "email"),
                FieldDescriptor::new(F::Phone, FieldKind::PhoneInput, "Phone number")
                    .placeholder("(555) 123-4567"),
            ],
            vec![
                FieldDescriptor::new(F::BirthDate, FieldKind::DatePicker, "Date of Birth"),
                FieldDescriptor::new(F::Gender, FieldKind::Skeleton(render_radio_group), "Gender")
                    .options(gender_options),
            ],
            vec![
                FieldDescriptor::new(F::Address, FieldKind::Input, "Address")
                    .placeholder("14th Street, New York"),
                FieldDescriptor::new(F::Occupation, FieldKind::Input, "Occupation")
                    .placeholder("Software Engineer"),
            ],
            vec![
                FieldDescriptor::new(F::EmergencyContactName, FieldKind::Input, "Emergency Contact Name")
                    .placeholder("Guardian's Name"),
                FieldDescriptor::new(
                    F::EmergencyContactNumber,
                    FieldKind::PhoneInput,
                    "Emergency Contact Number",
                )
                .placeholder("(555) 123-4567"),
            ],
        ],
    );

    let medical = section(
        "Medical Information",
        vec![
            vec![FieldDescriptor::new(F::PrimaryPhysician, FieldKind::Select, "Primary Physician")
                .placeholder("Select a physician")
                .options(doctor_options)],
            vec![
                FieldDescriptor::new(F::InsuranceProvider, FieldKind::Input, "Insurance Provider")
                    .placeholder("BlueCross BlueShield"),
                FieldDescriptor::new(F::InsurancePolicyNumber, FieldKind::Input, "Insurance Policy Number")
                    .placeholder("ABC123456789"),
            ],
            vec![
                FieldDescriptor::new(F::Allergies, FieldKind::Textarea, "Allergies (if any)")
                    .placeholder("Peanuts, Penicillin, Pollen"),
                FieldDescriptor::new(F::CurrentMedication, FieldKind::Textarea, "Current Medication (if any)")
                    .placeholder("Ibuprofen 200mg, Paracetamol 500mg"),
            ],
            vec![
                FieldDescriptor::new(F::FamilyMedicalHistory, FieldKind::Textarea, "Family Medical History")
                    .placeholder("Mother had brain cancer, Father had heart disease"),
                FieldDescriptor::new(F::PastMedicalHistory, FieldKind::Textarea, "Past Medical History")
                    .placeholder("Appendectomy, Tonsillectomy"),
            ],
        ],
    );

    let identification = section(
        "Identification and Verification",
        vec![
            vec![FieldDescriptor::new(F::IdentificationType, FieldKind::Select, "Identification Type")
                .placeholder("Select an identification type")
                .options(identification_options)],
            vec![FieldDescriptor::new(F::IdentificationNumber, FieldKind::Input, "Identification Number")
                .placeholder("123456789")],
            vec![FieldDescriptor::new(
                F::IdentificationDocument,
                FieldKind::Skeleton(render_file_uploader),
                "Scanned copy of identification document",
            )],
        ],
    );

    let consent = section(
        "Consent and Privacy",
        vec![
            vec![FieldDescriptor::new(F::TreatmentConsent, FieldKind::Checkbox, "I consent to treatment")],
            vec![FieldDescriptor::new(
                F::DisclosureConsent,
                FieldKind::Checkbox,
                "I consent to disclosure of information",
            )],
            vec![FieldDescriptor::new(F::PrivacyConsent, FieldKind::Checkbox, "I consent to privacy policy")],
        ],
    );

    FormLayout {
        title: "Welcome 👋".to_string(),
        subtitle: "Schedule your first appointment".to_string(),
        sections: vec![personal, medical, identification, consent],
        submit_label: "Get Started".to_string(),
    }
}
