//! 静态参考数据
//!
//! 医生列表、性别选项和证件类型在启动时加载一次，之后只读，
//! 由调用方显式传给需要它们的组件。

use serde::{Deserialize, Serialize};

use crate::models::{Gender, IdentificationType};

/// 医生展示信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Doctor {
    pub name: String,
    pub image: String,
}

impl Doctor {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }
}

/// 进程级只读参考数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceData {
    pub doctors: Vec<Doctor>,
    pub gender_options: Vec<Gender>,
    pub identification_types: Vec<IdentificationType>,
}

impl ReferenceData {
    /// 按姓名精确匹配医生，取第一个匹配项
    pub fn find_doctor(&self, name: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|doctor| doctor.name == name)
    }

    pub fn is_known_doctor(&self, name: &str) -> bool {
        self.find_doctor(name).is_some()
    }

    pub fn allows_gender(&self, gender: Gender) -> bool {
        self.gender_options.contains(&gender)
    }

    pub fn allows_identification_type(&self, kind: IdentificationType) -> bool {
        self.identification_types.contains(&kind)
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        let doctors = [
            ("John Green", "/assets/images/dr-green.png"),
            ("Leila Cameron", "/assets/images/dr-cameron.png"),
            ("David Livingston", "/assets/images/dr-livingston.png"),
            ("Evan Peter", "/assets/images/dr-peter.png"),
            ("Jane Powell", "/assets/images/dr-powell.png"),
            ("Alex Ramirez", "/assets/images/dr-remirez.png"),
            ("Jasmine Lee", "/assets/images/dr-lee.png"),
            ("Alyana Cruz", "/assets/images/dr-cruz.png"),
            ("Hardik Sharma", "/assets/images/dr-sharma.png"),
        ]
        .into_iter()
        .map(|(name, image)| Doctor::new(name, image))
        .collect();

        Self {
            doctors,
            gender_options: vec![Gender::Male, Gender::Female, Gender::Other],
            identification_types: IdentificationType::ALL.to_vec(),
        }
    }
}
