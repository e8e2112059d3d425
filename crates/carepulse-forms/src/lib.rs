//! # CarePulse表单模块
//!
//! 患者登记表单的完整前端逻辑，包括：
//! - 字段目录：登记表单的封闭字段集合及其取值类型
//! - 校验规则：声明式的逐字段规则，纯函数、可重复执行
//! - 表单状态：字段值、触碰/错误状态以及变更订阅
//! - 控件分派：按字段类型生成对应的交互控件
//! - 表单布局：登记表单的分组与字段描述

pub mod field;
pub mod layout;
pub mod render;
pub mod schema;
pub mod state;

pub use field::{FieldValue, RegistrationDraft, RegistrationField, ValueKind};
pub use layout::{registration_form, FormLayout, FormSection};
pub use render::{render_field, Control, FieldDescriptor, FieldKind, Icon, RenderedField, SelectOption};
pub use schema::{RegistrationSchema, Rule, ValidationResult};
pub use state::{FieldState, FormController, FormEvent, SubmissionStatus};
