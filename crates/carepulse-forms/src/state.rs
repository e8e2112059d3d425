//! 表单状态控制器
//!
//! 持有每个字段的当前值与触碰/错误状态。每次变更都会通过广播通道发布
//! [`FormEvent`]，依赖该表单的视图订阅后自行重新渲染。

use carepulse_core::{PatientRegistration, Result};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::field::{FieldValue, RegistrationDraft, RegistrationField};
use crate::schema::{RegistrationSchema, ValidationResult};

const EVENT_CAPACITY: usize = 64;

/// 单个字段的界面状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub touched: bool,
    pub error: Option<String>,
}

/// 提交状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,       // 未提交
    Submitting, // 提交中
    Succeeded,  // 已成功
    Failed,     // 提交失败，可重新提交
}

/// 表单变更事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    FieldChanged {
        field: RegistrationField,
        error: Option<String>,
    },
    Validated {
        valid: bool,
        error_count: usize,
    },
    SubmissionChanged {
        status: SubmissionStatus,
        error: Option<String>,
    },
}

/// 表单状态控制器
#[derive(Debug)]
pub struct FormController {
    schema: Arc<RegistrationSchema>,
    draft: RegistrationDraft,
    fields: BTreeMap<RegistrationField, FieldState>,
    today: NaiveDate,
    submission: SubmissionStatus,
    submission_error: Option<String>,
    events: broadcast::Sender<FormEvent>,
}

impl FormController {
    /// 以当天日期作为出生日期的参考日期创建控制器
    pub fn new(schema: Arc<RegistrationSchema>) -> Self {
        Self::with_today(schema, Utc::now().date_naive())
    }

    pub fn with_today(schema: Arc<RegistrationSchema>, today: NaiveDate) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let fields = RegistrationField::ALL
            .iter()
            .map(|field| (*field, FieldState::default()))
            .collect();

        Self {
            schema,
            draft: RegistrationDraft::new(),
            fields,
            today,
            submission: SubmissionStatus::Idle,
            submission_error: None,
            events,
        }
    }

    /// 订阅表单变更
    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    /// 更新字段值，仅重新校验该字段
    pub fn set_field(&mut self, field: RegistrationField, value: FieldValue) -> Result<()> {
        self.draft.set(field, value)?;

        let error = self.schema.validate_field(field, &self.draft, self.today);
        let state = self.fields.entry(field).or_default();
        state.touched = true;
        state.error = error.clone();

        debug!("Field {} changed, valid: {}", field, error.is_none());
        self.publish(FormEvent::FieldChanged { field, error });
        Ok(())
    }

    /// 按控件上声明的字段名更新字段值
    pub fn apply_change(&mut self, name: &str, value: FieldValue) -> Result<()> {
        let field = name.parse::<RegistrationField>()?;
        self.set_field(field, value)
    }

    /// 校验整个表单并填充所有错误槽
    pub fn validate_all(&mut self) -> bool {
        let result = self.schema.validate_at(&self.draft, self.today);
        self.apply_result(&result);

        self.publish(FormEvent::Validated {
            valid: result.is_valid,
            error_count: result.error_count(),
        });
        result.is_valid
    }

    /// 标记全部字段为已触碰，校验通过后返回类型化的登记信息
    pub fn submit(&mut self) -> std::result::Result<PatientRegistration, ValidationResult> {
        for state in self.fields.values_mut() {
            state.touched = true;
        }

        if !self.validate_all() {
            return Err(self.validation_result());
        }

        self.schema.parse_at(&self.draft, self.today).map_err(|result| {
            self.apply_result(&result);
            result
        })
    }

    /// 更新提交状态，供提交流程调用
    pub fn set_submission(&mut self, status: SubmissionStatus, error: Option<String>) {
        self.submission = status;
        self.submission_error = error.clone();
        self.publish(FormEvent::SubmissionChanged { status, error });
    }

    pub fn submission_status(&self) -> SubmissionStatus {
        self.submission
    }

    /// 提交中时提交按钮不可用
    pub fn is_loading(&self) -> bool {
        self.submission == SubmissionStatus::Submitting
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    pub fn value(&self, field: RegistrationField) -> &FieldValue {
        self.draft.get(field)
    }

    pub fn field_state(&self, field: RegistrationField) -> FieldState {
        self.fields.get(&field).cloned().unwrap_or_default()
    }

    /// 已触碰字段上的错误提示
    pub fn visible_error(&self, field: RegistrationField) -> Option<&str> {
        self.fields
            .get(&field)
            .filter(|state| state.touched)
            .and_then(|state| state.error.as_deref())
    }

    /// 当前所有错误槽
    pub fn validation_result(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        for (field, state) in &self.fields {
            if let Some(error) = &state.error {
                result.add_error(*field, error.clone());
            }
        }
        result
    }

    fn apply_result(&mut self, result: &ValidationResult) {
        for (field, state) in self.fields.iter_mut() {
            state.error = result.errors.get(field).cloned();
        }
    }

    fn publish(&self, event: FormEvent) {
        // 没有订阅者时发送失败，忽略即可
        let _ = self.events.send(event);
    }
}
