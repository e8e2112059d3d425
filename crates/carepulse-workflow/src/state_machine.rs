//! 提交状态机
//!
//! 管理登记表单从提交到完成的状态转换

use carepulse_core::{CarePulseError, Result};
use carepulse_forms::SubmissionStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 提交状态转换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SubmissionEvent {
    Submit,
    Succeed,
    Fail,
}

/// 提交状态机
#[derive(Debug)]
pub struct SubmissionStateMachine {
    transitions: HashMap<(SubmissionStatus, SubmissionEvent), SubmissionStatus>,
}

impl SubmissionStateMachine {
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        transitions.insert((SubmissionStatus::Idle, SubmissionEvent::Submit), SubmissionStatus::Submitting);
        // 失败后允许手动重新提交
        transitions.insert((SubmissionStatus::Failed, SubmissionEvent::Submit), SubmissionStatus::Submitting);
        transitions.insert((SubmissionStatus::Submitting, SubmissionEvent::Succeed), SubmissionStatus::Succeeded);
        transitions.insert((SubmissionStatus::Submitting, SubmissionEvent::Fail), SubmissionStatus::Failed);

        Self { transitions }
    }

    pub fn can_transition(&self, from: SubmissionStatus, event: SubmissionEvent) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// 执行状态转换
    pub fn transition(&self, from: SubmissionStatus, event: SubmissionEvent) -> Result<SubmissionStatus> {
        self.transitions
            .get(&(from, event))
            .copied()
            .ok_or_else(|| CarePulseError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            })
    }

    /// 获取状态的所有可能事件
    pub fn possible_events(&self, current: SubmissionStatus) -> Vec<SubmissionEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| *state == current)
            .map(|(_, event)| *event)
            .collect()
    }
}

impl Default for SubmissionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
