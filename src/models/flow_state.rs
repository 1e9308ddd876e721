//! 弹窗状态分类结果

use serde::{Deserialize, Serialize};

use super::snapshot::ChoiceOption;

/// 单选组中的一个成员
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioMember {
    pub handle: String,
    /// 成员自身 label，缺省为 value
    pub label: String,
    pub value: String,
}

/// 填写一个字段时需要的控件信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldControl {
    /// 文本框 / 文本域以及其他按 value 填写的 input
    Text { handle: String },
    Select {
        handle: String,
        options: Vec<ChoiceOption>,
    },
    RadioGroup {
        group: String,
        members: Vec<RadioMember>,
    },
}

/// 一个表单字段（或一个单选组）的引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// 人类可读的名字，保证非空
    pub name: String,
    pub empty: bool,
    pub control: FieldControl,
}

impl FieldRef {
    pub fn is_radio_group(&self) -> bool {
        matches!(self.control, FieldControl::RadioGroup { .. })
    }

    /// 可供选择的候选项；文本框返回 None
    pub fn choices(&self) -> Option<Vec<ChoiceOption>> {
        match &self.control {
            FieldControl::Text { .. } => None,
            FieldControl::Select { options, .. } => Some(options.clone()),
            FieldControl::RadioGroup { members, .. } => Some(
                members
                    .iter()
                    .map(|m| ChoiceOption::new(m.value.clone(), m.label.clone()))
                    .collect(),
            ),
        }
    }
}

/// 可推进流程的按钮类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionControl {
    Next,
    Review,
    Continue,
    Submit,
}

/// 申请成功时抓取到的职位信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: Option<String>,
    pub company: String,
    pub location: Option<String>,
}

/// 弹窗的语义状态，每个轮询周期重新计算
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    AwaitingFieldInput { empty_fields: Vec<FieldRef> },
    ResumeSelection,
    /// 出现成功文案，但还没有确认 / 关闭按钮
    SuccessUnconfirmed { raw_text: String },
    SuccessConfirmed { job_details: JobDetails },
    ActionAvailable { control: ActionControl, handle: String },
    NoActionAvailable,
}

impl FlowState {
    /// 日志用的短名字
    pub fn label(&self) -> &'static str {
        match self {
            FlowState::AwaitingFieldInput { .. } => "AwaitingFieldInput",
            FlowState::ResumeSelection => "ResumeSelection",
            FlowState::SuccessUnconfirmed { .. } => "SuccessUnconfirmed",
            FlowState::SuccessConfirmed { .. } => "SuccessConfirmed",
            FlowState::ActionAvailable { .. } => "ActionAvailable",
            FlowState::NoActionAvailable => "NoActionAvailable",
        }
    }
}
