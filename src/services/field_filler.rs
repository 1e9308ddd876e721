//! 字段填写 - 业务能力层
//!
//! 一个空字段的处理顺序：答案库 → 选项模糊匹配 → 问操作员 → 保存新答案

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ClassifierRules;
use crate::infrastructure::Surface;
use crate::models::{ChoiceOption, FieldControl, FieldRef, RadioMember};
use crate::services::answer_store::AnswerStore;
use crate::services::field_classifier::is_resume_named;
use crate::services::operator_prompt::OperatorPrompt;
use crate::services::option_matcher::best_matching_index;

/// 单个字段的填写结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillResult {
    /// 用已有答案自动填写
    AutoFilled,
    /// 操作员回答后填写（答案已保存）
    OperatorFilled,
    /// 操作员取消了提问
    Declined,
    /// 没有填写（简历字段、元素已消失）
    Skipped,
}

/// 字段填写服务
pub struct FieldFiller {
    answers: AnswerStore,
    prompt: Arc<dyn OperatorPrompt>,
    surface: Arc<dyn Surface>,
    rules: ClassifierRules,
    settle: Duration,
}

impl FieldFiller {
    pub fn new(
        answers: AnswerStore,
        prompt: Arc<dyn OperatorPrompt>,
        surface: Arc<dyn Surface>,
        rules: ClassifierRules,
        settle: Duration,
    ) -> Self {
        Self {
            answers,
            prompt,
            surface,
            rules,
            settle,
        }
    }

    /// 填写一个字段
    pub async fn fill(&self, field: &FieldRef) -> Result<FillResult> {
        if is_resume_named(&field.name, &self.rules) {
            debug!("跳过简历相关字段: {}", field.name);
            return Ok(FillResult::Skipped);
        }

        info!("✏️ 处理空字段: {}", field.name);
        let stored = self.answers.find_answer(&field.name).await;

        let result = match &field.control {
            FieldControl::Text { handle } => self.fill_text(field, handle, stored).await?,
            FieldControl::Select { handle, options } => {
                self.fill_select(field, handle, options, stored).await?
            }
            FieldControl::RadioGroup { members, .. } => {
                self.fill_radio(field, members, stored).await?
            }
        };

        if matches!(result, FillResult::AutoFilled | FillResult::OperatorFilled) {
            sleep(self.settle).await;
        }
        Ok(result)
    }

    async fn fill_text(
        &self,
        field: &FieldRef,
        handle: &str,
        stored: Option<String>,
    ) -> Result<FillResult> {
        if let Some(answer) = stored {
            let applied = self.surface.set_field_value(handle, &answer).await?;
            info!("✓ 自动填写字段 \"{}\"", field.name);
            return Ok(self.applied_or_skipped(field, applied, FillResult::AutoFilled));
        }

        let Some(answer) = self.prompt.ask_text(&field.name).await else {
            info!("操作员跳过字段 \"{}\"", field.name);
            return Ok(FillResult::Declined);
        };
        self.answers.save_answer(&field.name, &answer).await;
        let applied = self.surface.set_field_value(handle, &answer).await?;
        Ok(self.applied_or_skipped(field, applied, FillResult::OperatorFilled))
    }

    async fn fill_select(
        &self,
        field: &FieldRef,
        handle: &str,
        options: &[ChoiceOption],
        stored: Option<String>,
    ) -> Result<FillResult> {
        if let Some(index) = stored
            .as_deref()
            .and_then(|answer| best_matching_index(options, answer))
        {
            let option = &options[index];
            let applied = self.surface.set_field_value(handle, &option.value).await?;
            info!("✓ 自动选择下拉框 \"{}\" → \"{}\"", field.name, option.text);
            return Ok(self.applied_or_skipped(field, applied, FillResult::AutoFilled));
        }
        if stored.is_some() {
            info!("已有答案与 \"{}\" 的选项都不匹配，询问操作员", field.name);
        }

        let chosen = self.prompt.ask_choice(&field.name, options).await;
        let Some(option) = chosen.and_then(|i| options.get(i)) else {
            info!("操作员跳过字段 \"{}\"", field.name);
            return Ok(FillResult::Declined);
        };
        self.answers.save_answer(&field.name, &option.text).await;
        let applied = self.surface.set_field_value(handle, &option.value).await?;
        Ok(self.applied_or_skipped(field, applied, FillResult::OperatorFilled))
    }

    async fn fill_radio(
        &self,
        field: &FieldRef,
        members: &[RadioMember],
        stored: Option<String>,
    ) -> Result<FillResult> {
        let options = field.choices().unwrap_or_default();

        if let Some(index) = stored
            .as_deref()
            .and_then(|answer| best_matching_index(&options, answer))
        {
            let member = &members[index];
            let applied = self.surface.check_radio(&member.handle).await?;
            info!("✓ 自动选择单选项 \"{}\" → \"{}\"", field.name, member.label);
            return Ok(self.applied_or_skipped(field, applied, FillResult::AutoFilled));
        }

        let chosen = self.prompt.ask_choice(&field.name, &options).await;
        let Some(member) = chosen.and_then(|i| members.get(i)) else {
            info!("操作员跳过字段 \"{}\"", field.name);
            return Ok(FillResult::Declined);
        };
        self.answers.save_answer(&field.name, &member.label).await;
        let applied = self.surface.check_radio(&member.handle).await?;
        Ok(self.applied_or_skipped(field, applied, FillResult::OperatorFilled))
    }

    fn applied_or_skipped(&self, field: &FieldRef, applied: bool, result: FillResult) -> FillResult {
        if applied {
            result
        } else {
            warn!("⚠️ 字段 \"{}\" 对应的元素已不存在", field.name);
            FillResult::Skipped
        }
    }
}
