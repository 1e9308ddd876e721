//! 申请流程 - 流程层
//!
//! 核心职责：驱动"一个职位"的申请弹窗直到结束
//!
//! 每一步重新快照、重新分类，按状态决定动作：
//! 1. 空字段 → 逐个填写；操作员放弃的字段仍然阻塞，全部被放弃时结束（待输入）
//! 2. 成功 → 记录结果 → 关闭弹窗 → 结束（成功）
//! 3. 选简历 → 点 next / review，没有时按 4、5 处理
//! 4. Submit → 点击后等待关闭按钮出现
//! 5. Next / Review / Continue → 点击
//! 6. 无可用按钮 → 已提交过算成功，否则放弃

use anyhow::Result;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::{ClassifierRules, Config, Timings};
use crate::infrastructure::Surface;
use crate::models::{ActionControl, FieldRef, FlowState, JobDetails, ModalSnapshot};
use crate::services::step_classifier::{
    action_control, classify, done_controls, has_success_message, job_details,
    resume_advance_control,
};
use crate::services::{AnswerStore, FieldFiller, FillResult, OperatorPrompt, OutcomeTracker};
use crate::utils::truncate_text;
use crate::workflow::item_ctx::ItemCtx;

/// 一个职位的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// 申请成功（已记录）
    Success,
    /// 流程无法推进，放弃该职位
    NoOp,
    /// 步数用尽时仍卡在必填字段上
    NeedsInput,
    /// 自动运行被关闭
    Cancelled,
}

/// 单个职位内部的可变状态
#[derive(Default)]
struct Progress {
    submitted: bool,
    recorded: bool,
    declined: HashSet<String>,
    last_pending: Vec<String>,
    last_snapshot: Option<ModalSnapshot>,
}

/// 申请流程
///
/// - 只通过 [`Surface`] 操作页面
/// - 分类逻辑全部委托给 step_classifier
/// - 填写委托给 [`FieldFiller`]，记录委托给 [`OutcomeTracker`]
pub struct FlowController {
    surface: Arc<dyn Surface>,
    filler: FieldFiller,
    tracker: OutcomeTracker,
    rules: ClassifierRules,
    timings: Timings,
    max_steps: usize,
}

impl FlowController {
    pub fn new(
        config: &Config,
        surface: Arc<dyn Surface>,
        answers: AnswerStore,
        prompt: Arc<dyn OperatorPrompt>,
        tracker: OutcomeTracker,
    ) -> Self {
        let filler = FieldFiller::new(
            answers,
            prompt,
            surface.clone(),
            config.rules.clone(),
            config.timings.field_fill_settle(),
        );
        Self {
            surface,
            filler,
            tracker,
            rules: config.rules.clone(),
            timings: config.timings.clone(),
            max_steps: config.max_flow_steps,
        }
    }

    /// 驱动当前打开的申请弹窗直到结束
    ///
    /// `enabled` 在每一步开始时检查；正在等待的操作员提问不会被打断
    pub async fn drive(&self, ctx: &ItemCtx, enabled: &AtomicBool) -> Result<FlowOutcome> {
        let mut progress = Progress::default();
        let mut awaiting_input = false;

        for step in 1..=self.max_steps {
            if !enabled.load(Ordering::SeqCst) {
                info!("{} ⏹ 自动运行已关闭，停止当前申请", ctx);
                return Ok(FlowOutcome::Cancelled);
            }

            let Some(snapshot) = self.surface.modal().await? else {
                return Ok(self.finish_without_modal(ctx, &mut progress).await);
            };

            let state = classify(&snapshot, &self.rules);
            debug!("{} 第 {} 步: {}", ctx, step, state.label());
            awaiting_input = matches!(state, FlowState::AwaitingFieldInput { .. });

            match state {
                FlowState::AwaitingFieldInput { empty_fields } => {
                    if !self.fill_fields(ctx, &empty_fields, &mut progress).await? {
                        warn!("{} ⚠️ 必填字段被操作员放弃，停止当前申请", ctx);
                        return Ok(FlowOutcome::NeedsInput);
                    }
                }
                FlowState::SuccessConfirmed {
                    job_details: details,
                } => {
                    self.finish_success(ctx, &details, &snapshot, &mut progress)
                        .await;
                    return Ok(FlowOutcome::Success);
                }
                FlowState::SuccessUnconfirmed { raw_text } => {
                    debug!("{} 成功文案: {}", ctx, truncate_text(&raw_text, 120));
                    let details = job_details(&snapshot, &self.rules);
                    self.finish_success(ctx, &details, &snapshot, &mut progress)
                        .await;
                    return Ok(FlowOutcome::Success);
                }
                FlowState::ResumeSelection => {
                    if let Some(button) = resume_advance_control(&snapshot, &self.rules) {
                        info!("{} 📄 简历选择页，继续下一步", ctx);
                        let handle = button.handle.clone();
                        self.click_and_settle(&handle).await?;
                    } else if let Some((control, button)) = action_control(&snapshot, &self.rules)
                    {
                        let handle = button.handle.clone();
                        self.take_action(ctx, control, &handle, &mut progress).await?;
                    } else {
                        progress.last_snapshot = Some(snapshot);
                        return Ok(self.finish_stalled(ctx, &mut progress).await);
                    }
                }
                FlowState::ActionAvailable { control, handle } => {
                    self.take_action(ctx, control, &handle, &mut progress).await?;
                }
                FlowState::NoActionAvailable => {
                    progress.last_snapshot = Some(snapshot);
                    return Ok(self.finish_stalled(ctx, &mut progress).await);
                }
            }

            progress.last_snapshot = Some(snapshot);
        }

        if progress.submitted {
            warn!("{} ⚠️ 已提交但步数用尽，按成功处理", ctx);
            self.record_once(ctx, &self.best_effort_details(&progress), &mut progress)
                .await;
            return Ok(FlowOutcome::Success);
        }
        if awaiting_input {
            warn!("{} ⚠️ 步数用尽，仍有必填字段未完成", ctx);
            Ok(FlowOutcome::NeedsInput)
        } else {
            warn!("{} ⚠️ 步数用尽，放弃该职位", ctx);
            Ok(FlowOutcome::NoOp)
        }
    }

    /// 填写本轮的空字段
    ///
    /// 被操作员放弃过的字段不再提问；返回 false 表示剩下的空字段全都被放弃了
    async fn fill_fields(
        &self,
        ctx: &ItemCtx,
        fields: &[FieldRef],
        progress: &mut Progress,
    ) -> Result<bool> {
        let open: Vec<&FieldRef> = fields
            .iter()
            .filter(|f| !progress.declined.contains(&f.name))
            .collect();
        if open.is_empty() {
            return Ok(false);
        }

        let names: Vec<String> = open.iter().map(|f| f.name.clone()).collect();
        if names == progress.last_pending {
            // 上一轮填过仍然为空，等页面自己的逻辑跟上
            debug!("{} 字段仍为空，等待下一次轮询: {:?}", ctx, names);
            sleep(self.timings.poll_interval()).await;
        }

        for field in open {
            if self.filler.fill(field).await? == FillResult::Declined {
                progress.declined.insert(field.name.clone());
            }
        }
        progress.last_pending = names;
        Ok(true)
    }

    /// 点击推进按钮；Submit 额外标记已提交并等待关闭按钮
    async fn take_action(
        &self,
        ctx: &ItemCtx,
        control: ActionControl,
        handle: &str,
        progress: &mut Progress,
    ) -> Result<()> {
        if control != ActionControl::Submit {
            info!("{} ➡️ 点击 {:?}", ctx, control);
            return self.click_and_settle(handle).await;
        }

        info!("{} 🚀 提交申请", ctx);
        if self.surface.click(handle).await? {
            progress.submitted = true;
            self.wait_for_dismiss_control().await?;
        }
        Ok(())
    }

    async fn click_and_settle(&self, handle: &str) -> Result<()> {
        if !self.surface.click(handle).await? {
            debug!("按钮 {} 已不存在", handle);
        }
        sleep(self.timings.post_click_settle()).await;
        Ok(())
    }

    /// 提交后轮询，直到出现关闭按钮、弹窗消失或超时
    async fn wait_for_dismiss_control(&self) -> Result<()> {
        let started = Instant::now();
        loop {
            match self.surface.modal().await? {
                None => return Ok(()),
                Some(snapshot)
                    if has_success_message(&snapshot, &self.rules)
                        && !done_controls(&snapshot, &self.rules).is_empty() =>
                {
                    debug!("提交后出现关闭按钮");
                    return Ok(());
                }
                Some(_) => {}
            }
            if started.elapsed() >= self.timings.submit_settle() {
                return Ok(());
            }
            sleep(self.timings.dismiss_poll_step()).await;
        }
    }

    /// 成功：先记录，再尝试关闭弹窗；关闭失败不影响结果
    async fn finish_success(
        &self,
        ctx: &ItemCtx,
        details: &JobDetails,
        snapshot: &ModalSnapshot,
        progress: &mut Progress,
    ) {
        info!("{} ✅ 申请成功: {}", ctx, details.company);
        self.record_once(ctx, details, progress).await;

        match self.dismiss(snapshot).await {
            Ok(true) => debug!("{} 成功弹窗已关闭", ctx),
            Ok(false) => warn!("{} ⚠️ 成功弹窗无法关闭", ctx),
            Err(e) => warn!("{} ⚠️ 关闭成功弹窗时出错: {}", ctx, e),
        }
    }

    /// 无可用动作：已提交过算成功，否则放弃
    async fn finish_stalled(&self, ctx: &ItemCtx, progress: &mut Progress) -> FlowOutcome {
        if progress.submitted {
            info!("{} ✅ 提交后没有后续操作，视为完成", ctx);
            self.record_once(ctx, &self.best_effort_details(progress), progress)
                .await;
            FlowOutcome::Success
        } else {
            warn!("{} ⚠️ 找不到可用按钮，放弃该职位", ctx);
            FlowOutcome::NoOp
        }
    }

    /// 弹窗消失：已提交过算成功，否则放弃
    async fn finish_without_modal(&self, ctx: &ItemCtx, progress: &mut Progress) -> FlowOutcome {
        if progress.submitted {
            info!("{} ✅ 提交后弹窗已关闭，视为完成", ctx);
            self.record_once(ctx, &self.best_effort_details(progress), progress)
                .await;
            FlowOutcome::Success
        } else {
            warn!("{} ⚠️ 申请弹窗不存在", ctx);
            FlowOutcome::NoOp
        }
    }

    fn best_effort_details(&self, progress: &Progress) -> JobDetails {
        progress
            .last_snapshot
            .as_ref()
            .map(|s| job_details(s, &self.rules))
            .unwrap_or_else(|| job_details(&ModalSnapshot::default(), &self.rules))
    }

    async fn record_once(&self, ctx: &ItemCtx, details: &JobDetails, progress: &mut Progress) {
        if progress.recorded {
            return;
        }
        progress.recorded = true;
        self.tracker.record(details, ctx.platform).await;
    }

    /// 依次尝试关闭按钮，每次点击后确认弹窗是否还在；都不行再按 Escape
    async fn dismiss(&self, snapshot: &ModalSnapshot) -> Result<bool> {
        for button in done_controls(snapshot, &self.rules) {
            if !self.surface.click(&button.handle).await? {
                continue;
            }
            sleep(self.timings.dismiss_settle()).await;
            if !self.surface.modal_visible().await? {
                return Ok(true);
            }
        }

        debug!("关闭按钮无效，尝试 Escape");
        self.surface.press_escape().await?;
        sleep(self.timings.dismiss_settle()).await;
        Ok(!self.surface.modal_visible().await?)
    }
}
