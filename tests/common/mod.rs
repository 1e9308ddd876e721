//! 集成测试公共设施：脚本化的页面、操作员和配置
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use job_auto_apply::config::{Config, Timings};
use job_auto_apply::infrastructure::kv_store::{keys, KeyValueStore};
use job_auto_apply::infrastructure::{MemoryStore, Surface};
use job_auto_apply::models::{
    ButtonSnapshot, ChoiceOption, FieldKind, FieldSnapshot, ListItemSnapshot, ListingSnapshot,
    ModalSnapshot, PageButtonSnapshot,
};
use job_auto_apply::services::OperatorPrompt;

pub const LINKEDIN_JOBS_URL: &str = "https://www.linkedin.com/jobs/collections/easy-apply/";

/// 所有等待都为 0 的配置
pub fn test_config() -> Config {
    Config {
        timings: Timings::instant(),
        ..Config::default()
    }
}

pub async fn store_with_profile(profile: serde_json::Value) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.set(keys::USER_DATA, profile).await.unwrap();
    Arc::new(store)
}

// ========== 快照构造 ==========

pub fn button(handle: &str, text: &str) -> ButtonSnapshot {
    ButtonSnapshot {
        handle: handle.to_string(),
        text: text.to_string(),
        ..Default::default()
    }
}

pub fn text_field(handle: &str, label: &str) -> FieldSnapshot {
    FieldSnapshot {
        handle: handle.to_string(),
        kind: FieldKind::Text,
        for_label: Some(label.to_string()),
        selected_index: -1,
        ..Default::default()
    }
}

pub fn select_field(handle: &str, label: &str, options: &[(&str, &str)]) -> FieldSnapshot {
    FieldSnapshot {
        handle: handle.to_string(),
        kind: FieldKind::Select,
        for_label: Some(label.to_string()),
        selected_index: 0,
        options: options
            .iter()
            .map(|(v, t)| ChoiceOption::new(*v, *t))
            .collect(),
        ..Default::default()
    }
}

pub fn radio(handle: &str, group: &str, legend: &str, label: &str) -> FieldSnapshot {
    FieldSnapshot {
        handle: handle.to_string(),
        kind: FieldKind::Radio,
        name: group.to_string(),
        value: label.to_lowercase(),
        for_label: Some(label.to_string()),
        group_legend: Some(legend.to_string()),
        selected_index: -1,
        ..Default::default()
    }
}

pub fn step(buttons: Vec<ButtonSnapshot>) -> ModalSnapshot {
    ModalSnapshot {
        buttons,
        ..Default::default()
    }
}

pub fn step_with_fields(fields: Vec<FieldSnapshot>, buttons: Vec<ButtonSnapshot>) -> ModalSnapshot {
    ModalSnapshot {
        fields,
        buttons,
        ..Default::default()
    }
}

pub fn success_step(company: &str, done_handle: &str) -> ModalSnapshot {
    ModalSnapshot {
        text: format!("\n  Application sent\n  Your application was sent to {}!\n", company),
        buttons: vec![button(done_handle, "done")],
        job_title: Some("Rust Engineer".to_string()),
        job_location: Some("Remote".to_string()),
        ..Default::default()
    }
}

/// 带简历选择器的一步
pub fn resume_step(buttons: Vec<ButtonSnapshot>) -> ModalSnapshot {
    ModalSnapshot {
        has_resume_picker: true,
        buttons,
        ..Default::default()
    }
}

pub fn easy_apply_button(handle: &str) -> ButtonSnapshot {
    button(handle, "easy apply")
}

// ========== 脚本化页面 ==========

/// 一张职位卡片：点开后的入口按钮和申请弹窗的每一步
#[derive(Clone, Default)]
pub struct FakeCard {
    pub handle: String,
    pub has_link: bool,
    pub entry: Option<ButtonSnapshot>,
    pub script: Vec<ModalSnapshot>,
}

impl FakeCard {
    pub fn with_entry(handle: &str, entry: &str, script: Vec<ModalSnapshot>) -> Self {
        Self {
            handle: handle.to_string(),
            has_link: true,
            entry: Some(easy_apply_button(entry)),
            script,
        }
    }

    pub fn without_entry(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            has_link: true,
            ..Default::default()
        }
    }
}

#[derive(Default)]
pub struct FakeState {
    pub url: String,
    pub cards: Vec<FakeCard>,
    pub current_page: Option<u32>,
    pub page_buttons: Vec<PageButtonSnapshot>,
    /// 点击分页按钮后依次换上的卡片
    pub next_pages: VecDeque<Vec<FakeCard>>,
    pub current_card: Option<String>,
    /// 当前弹窗剩下的步骤，队首是当前显示的一步
    pub modal: VecDeque<ModalSnapshot>,
    /// 为 true 时写入字段不生效（模拟页面把值清掉）
    pub ignore_fills: bool,
    /// 为 true 时点击关闭按钮弹窗仍然存在
    pub stuck_modal: bool,
    /// 每次进入下一步后，前这么多次读取弹窗时按钮还没渲染出来
    pub button_delay_polls: usize,
    hidden_polls: usize,

    pub marked: HashSet<String>,
    pub clicks: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub radios: Vec<String>,
    pub escapes: usize,
}

/// 按脚本响应的内存页面
///
/// 点击当前一步里存在的按钮会进入下一步；最后一步被点掉后弹窗关闭
pub struct FakeSurface {
    pub state: Mutex<FakeState>,
}

impl FakeSurface {
    pub fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                url: url.to_string(),
                ..Default::default()
            }),
        })
    }

    pub fn with_cards(cards: Vec<FakeCard>) -> Arc<Self> {
        let surface = Self::new(LINKEDIN_JOBS_URL);
        surface.state.lock().unwrap().cards = cards;
        surface
    }

    /// 直接打开一个申请弹窗
    pub fn with_modal(script: Vec<ModalSnapshot>) -> Arc<Self> {
        let surface = Self::new(LINKEDIN_JOBS_URL);
        surface.state.lock().unwrap().modal = script.into();
        surface
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().fills.clone()
    }

    pub fn radios(&self) -> Vec<String> {
        self.state.lock().unwrap().radios.clone()
    }

    pub fn is_marked(&self, handle: &str) -> bool {
        self.state.lock().unwrap().marked.contains(handle)
    }

    pub fn modal_polls_pending(&self) -> usize {
        self.state.lock().unwrap().hidden_polls
    }

    pub fn modal_open(&self) -> bool {
        !self.state.lock().unwrap().modal.is_empty()
    }
}

#[async_trait]
impl Surface for FakeSurface {
    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn listing(&self) -> Result<ListingSnapshot> {
        let state = self.state.lock().unwrap();
        Ok(ListingSnapshot {
            items: state
                .cards
                .iter()
                .map(|c| ListItemSnapshot {
                    handle: c.handle.clone(),
                    processed: state.marked.contains(&c.handle),
                    has_link: c.has_link,
                })
                .collect(),
            current_page: state.current_page,
            page_buttons: state.page_buttons.clone(),
        })
    }

    async fn mark_processed(&self, handle: &str) -> Result<()> {
        self.state.lock().unwrap().marked.insert(handle.to_string());
        Ok(())
    }

    async fn scroll_into_view(&self, _handle: &str) -> Result<()> {
        Ok(())
    }

    async fn click_item_link(&self, handle: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let exists = state.cards.iter().any(|c| c.handle == handle && c.has_link);
        if exists {
            state.current_card = Some(handle.to_string());
        }
        Ok(exists)
    }

    async fn entry_point(&self) -> Result<Option<ButtonSnapshot>> {
        let state = self.state.lock().unwrap();
        let entry = state
            .current_card
            .as_ref()
            .and_then(|current| state.cards.iter().find(|c| &c.handle == current))
            .and_then(|card| card.entry.clone())
            .filter(|entry| !state.marked.contains(&entry.handle));
        Ok(entry)
    }

    async fn modal(&self) -> Result<Option<ModalSnapshot>> {
        let mut state = self.state.lock().unwrap();
        let hidden = state.hidden_polls > 0;
        if hidden {
            state.hidden_polls -= 1;
        }
        Ok(state.modal.front().cloned().map(|mut step| {
            if hidden {
                step.buttons.clear();
            }
            step
        }))
    }

    async fn modal_visible(&self) -> Result<bool> {
        Ok(!self.state.lock().unwrap().modal.is_empty())
    }

    async fn click(&self, handle: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(handle.to_string());

        // 入口按钮：打开对应卡片的弹窗
        if let Some(card) = state
            .cards
            .iter()
            .find(|c| c.entry.as_ref().is_some_and(|e| e.handle == handle))
            .cloned()
        {
            state.modal = card.script.into();
            return Ok(true);
        }

        // 分页按钮：换一页卡片
        if let Some(page) = state
            .page_buttons
            .iter()
            .find(|b| b.handle == handle)
            .and_then(|b| b.number)
        {
            let cards = state.next_pages.pop_front().unwrap_or_default();
            state.cards = cards;
            state.current_page = Some(page);
            state.page_buttons.retain(|b| b.number.is_some_and(|n| n > page));
            return Ok(true);
        }

        let in_current_step = state
            .modal
            .front()
            .is_some_and(|m| m.buttons.iter().any(|b| b.handle == handle));
        if !in_current_step {
            return Ok(false);
        }
        let is_last = state.modal.len() == 1;
        if !(is_last && state.stuck_modal) {
            state.modal.pop_front();
            if !state.modal.is_empty() {
                state.hidden_polls = state.button_delay_polls;
            }
        }
        Ok(true)
    }

    async fn set_field_value(&self, handle: &str, value: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.fills.push((handle.to_string(), value.to_string()));
        let ignore = state.ignore_fills;
        let Some(step) = state.modal.front_mut() else {
            return Ok(false);
        };
        let Some(field) = step.fields.iter_mut().find(|f| f.handle == handle) else {
            return Ok(false);
        };
        if !ignore {
            field.value = value.to_string();
            if let Some(i) = field.options.iter().position(|o| o.value == value) {
                field.selected_index = i as i64;
            }
        }
        Ok(true)
    }

    async fn check_radio(&self, handle: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.radios.push(handle.to_string());
        let Some(step) = state.modal.front_mut() else {
            return Ok(false);
        };
        let Some(group) = step
            .fields
            .iter()
            .find(|f| f.handle == handle)
            .map(|f| f.name.clone())
        else {
            return Ok(false);
        };
        for field in step.fields.iter_mut().filter(|f| f.name == group) {
            field.checked = field.handle == handle;
        }
        Ok(true)
    }

    async fn press_escape(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.escapes += 1;
        state.modal.clear();
        Ok(())
    }
}

// ========== 脚本化操作员 ==========

/// 按预设回答的操作员；回答用完后一律取消
#[derive(Default)]
pub struct ScriptedPrompt {
    texts: Mutex<VecDeque<Option<String>>>,
    choices: Mutex<VecDeque<Option<usize>>>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answering_text(answers: &[&str]) -> Arc<Self> {
        let prompt = Self::default();
        *prompt.texts.lock().unwrap() = answers.iter().map(|a| Some(a.to_string())).collect();
        Arc::new(prompt)
    }

    /// `None` 表示这一次取消
    pub fn answering_or_cancelling(answers: &[Option<&str>]) -> Arc<Self> {
        let prompt = Self::default();
        *prompt.texts.lock().unwrap() = answers.iter().map(|a| a.map(str::to_string)).collect();
        Arc::new(prompt)
    }

    pub fn choosing(choices: &[usize]) -> Arc<Self> {
        let prompt = Self::default();
        *prompt.choices.lock().unwrap() = choices.iter().map(|c| Some(*c)).collect();
        Arc::new(prompt)
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperatorPrompt for ScriptedPrompt {
    async fn ask_text(&self, field_name: &str) -> Option<String> {
        self.asked.lock().unwrap().push(field_name.to_string());
        self.texts.lock().unwrap().pop_front().flatten()
    }

    async fn ask_choice(&self, field_name: &str, _options: &[ChoiceOption]) -> Option<usize> {
        self.asked.lock().unwrap().push(field_name.to_string());
        self.choices.lock().unwrap().pop_front().flatten()
    }
}

/// 收到提问后一直等到 [`BlockingPrompt::release`] 才回答
#[derive(Default)]
pub struct BlockingPrompt {
    release: Notify,
    answer: String,
}

impl BlockingPrompt {
    pub fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            release: Notify::new(),
            answer: answer.to_string(),
        })
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl OperatorPrompt for BlockingPrompt {
    async fn ask_text(&self, _field_name: &str) -> Option<String> {
        self.release.notified().await;
        Some(self.answer.clone())
    }

    async fn ask_choice(&self, _field_name: &str, _options: &[ChoiceOption]) -> Option<usize> {
        self.release.notified().await;
        Some(0)
    }
}
