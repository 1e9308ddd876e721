//! 操作员输入 - 业务能力层
//!
//! 自动填写不了的字段交给人来回答。提问会挂起当前流程直到拿到回答或被取消，
//! 不会被关闭开关打断

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::models::ChoiceOption;

#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    /// 自由文本提问，取消时返回 None
    async fn ask_text(&self, field_name: &str) -> Option<String>;

    /// 按编号选择，返回选中项的下标，取消或输入无效时返回 None
    async fn ask_choice(&self, field_name: &str, options: &[ChoiceOption]) -> Option<usize>;
}

/// 等待中的提问
///
/// 控制台读取线程拿到一行输入后先交给这里；没有提问在等待时，这一行按控制命令处理
#[derive(Clone, Default)]
pub struct PromptSlot {
    pending: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

impl PromptSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&self) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(tx);
        }
        rx
    }

    /// 把一行输入交给等待中的提问；没有提问在等待时原样返回
    pub fn offer(&self, line: String) -> Result<(), String> {
        let sender = match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(_) => None,
        };
        match sender {
            Some(tx) => tx.send(line),
            None => Err(line),
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.is_some())
            .unwrap_or(false)
    }
}

/// 在终端里提问
pub struct ConsolePrompt {
    slot: PromptSlot,
}

impl ConsolePrompt {
    pub fn new(slot: PromptSlot) -> Self {
        Self { slot }
    }

    async fn read_answer(&self, message: String) -> Option<String> {
        let rx = self.slot.open();
        println!("\n{}", message);
        match rx.await {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    None
                } else {
                    Some(line)
                }
            }
            Err(_) => {
                warn!("⚠️ 控制台输入已关闭，跳过提问");
                None
            }
        }
    }
}

/// 编号从 1 开始，超出范围视为取消
pub fn parse_choice(input: &str, option_count: usize) -> Option<usize> {
    let number: usize = input.trim().parse().ok()?;
    (1..=option_count).contains(&number).then(|| number - 1)
}

pub fn text_prompt_message(field_name: &str) -> String {
    format!(
        "请为 \"{}\" 提供答案，答案会被保存供以后使用。\n直接回车跳过该字段。",
        field_name
    )
}

pub fn choice_prompt_message(field_name: &str, options: &[ChoiceOption]) -> String {
    let options_text = options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}: {}", i + 1, opt.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "请输入编号为 \"{}\" 选择一个选项：\n\n{}\n\n直接回车跳过该字段。",
        field_name, options_text
    )
}

#[async_trait]
impl OperatorPrompt for ConsolePrompt {
    async fn ask_text(&self, field_name: &str) -> Option<String> {
        debug!("向操作员提问: {}", field_name);
        self.read_answer(text_prompt_message(field_name)).await
    }

    async fn ask_choice(&self, field_name: &str, options: &[ChoiceOption]) -> Option<usize> {
        debug!("向操作员提问(选择): {} ({} 个选项)", field_name, options.len());
        let answer = self
            .read_answer(choice_prompt_message(field_name, options))
            .await?;
        let choice = parse_choice(&answer, options.len());
        if choice.is_none() {
            warn!("⚠️ 无效的编号 \"{}\"，跳过字段 \"{}\"", answer, field_name);
        }
        choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice_is_one_based() {
        assert_eq!(parse_choice("1", 3), Some(0));
        assert_eq!(parse_choice(" 3 ", 3), Some(2));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("two", 3), None);
    }

    #[test]
    fn test_choice_message_lists_options() {
        let msg = choice_prompt_message(
            "Country",
            &[ChoiceOption::new("us", "United States"), ChoiceOption::new("ca", "Canada")],
        );
        assert!(msg.contains("1: United States\n2: Canada"));
    }

    #[test]
    fn test_offer_without_pending_prompt_returns_line() {
        let slot = PromptSlot::new();
        assert_eq!(slot.offer("stop".to_string()), Err("stop".to_string()));
    }

    #[tokio::test]
    async fn test_console_prompt_receives_offered_line() {
        let slot = PromptSlot::new();
        let prompt = ConsolePrompt::new(slot.clone());

        let answer = tokio::spawn(async move { prompt.ask_text("Phone").await });
        while !slot.is_waiting() {
            tokio::task::yield_now().await;
        }
        slot.offer("555-0100\n".to_string()).unwrap();

        assert_eq!(answer.await.unwrap().as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_empty_line_cancels() {
        let slot = PromptSlot::new();
        let prompt = ConsolePrompt::new(slot.clone());

        let answer = tokio::spawn(async move {
            prompt
                .ask_choice("Degree", &[ChoiceOption::new("b", "Bachelor")])
                .await
        });
        while !slot.is_waiting() {
            tokio::task::yield_now().await;
        }
        slot.offer(String::new()).unwrap();

        assert_eq!(answer.await.unwrap(), None);
    }
}
