//! 操作员终端 - 编排层
//!
//! 标准输入只有一个读者：有提问在等待时，输入行交给提问；否则按控制命令处理

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::models::ControlSignal;
use crate::orchestrator::runner::{ControlHandle, Runner};
use crate::services::PromptSlot;

/// 控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Status,
    Quit,
}

/// 解析一行输入，空行和未知命令返回 None
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    match line.trim().to_lowercase().as_str() {
        "start" => Some(ConsoleCommand::Start),
        "stop" => Some(ConsoleCommand::Stop),
        "status" => Some(ConsoleCommand::Status),
        "quit" | "exit" => Some(ConsoleCommand::Quit),
        _ => None,
    }
}

pub const HELP: &str = "可用命令: start | stop | status | quit";

/// 读取标准输入直到 quit 或输入结束
pub async fn run_console(slot: PromptSlot, control: ControlHandle, runner: Arc<Runner>) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    println!("{}", HELP);

    while let Some(line) = lines.next_line().await? {
        // 有提问在等待时这一行就是回答
        let Err(line) = slot.offer(line) else {
            continue;
        };

        match parse_command(&line) {
            Some(ConsoleCommand::Start) => toggle(&control, true).await,
            Some(ConsoleCommand::Stop) => toggle(&control, false).await,
            Some(ConsoleCommand::Status) => {
                let stats = runner.stats();
                println!(
                    "运行中: {} | 处理中: {} | 等待回答: {} | 打开 {} / 成功 {} / 放弃 {} / 待输入 {}",
                    runner.is_enabled(),
                    runner.is_busy(),
                    slot.is_waiting(),
                    stats.items_opened,
                    stats.succeeded,
                    stats.no_op,
                    stats.needs_input
                );
            }
            Some(ConsoleCommand::Quit) => {
                info!("👋 收到退出命令");
                return Ok(());
            }
            None if line.trim().is_empty() => {}
            None => println!("未知命令 \"{}\"。{}", line.trim(), HELP),
        }
    }

    info!("标准输入已关闭");
    Ok(())
}

async fn toggle(control: &ControlHandle, enabled: bool) {
    match control.send(ControlSignal::ToggleAutoRunner { enabled }).await {
        Ok(response) if response.success => {}
        Ok(response) => println!(
            "⚠️ {}",
            response.error.unwrap_or_else(|| "请求被拒绝".to_string())
        ),
        Err(e) => {
            warn!("⚠️ {}", e);
            println!("⚠️ {}", e);
        }
    }
}
