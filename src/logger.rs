//! 日志初始化
//!
//! 控制台 + 日志文件两路输出，级别可用 `RUST_LOG` 覆盖

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 只输出到控制台（测试 / 临时调试用）
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// 初始化控制台和日志文件输出
///
/// # 参数
/// - `log_file_path`: 日志文件路径，启动时写入表头后追加
/// - `verbose`: 是否输出 debug 级别
pub fn init_with_file(log_file_path: &str, verbose: bool) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_file_path)?;
    file.write_all(log_header().as_bytes())?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init();

    Ok(())
}

fn log_header() -> String {
    format!(
        "{}\n自动投递日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    )
}
