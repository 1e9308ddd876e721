//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：连接浏览器、创建 JsExecutor / PageSurface、打开存储
//! 2. **组装**：答案库、结果记录、申请流程、列表翻页、运行器
//! 3. **运行**：启动控制通道和操作员终端，直到 quit
//! 4. **收尾**：停止运行器，输出统计
//!
//! 唯一持有 Browser 的模块

use anyhow::Result;
use chromiumoxide::Browser;
use std::sync::Arc;
use tracing::info;

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{JsExecutor, JsonFileStore, KeyValueStore, PageSurface, Surface};
use crate::orchestrator::console::run_console;
use crate::orchestrator::paginator::ListPaginator;
use crate::orchestrator::runner::{log_stats, Runner};
use crate::services::{AnswerStore, ConsolePrompt, OperatorPrompt, OutcomeTracker, PromptSlot};
use crate::workflow::FlowController;

/// 职位页 URL 中的片段，用来在已打开的标签页里找到目标页面
const JOBS_URL_HINT: &str = "linkedin.com/jobs";

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    runner: Arc<Runner>,
    slot: PromptSlot,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let (browser, page) = browser::connect_to_browser_and_page(
            config.browser_debug_port,
            Some(&config.target_url),
            Some(JOBS_URL_HINT),
        )
        .await?;

        // JsExecutor 是唯一的 page owner
        let surface: Arc<dyn Surface> = Arc::new(PageSurface::new(JsExecutor::new(page)));
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&config.store_path));
        let slot = PromptSlot::new();
        let prompt: Arc<dyn OperatorPrompt> = Arc::new(ConsolePrompt::new(slot.clone()));

        let runner = build_runner(&config, surface, store, prompt);

        Ok(Self {
            config,
            _browser: browser,
            runner,
            slot,
        })
    }

    /// 运行应用主逻辑，直到操作员输入 quit
    pub async fn run(&self) -> Result<()> {
        let control = self.runner.serve_controls();
        self.runner.initialize().await?;

        run_console(self.slot.clone(), control, Arc::clone(&self.runner)).await?;

        self.runner.stop();
        log_stats(&self.runner.stats());
        info!("\n日志已保存至: {}", self.config.output_log_file);
        Ok(())
    }
}

/// 组装运行器
pub fn build_runner(
    config: &Config,
    surface: Arc<dyn Surface>,
    store: Arc<dyn KeyValueStore>,
    prompt: Arc<dyn OperatorPrompt>,
) -> Arc<Runner> {
    let answers = AnswerStore::new(store.clone());
    let tracker = OutcomeTracker::new(store.clone(), config.successful_apps_cap);
    let flow = FlowController::new(config, surface.clone(), answers, prompt, tracker);
    let paginator = ListPaginator::new(config, surface.clone(), flow);
    Runner::new(config, surface, store, paginator)
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动投递模式");
    info!("🌐 调试端口: {}", config.browser_debug_port);
    info!("🎯 目标页面: {}", config.target_url);
    info!("💾 存储文件: {}", config.store_path);
    info!("⏱ 轮询间隔: {:?}", config.timings.poll_interval());
    info!("{}", "=".repeat(60));
}
