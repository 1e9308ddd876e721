//! 自动运行器 - 编排层
//!
//! ## 职责
//!
//! 1. 固定间隔触发一次处理（tick），同一时间最多只有一次处理在进行
//! 2. 开关自动运行，并把开关状态写入存储
//! 3. 启动时根据存储的开关状态或当前页面决定是否自动开始
//! 4. 汇总运行统计
//!
//! ## 并发模型
//!
//! 每个 tick 都是独立的任务。处理期间一直持有单飞锁（包括等待操作员回答的时间），
//! 锁被占用时到来的 tick 直接放弃，不排队也不重试。

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Timings};
use crate::error::{AppError, AppResult};
use crate::infrastructure::kv_store::{self, keys, KeyValueStore};
use crate::infrastructure::Surface;
use crate::models::{is_jobs_page, ControlResponse, ControlSignal, Platform};
use crate::orchestrator::paginator::{ListPaginator, PassOutcome, PassReport};
use crate::workflow::FlowOutcome;

/// 平台不受支持时回给操作员的提示
pub const UNSUPPORTED_PLATFORM_HINT: &str = "Navigate to LinkedIn jobs page";

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub items_opened: usize,
    pub succeeded: usize,
    pub no_op: usize,
    pub needs_input: usize,
    pub cancelled: usize,
    pub skipped_without_entry: usize,
    pub pages_advanced: usize,
    pub failed_passes: usize,
}

impl RunStats {
    fn absorb(&mut self, report: &PassReport) {
        self.items_opened += report.skipped_without_entry;
        self.skipped_without_entry += report.skipped_without_entry;
        match report.outcome {
            PassOutcome::Applied(outcome) => {
                self.items_opened += 1;
                match outcome {
                    FlowOutcome::Success => self.succeeded += 1,
                    FlowOutcome::NoOp => self.no_op += 1,
                    FlowOutcome::NeedsInput => self.needs_input += 1,
                    FlowOutcome::Cancelled => self.cancelled += 1,
                }
            }
            PassOutcome::PageAdvanced => self.pages_advanced += 1,
            PassOutcome::ListExhausted | PassOutcome::Stopped => {}
        }
    }
}

struct Poller {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// 自动运行器
pub struct Runner {
    surface: Arc<dyn Surface>,
    store: Arc<dyn KeyValueStore>,
    paginator: ListPaginator,
    timings: Timings,
    auto_start: bool,
    enabled: AtomicBool,
    single_flight: tokio::sync::Mutex<()>,
    busy: AtomicBool,
    stats: Mutex<RunStats>,
    poller: Mutex<Option<Poller>>,
}

impl Runner {
    pub fn new(
        config: &Config,
        surface: Arc<dyn Surface>,
        store: Arc<dyn KeyValueStore>,
        paginator: ListPaginator,
    ) -> Arc<Self> {
        Arc::new(Self {
            surface,
            store,
            paginator,
            timings: config.timings.clone(),
            auto_start: config.auto_start,
            enabled: AtomicBool::new(false),
            single_flight: tokio::sync::Mutex::new(()),
            busy: AtomicBool::new(false),
            stats: Mutex::new(RunStats::default()),
            poller: Mutex::new(None),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// 当前是否有处理在进行
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> RunStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    /// 启动时决定是否自动开始
    ///
    /// 存储里的开关为开，或者配置允许且当前就在职位页时开始
    pub async fn initialize(self: &Arc<Self>) -> Result<()> {
        let url = self.surface.current_url().await?;
        if let Err(e) = ensure_supported(&url) {
            info!("⏸ {}，等待操作员切换页面后手动开始", e);
            return Ok(());
        }

        let persisted = match kv_store::load::<bool>(self.store.as_ref(), keys::IS_AUTO_RUNNING).await {
            Ok(value) => value.unwrap_or(false),
            Err(e) => {
                warn!("⚠️ 读取自动运行开关失败: {}", e);
                false
            }
        };

        if persisted || (self.auto_start && is_jobs_page(&url)) {
            info!("🚀 自动开始 (存储开关: {}, 当前页面: {})", persisted, url);
            self.start();
        } else {
            info!("⏸ 自动运行未开启，输入 start 开始");
        }
        Ok(())
    }

    /// 处理一个控制信号
    pub async fn handle_control(self: &Arc<Self>, signal: ControlSignal) -> ControlResponse {
        let ControlSignal::ToggleAutoRunner { enabled } = signal;

        let url = match self.surface.current_url().await {
            Ok(url) => url,
            Err(e) => {
                warn!("⚠️ 无法读取当前页面地址: {}", e);
                return ControlResponse::rejected(UNSUPPORTED_PLATFORM_HINT);
            }
        };
        if let Err(e) = ensure_supported(&url) {
            warn!("⚠️ 拒绝开关请求: {}", e);
            return ControlResponse::rejected(UNSUPPORTED_PLATFORM_HINT);
        }

        if enabled {
            self.start();
        } else {
            self.stop();
        }

        if let Err(e) = kv_store::save(self.store.as_ref(), keys::IS_AUTO_RUNNING, &enabled).await {
            warn!("⚠️ 保存自动运行开关失败: {}", e);
        }
        ControlResponse::ok()
    }

    /// 开始自动运行：立即处理一次，之后按固定间隔触发
    pub fn start(self: &Arc<Self>) {
        self.enabled.store(true, Ordering::SeqCst);

        let Ok(mut poller) = self.poller.lock() else {
            return;
        };
        if poller.as_ref().is_some_and(|p| !p.handle.is_finished()) {
            debug!("自动运行已在进行");
            return;
        }

        let token = CancellationToken::new();
        let child = token.clone();
        let runner = Arc::clone(self);
        let period = self.timings.poll_interval().max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        let runner = Arc::clone(&runner);
                        tokio::spawn(async move {
                            runner.tick().await;
                        });
                    }
                }
            }
            debug!("轮询已停止");
        });

        *poller = Some(Poller { token, handle });
        info!("▶️ 自动运行已开始 (间隔 {:?})", period);
    }

    /// 停止自动运行
    ///
    /// 正在进行的处理会在下一个检查点结束，等待中的操作员提问不会被打断
    pub fn stop(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        if let Some(poller) = self.poller.lock().ok().and_then(|mut p| p.take()) {
            poller.token.cancel();
        }
        info!("⏹ 自动运行已停止");
    }

    /// 一次处理
    ///
    /// 返回是否真正执行了处理；关闭状态或已有处理在进行时什么都不做
    pub async fn tick(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Ok(_guard) = self.single_flight.try_lock() else {
            debug!("上一次处理尚未结束，跳过本次 tick");
            return false;
        };
        self.busy.store(true, Ordering::SeqCst);

        if let Err(e) = self.run_pass().await {
            error!("❌ 本次处理失败: {:#}", e);
            if let Ok(mut stats) = self.stats.lock() {
                stats.failed_passes += 1;
            }
        }
        self.busy.store(false, Ordering::SeqCst);
        true
    }

    async fn run_pass(&self) -> Result<()> {
        let report = self.paginator.process_next(&self.enabled).await?;
        debug!("本次处理结果: {:?}", report);

        if let Ok(mut stats) = self.stats.lock() {
            stats.absorb(&report);
        }

        match report.outcome {
            PassOutcome::Applied(FlowOutcome::Success) => {
                sleep(self.timings.success_cooldown()).await
            }
            PassOutcome::Applied(_) => sleep(self.timings.abandon_cooldown()).await,
            PassOutcome::ListExhausted => sleep(self.timings.page_load_settle()).await,
            PassOutcome::PageAdvanced | PassOutcome::Stopped => {}
        }
        Ok(())
    }

    /// 开始接收控制信号
    pub fn serve_controls(self: &Arc<Self>) -> ControlHandle {
        let (tx, mut rx) = mpsc::channel::<ControlRequest>(8);
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            while let Some((signal, reply)) = rx.recv().await {
                let response = runner.handle_control(signal).await;
                let _ = reply.send(response);
            }
        });
        ControlHandle { tx }
    }
}

type ControlRequest = (ControlSignal, oneshot::Sender<ControlResponse>);

/// 控制信号的发送端
#[derive(Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<ControlRequest>,
}

impl ControlHandle {
    /// 发送控制信号并等待回复；接收端不存在时返回 [`AppError::Transport`]
    pub async fn send(&self, signal: ControlSignal) -> AppResult<ControlResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((signal, reply_tx))
            .await
            .map_err(|_| AppError::Transport("没有正在运行的接收端".to_string()))?;
        reply_rx
            .await
            .map_err(|_| AppError::Transport("接收端没有回复".to_string()))
    }
}

/// 当前页面是否属于可自动投递的平台
pub fn ensure_supported(url: &str) -> AppResult<Platform> {
    Platform::detect(url)
        .filter(|p| p.is_supported())
        .ok_or_else(|| AppError::UnsupportedPlatform(url.to_string()))
}

/// 输出运行统计
pub fn log_stats(stats: &RunStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行统计");
    info!(
        "结束时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📋 打开职位: {}", stats.items_opened);
    info!("✅ 申请成功: {}", stats.succeeded);
    info!("⏭ 无法推进: {}", stats.no_op);
    info!("✏️ 等待输入: {}", stats.needs_input);
    info!("⏹ 中途停止: {}", stats.cancelled);
    info!("🚫 无 Easy Apply: {}", stats.skipped_without_entry);
    info!("📄 翻页次数: {}", stats.pages_advanced);
    info!("❌ 处理失败: {}", stats.failed_passes);
    info!("{}", "=".repeat(60));
}
