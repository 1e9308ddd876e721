use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::AppError;

/// 默认配置文件
const DEFAULT_CONFIG_FILE: &str = "auto_apply.toml";

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 目标URL（找不到已打开的职位页时导航到这里）
    pub target_url: String,
    /// 持久化存储文件
    pub store_path: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 在职位页上自动启动
    pub auto_start: bool,
    /// 单个职位最多推进多少步
    pub max_flow_steps: usize,
    /// 成功投递记录上限
    pub successful_apps_cap: usize,
    pub timings: Timings,
    pub rules: ClassifierRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: "https://www.linkedin.com/jobs/collections/easy-apply/".to_string(),
            store_path: "auto_apply_store.json".to_string(),
            output_log_file: "auto_apply.log".to_string(),
            verbose_logging: false,
            auto_start: true,
            max_flow_steps: 40,
            successful_apps_cap: 1000,
            timings: Timings::default(),
            rules: ClassifierRules::default(),
        }
    }
}

impl Config {
    /// 读取配置：先读 TOML 文件（可选），再用环境变量覆盖
    pub fn load() -> Result<Self, AppError> {
        let path =
            std::env::var("AUTO_APPLY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            info!("📄 读取配置文件: {}", path);
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_toml_file(path: &str) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// 环境变量覆盖
    pub fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(default.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            store_path: std::env::var("STORE_PATH").unwrap_or(default.store_path),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            auto_start: env_parse("AUTO_START").unwrap_or(default.auto_start),
            timings: Timings {
                poll_interval_ms: env_parse("POLL_INTERVAL_MS")
                    .unwrap_or(default.timings.poll_interval_ms),
                ..default.timings
            },
            ..default
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("⚠️ 环境变量 {} 的值 '{}' 无法解析，使用默认值", var, raw);
            None
        }
    }
}

/// 各个等待点的时长（毫秒）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// 轮询周期
    pub poll_interval_ms: u64,
    /// 点击按钮后等待页面稳定
    pub post_click_settle_ms: u64,
    /// 每填写一个字段后的等待
    pub field_fill_settle_ms: u64,
    /// 打开职位 / 翻页后等待加载
    pub page_load_settle_ms: u64,
    /// 滚动到职位卡片后的等待
    pub item_scroll_settle_ms: u64,
    /// 点击提交后等待成功弹窗的总时长
    pub submit_settle_ms: u64,
    /// 点击完成 / Escape 后检查弹窗是否关闭前的等待
    pub dismiss_settle_ms: u64,
    /// 提交后轮询关闭按钮的间隔
    pub dismiss_poll_step_ms: u64,
    /// 投递成功后处理下一个职位前的等待
    pub success_cooldown_ms: u64,
    /// 放弃一个职位后处理下一个职位前的等待
    pub abandon_cooldown_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            post_click_settle_ms: 2_000,
            field_fill_settle_ms: 500,
            page_load_settle_ms: 2_000,
            item_scroll_settle_ms: 1_000,
            submit_settle_ms: 3_000,
            dismiss_settle_ms: 1_000,
            dismiss_poll_step_ms: 500,
            success_cooldown_ms: 3_000,
            abandon_cooldown_ms: 1_000,
        }
    }
}

impl Timings {
    /// 测试用：所有等待为零，轮询周期保持很短
    pub fn instant() -> Self {
        Self {
            poll_interval_ms: 5,
            post_click_settle_ms: 0,
            field_fill_settle_ms: 0,
            page_load_settle_ms: 0,
            item_scroll_settle_ms: 0,
            submit_settle_ms: 0,
            dismiss_settle_ms: 0,
            dismiss_poll_step_ms: 0,
            success_cooldown_ms: 0,
            abandon_cooldown_ms: 0,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn post_click_settle(&self) -> Duration {
        Duration::from_millis(self.post_click_settle_ms)
    }

    pub fn field_fill_settle(&self) -> Duration {
        Duration::from_millis(self.field_fill_settle_ms)
    }

    pub fn page_load_settle(&self) -> Duration {
        Duration::from_millis(self.page_load_settle_ms)
    }

    pub fn item_scroll_settle(&self) -> Duration {
        Duration::from_millis(self.item_scroll_settle_ms)
    }

    pub fn submit_settle(&self) -> Duration {
        Duration::from_millis(self.submit_settle_ms)
    }

    pub fn dismiss_settle(&self) -> Duration {
        Duration::from_millis(self.dismiss_settle_ms)
    }

    pub fn dismiss_poll_step(&self) -> Duration {
        Duration::from_millis(self.dismiss_poll_step_ms)
    }

    pub fn success_cooldown(&self) -> Duration {
        Duration::from_millis(self.success_cooldown_ms)
    }

    pub fn abandon_cooldown(&self) -> Duration {
        Duration::from_millis(self.abandon_cooldown_ms)
    }
}

/// 页面分类用到的文案白名单
///
/// 目标站点没有稳定的结构，所有判断都基于这些词表，可以在配置文件 `[rules]` 中替换
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// 任意一个出现即视为投递成功（不区分大小写）
    pub success_phrases: Vec<String>,
    /// 成对同时出现才视为成功的弱信号
    pub weak_success_pairs: Vec<(String, String)>,
    /// 用来定位成功提示所在 section 的文案
    pub success_section_phrases: Vec<String>,
    /// 完成 / 关闭按钮词表（小写）
    pub dismiss_words: Vec<String>,
    pub next_words: Vec<String>,
    pub review_words: Vec<String>,
    pub continue_words: Vec<String>,
    pub submit_words: Vec<String>,
    /// 提交按钮 aria-label 中的短语
    pub submit_aria_phrases: Vec<String>,
    /// 底部主按钮的 class
    pub primary_button_class: String,
    /// 关闭弹窗按钮的 class
    pub dismiss_button_class: String,
    /// 入口按钮必须包含的文字（小写）
    pub entry_point_label: String,
    /// 简历相关词（小写）
    pub resume_words: Vec<String>,
    /// 文件控件 accept 中表示简历的扩展名
    pub resume_accept_hints: Vec<String>,
    /// 下拉框占位选项的文字特征（小写）
    pub placeholder_words: Vec<String>,
    /// 下拉框占位选项的取值
    pub placeholder_values: Vec<String>,
    /// 从成功文案中提取公司名的正则，第一个分组为公司名
    pub company_pattern: String,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        Self {
            success_phrases: words(&[
                "Application sent",
                "Your application was sent to",
                "application was submitted",
                "successfully submitted",
                "You can keep track of your application",
                "can keep track of your application",
                "track your application in",
            ]),
            weak_success_pairs: vec![("Applied".to_string(), "My Jobs".to_string())],
            success_section_phrases: words(&[
                "Application sent",
                "Your application was sent to",
                "You can keep track of your application",
                "application was sent",
            ]),
            dismiss_words: words(&["done", "dismiss"]),
            next_words: words(&["next"]),
            review_words: words(&["review"]),
            continue_words: words(&["continue"]),
            submit_words: words(&["submit"]),
            submit_aria_phrases: words(&["submit application"]),
            primary_button_class: "artdeco-button--primary".to_string(),
            dismiss_button_class: "artdeco-modal__dismiss".to_string(),
            entry_point_label: "easy apply".to_string(),
            resume_words: words(&["resume", "cv"]),
            resume_accept_hints: words(&["pdf", "doc"]),
            placeholder_words: words(&["select", "choose"]),
            placeholder_values: words(&["", "-1", "0"]),
            company_pattern: r"(?:sent to|submitted to|sent successfully to) ([^!.]+)[!.]"
                .to_string(),
        }
    }
}
