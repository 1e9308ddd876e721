//! # Job Auto Apply
//!
//! 通过浏览器远程调试端口自动完成 LinkedIn "Easy Apply" 申请的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page、存储文件），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `Surface` - 页面端口：快照读取 + 按句柄操作元素
//! - `KeyValueStore` - 整值读写的持久化存储
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，全部按单个字段 / 单个弹窗工作
//! - `step_classifier` / `field_classifier` - 纯函数分类
//! - `AnswerStore` - 字段名 → 答案
//! - `FieldFiller` - 填写单个字段，必要时询问操作员
//! - `OutcomeTracker` - 记录成功投递
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整申请流程
//! - `ItemCtx` - 上下文封装（第几个职位、第几页、哪个平台）
//! - `FlowController` - 状态机（填写 → 下一步 → 提交 → 确认）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/runner` - 定时 tick + 单飞锁 + 开关
//! - `orchestrator/paginator` - 遍历职位卡片、翻页
//! - `orchestrator/app` - 资源持有和组装
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, Surface};
pub use orchestrator::{App, Runner};
pub use workflow::{FlowController, FlowOutcome, ItemCtx};
