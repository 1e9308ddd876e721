//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 连接浏览器，持有 Browser
//! - 组装各层组件
//! - 运行到操作员退出，输出全局统计
//!
//! ### `runner` - 自动运行器
//! - 固定间隔触发处理，单飞锁保证同一时间只处理一个职位
//! - 开关自动运行并持久化开关状态
//! - 汇总运行统计
//!
//! ### `paginator` - 列表翻页
//! - 找下一张未处理的卡片并打开
//! - 交给 FlowController 处理申请弹窗
//! - 当前页处理完时翻页
//!
//! ### `console` - 操作员终端
//! - 标准输入同时服务操作员提问和控制命令
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser)
//!     ↓
//! runner (tick + 单飞锁)
//!     ↓
//! paginator (处理 Vec<卡片>)
//!     ↓
//! workflow::FlowController (处理单个申请弹窗)
//!     ↓
//! services (能力层：分类 / 填写 / 答案库 / 记录)
//!     ↓
//! infrastructure (基础设施：Surface / JsExecutor / KeyValueStore)
//! ```

pub mod app;
pub mod console;
pub mod paginator;
pub mod runner;

// 重新导出主要类型
pub use app::{build_runner, App};
pub use paginator::{ListPaginator, PassOutcome, PassReport};
pub use runner::{ControlHandle, RunStats, Runner};
