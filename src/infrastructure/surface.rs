//! 页面端口
//!
//! 流程层只通过这个 trait 观察和操作页面：读操作返回快照，写操作用快照里的句柄定位元素

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ButtonSnapshot, ListingSnapshot, ModalSnapshot};

#[async_trait]
pub trait Surface: Send + Sync {
    /// 当前页面地址
    async fn current_url(&self) -> Result<String>;

    /// 职位列表和分页按钮
    async fn listing(&self) -> Result<ListingSnapshot>;

    /// 给元素打上已处理标记（只增不减）
    async fn mark_processed(&self, handle: &str) -> Result<()>;

    async fn scroll_into_view(&self, handle: &str) -> Result<()>;

    /// 点击职位卡片上的标题链接；卡片没有链接时返回 false
    async fn click_item_link(&self, handle: &str) -> Result<bool>;

    /// 详情区域中尚未处理过的申请入口按钮
    async fn entry_point(&self) -> Result<Option<ButtonSnapshot>>;

    /// 申请弹窗快照；没有弹窗时返回 None
    async fn modal(&self) -> Result<Option<ModalSnapshot>>;

    /// 弹窗是否仍然可见
    async fn modal_visible(&self) -> Result<bool>;

    /// 点击元素；元素已不存在时返回 false
    async fn click(&self, handle: &str) -> Result<bool>;

    /// 写入字段值并触发 input / change 事件
    async fn set_field_value(&self, handle: &str, value: &str) -> Result<bool>;

    /// 选中单选按钮并触发 input / change 事件
    async fn check_radio(&self, handle: &str) -> Result<bool>;

    /// 向文档发送 Escape 按键
    async fn press_escape(&self) -> Result<()>;
}
