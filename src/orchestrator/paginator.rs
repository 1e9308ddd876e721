//! 列表翻页 - 编排层
//!
//! ## 职责
//!
//! 1. 在当前列表页找到下一张未处理的卡片（发现即标记，绝不重复选中）
//! 2. 打开卡片，找到 Easy Apply 入口，交给 [`FlowController`] 处理
//! 3. 当前页处理完时点击下一页；没有下一页时报告列表已耗尽

use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::{ClassifierRules, Config, Timings};
use crate::infrastructure::Surface;
use crate::models::{ButtonSnapshot, ListItemSnapshot, ListingSnapshot, PageButtonSnapshot, Platform};
use crate::workflow::{FlowController, FlowOutcome, ItemCtx};

/// 一次处理的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// 打开了一个有 Easy Apply 入口的职位并走完了申请流程
    Applied(FlowOutcome),
    /// 当前页已处理完，点击了下一页
    PageAdvanced,
    /// 没有未处理的卡片，也没有下一页
    ListExhausted,
    /// 扫描途中自动运行被关闭
    Stopped,
}

/// 一次处理的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub outcome: PassOutcome,
    /// 本次跳过的没有 Easy Apply 入口的职位数
    pub skipped_without_entry: usize,
}

/// 页码为当前页 + 1 的分页按钮
pub fn next_page_control(listing: &ListingSnapshot) -> Option<&PageButtonSnapshot> {
    let target = listing.current_page? + 1;
    listing.page_buttons.iter().find(|b| b.number == Some(target))
}

/// 入口按钮是否是 Easy Apply（文本或 aria-label 含入口标签）
pub fn is_entry_point(button: &ButtonSnapshot, rules: &ClassifierRules) -> bool {
    let label = rules.entry_point_label.to_lowercase();
    !button.disabled
        && (button.text.to_lowercase().contains(&label)
            || button.aria_label.to_lowercase().contains(&label))
}

pub struct ListPaginator {
    surface: Arc<dyn Surface>,
    flow: FlowController,
    rules: ClassifierRules,
    timings: Timings,
    opened: AtomicUsize,
}

impl ListPaginator {
    pub fn new(config: &Config, surface: Arc<dyn Surface>, flow: FlowController) -> Self {
        Self {
            surface,
            flow,
            rules: config.rules.clone(),
            timings: config.timings.clone(),
            opened: AtomicUsize::new(0),
        }
    }

    /// 本次运行中打开过的职位数
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// 当前页下一张未处理的卡片
    ///
    /// 返回卡片和当前页码，返回前已经打上处理标记；没有链接的卡片同样标记后跳过
    pub async fn next_unprocessed_item(&self) -> Result<Option<(ListItemSnapshot, Option<u32>)>> {
        let listing = self.surface.listing().await?;

        for item in listing.items.into_iter().filter(|i| !i.processed) {
            self.surface.mark_processed(&item.handle).await?;
            if item.has_link {
                return Ok(Some((item, listing.current_page)));
            }
            debug!("卡片 {} 没有职位链接，跳过", item.handle);
        }
        Ok(None)
    }

    /// 处理下一个有 Easy Apply 入口的职位，当前页没有时翻页
    ///
    /// 没有入口的职位直接跳过，继续看同一页的下一张卡片
    pub async fn process_next(&self, enabled: &AtomicBool) -> Result<PassReport> {
        let platform = Platform::detect(&self.surface.current_url().await?);
        let mut skipped_without_entry = 0;

        loop {
            if !enabled.load(Ordering::SeqCst) {
                return Ok(PassReport {
                    outcome: PassOutcome::Stopped,
                    skipped_without_entry,
                });
            }

            let outcome = match self.next_unprocessed_item().await? {
                Some((item, page)) => match self.open_item(item, page, platform, enabled).await? {
                    Some(flow_outcome) => PassOutcome::Applied(flow_outcome),
                    None => {
                        skipped_without_entry += 1;
                        continue;
                    }
                },
                None => self.advance_page().await?,
            };
            return Ok(PassReport {
                outcome,
                skipped_without_entry,
            });
        }
    }

    /// 打开职位；没有 Easy Apply 入口时返回 None
    async fn open_item(
        &self,
        item: ListItemSnapshot,
        page: Option<u32>,
        platform: Option<Platform>,
        enabled: &AtomicBool,
    ) -> Result<Option<FlowOutcome>> {
        let index = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        let ctx = ItemCtx::new(index, item.handle, page, platform);
        info!("{} 📋 打开职位", ctx);

        self.surface.scroll_into_view(&ctx.handle).await?;
        sleep(self.timings.item_scroll_settle()).await;
        if !self.surface.click_item_link(&ctx.handle).await? {
            info!("{} 职位链接已不存在，跳过", ctx);
            return Ok(None);
        }
        sleep(self.timings.page_load_settle()).await;

        let entry = self
            .surface
            .entry_point()
            .await?
            .filter(|b| is_entry_point(b, &self.rules));
        let Some(entry) = entry else {
            info!("{} 没有 Easy Apply 入口，跳过", ctx);
            return Ok(None);
        };

        self.surface.mark_processed(&entry.handle).await?;
        if !self.surface.click(&entry.handle).await? {
            info!("{} Easy Apply 按钮已消失，跳过", ctx);
            return Ok(None);
        }
        sleep(self.timings.post_click_settle()).await;

        let outcome = self.flow.drive(&ctx, enabled).await?;
        info!("{} 申请结束: {:?}", ctx, outcome);
        Ok(Some(outcome))
    }

    async fn advance_page(&self) -> Result<PassOutcome> {
        let listing = self.surface.listing().await?;
        let Some(button) = next_page_control(&listing) else {
            info!("📭 没有更多职位了");
            return Ok(PassOutcome::ListExhausted);
        };

        info!("📄 当前页已处理完，翻到第 {} 页", button.number.unwrap_or_default());
        if !self.surface.click(&button.handle).await? {
            return Ok(PassOutcome::ListExhausted);
        }
        sleep(self.timings.page_load_settle()).await;
        Ok(PassOutcome::PageAdvanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_button(handle: &str, number: Option<u32>) -> PageButtonSnapshot {
        PageButtonSnapshot {
            handle: handle.to_string(),
            number,
        }
    }

    #[test]
    fn test_next_page_is_current_plus_one() {
        let listing = ListingSnapshot {
            current_page: Some(2),
            page_buttons: vec![
                page_button("p1", Some(1)),
                page_button("p3", Some(3)),
                page_button("dots", None),
            ],
            ..Default::default()
        };
        assert_eq!(next_page_control(&listing).map(|b| b.handle.as_str()), Some("p3"));
    }

    #[test]
    fn test_no_next_page_on_last_page_or_without_pagination() {
        let last = ListingSnapshot {
            current_page: Some(3),
            page_buttons: vec![page_button("p2", Some(2)), page_button("p3", Some(3))],
            ..Default::default()
        };
        assert!(next_page_control(&last).is_none());
        assert!(next_page_control(&ListingSnapshot::default()).is_none());
    }

    #[test]
    fn test_entry_point_requires_label() {
        let rules = ClassifierRules::default();
        let mut button = ButtonSnapshot {
            text: "easy apply".to_string(),
            ..Default::default()
        };
        assert!(is_entry_point(&button, &rules));

        button.text = "apply".to_string();
        assert!(!is_entry_point(&button, &rules));

        button.aria_label = "easy apply to rust engineer".to_string();
        assert!(is_entry_point(&button, &rules));

        button.disabled = true;
        assert!(!is_entry_point(&button, &rules));
    }
}
