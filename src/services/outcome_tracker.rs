//! 投递结果记录 - 业务能力层
//!
//! 每次成功投递追加一条记录到 `successfulApps`，超过上限时丢弃最旧的记录

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::infrastructure::kv_store::{self, keys, KeyValueStore};
use crate::models::{JobDetails, Platform, SuccessfulApp};
use crate::services::step_classifier::UNKNOWN_COMPANY;

pub const UNKNOWN_POSITION: &str = "Unknown Position";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Clone)]
pub struct OutcomeTracker {
    store: Arc<dyn KeyValueStore>,
    cap: usize,
}

impl OutcomeTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, cap: usize) -> Self {
        Self { store, cap }
    }

    /// 追加一条成功记录
    ///
    /// 读-改-写整个列表；存储失败只记日志，不影响流程
    pub async fn record(&self, details: &JobDetails, platform: Option<Platform>) {
        let mut apps: Vec<SuccessfulApp> =
            match kv_store::load(self.store.as_ref(), keys::SUCCESSFUL_APPS).await {
                Ok(apps) => apps.unwrap_or_default(),
                Err(e) => {
                    warn!("⚠️ 读取投递记录失败，本次不记录: {}", e);
                    return;
                }
            };

        let entry = SuccessfulApp {
            company: non_blank(Some(&details.company)).unwrap_or(UNKNOWN_COMPANY).to_string(),
            position: non_blank(details.title.as_deref())
                .unwrap_or(UNKNOWN_POSITION)
                .to_string(),
            location: non_blank(details.location.as_deref())
                .unwrap_or(UNKNOWN_LOCATION)
                .to_string(),
            date: Utc::now().to_rfc3339(),
            platform,
        };
        info!(
            "📊 记录成功投递: {} @ {} ({})",
            entry.position, entry.company, entry.location
        );
        apps.push(entry);

        if apps.len() > self.cap {
            let overflow = apps.len() - self.cap;
            apps.drain(..overflow);
        }

        if let Err(e) = kv_store::save(self.store.as_ref(), keys::SUCCESSFUL_APPS, &apps).await {
            warn!("⚠️ 写入投递记录失败: {}", e);
        }
    }

    /// 当前保存的全部记录，旧的在前
    pub async fn history(&self) -> Vec<SuccessfulApp> {
        kv_store::load(self.store.as_ref(), keys::SUCCESSFUL_APPS)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
