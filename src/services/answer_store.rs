//! 答案库 - 业务能力层
//!
//! 字段名 → 答案。先查个人资料的固定别名表，再查操作员以前填过的答案

use phf::phf_map;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::infrastructure::kv_store::{self, keys, KeyValueStore};
use crate::models::UserData;

/// 常见字段名（小写）→ 个人资料键
static PROFILE_ALIASES: phf::Map<&'static str, &'static str> = phf_map! {
    "first name" => "firstName",
    "last name" => "lastName",
    "full name" => "name",
    "email" => "email",
    "phone" => "phone",
    "location" => "location",
    "current title" => "currentTitle",
    "current company" => "currentCompany",
    "experience" => "experience",
    "years of experience" => "yearsOfExperience",
    "education" => "education",
    "linkedin" => "linkedin",
    "website" => "website",
    "github" => "github",
    "expected salary" => "salaryExpectation",
    "notice period" => "noticePeriod",
};

/// 答案库
///
/// 每次访问都重新读取存储，不做缓存
#[derive(Clone)]
pub struct AnswerStore {
    store: Arc<dyn KeyValueStore>,
}

impl AnswerStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// 查找字段的答案（字段名不区分大小写）
    ///
    /// 个人资料命中时总是优先于学习到的答案；存储读取失败视为没有答案
    pub async fn find_answer(&self, field_name: &str) -> Option<String> {
        let lowered = field_name.trim().to_lowercase();

        if let Some(answer) = self.profile_answer(&lowered).await {
            debug!("字段 \"{}\" 命中个人资料", field_name);
            return Some(answer);
        }

        let answers = self.learned_answers().await;
        answers
            .get(field_name)
            .or_else(|| {
                answers
                    .iter()
                    .find(|(name, _)| name.trim().to_lowercase() == lowered)
                    .map(|(_, answer)| answer)
            })
            .cloned()
    }

    /// 保存操作员给出的答案，返回是否写入成功
    pub async fn save_answer(&self, field_name: &str, answer: &str) -> bool {
        let mut answers = self.learned_answers().await;

        // 同名（忽略大小写）的旧答案一并替换，保证后续查到的是最新值
        let lowered = field_name.trim().to_lowercase();
        answers.retain(|name, _| name.trim().to_lowercase() != lowered);
        answers.insert(field_name.to_string(), answer.to_string());

        match kv_store::save(self.store.as_ref(), keys::FORM_ANSWERS, &answers).await {
            Ok(()) => {
                debug!("已保存字段 \"{}\" 的答案", field_name);
                true
            }
            Err(e) => {
                warn!("⚠️ 保存字段 \"{}\" 的答案失败: {}", field_name, e);
                false
            }
        }
    }

    async fn profile_answer(&self, lowered_name: &str) -> Option<String> {
        let key = PROFILE_ALIASES.get(lowered_name)?;
        match kv_store::load::<UserData>(self.store.as_ref(), keys::USER_DATA).await {
            Ok(profile) => profile?.get(key).map(str::to_string),
            Err(e) => {
                warn!("⚠️ 读取个人资料失败: {}", e);
                None
            }
        }
    }

    async fn learned_answers(&self) -> HashMap<String, String> {
        match kv_store::load(self.store.as_ref(), keys::FORM_ANSWERS).await {
            Ok(answers) => answers.unwrap_or_default(),
            Err(e) => {
                warn!("⚠️ 读取已保存答案失败: {}", e);
                HashMap::new()
            }
        }
    }
}
