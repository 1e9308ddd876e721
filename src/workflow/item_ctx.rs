//! 职位处理上下文
//!
//! 封装"我正在处理第几个职位、在第几页、哪个平台"这一信息

use std::fmt::Display;

use crate::models::Platform;

/// 职位处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 本次运行中打开的第几个职位（从1开始，仅用于日志显示）
    pub item_index: usize,

    /// 列表卡片的句柄
    pub handle: String,

    /// 当前列表页码，页面上没有分页时为 None
    pub page: Option<u32>,

    /// 当前页面所属平台
    pub platform: Option<Platform>,
}

impl ItemCtx {
    pub fn new(
        item_index: usize,
        handle: String,
        page: Option<u32>,
        platform: Option<Platform>,
    ) -> Self {
        Self {
            item_index,
            handle,
            page,
            platform,
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.page {
            Some(page) => write!(f, "[职位 #{} 第{}页]", self.item_index, page),
            None => write!(f, "[职位 #{}]", self.item_index),
        }
    }
}
