//! 页面快照
//!
//! 由注入的 JS 一次性采集，所有分类逻辑只读这些结构，不直接碰 DOM

use serde::{Deserialize, Serialize};

/// 下拉框 / 单选组的一个候选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub text: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// 表单控件种类
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    TextArea,
    Select,
    Radio,
    Checkbox,
    File,
}

/// 单个表单控件的快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSnapshot {
    /// 稳定句柄（`data-jaa-ref`）
    pub handle: String,
    pub kind: FieldKind,
    pub id: String,
    pub name: String,
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
    /// `style.display === 'none'`
    pub hidden: bool,
    pub options: Vec<ChoiceOption>,
    /// 下拉框当前选中项，没有选中时为 -1
    pub selected_index: i64,
    /// `label[for=id]` 的文本
    pub for_label: Option<String>,
    /// 最近一个包含 label 的祖先里的 label 文本
    pub ancestor_label: Option<String>,
    /// 最近的 fieldset/div 里的 legend 文本
    pub group_legend: Option<String>,
    /// 最近的 fieldset/div 里的 label 文本
    pub group_label: Option<String>,
    /// 最近的 div/section/form 的文本（小写）
    pub container_text: String,
    pub accept: String,
    pub aria_label: String,
}

/// 按钮快照，文本和 aria-label 已经 trim + 小写
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonSnapshot {
    pub handle: String,
    pub text: String,
    /// 第一个内嵌 span 的文本
    pub span_text: String,
    pub aria_label: String,
    pub classes: Vec<String>,
    pub in_footer: bool,
    pub disabled: bool,
    /// 所在 `section` 在 [`ModalSnapshot::sections`] 中的下标
    pub section: Option<usize>,
}

impl ButtonSnapshot {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// 弹窗中的一个 `section`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionSnapshot {
    pub text: String,
}

/// 申请弹窗的完整快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModalSnapshot {
    /// 弹窗全文（原始大小写）
    pub text: String,
    pub fields: Vec<FieldSnapshot>,
    pub buttons: Vec<ButtonSnapshot>,
    pub sections: Vec<SectionSnapshot>,
    pub has_resume_picker: bool,
    /// 职位详情卡片上的标题
    pub job_title: Option<String>,
    /// 职位详情卡片上的地点
    pub job_location: Option<String>,
}

/// 职位列表中的一张卡片
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListItemSnapshot {
    pub handle: String,
    pub processed: bool,
    pub has_link: bool,
}

/// 分页按钮
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageButtonSnapshot {
    pub handle: String,
    pub number: Option<u32>,
}

/// 列表页快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingSnapshot {
    pub items: Vec<ListItemSnapshot>,
    /// `aria-current="true"` 按钮上的页码
    pub current_page: Option<u32>,
    pub page_buttons: Vec<PageButtonSnapshot>,
}
