//! 字段分类 - 业务能力层
//!
//! 纯函数：判断字段是否为空、是否为简历上传、字段叫什么名字

use std::collections::HashMap;
use tracing::debug;

use crate::config::ClassifierRules;
use crate::models::{
    FieldControl, FieldKind, FieldRef, FieldSnapshot, ModalSnapshot, RadioMember,
};

/// 单个控件是否为空
///
/// 单选按钮在这里只看自身是否选中，整组的判断见 [`is_radio_group_empty`]
pub fn is_empty(field: &FieldSnapshot, rules: &ClassifierRules) -> bool {
    match field.kind {
        FieldKind::Select => is_select_empty(field, rules),
        FieldKind::Radio => !field.checked,
        _ => field.value.is_empty(),
    }
}

fn is_select_empty(field: &FieldSnapshot, rules: &ClassifierRules) -> bool {
    if field.value.is_empty() || field.value == "-1" {
        return true;
    }
    let placeholder_first = field.options.first().is_some_and(|first| {
        let text = first.text.to_lowercase();
        rules.placeholder_values.iter().any(|v| *v == first.value)
            || rules.placeholder_words.iter().any(|w| text.contains(w.as_str()))
    });
    field.selected_index == 0 && placeholder_first
}

/// 单选组为空 ⇔ 没有任何成员被选中
pub fn is_radio_group_empty(members: &[&FieldSnapshot]) -> bool {
    !members.iter().any(|m| m.checked)
}

/// 是否为简历上传控件，这类控件永远不自动填写
pub fn is_resume_upload(field: &FieldSnapshot, rules: &ClassifierRules) -> bool {
    if field.kind != FieldKind::File {
        return false;
    }

    let name = name_of(field);
    let mentions_resume = |text: &str| rules.resume_words.iter().any(|w| text.contains(w.as_str()));

    let is_resume = is_resume_named(&name, rules)
        || mentions_resume(&field.container_text)
        || rules
            .resume_accept_hints
            .iter()
            .any(|hint| field.accept.contains(hint.as_str()))
        || mentions_resume(&field.aria_label);

    if is_resume {
        debug!(
            "识别为简历上传控件: {} (accept: {})",
            name, field.accept
        );
    }
    is_resume
}

/// 字段名是否指向简历（这类字段留给简历选择步骤，不自动填写）
pub fn is_resume_named(name: &str, rules: &ClassifierRules) -> bool {
    let lowered = name.to_lowercase();
    rules.resume_words.iter().any(|w| lowered.contains(w.as_str()))
}

/// 字段名：label[for] → 祖先中的 label → name → id
///
/// 保证返回非空字符串
pub fn name_of(field: &FieldSnapshot) -> String {
    first_non_blank([
        field.for_label.as_deref(),
        field.ancestor_label.as_deref(),
        Some(field.name.as_str()),
        Some(field.id.as_str()),
    ])
    .unwrap_or_else(|| fallback_name(field))
}

/// 单选组名：legend → 容器 label → 成员自身 label → name
pub fn radio_group_name(first: &FieldSnapshot) -> String {
    first_non_blank([
        first.group_legend.as_deref(),
        first.group_label.as_deref(),
        first.for_label.as_deref(),
        first.ancestor_label.as_deref(),
        Some(first.name.as_str()),
        Some(first.id.as_str()),
    ])
    .unwrap_or_else(|| fallback_name(first))
}

/// 单选成员自身的 label，缺省为 value
fn radio_member_label(member: &FieldSnapshot) -> String {
    first_non_blank([
        member.for_label.as_deref(),
        member.ancestor_label.as_deref(),
        Some(member.value.as_str()),
    ])
    .unwrap_or_default()
}

fn first_non_blank<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn fallback_name(field: &FieldSnapshot) -> String {
    if field.handle.is_empty() {
        "unnamed field".to_string()
    } else {
        format!("field {}", field.handle)
    }
}

fn is_interactive(field: &FieldSnapshot) -> bool {
    !field.disabled && !field.hidden
}

/// 收集弹窗中所有可填写的字段（含非空字段）
///
/// 单选按钮按 name 归组，每组只报告一次；文件控件不参与自动填写
pub fn collect_fields(snapshot: &ModalSnapshot, rules: &ClassifierRules) -> Vec<FieldRef> {
    let mut refs = Vec::new();
    let mut radio_groups: HashMap<String, Vec<&FieldSnapshot>> = HashMap::new();
    let mut radio_order: Vec<String> = Vec::new();

    for field in &snapshot.fields {
        match field.kind {
            FieldKind::File => {
                if !is_resume_upload(field, rules) {
                    debug!("跳过非简历文件控件: {}", name_of(field));
                }
            }
            FieldKind::Radio => {
                let group = if field.name.is_empty() {
                    field.handle.clone()
                } else {
                    field.name.clone()
                };
                let members = radio_groups.entry(group.clone()).or_default();
                if members.is_empty() {
                    radio_order.push(group);
                }
                members.push(field);
            }
            FieldKind::Select => {
                if is_interactive(field) {
                    refs.push(FieldRef {
                        name: name_of(field),
                        empty: is_empty(field, rules),
                        control: FieldControl::Select {
                            handle: field.handle.clone(),
                            options: field.options.clone(),
                        },
                    });
                }
            }
            FieldKind::Text | FieldKind::TextArea | FieldKind::Checkbox => {
                if is_interactive(field) {
                    refs.push(FieldRef {
                        name: name_of(field),
                        empty: is_empty(field, rules),
                        control: FieldControl::Text {
                            handle: field.handle.clone(),
                        },
                    });
                }
            }
        }
    }

    for group in radio_order {
        let members = &radio_groups[&group];
        let first = members[0];
        if !is_interactive(first) {
            continue;
        }
        refs.push(FieldRef {
            name: radio_group_name(first),
            empty: is_radio_group_empty(members),
            control: FieldControl::RadioGroup {
                group,
                members: members
                    .iter()
                    .map(|m| RadioMember {
                        handle: m.handle.clone(),
                        label: radio_member_label(m),
                        value: m.value.clone(),
                    })
                    .collect(),
            },
        });
    }

    refs
}

/// 弹窗中所有空字段
pub fn empty_fields(snapshot: &ModalSnapshot, rules: &ClassifierRules) -> Vec<FieldRef> {
    collect_fields(snapshot, rules)
        .into_iter()
        .filter(|f| f.empty)
        .collect()
}
