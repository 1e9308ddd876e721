//! 弹窗状态分类 - 业务能力层
//!
//! 职责：把一次 [`ModalSnapshot`] 归到唯一的 [`FlowState`]。
//!
//! 判定顺序固定，前一条命中就返回：
//! 1. 还有空字段（简历相关的除外）→ `AwaitingFieldInput`
//! 2. 出现成功文案 → 有关闭按钮时 `SuccessConfirmed`，否则 `SuccessUnconfirmed`
//! 3. 简历选择器 → `ResumeSelection`
//! 4. 可推进的按钮 → `ActionAvailable`
//! 5. 以上都没有 → `NoActionAvailable`

use regex::Regex;
use tracing::{debug, warn};

use crate::config::ClassifierRules;
use crate::models::{ActionControl, ButtonSnapshot, FlowState, JobDetails, ModalSnapshot};
use crate::services::field_classifier::{empty_fields, is_resume_named};
use crate::utils::collapse_whitespace;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// 对快照分类
///
/// 空字段只要还空着就一直阻塞，不管操作员是否放弃过
pub fn classify(snapshot: &ModalSnapshot, rules: &ClassifierRules) -> FlowState {
    let pending: Vec<_> = empty_fields(snapshot, rules)
        .into_iter()
        .filter(|f| !is_resume_named(&f.name, rules))
        .collect();
    if !pending.is_empty() {
        return FlowState::AwaitingFieldInput {
            empty_fields: pending,
        };
    }

    if has_success_message(snapshot, rules) {
        return if done_controls(snapshot, rules).is_empty() {
            FlowState::SuccessUnconfirmed {
                raw_text: collapse_whitespace(&snapshot.text),
            }
        } else {
            FlowState::SuccessConfirmed {
                job_details: job_details(snapshot, rules),
            }
        };
    }

    if snapshot.has_resume_picker {
        return FlowState::ResumeSelection;
    }

    match action_control(snapshot, rules) {
        Some((control, button)) => FlowState::ActionAvailable {
            control,
            handle: button.handle.clone(),
        },
        None => FlowState::NoActionAvailable,
    }
}

/// 是否出现申请成功的文案
///
/// 强文案单独出现即可；弱文案（如 "Applied"）必须成对出现
pub fn has_success_message(snapshot: &ModalSnapshot, rules: &ClassifierRules) -> bool {
    let text = snapshot.text.to_lowercase();
    let contains = |phrase: &String| text.contains(&phrase.to_lowercase());

    if rules.success_phrases.iter().any(contains) {
        return true;
    }
    if rules
        .weak_success_pairs
        .iter()
        .any(|(a, b)| contains(a) && contains(b))
    {
        return true;
    }
    success_section(snapshot, rules).is_some()
}

/// 第一个包含成功文案的 `section` 下标
pub fn success_section(snapshot: &ModalSnapshot, rules: &ClassifierRules) -> Option<usize> {
    snapshot.sections.iter().position(|section| {
        let text = section.text.to_lowercase();
        rules
            .success_section_phrases
            .iter()
            .any(|p| text.contains(&p.to_lowercase()))
    })
}

fn is_word(value: &str, words: &[String]) -> bool {
    words.iter().any(|w| w == value)
}

fn mentions(value: &str, words: &[String]) -> bool {
    words.iter().any(|w| value.contains(w.as_str()))
}

/// 按钮是否是「完成 / 关闭」按钮
///
/// 两条路径任一命中即可：按钮文本或 aria-label，或内嵌 span 的文本
pub fn is_dismiss_button(button: &ButtonSnapshot, rules: &ClassifierRules) -> bool {
    let by_text = is_word(&button.text, &rules.dismiss_words)
        || mentions(&button.aria_label, &rules.dismiss_words);
    let by_span = is_word(button.span_text.trim(), &rules.dismiss_words);
    by_text || by_span
}

/// 成功后可用来关闭弹窗的按钮，按尝试顺序排列
///
/// 成功区块内的完成按钮 → 关闭图标 / 主按钮 / aria 标注的按钮 → 其余文本为 "done" 的按钮
pub fn done_controls<'a>(
    snapshot: &'a ModalSnapshot,
    rules: &ClassifierRules,
) -> Vec<&'a ButtonSnapshot> {
    let mut ordered: Vec<&ButtonSnapshot> = Vec::new();
    let mut push = |button: &'a ButtonSnapshot| {
        if !ordered.iter().any(|b| b.handle == button.handle) {
            ordered.push(button);
        }
    };
    let candidates: Vec<&ButtonSnapshot> = snapshot
        .buttons
        .iter()
        .filter(|b| !b.disabled && is_dismiss_button(b, rules))
        .collect();

    if let Some(section) = success_section(snapshot, rules) {
        candidates
            .iter()
            .copied()
            .filter(|b| b.section == Some(section))
            .for_each(&mut push);
    }

    candidates
        .iter()
        .copied()
        .filter(|b| {
            b.has_class(&rules.dismiss_button_class)
                || b.has_class(&rules.primary_button_class)
                || !b.aria_label.is_empty()
        })
        .for_each(&mut push);

    candidates.iter().copied().for_each(&mut push);
    ordered
}

/// 选简历页上用来继续的按钮（next / review）
pub fn resume_advance_control<'a>(
    snapshot: &'a ModalSnapshot,
    rules: &ClassifierRules,
) -> Option<&'a ButtonSnapshot> {
    snapshot.buttons.iter().find(|b| {
        !b.disabled
            && (mentions(&b.text, &rules.next_words)
                || mentions(&b.text, &rules.review_words)
                || mentions(&b.aria_label, &rules.next_words)
                || mentions(&b.aria_label, &rules.review_words))
    })
}

/// 第一个可推进流程的按钮
///
/// 完成 / 关闭按钮永远不算；footer 里的主按钮即使文本不认识也算 Continue
pub fn action_control<'a>(
    snapshot: &'a ModalSnapshot,
    rules: &ClassifierRules,
) -> Option<(ActionControl, &'a ButtonSnapshot)> {
    snapshot.buttons.iter().filter(|b| !b.disabled).find_map(|b| {
        if is_word(&b.text, &rules.dismiss_words) {
            return None;
        }
        let hit = |words: &[String]| mentions(&b.text, words) || mentions(&b.aria_label, words);

        let control = if mentions(&b.text, &rules.submit_words)
            || mentions(&b.aria_label, &rules.submit_aria_phrases)
        {
            ActionControl::Submit
        } else if hit(&rules.next_words) {
            ActionControl::Next
        } else if hit(&rules.review_words) {
            ActionControl::Review
        } else if hit(&rules.continue_words)
            || (b.in_footer && b.has_class(&rules.primary_button_class))
        {
            ActionControl::Continue
        } else {
            return None;
        };
        Some((control, b))
    })
}

/// 从成功弹窗里提取职位信息，公司名取不到时为 "Unknown Company"
pub fn job_details(snapshot: &ModalSnapshot, rules: &ClassifierRules) -> JobDetails {
    let text = collapse_whitespace(&snapshot.text);
    let company = match Regex::new(&rules.company_pattern) {
        Ok(pattern) => pattern
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|c| !c.is_empty()),
        Err(e) => {
            warn!("⚠️ 公司名正则无效: {}", e);
            None
        }
    };
    let details = JobDetails {
        title: snapshot.job_title.clone().filter(|t| !t.trim().is_empty()),
        company: company.unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
        location: snapshot.job_location.clone().filter(|l| !l.trim().is_empty()),
    };
    debug!("职位信息: {:?}", details);
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldKind, FieldSnapshot, SectionSnapshot};

    fn rules() -> ClassifierRules {
        ClassifierRules::default()
    }

    fn button(handle: &str, text: &str) -> ButtonSnapshot {
        ButtonSnapshot {
            handle: handle.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn empty_text(handle: &str, label: &str) -> FieldSnapshot {
        FieldSnapshot {
            handle: handle.to_string(),
            kind: FieldKind::Text,
            for_label: Some(label.to_string()),
            selected_index: -1,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_fields_take_priority_over_success() {
        let snapshot = ModalSnapshot {
            text: "Application sent".to_string(),
            fields: vec![empty_text("f1", "Phone")],
            buttons: vec![button("b1", "done")],
            ..Default::default()
        };
        match classify(&snapshot, &rules()) {
            FlowState::AwaitingFieldInput { empty_fields } => {
                assert_eq!(empty_fields.len(), 1);
                assert_eq!(empty_fields[0].name, "Phone");
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_resume_fields_do_not_block() {
        let snapshot = ModalSnapshot {
            fields: vec![empty_text("f2", "Resume headline")],
            buttons: vec![button("b1", "next")],
            ..Default::default()
        };
        assert_eq!(
            classify(&snapshot, &rules()),
            FlowState::ActionAvailable {
                control: ActionControl::Next,
                handle: "b1".to_string()
            }
        );

        let mut blocked = snapshot.clone();
        blocked.fields.push(empty_text("f1", "Phone"));
        assert!(matches!(
            classify(&blocked, &rules()),
            FlowState::AwaitingFieldInput { empty_fields } if empty_fields.len() == 1
        ));
    }

    #[test]
    fn test_success_confirmed_with_company() {
        let snapshot = ModalSnapshot {
            text: "\n  Application sent\n Your application was sent to Acme Corp!  ".to_string(),
            buttons: vec![button("b1", "done")],
            job_title: Some("Rust Engineer".to_string()),
            ..Default::default()
        };
        match classify(&snapshot, &rules()) {
            FlowState::SuccessConfirmed { job_details } => {
                assert_eq!(job_details.company, "Acme Corp");
                assert_eq!(job_details.title.as_deref(), Some("Rust Engineer"));
                assert_eq!(job_details.location, None);
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_success_without_dismiss_is_unconfirmed() {
        let snapshot = ModalSnapshot {
            text: "Application   sent".to_string(),
            ..Default::default()
        };
        assert_eq!(
            classify(&snapshot, &rules()),
            FlowState::SuccessUnconfirmed {
                raw_text: "Application sent".to_string()
            }
        );
    }

    #[test]
    fn test_weak_phrase_alone_is_not_success() {
        let r = rules();
        let mut snapshot = ModalSnapshot {
            text: "Applied 3 days ago".to_string(),
            ..Default::default()
        };
        assert!(!has_success_message(&snapshot, &r));

        snapshot.text = "Applied. See it in My Jobs".to_string();
        assert!(has_success_message(&snapshot, &r));
    }

    #[test]
    fn test_success_section_and_ordered_done_controls() {
        let r = rules();
        let mut close = button("x", "");
        close.aria_label = "dismiss".to_string();
        close.classes = vec![r.dismiss_button_class.clone()];
        let mut section_done = button("d", "done");
        section_done.section = Some(1);
        let plain_done = button("p", "done");

        let snapshot = ModalSnapshot {
            text: "Your application was sent to Globex.".to_string(),
            sections: vec![
                SectionSnapshot { text: "Job details".to_string() },
                SectionSnapshot { text: "Application sent".to_string() },
            ],
            buttons: vec![close, plain_done, section_done],
            ..Default::default()
        };
        assert_eq!(success_section(&snapshot, &r), Some(1));

        let handles: Vec<&str> = done_controls(&snapshot, &r)
            .iter()
            .map(|b| b.handle.as_str())
            .collect();
        assert_eq!(handles, vec!["d", "x", "p"]);
    }

    #[test]
    fn test_span_text_marks_dismiss_button() {
        let mut b = button("b1", "");
        b.span_text = "done".to_string();
        assert!(is_dismiss_button(&b, &rules()));
        assert!(!is_dismiss_button(&button("b2", "next"), &rules()));
    }

    #[test]
    fn test_resume_picker_before_action() {
        let snapshot = ModalSnapshot {
            has_resume_picker: true,
            buttons: vec![button("b1", "next")],
            ..Default::default()
        };
        let r = rules();
        assert_eq!(classify(&snapshot, &r), FlowState::ResumeSelection);
        assert_eq!(
            resume_advance_control(&snapshot, &r).map(|b| b.handle.as_str()),
            Some("b1")
        );
    }

    #[test]
    fn test_action_control_kinds() {
        let r = rules();
        let classify_button = |b: ButtonSnapshot| {
            let snapshot = ModalSnapshot {
                buttons: vec![b],
                ..Default::default()
            };
            action_control(&snapshot, &r).map(|(c, _)| c)
        };

        assert_eq!(classify_button(button("b", "submit application")), Some(ActionControl::Submit));
        assert_eq!(classify_button(button("b", "review your application")), Some(ActionControl::Review));
        assert_eq!(classify_button(button("b", "continue to next step")), Some(ActionControl::Next));
        assert_eq!(classify_button(button("b", "done")), None);
        assert_eq!(classify_button(button("b", "save")), None);

        let mut aria_submit = button("b", "");
        aria_submit.aria_label = "submit application".to_string();
        assert_eq!(classify_button(aria_submit), Some(ActionControl::Submit));

        let mut footer_primary = button("b", "weiter");
        footer_primary.in_footer = true;
        footer_primary.classes = vec![r.primary_button_class.clone()];
        assert_eq!(classify_button(footer_primary), Some(ActionControl::Continue));

        let mut disabled = button("b", "next");
        disabled.disabled = true;
        assert_eq!(classify_button(disabled), None);
    }

    #[test]
    fn test_no_action_available() {
        let snapshot = ModalSnapshot {
            text: "Loading".to_string(),
            ..Default::default()
        };
        assert_eq!(
            classify(&snapshot, &rules()),
            FlowState::NoActionAvailable
        );
    }

    #[test]
    fn test_company_defaults_when_pattern_misses() {
        let snapshot = ModalSnapshot {
            text: "Application sent".to_string(),
            ..Default::default()
        };
        assert_eq!(job_details(&snapshot, &rules()).company, UNKNOWN_COMPANY);
    }
}
