//! 候选项匹配
//!
//! 把一个已知答案对应到下拉框 / 单选组的某个选项，分三档，前一档命中就不再往下找：
//! 1. 文字或取值完全相同（忽略大小写）
//! 2. 任一方向的子串包含
//! 3. 答案长于 3 个字符时，按单词比对，至少一对长于 3 个字符的单词互相包含

use crate::models::ChoiceOption;

/// 最匹配的选项下标，同档内取第一个
pub fn best_matching_index(options: &[ChoiceOption], answer: &str) -> Option<usize> {
    let answer = answer.trim().to_lowercase();
    if answer.is_empty() {
        return None;
    }

    let lowered: Vec<(String, String)> = options
        .iter()
        .map(|o| (o.text.trim().to_lowercase(), o.value.trim().to_lowercase()))
        .collect();

    if let Some(i) = lowered
        .iter()
        .position(|(text, value)| *text == answer || *value == answer)
    {
        return Some(i);
    }

    // 空字符串是任何字符串的子串，占位选项不能借此命中
    let related = |candidate: &str| {
        !candidate.is_empty() && (candidate.contains(&answer) || answer.contains(candidate))
    };
    if let Some(i) = lowered
        .iter()
        .position(|(text, value)| related(text) || related(value))
    {
        return Some(i);
    }

    if answer.chars().count() > 3 {
        let answer_words: Vec<&str> = long_words(&answer).collect();
        return lowered.iter().position(|(text, _)| {
            long_words(text).any(|opt_word| {
                answer_words
                    .iter()
                    .any(|word| opt_word.contains(word) || word.contains(opt_word))
            })
        });
    }

    None
}

/// 最匹配的选项
pub fn best_matching_option<'a>(
    options: &'a [ChoiceOption],
    answer: &str,
) -> Option<&'a ChoiceOption> {
    best_matching_index(options, answer).map(|i| &options[i])
}

fn long_words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().filter(|w| w.chars().count() > 3)
}
