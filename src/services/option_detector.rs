/// 选项数量检测
///
/// 从原题题干中推断选项个数：先找字母标号（A) / A. / (A) / Option A:），
/// 再找数字标号（1) / 1.），都没有时默认 4 个。
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// 检测不到标号时的默认选项数
pub const DEFAULT_OPTION_COUNT: usize = 4;
const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 10;

static LETTER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b([A-Z])\)\s",
        r"(?i)\b([A-Z])\.\s",
        r"(?i)\(([A-Z])\)",
        r"(?i)Option\s+([A-Z])[:\s]",
        r"(?i)\b([A-Z])\)\S",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid option letter pattern"))
    .collect()
});

static NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\b(\d+)\)\s", r"\b(\d+)\.\s"]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid option number pattern"))
        .collect()
});

/// 推断题干中的选项个数，结果限制在 [2, 10]
pub fn detect_option_count(base_question: &str) -> usize {
    if let Some(count) = count_from_letters(base_question) {
        debug!("根据字母标号检测到 {} 个选项", count);
        return count;
    }
    if let Some(count) = count_from_numbers(base_question) {
        debug!("根据数字标号检测到 {} 个选项", count);
        return count;
    }
    debug!("未检测到选项标号，使用默认值 {}", DEFAULT_OPTION_COUNT);
    DEFAULT_OPTION_COUNT
}

/// 最大字母的序号（A=1），而不是字母个数
fn count_from_letters(text: &str) -> Option<usize> {
    let letters: BTreeSet<char> = LETTER_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().chars().next())
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let highest = letters.last()?;
    let count = (*highest as usize) - ('A' as usize) + 1;
    Some(count.clamp(MIN_OPTIONS, MAX_OPTIONS))
}

fn count_from_numbers(text: &str) -> Option<usize> {
    NUMBER_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<usize>().ok())
        .max()
        .map(|count| count.clamp(MIN_OPTIONS, MAX_OPTIONS))
}
