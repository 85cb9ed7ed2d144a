//! 题目校验与归一化
//!
//! 把恢复出的候选题目整理成固定结构：题干非空、恰好 K 个选项、
//! 恰好一个 "CA"。无法修复的候选题目直接丢弃，不影响其他题目。
//!
//! 选项数量不符时的处理由 [`OptionStrictness`] 决定：
//! 宽松模式补齐占位选项或截断，严格模式直接丢弃该题。

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::clients::{build_image_prompt, ImageGenerator};
use crate::config::OptionStrictness;
use crate::error::ValidationError;
use crate::models::question::{
    GeneratedQuestion, QuestionOption, CORRECT_MARKER, PLACEHOLDER_LOGIC,
};
use crate::services::response_recovery::RawCandidate;
use crate::utils::truncate_text;

/// 题干最少字符数（去除首尾空白后）
const MIN_QUESTION_CHARS: usize = 5;
/// 图片描述超过这个长度才作为图片提示词使用
const MIN_IMAGE_DESCRIPTION_CHARS: usize = 10;
/// 题数不足时错误信息中保留的原文长度
const PREVIEW_CHARS: usize = 1000;

/// logic 表示正确答案：整段是 "CA"，或出现独立的 correct / right
static CORRECT_SIGNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\(?ca\b|\bcorrect\b|\bright\b").expect("valid correct signal pattern")
});

/// 候选题目被丢弃的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnObject,
    MissingQuestion,
    MissingOptions,
    OptionCountMismatch { found: usize, expected: usize },
    QuestionTooShort(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAnObject => write!(f, "不是 JSON 对象"),
            SkipReason::MissingQuestion => write!(f, "缺少题干"),
            SkipReason::MissingOptions => write!(f, "缺少选项列表"),
            SkipReason::OptionCountMismatch { found, expected } => {
                write!(f, "选项数 {} 与要求的 {} 不符", found, expected)
            }
            SkipReason::QuestionTooShort(text) => write!(f, "题干过短: '{}'", text),
        }
    }
}

/// 校验规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub num_options: usize,
    pub strictness: OptionStrictness,
}

/// 一批候选题目的校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub questions: Vec<GeneratedQuestion>,
    /// 候选题目总数
    pub parsed: usize,
    /// (候选序号, 原因)
    pub skipped: Vec<(usize, SkipReason)>,
}

/// logic 是否表示正确答案
pub fn is_correct_signal(logic: &str) -> bool {
    CORRECT_SIGNAL.is_match(logic)
}

/// 校验单个候选题目
///
/// `index` 只用于日志（从 0 开始）
pub fn validate_candidate(
    candidate: &RawCandidate,
    rules: &ValidationRules,
    index: usize,
) -> Result<GeneratedQuestion, SkipReason> {
    let map = candidate.as_object().ok_or(SkipReason::NotAnObject)?;

    let question = map
        .get("question")
        .and_then(scalar_text)
        .filter(|text| !text.is_empty())
        .ok_or(SkipReason::MissingQuestion)?;

    let raw_options = map
        .get("options")
        .and_then(Value::as_array)
        .ok_or(SkipReason::MissingOptions)?;

    let expected = rules.num_options;
    if raw_options.len() != expected {
        warn!(
            "⚠️ 题目 {} 有 {} 个选项，应为 {}",
            index + 1,
            raw_options.len(),
            expected
        );
        if rules.strictness == OptionStrictness::Strict {
            return Err(SkipReason::OptionCountMismatch {
                found: raw_options.len(),
                expected,
            });
        }
        if raw_options.len() > expected {
            debug!(
                "移除题目 {} 多余的 {} 个选项",
                index + 1,
                raw_options.len() - expected
            );
        }
    }

    let options = normalize_options(raw_options, expected);

    let question = question.trim().to_string();
    if question.chars().count() < MIN_QUESTION_CHARS {
        return Err(SkipReason::QuestionTooShort(question));
    }

    Ok(GeneratedQuestion {
        question,
        options,
        image: text_field(map, "image"),
        solution: solution_text(map),
    })
}

/// 整理选项：截断到 K 个、丢弃空选项、保留第一个正确答案、补齐占位选项，
/// 最后保证恰好一个 "CA"
fn normalize_options(raw_options: &[Value], expected: usize) -> Vec<QuestionOption> {
    let mut options = Vec::with_capacity(expected);
    let mut has_correct = false;

    for raw in raw_options.iter().take(expected) {
        let Some(option) = raw.as_object() else {
            continue;
        };
        let Some(text) = option
            .get("text")
            .and_then(scalar_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let mut logic = option
            .get("logic")
            .and_then(scalar_text)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_LOGIC.to_string());

        if is_correct_signal(&logic) {
            logic = if has_correct {
                // 多个正确答案时只保留第一个
                PLACEHOLDER_LOGIC.to_string()
            } else {
                has_correct = true;
                CORRECT_MARKER.to_string()
            };
        }

        options.push(QuestionOption { text, logic });
    }

    while options.len() < expected {
        options.push(QuestionOption::placeholder(options.len()));
    }

    if !has_correct {
        if let Some(first) = options.first_mut() {
            first.logic = CORRECT_MARKER.to_string();
        }
    }

    options
}

/// 校验一批候选题目，单题失败只记录日志
pub fn validate_candidates(candidates: &[RawCandidate], rules: &ValidationRules) -> ValidationOutcome {
    let mut questions = Vec::with_capacity(candidates.len());
    let mut skipped = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        match validate_candidate(candidate, rules, index) {
            Ok(question) => questions.push(question),
            Err(reason) => {
                warn!("⏭️ 跳过题目 {}: {}", index + 1, reason);
                skipped.push((index, reason));
            }
        }
    }

    ValidationOutcome {
        questions,
        parsed: candidates.len(),
        skipped,
    }
}

/// 按请求数量收尾：不足时报错，多出时截断
pub fn finalize(
    outcome: ValidationOutcome,
    requested: usize,
    raw_text: &str,
) -> Result<Vec<GeneratedQuestion>, ValidationError> {
    let validated = outcome.questions.len();
    if validated == 0 {
        return Err(ValidationError::NoValidQuestions);
    }

    if validated < requested {
        return Err(ValidationError::Shortfall {
            parsed: outcome.parsed,
            validated,
            requested,
            collapsed_to_one: validated == 1 && requested > 1,
            preview: truncate_text(raw_text, PREVIEW_CHARS),
        });
    }

    let mut questions = outcome.questions;
    if questions.len() > requested {
        debug!("截断多余题目: {} → {}", questions.len(), requested);
        questions.truncate(requested);
    }
    Ok(questions)
}

/// 模型给出的图片描述（足够长时才使用）
pub fn image_description(question: &GeneratedQuestion) -> Option<&str> {
    let description = question.image.trim();
    (description.chars().count() > MIN_IMAGE_DESCRIPTION_CHARS).then_some(description)
}

/// 为题目生成图片，失败时清空图片字段而不影响题目本身
pub async fn attach_image<G: ImageGenerator>(generator: &G, question: &mut GeneratedQuestion, index: usize) {
    let prompt = build_image_prompt(&question.question, image_description(question));

    match generator.generate(&prompt).await {
        Ok(Some(url)) => {
            debug!("题目 {} 图片生成成功", index + 1);
            question.image = url;
        }
        Ok(None) => {
            warn!("⚠️ 题目 {} 的图片接口未返回 URL", index + 1);
            question.image.clear();
        }
        Err(e) => {
            warn!("⚠️ 题目 {} 图片生成失败: {}", index + 1, e);
            question.image.clear();
        }
    }
}

/// 标量转文本；数组和对象不当作文本
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(scalar_text)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// 解析可能是分步数组，按空格拼接
fn solution_text(map: &Map<String, Value>) -> String {
    match map.get("solution") {
        Some(Value::Array(steps)) => steps
            .iter()
            .filter_map(scalar_text)
            .map(|step| step.trim().to_string())
            .filter(|step| !step.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        _ => text_field(map, "solution"),
    }
}
