//! 响应恢复
//!
//! 模型输出经常不是干净的 JSON 数组：带代码块标记、前后有说明文字、
//! 包了一层 `{"questions": [...]}`、只返回单个对象、或者多了尾逗号。
//! 这里按固定顺序尝试一组提取策略，第一个得到合法结构的策略胜出。
//!
//! 本模块只做文本到候选题目的转换，不做任何字段校验。

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::RecoveryError;
use crate::utils::truncate_text;

/// 未经校验的候选题目
pub type RawCandidate = Value;

/// 错误信息中保留的原文长度
const PREVIEW_CHARS: usize = 1000;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+\-]*\s*").expect("valid fence pattern"));
static ARRAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*\]").expect("valid array pattern"));
static OBJECT_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{[\s\S]*"question"[\s\S]*?\}"#).expect("valid object pattern")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma pattern"));

/// 解析出的 JSON 结构
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedShape {
    /// `[...]`
    List(Vec<Value>),
    /// `{"questions": [...]}`
    WrappedList(Vec<Value>),
    /// 带 `question` 字段的单个对象
    SingleObject(Map<String, Value>),
    /// 其他结构，附带描述
    Unrecognized(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeKind {
    List,
    WrappedList,
    SingleObject,
}

impl ParsedShape {
    /// 判断结构；`questions` 列表优先于 `question` 字段
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => ParsedShape::List(items),
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.get_mut("questions") {
                    return ParsedShape::WrappedList(std::mem::take(items));
                }
                if map.contains_key("question") {
                    ParsedShape::SingleObject(map)
                } else {
                    ParsedShape::Unrecognized("an object without a 'questions' list or 'question' field")
                }
            }
            Value::String(_) => ParsedShape::Unrecognized("a string"),
            Value::Number(_) => ParsedShape::Unrecognized("a number"),
            Value::Bool(_) => ParsedShape::Unrecognized("a boolean"),
            Value::Null => ParsedShape::Unrecognized("null"),
        }
    }

    fn kind(&self) -> Option<ShapeKind> {
        match self {
            ParsedShape::List(_) => Some(ShapeKind::List),
            ParsedShape::WrappedList(_) => Some(ShapeKind::WrappedList),
            ParsedShape::SingleObject(_) => Some(ShapeKind::SingleObject),
            ParsedShape::Unrecognized(_) => None,
        }
    }

    /// 从片段中截取出的列表至少要有一个像题目的对象（空列表除外），
    /// 否则多半是截到了某道题的 options 数组；整段解析出的列表原样接受
    fn validate_structure(self, sliced: bool) -> Result<Vec<RawCandidate>, String> {
        match self {
            ParsedShape::List(items) | ParsedShape::WrappedList(items) => {
                if !sliced || items.is_empty() || items.iter().any(looks_like_question) {
                    Ok(items)
                } else {
                    Err("extracted list contains no question objects".to_string())
                }
            }
            ParsedShape::SingleObject(map) => Ok(vec![Value::Object(map)]),
            ParsedShape::Unrecognized(what) => Err(format!("extracted JSON is {}", what)),
        }
    }
}

fn looks_like_question(item: &Value) -> bool {
    item.as_object()
        .is_some_and(|map| map.contains_key("question"))
}

/// 单个策略的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Recovered(Vec<RawCandidate>),
    /// 文本中没有该策略要找的片段
    NoMatch,
    /// 找到了片段但解析失败
    Failed(String),
}

impl Attempt {
    fn is_recovered(&self) -> bool {
        matches!(self, Attempt::Recovered(_))
    }
}

/// 一个提取策略
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&str) -> Attempt,
}

/// 按顺序尝试的提取策略
pub const STRATEGIES: [Strategy; 5] = [
    Strategy {
        name: "direct_parse",
        run: direct_parse,
    },
    Strategy {
        name: "array_span",
        run: array_span,
    },
    Strategy {
        name: "object_span",
        run: object_span,
    },
    Strategy {
        name: "bracket_boundary",
        run: bracket_boundary,
    },
    Strategy {
        name: "trailing_comma_repair",
        run: trailing_comma_repair,
    },
];

/// 去掉所有代码块标记（```json、```）并去除首尾空白
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// 从模型原始输出中恢复候选题目
pub fn recover_candidates(raw: &str) -> Result<Vec<RawCandidate>, RecoveryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RecoveryError::EmptyInput);
    }

    let cleaned = strip_code_fences(trimmed);
    if cleaned.is_empty() {
        return Err(RecoveryError::EmptyAfterCleanup);
    }

    let mut last_error = None;
    for strategy in STRATEGIES.iter() {
        match (strategy.run)(&cleaned) {
            Attempt::Recovered(candidates) => {
                debug!(
                    "策略 {} 成功，恢复出 {} 个候选题目",
                    strategy.name,
                    candidates.len()
                );
                return Ok(candidates);
            }
            Attempt::Failed(message) => {
                debug!("策略 {} 失败: {}", strategy.name, message);
                last_error = Some(message);
            }
            Attempt::NoMatch => {}
        }
    }

    warn!("❌ 所有提取策略均失败，响应长度 {} 字符", trimmed.chars().count());
    Err(RecoveryError::Unrecoverable {
        length: trimmed.chars().count(),
        preview: truncate_text(trimmed, PREVIEW_CHARS),
        last_error,
    })
}

/// 解析截取出的片段
fn parse_span(span: &str, accepted: &[ShapeKind]) -> Attempt {
    parse_json(span, accepted, true)
}

fn parse_json(span: &str, accepted: &[ShapeKind], sliced: bool) -> Attempt {
    let value = match serde_json::from_str::<Value>(span.trim()) {
        Ok(value) => value,
        Err(e) => return Attempt::Failed(e.to_string()),
    };

    let shape = ParsedShape::classify(value);
    match shape.kind() {
        Some(kind) if !accepted.contains(&kind) => {
            Attempt::Failed(format!("unexpected {:?} at this stage", kind))
        }
        _ => match shape.validate_structure(sliced) {
            Ok(candidates) => Attempt::Recovered(candidates),
            Err(message) => Attempt::Failed(message),
        },
    }
}

/// 第一个 `open` 到最后一个 `close` 之间的片段（含两端）
fn span_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// 整段直接解析
fn direct_parse(text: &str) -> Attempt {
    parse_json(
        text,
        &[ShapeKind::List, ShapeKind::WrappedList, ShapeKind::SingleObject],
        false,
    )
}

/// 截取第一个 `[` 到最后一个 `]`
fn array_span(text: &str) -> Attempt {
    match ARRAY_SPAN.find(text) {
        Some(m) => parse_span(m.as_str(), &[ShapeKind::List]),
        None => Attempt::NoMatch,
    }
}

/// 截取包含 "question" 的对象
fn object_span(text: &str) -> Attempt {
    match OBJECT_SPAN.find(text) {
        Some(m) => parse_span(m.as_str(), &[ShapeKind::SingleObject]),
        None => Attempt::NoMatch,
    }
}

/// 先按方括号边界截取，失败再按花括号边界截取
fn bracket_boundary(text: &str) -> Attempt {
    let from_brackets = span_between(text, '[', ']')
        .map(|span| parse_span(span, &[ShapeKind::List, ShapeKind::WrappedList]))
        .unwrap_or(Attempt::NoMatch);
    if from_brackets.is_recovered() {
        return from_brackets;
    }

    let from_braces = span_between(text, '{', '}')
        .map(|span| parse_span(span, &[ShapeKind::WrappedList, ShapeKind::SingleObject]))
        .unwrap_or(Attempt::NoMatch);

    prefer_recovered(from_brackets, from_braces)
}

/// 去掉 `}`、`]` 前的多余逗号，再重试数组和对象截取
fn trailing_comma_repair(text: &str) -> Attempt {
    let repaired = TRAILING_COMMA.replace_all(text, "$1");
    if repaired == text {
        return Attempt::NoMatch;
    }

    let from_array = array_span(&repaired);
    if from_array.is_recovered() {
        return from_array;
    }
    prefer_recovered(from_array, object_span(&repaired))
}

/// 后一次尝试成功则取后者，否则保留先出现的失败信息
fn prefer_recovered(first: Attempt, second: Attempt) -> Attempt {
    match (first, second) {
        (_, Attempt::Recovered(candidates)) => Attempt::Recovered(candidates),
        (Attempt::Failed(message), _) => Attempt::Failed(message),
        (_, second) => second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TWO_QUESTIONS: &str = r#"[{"question": "What is 3+4?", "options": [{"text": "7", "logic": "CA"}]}, {"question": "What is 5+2?", "options": [{"text": "7", "logic": "CA"}]}]"#;

    #[test]
    fn test_clean_array() {
        let candidates = recover_candidates(TWO_QUESTIONS).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1]["question"], "What is 5+2?");
    }

    #[test]
    fn test_fenced_matches_unfenced() {
        let fenced = format!("```json\n{}\n```", TWO_QUESTIONS);
        assert_eq!(
            recover_candidates(&fenced).unwrap(),
            recover_candidates(TWO_QUESTIONS).unwrap()
        );

        let bare_fence = format!("```\n{}\n```", TWO_QUESTIONS);
        assert_eq!(recover_candidates(&bare_fence).unwrap().len(), 2);
    }

    #[test]
    fn test_prose_around_array() {
        let text = format!(
            "Here are the questions:\n{}\nLet me know if you need more.",
            TWO_QUESTIONS
        );
        assert_eq!(recover_candidates(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_wrapped_list() {
        let text = format!(r#"{{"questions": {}}}"#, TWO_QUESTIONS);
        assert_eq!(recover_candidates(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_wrapped_list_with_prose() {
        let text = format!(r#"Sure! {{"questions": {}}} Enjoy."#, TWO_QUESTIONS);
        assert_eq!(recover_candidates(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_single_object() {
        let text = r#"{"question": "What is 3+4?", "options": [{"text": "7", "logic": "CA"}], "image": "", "solution": "7"}"#;
        let candidates = recover_candidates(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0]["solution"], "7");
    }

    #[test]
    fn test_single_object_with_prose_is_not_mistaken_for_options() {
        let text = r#"Sure! {"question": "What is 3+4?", "options": [{"text": "7", "logic": "CA"}, {"text": "1", "logic": "Subtracted"}]} Done."#;
        let candidates = recover_candidates(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0]["question"], "What is 3+4?");
    }

    #[test]
    fn test_trailing_commas() {
        let text = r#"[{"question": "What is 3+4?", "options": [{"text": "7", "logic": "CA"},],},]"#;
        let candidates = recover_candidates(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0]["options"], json!([{"text": "7", "logic": "CA"}]));
    }

    #[test]
    fn test_trailing_comma_after_last_question() {
        let text = format!("{}, ]", TWO_QUESTIONS.trim_end_matches(']'));
        assert_eq!(recover_candidates(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_clean_array_without_question_keys_is_recovered() {
        let text = r#"[{"prompt": "What is 3+4?", "options": []}, {"prompt": "What is 5+2?", "options": []}]"#;
        let candidates = recover_candidates(text).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0]["prompt"], "What is 3+4?");
    }

    #[test]
    fn test_sliced_options_array_is_not_a_question_list() {
        let sliced = r#"[{"text": "7", "logic": "CA"}, {"text": "1", "logic": "Subtracted"}]"#;
        assert!(matches!(
            parse_span(sliced, &[ShapeKind::List]),
            Attempt::Failed(_)
        ));
    }

    #[test]
    fn test_empty_array_is_recovered() {
        assert_eq!(recover_candidates("[]").unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(recover_candidates("   \n"), Err(RecoveryError::EmptyInput));
        assert_eq!(
            recover_candidates("```json\n```"),
            Err(RecoveryError::EmptyAfterCleanup)
        );
    }

    #[test]
    fn test_unrecoverable_keeps_preview_and_error() {
        let text = format!("I cannot help with that. {}", "x".repeat(1200));
        match recover_candidates(&text) {
            Err(RecoveryError::Unrecoverable {
                length,
                preview,
                last_error,
            }) => {
                assert_eq!(length, text.chars().count());
                assert!(preview.ends_with("..."));
                assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
                assert!(last_error.is_some());
            }
            other => panic!("expected unrecoverable, got {:?}", other),
        }
    }

    #[test]
    fn test_object_without_question_fields() {
        assert!(matches!(
            recover_candidates(r#"{"foo": 1}"#),
            Err(RecoveryError::Unrecoverable { .. })
        ));
    }

    #[test]
    fn test_recovery_is_idempotent() {
        let text = format!("```json\n{}\n```\nThanks!", TWO_QUESTIONS);
        assert_eq!(recover_candidates(&text), recover_candidates(&text));
    }

    #[test]
    fn test_shape_prefers_questions_list() {
        let value = json!({"question": "ignored", "questions": [{"question": "a"}]});
        assert!(matches!(
            ParsedShape::classify(value),
            ParsedShape::WrappedList(items) if items.len() == 1
        ));
    }
}
