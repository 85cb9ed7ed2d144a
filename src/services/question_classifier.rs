/// 题目类型识别
///
/// 优先使用调用方显式指定的类型；否则按题干中的情境关键词和 SME 备注判断。
use tracing::{debug, info};

use crate::models::QuestionType;

/// 出现任一关键词即视为应用题（子串匹配，不区分大小写）
pub const WORD_PROBLEM_KEYWORDS: [&str; 17] = [
    "bought", "sold", "store", "park", "school", "restaurant", "recipe", "shopping", "travel",
    "distance", "speed", "time", "age", "people", "students", "teacher", "class",
];

/// 备注中出现这些词时强制按应用题处理
const CONTEXT_NOTE_MARKERS: [&str; 2] = ["context", "real-life"];

/// 类型的判定依据（用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    /// 调用方显式指定
    Override,
    /// 命中题干关键词
    Keyword(&'static str),
    /// SME 备注要求情境化
    Notes,
    /// 无任何信号，按纯计算题处理
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub question_type: QuestionType,
    pub source: ClassificationSource,
}

/// 判断题目类型
pub fn classify(
    base_question: &str,
    notes: Option<&str>,
    override_type: Option<&str>,
) -> Classification {
    if let Some(raw) = override_type {
        match QuestionType::from_override(raw) {
            Some(question_type) => {
                info!("🏷️ 使用指定的题目类型: {}", question_type);
                return Classification {
                    question_type,
                    source: ClassificationSource::Override,
                };
            }
            None => debug!("无法识别的题目类型 '{}'，改为自动判断", raw),
        }
    }

    let question = base_question.to_lowercase();
    if let Some(keyword) = WORD_PROBLEM_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| question.contains(keyword))
    {
        debug!("题干包含关键词 '{}'，识别为应用题", keyword);
        return Classification {
            question_type: QuestionType::WordProblem,
            source: ClassificationSource::Keyword(keyword),
        };
    }

    let notes = notes.unwrap_or_default().to_lowercase();
    if CONTEXT_NOTE_MARKERS
        .iter()
        .any(|marker| notes.contains(marker))
    {
        debug!("SME 备注要求情境化，识别为应用题");
        return Classification {
            question_type: QuestionType::WordProblem,
            source: ClassificationSource::Notes,
        };
    }

    info!("🏷️ 未发现应用题特征，按纯计算题处理");
    Classification {
        question_type: QuestionType::Mathematical,
        source: ClassificationSource::Default,
    }
}
