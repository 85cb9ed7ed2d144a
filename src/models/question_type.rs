use serde::{Deserialize, Serialize};

/// 题目类型，决定使用哪套提示词
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 纯计算题：只改数字
    Mathematical,
    /// 应用题：改情境、人物、物品和数字
    WordProblem,
    /// 图表题
    ImageBased,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Mathematical => "mathematical",
            QuestionType::WordProblem => "word_problem",
            QuestionType::ImageBased => "image_based",
        }
    }

    /// 解析调用方显式指定的类型（URL 参数写法和下划线写法都接受）
    pub fn from_override(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mathematical" => Some(QuestionType::Mathematical),
            "word-problems" | "word_problems" | "word_problem" | "word-problem" => {
                Some(QuestionType::WordProblem)
            }
            "image-based" | "image_based" => Some(QuestionType::ImageBased),
            _ => None,
        }
    }

    /// 是否使用完整（冗长）提示词
    pub fn is_verbose(self) -> bool {
        !matches!(self, QuestionType::Mathematical)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
