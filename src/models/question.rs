use serde::{Deserialize, Serialize};

/// 正确答案的标记
pub const CORRECT_MARKER: &str = "CA";
/// 占位干扰项的默认理由
pub const PLACEHOLDER_LOGIC: &str = "Plausible distractor";

/// 选项序号对应的字母（0 → A）
pub fn option_letter(index: usize) -> char {
    char::from(b'A' + (index % 26) as u8)
}

/// 单个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    /// 干扰项对应的学生错误；正确答案固定为 "CA"
    pub logic: String,
}

impl QuestionOption {
    /// 位于 `index` 位置的占位干扰项，如 "Option C"
    pub fn placeholder(index: usize) -> Self {
        Self {
            text: format!("Option {}", option_letter(index)),
            logic: PLACEHOLDER_LOGIC.to_string(),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.logic == CORRECT_MARKER
    }
}

/// 生成的副本题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<QuestionOption>,
    /// 图片 URL；未生成图片时可能是模型给出的图片描述或空字符串
    pub image: String,
    pub solution: String,
}

impl GeneratedQuestion {
    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_correct()).count()
    }

    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.is_correct())
    }
}

impl std::fmt::Display for GeneratedQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 截断题目内容以便显示（最多80个字符）
        let preview = if self.question.chars().count() > 80 {
            self.question.chars().take(80).collect::<String>() + "..."
        } else {
            self.question.clone()
        };
        write!(f, "{} [{} 个选项]", preview, self.options.len())
    }
}
