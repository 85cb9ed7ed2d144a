use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// 未指定时使用的难度
pub const DEFAULT_DIFFICULTY: &str = "Medium";
/// 显式指定选项数时允许的范围
pub const OPTION_COUNT_RANGE: std::ops::RangeInclusive<usize> = 2..=10;

/// 一次副本题生成请求
///
/// 字段沿用前端的 camelCase 写法，同时接受 snake_case
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseQuestionRequest {
    #[serde(default, alias = "base_question")]
    pub base_question: String,
    /// 要生成的副本题数量（整数或数字字符串）
    #[serde(
        default,
        alias = "num_copy_questions",
        deserialize_with = "deserialize_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub num_copy_questions: Option<String>,
    #[serde(default)]
    pub model: String,
    /// 显式选项数；为空时从题干推断
    #[serde(
        default,
        alias = "num_options",
        deserialize_with = "deserialize_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub num_options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    /// 逗号分隔的图片 URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<String>,
    /// 前端上传的图片文件（内容不解析，只关心是否存在）
    #[serde(default, alias = "image_files", skip_serializing_if = "Vec::is_empty")]
    pub image_files: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<String>,
    /// 显式题目类型：mathematical / word-problems / image-based
    #[serde(default, alias = "question_type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
}

/// 校验后的数量参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCounts {
    pub num_questions: usize,
    /// `None` 表示需要从题干推断
    pub num_options: Option<usize>,
}

impl BaseQuestionRequest {
    pub fn new(base_question: impl Into<String>, num_copy_questions: usize, model: impl Into<String>) -> Self {
        Self {
            base_question: base_question.into(),
            num_copy_questions: Some(num_copy_questions.to_string()),
            model: model.into(),
            ..Default::default()
        }
    }

    /// 校验必填字段并解析数量参数
    pub fn validate(&self) -> Result<RequestCounts, InputError> {
        if self.base_question.trim().is_empty() {
            return Err(InputError::MissingField("baseQuestion".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(InputError::MissingField("model".to_string()));
        }

        let raw_count = non_blank(self.num_copy_questions.as_deref())
            .ok_or_else(|| InputError::MissingField("numCopyQuestions".to_string()))?;
        let num_questions = parse_count("numCopyQuestions", raw_count)?;
        if num_questions == 0 {
            return Err(InputError::InvalidCount {
                field: "numCopyQuestions".to_string(),
                value: raw_count.to_string(),
            });
        }

        // 选项数为空或 0 时视为未指定
        let num_options = match non_blank(self.num_options.as_deref()) {
            None => None,
            Some(raw) => match parse_count("numOptions", raw)? {
                0 => None,
                k if OPTION_COUNT_RANGE.contains(&k) => Some(k),
                k => return Err(InputError::OptionCountOutOfRange(k)),
            },
        };

        Ok(RequestCounts {
            num_questions,
            num_options,
        })
    }

    /// 题干附带的图片 URL 列表
    pub fn image_urls(&self) -> Vec<&str> {
        self.images
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .collect()
    }

    /// 题干是否带图（URL 或上传文件）
    pub fn has_images(&self) -> bool {
        !self.image_urls().is_empty() || !self.image_files.is_empty()
    }

    pub fn difficulty(&self) -> &str {
        non_blank(self.difficulty.as_deref()).unwrap_or(DEFAULT_DIFFICULTY)
    }

    pub fn notes(&self) -> Option<&str> {
        non_blank(self.notes.as_deref())
    }

    pub fn solution(&self) -> Option<&str> {
        non_blank(self.solution.as_deref())
    }

    pub fn grade(&self) -> Option<&str> {
        non_blank(self.grade.as_deref())
    }

    pub fn curriculum(&self) -> Option<&str> {
        non_blank(self.curriculum.as_deref())
    }

    pub fn question_type(&self) -> Option<&str> {
        non_blank(self.question_type.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_count(field: &str, raw: &str) -> Result<usize, InputError> {
    raw.parse::<usize>().map_err(|_| InputError::InvalidCount {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

// 数量字段既可能是整数也可能是字符串，统一保留原始文本，留到 validate 再解析
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a count")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            // 5.0 这类整数值的浮点数按整数处理
            if value.fract() == 0.0 && value >= 0.0 {
                Ok(Some(format!("{}", value as u64)))
            } else {
                Ok(Some(value.to_string()))
            }
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(CountVisitor)
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accept_integer_or_string() {
        let request: BaseQuestionRequest = serde_json::from_str(
            r#"{"baseQuestion": "What is 2+3? A) 4 B) 5 C) 6", "numCopyQuestions": "3", "model": "gpt-4o", "numOptions": 4}"#,
        )
        .unwrap();

        let counts = request.validate().unwrap();
        assert_eq!(counts.num_questions, 3);
        assert_eq!(counts.num_options, Some(4));
    }

    #[test]
    fn test_snake_case_aliases() {
        let request: BaseQuestionRequest = serde_json::from_str(
            r#"{"base_question": "Solve 7 x 8", "num_copy_questions": 2, "model": "gpt-4o", "question_type": "mathematical"}"#,
        )
        .unwrap();

        assert_eq!(request.validate().unwrap().num_questions, 2);
        assert_eq!(request.question_type(), Some("mathematical"));
    }

    #[test]
    fn test_missing_fields() {
        let request = BaseQuestionRequest::new("  ", 2, "gpt-4o");
        assert_eq!(
            request.validate(),
            Err(InputError::MissingField("baseQuestion".to_string()))
        );

        let request = BaseQuestionRequest::new("What is 3+4?", 2, "");
        assert_eq!(
            request.validate(),
            Err(InputError::MissingField("model".to_string()))
        );

        let mut request = BaseQuestionRequest::new("What is 3+4?", 2, "gpt-4o");
        request.num_copy_questions = None;
        assert_eq!(
            request.validate(),
            Err(InputError::MissingField("numCopyQuestions".to_string()))
        );
    }

    #[test]
    fn test_invalid_counts() {
        let mut request = BaseQuestionRequest::new("What is 3+4?", 2, "gpt-4o");
        request.num_copy_questions = Some("three".to_string());
        assert!(matches!(
            request.validate(),
            Err(InputError::InvalidCount { .. })
        ));

        request.num_copy_questions = Some("0".to_string());
        assert!(matches!(
            request.validate(),
            Err(InputError::InvalidCount { .. })
        ));
    }

    #[test]
    fn test_option_count_range() {
        let mut request = BaseQuestionRequest::new("What is 3+4?", 2, "gpt-4o");

        request.num_options = Some("12".to_string());
        assert_eq!(
            request.validate(),
            Err(InputError::OptionCountOutOfRange(12))
        );

        request.num_options = Some("1".to_string());
        assert_eq!(request.validate(), Err(InputError::OptionCountOutOfRange(1)));

        // 空值和 0 表示自动推断
        request.num_options = Some("".to_string());
        assert_eq!(request.validate().unwrap().num_options, None);
        request.num_options = Some("0".to_string());
        assert_eq!(request.validate().unwrap().num_options, None);
    }

    #[test]
    fn test_null_count_is_missing() {
        let request: BaseQuestionRequest = serde_json::from_str(
            r#"{"baseQuestion": "What is 3+4?", "numCopyQuestions": null, "model": "gpt-4o"}"#,
        )
        .unwrap();
        assert_eq!(
            request.validate(),
            Err(InputError::MissingField("numCopyQuestions".to_string()))
        );
    }

    #[test]
    fn test_image_urls_and_defaults() {
        let mut request = BaseQuestionRequest::new("What is 3+4?", 1, "gpt-4o");
        assert!(!request.has_images());
        assert_eq!(request.difficulty(), DEFAULT_DIFFICULTY);

        request.images = Some("https://a.example/1.png, ,https://a.example/2.png".to_string());
        assert_eq!(
            request.image_urls(),
            vec!["https://a.example/1.png", "https://a.example/2.png"]
        );
        assert!(request.has_images());

        request.images = None;
        request.image_files = vec![serde_json::json!({"name": "figure.png"})];
        assert!(request.has_images());
    }

    #[test]
    fn test_toml_request() {
        let request: BaseQuestionRequest = toml::from_str(
            r#"
baseQuestion = "Sarah bought 3 apples at the store."
numCopyQuestions = 4
model = "gpt-4o"
difficulty = "Hard"
"#,
        )
        .unwrap();

        assert_eq!(request.validate().unwrap().num_questions, 4);
        assert_eq!(request.difficulty(), "Hard");
    }
}
