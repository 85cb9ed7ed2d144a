//! 生成上下文
//!
//! 封装"这次请求要生成什么"：题数、选项数、题目类型、是否生成图片

use std::fmt::Display;

use crate::error::InputError;
use crate::models::{BaseQuestionRequest, QuestionType};
use crate::services::{classify, detect_option_count, ClassificationSource};

/// 生成上下文
///
/// 由请求解析得到，整个流程中只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationCtx {
    pub model: String,

    /// 要生成的题数 N
    pub num_questions: usize,

    /// 每题选项数 K
    pub num_options: usize,

    /// K 是否从题干推断得到
    pub options_inferred: bool,

    pub question_type: QuestionType,

    /// 题目类型的判定依据
    pub classification: ClassificationSource,

    /// 原题带图时为副本题生成图片
    pub should_generate_images: bool,
}

impl GenerationCtx {
    /// 校验请求并解析生成参数
    pub fn resolve(request: &BaseQuestionRequest) -> Result<Self, InputError> {
        let counts = request.validate()?;

        let (num_options, options_inferred) = match counts.num_options {
            Some(k) => (k, false),
            None => (detect_option_count(&request.base_question), true),
        };

        let classification = classify(
            &request.base_question,
            request.notes(),
            request.question_type(),
        );

        Ok(Self {
            model: request.model.trim().to_string(),
            num_questions: counts.num_questions,
            num_options,
            options_inferred,
            question_type: classification.question_type,
            classification: classification.source,
            should_generate_images: request.has_images(),
        })
    }
}

impl Display for GenerationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[模型 {} 题数#{} 选项数#{}{} 类型#{}]",
            self.model,
            self.num_questions,
            self.num_options,
            if self.options_inferred { "(推断)" } else { "" },
            self.question_type
        )
    }
}
