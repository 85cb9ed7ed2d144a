//! 副本题生成流程 - 流程层
//!
//! 核心职责：定义"一次生成请求"的完整处理流程
//!
//! 流程顺序：
//! 1. 校验请求 → 推断选项数 → 判断题目类型
//! 2. 构建提示词 → 调用 LLM
//! 3. 恢复 JSON → 逐题校验 → 按题数收尾
//! 4. 原题带图时为每道题生成图片（失败不影响题目）

use tracing::info;

use crate::clients::{
    token_budget, CompletionRequest, ImageClient, ImageGenerator, LlmClient, TextCompletion,
};
use crate::config::{Config, OptionStrictness};
use crate::error::AppResult;
use crate::models::{BaseQuestionRequest, Curriculum, GeneratedQuestion};
use crate::services::{
    attach_image, build_prompts, finalize, recover_candidates, validate_candidates,
    PromptContext, ValidationRules,
};
use crate::utils::logging::{log_generation_stats, log_request_start};
use crate::workflow::generation_ctx::GenerationCtx;

/// 副本题生成流程
///
/// - 编排完整的生成流程
/// - 只依赖能力（文本生成、图片生成），不关心具体实现
/// - 不保存任何请求间状态，可以并发处理多个请求
pub struct QuestionFlow<C, I> {
    completion: C,
    images: I,
    curriculum: Curriculum,
    strictness: OptionStrictness,
}

impl QuestionFlow<LlmClient, ImageClient> {
    /// 根据配置创建使用真实接口的流程
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let completion = LlmClient::new(config)?;
        let images = ImageClient::new(config)?;
        let curriculum = Curriculum::load(config.curriculum_file.as_deref()).await;

        Ok(Self::new(completion, images, curriculum).with_strictness(config.option_strictness))
    }
}

impl<C: TextCompletion, I: ImageGenerator> QuestionFlow<C, I> {
    /// 创建新的生成流程
    pub fn new(completion: C, images: I, curriculum: Curriculum) -> Self {
        Self {
            completion,
            images,
            curriculum,
            strictness: OptionStrictness::default(),
        }
    }

    pub fn with_strictness(mut self, strictness: OptionStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// 处理一次生成请求，成功时恰好返回请求的题数
    pub async fn run(&self, request: &BaseQuestionRequest) -> AppResult<Vec<GeneratedQuestion>> {
        let ctx = GenerationCtx::resolve(request)?;
        log_request_start(&ctx, &request.base_question);

        // ========== 构建提示词 ==========
        let subskills = match (request.grade(), request.curriculum()) {
            (Some(grade), Some(curriculum)) => self.curriculum.subskills(grade, curriculum),
            _ => Vec::new(),
        };
        let image_urls = request.image_urls();
        let prompts = build_prompts(&PromptContext {
            base_question: &request.base_question,
            notes: request.notes(),
            solution: request.solution(),
            image_urls: &image_urls,
            has_image_files: !request.image_files.is_empty(),
            num_options: ctx.num_options,
            num_questions: ctx.num_questions,
            difficulty: request.difficulty(),
            grade: request.grade(),
            curriculum: request.curriculum(),
            question_type: ctx.question_type,
            subskills: &subskills,
            should_generate_images: ctx.should_generate_images,
        });

        // ========== 调用 LLM ==========
        let max_tokens = token_budget(ctx.num_options, ctx.num_questions);
        info!(
            "🤖 {} 调用模型生成，token 预算: {}",
            ctx, max_tokens
        );
        let completion = self
            .completion
            .complete(&CompletionRequest {
                model: &ctx.model,
                system: &prompts.system,
                user: &prompts.user,
                max_tokens,
            })
            .await?;
        let raw_text = completion.into_text(&ctx.model)?;
        info!("✓ 收到模型响应，长度 {} 字符", raw_text.chars().count());

        // ========== 恢复与校验 ==========
        let candidates = recover_candidates(&raw_text)?;
        let rules = ValidationRules {
            num_options: ctx.num_options,
            strictness: self.strictness,
        };
        let outcome = validate_candidates(&candidates, &rules);
        log_generation_stats(outcome.parsed, outcome.questions.len(), ctx.num_questions);
        let mut questions = finalize(outcome, ctx.num_questions, &raw_text)?;

        // ========== 图片生成 ==========
        if ctx.should_generate_images {
            info!("🖼️ 原题带图，为 {} 道题生成图片", questions.len());
            for (index, question) in questions.iter_mut().enumerate() {
                attach_image(&self.images, question, index).await;
            }
        }

        info!("✅ {} 生成完成，共 {} 道题", ctx, questions.len());
        Ok(questions)
    }
}
