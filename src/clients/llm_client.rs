//! LLM 客户端 - 基础设施层
//!
//! 只负责"调用文本生成接口"能力：发送 system/user 消息，返回原始文本和完成原因。
//! 不做任何解析，也不做重试。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（通过 `OPENAI_API_BASE` 指定端点）

use std::fmt;
use std::future::Future;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ConfigError, GenerationError};

/// 单题最少 token 数
const MIN_TOKENS_PER_QUESTION: usize = 500;
/// 每个选项预估 token 数
const TOKENS_PER_OPTION: usize = 400;
/// 总预算下限
const MIN_TOTAL_TOKENS: usize = 1500;
/// 总预算上限（多题时再上浮 20%）
const MAX_TOTAL_TOKENS: usize = 8000;
/// 推理类模型的最小 max_completion_tokens
const MIN_COMPLETION_TOKENS: u32 = 100;
/// 非推理类模型的采样温度
const TEMPERATURE: f32 = 0.7;

/// 计算一次生成请求的 token 预算
///
/// 单题预算 = max(500, 400 × 选项数)；总预算 = min(8000, max(1500, 单题预算 × 题数))；
/// 多于一题时再上浮 20%，降低截断风险。
pub fn token_budget(num_options: usize, num_questions: usize) -> u32 {
    let per_question = MIN_TOKENS_PER_QUESTION.max(TOKENS_PER_OPTION * num_options);
    let mut total = MIN_TOTAL_TOKENS
        .max(per_question.saturating_mul(num_questions))
        .min(MAX_TOTAL_TOKENS);
    if num_questions > 1 {
        total = total * 6 / 5;
    }
    total as u32
}

/// 是否是使用 `max_completion_tokens` 参数的推理类模型
pub fn uses_completion_tokens(model: &str) -> bool {
    let model = model.trim().to_lowercase();
    ["gpt-5", "o1", "o3", "o4"]
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// 生成结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Other(String),
}

impl StopReason {
    /// 从接口返回的字符串解析（如 "length"、"content_filter"）
    pub fn from_wire(value: &str) -> Self {
        match value {
            "stop" => StopReason::Stop,
            "length" => StopReason::Length,
            "content_filter" => StopReason::ContentFilter,
            "tool_calls" => StopReason::ToolCalls,
            other => StopReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Stop => write!(f, "stop"),
            StopReason::Length => write!(f, "length"),
            StopReason::ContentFilter => write!(f, "content_filter"),
            StopReason::ToolCalls => write!(f, "tool_calls"),
            StopReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// 一次文本生成请求
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
}

/// 文本生成结果（原始输出 + 完成原因）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: Option<String>,
    pub stop_reason: Option<StopReason>,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: Some(StopReason::Stop),
        }
    }

    /// 取出非空文本，空内容时根据完成原因给出说明
    pub fn into_text(self, model: &str) -> Result<String, GenerationError> {
        match self.content.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(GenerationError::EmptyContent {
                model: model.to_string(),
                stop_reason: self.stop_reason,
            }),
        }
    }
}

/// 文本生成能力
pub trait TextCompletion: Send + Sync {
    fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> impl Future<Output = Result<Completion, GenerationError>> + Send;
}

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key()?)
            .with_api_base(&config.llm_api_base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
        })
    }
}

impl TextCompletion for LlmClient {
    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Completion, GenerationError> {
        let model = request.model;
        let build_failed = |e: OpenAIError| GenerationError::RequestBuild {
            model: model.to_string(),
            message: e.to_string(),
        };

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system)
            .build()
            .map_err(build_failed)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user)
            .build()
            .map_err(build_failed)?;
        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(model).messages(messages);
        if uses_completion_tokens(model) {
            builder.max_completion_tokens(request.max_tokens.max(MIN_COMPLETION_TOKENS));
        } else {
            builder.max_tokens(request.max_tokens).temperature(TEMPERATURE);
        }
        let chat_request = builder.build().map_err(build_failed)?;

        debug!(
            "调用 LLM API，模型: {}，token 预算: {}，提示词长度: {} 字符",
            model,
            request.max_tokens,
            request.user.len()
        );

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            GenerationError::api_call_failed(model, e)
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::NoChoices {
                model: model.to_string(),
            })?;

        let stop_reason = choice
            .finish_reason
            .as_ref()
            .and_then(|reason| serde_json::to_value(reason).ok())
            .and_then(|value| value.as_str().map(StopReason::from_wire));

        debug!(
            "LLM API 调用成功，完成原因: {}",
            stop_reason
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "N/A".to_string())
        );

        Ok(Completion {
            content: choice.message.content,
            stop_reason,
        })
    }
}
