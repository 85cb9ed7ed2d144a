use thiserror::Error;

use crate::clients::StopReason;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求参数错误（不会发起任何生成调用）
    #[error("Invalid request: {0}")]
    Input(#[from] InputError),
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// 文本生成调用失败
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// 无法从模型输出中恢复出结构化数据
    #[error("Response recovery failed: {0}")]
    Recovery(#[from] RecoveryError),
    /// 校验后题目数量不足
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// 文件操作错误
    #[error("File error: {0}")]
    File(#[from] FileError),
}

impl AppError {
    /// 对应的 HTTP 状态码，供外层接口映射使用
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Input(_) => 400,
            _ => 500,
        }
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: impl std::fmt::Display) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            message: source.to_string(),
        })
    }
}

/// 请求参数错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// 必填字段缺失或为空
    #[error("Missing required field: {0}")]
    MissingField(String),
    /// 数量字段无法解析或不是正整数
    #[error("Field {field} must be a positive integer, got '{value}'")]
    InvalidCount { field: String, value: String },
    /// 显式指定的选项数超出范围
    #[error("numOptions must be between 2 and 10, got {0}")]
    OptionCountOutOfRange(usize),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未设置 API Key 或仍是占位值
    #[error("Please set OPENAI_API_KEY in the environment or the .env file")]
    MissingApiKey,
}

/// 文本生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 构建请求失败
    #[error("Failed to build completion request for {model}: {message}")]
    RequestBuild { model: String, message: String },
    /// API 调用失败（网络、鉴权、模型不存在等）
    #[error("API call failed for {model}: {message}{}", format_hint(.hint))]
    ApiCallFailed {
        model: String,
        message: String,
        hint: Option<String>,
    },
    /// 返回结果中没有任何 choice
    #[error("{model} returned an empty response: no choices available")]
    NoChoices { model: String },
    /// 返回内容为空或只有空白
    #[error("{model} returned empty content.{}", describe_stop_reason(.stop_reason.as_ref()))]
    EmptyContent {
        model: String,
        stop_reason: Option<StopReason>,
    },
}

impl GenerationError {
    /// 根据底层错误信息构建 API 调用错误，模型不存在时附带提示
    pub fn api_call_failed(model: impl Into<String>, source: impl std::fmt::Display) -> Self {
        let model = model.into();
        let message = source.to_string();
        let lowered = message.to_lowercase();
        let hint = (lowered.contains("model") && lowered.contains("not found")).then(|| {
            format!(
                "Note: '{}' model may not be available. Try using 'gpt-4o' or 'gpt-4-turbo' instead.",
                model
            )
        });
        GenerationError::ApiCallFailed {
            model,
            message,
            hint,
        }
    }

    /// 完成原因（如果已知）
    pub fn stop_reason(&self) -> Option<&StopReason> {
        match self {
            GenerationError::EmptyContent { stop_reason, .. } => stop_reason.as_ref(),
            _ => None,
        }
    }
}

fn format_hint(hint: &Option<String>) -> String {
    hint.as_deref()
        .map(|h| format!("\n\n{}", h))
        .unwrap_or_default()
}

fn describe_stop_reason(reason: Option<&StopReason>) -> String {
    match reason {
        None => String::new(),
        Some(StopReason::Length) => " Finish reason: length. The response was truncated. \
             Try reducing the number of questions or increasing the token budget."
            .to_string(),
        Some(StopReason::ContentFilter) => {
            " Finish reason: content_filter. The content was filtered. Try adjusting the prompt."
                .to_string()
        }
        Some(StopReason::Stop) => " Finish reason: stop. The model stopped generating. \
             This may indicate a model issue or invalid prompt."
            .to_string(),
        Some(other) => format!(" Finish reason: {}", other),
    }
}

/// 响应恢复错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecoveryError {
    /// 原始输出为空
    #[error("model returned empty content after stripping whitespace")]
    EmptyInput,
    /// 去掉 markdown 代码块标记后内容为空
    #[error("content became empty after removing markdown code fences")]
    EmptyAfterCleanup,
    /// 所有恢复策略都失败
    #[error(
        "Failed to parse JSON array from response.\nLast error: {}\nResponse length: {length} characters\nResponse preview:\n{preview}",
        .last_error.as_deref().unwrap_or("none")
    )]
    Unrecoverable {
        length: usize,
        preview: String,
        last_error: Option<String>,
    },
}

/// 题目校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 没有任何题目通过校验
    #[error("No valid questions were generated. Please try again or check the base question format.")]
    NoValidQuestions,
    /// 通过校验的题目少于请求数量
    #[error(
        "{}\nParsed {parsed} questions from JSON\nValidated {validated} questions\nRequested {requested} questions\nResponse preview (first 1000 chars):\n{preview}",
        shortfall_headline(.validated, .requested)
    )]
    Shortfall {
        parsed: usize,
        validated: usize,
        requested: usize,
        collapsed_to_one: bool,
        preview: String,
    },
}

fn shortfall_headline(validated: &usize, requested: &usize) -> String {
    if *validated == 1 {
        format!("Only 1 question was generated instead of {}.", requested)
    } else {
        format!(
            "Only {} questions were generated instead of {}.",
            validated, requested
        )
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },
    /// 不支持的请求文件格式
    #[error("unsupported request file extension: {path}")]
    UnsupportedFormat { path: String },
    /// 请求文件解析失败
    #[error("failed to parse {path}: {message}")]
    ParseFailed { path: String, message: String },
}

/// 图片生成错误
///
/// 只在单题范围内记录日志，不会向上传播
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image endpoint returned status {status}: {body}")]
    BadStatus { status: u16, body: String },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
