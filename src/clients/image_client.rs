//! 图片生成客户端 - 基础设施层
//!
//! 调用 `POST {base}/images/generations`，只返回第一张图片的 URL。
//! 失败由调用方在单题范围内吞掉。

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{ConfigError, ImageError};

/// 根据题目生成图片提示词时保留的最大字符数
const QUESTION_PROMPT_CHARS: usize = 200;

/// 图片生成能力
pub trait ImageGenerator: Send + Sync {
    /// 返回生成图片的 URL；接口没有给出 URL 时返回 `None`
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Option<String>, ImageError>> + Send;
}

/// 构建图片生成提示词
///
/// 有图片描述时直接使用描述，否则截取题干前 200 个字符
pub fn build_image_prompt(question: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!(
            "Educational diagram or illustration for math problem: {}. \
             Clean, simple, professional style suitable for educational materials.",
            description
        ),
        None => {
            let question: String = question.chars().take(QUESTION_PROMPT_CHARS).collect();
            format!(
                "Educational diagram or illustration for this math problem: {}. \
                 Clean, simple, professional style suitable for educational materials, \
                 showing relevant numbers, shapes, or objects.",
                question
            )
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// 图片生成客户端
pub struct ImageClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    size: String,
    quality: String,
}

impl ImageClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: config.api_key()?.to_string(),
            endpoint: format!(
                "{}/images/generations",
                config.llm_api_base_url.trim_end_matches('/')
            ),
            model: config.image_model.clone(),
            size: config.image_size.clone(),
            quality: config.image_quality.clone(),
        })
    }
}

impl ImageGenerator for ImageClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ImageError> {
        debug!("调用图片生成 API，模型: {}", self.model);

        let body = ImageGenerationRequest {
            model: &self.model,
            prompt,
            size: &self.size,
            quality: &self.quality,
            n: 1,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ImageGenerationResponse = response.json().await?;
        Ok(parsed.data.into_iter().find_map(|image| image.url))
    }
}
