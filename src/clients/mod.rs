pub mod image_client;
pub mod llm_client;

pub use image_client::{build_image_prompt, ImageClient, ImageGenerator};
pub use llm_client::{
    token_budget, Completion, CompletionRequest, LlmClient, StopReason, TextCompletion,
};
