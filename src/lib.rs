//! # Copy Questions
//!
//! 根据一道原题生成 N 道结构相同、数字或情境不同的选择题副本
//!
//! ## 架构设计
//!
//! 本系统采用三层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 只暴露外部能力，不做解析
//! - `LlmClient` - 文本生成能力（OpenAI 兼容接口）
//! - `ImageClient` - 图片生成能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 纯函数为主，不持有任何资源
//! - `option_detector` - 从题干推断选项数
//! - `question_classifier` - 判断题目类型
//! - `prompt_builder` - 构建提示词
//! - `response_recovery` - 从模型输出中恢复 JSON
//! - `question_validator` - 逐题校验、补齐选项、按题数收尾
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次生成请求"的完整处理流程
//! - `GenerationCtx` - 上下文封装（题数 + 选项数 + 类型）
//! - `QuestionFlow` - 流程编排（prompt → LLM → recover → validate → image）
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, OptionStrictness};
pub use error::{AppError, AppResult};
pub use models::{load_all_requests, load_request, BaseQuestionRequest, GeneratedQuestion};
pub use workflow::{GenerationCtx, QuestionFlow};
