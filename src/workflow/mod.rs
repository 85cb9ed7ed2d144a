pub mod generation_ctx;
pub mod question_flow;

pub use generation_ctx::GenerationCtx;
pub use question_flow::QuestionFlow;
