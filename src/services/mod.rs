pub mod option_detector;
pub mod prompt_builder;
pub mod question_classifier;
pub mod question_validator;
pub mod response_recovery;

pub use option_detector::detect_option_count;
pub use prompt_builder::{build_prompts, PromptContext, PromptPair};
pub use question_classifier::{classify, Classification, ClassificationSource};
pub use question_validator::{
    attach_image, finalize, validate_candidate, validate_candidates, SkipReason, ValidationOutcome,
    ValidationRules,
};
pub use response_recovery::{recover_candidates, RawCandidate};
