pub mod curriculum;
pub mod loaders;
pub mod question;
pub mod question_type;
pub mod request;

pub use curriculum::{Curriculum, CurriculumTable};
pub use loaders::{load_all_requests, load_request};
pub use question::{GeneratedQuestion, QuestionOption, CORRECT_MARKER, PLACEHOLDER_LOGIC};
pub use question_type::QuestionType;
pub use request::{BaseQuestionRequest, RequestCounts};
