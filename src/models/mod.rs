pub(crate) mod de;
pub mod question;
pub mod response;
pub mod route;
pub mod session;

pub use question::{
    NextQuestionResponse, NextStep, PossibleResponse, Question, QuestionEnvelope, QuestionKind,
};
pub use response::CandidateResponse;
pub use route::Route;
pub use session::SessionCtx;
pub use test::{TestCategory, TestMetadata};
