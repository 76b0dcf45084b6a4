#[cfg(test)]
pub(crate) mod fake_backend;
pub mod question_flow;
pub mod session_loader;

pub use question_flow::{FlowDeps, FlowState, QuestionFlow};
pub use session_loader::{LoaderView, SessionLoader, StartOutcome};
