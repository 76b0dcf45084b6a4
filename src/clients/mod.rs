pub mod assessment_client;

pub use assessment_client::{AssessmentBackend, AssessmentClient};
