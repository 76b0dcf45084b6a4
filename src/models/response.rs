use serde::{Deserialize, Serialize};

use crate::models::SessionCtx;

/// 候选人答案（POST /result/response）
///
/// 无论题型如何都是同一个扁平结构；选择题提交的是选项显示文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResponse {
    pub response: String,
    pub question_id: String,
    /// 即 sessionId
    pub test_result_id: String,
    pub test_id: String,
}

impl CandidateResponse {
    pub fn new(ctx: &SessionCtx, question_id: &str, response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            question_id: question_id.to_string(),
            test_result_id: ctx.session_id.clone(),
            test_id: ctx.test_id.clone(),
        }
    }
}
