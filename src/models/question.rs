use serde::{Deserialize, Deserializer, Serialize};

use crate::models::de::{null_as_default, whole_number};

/// 后端表示"没有下一题"的哨兵值
pub const RESULT_SENTINEL: &str = "result";

/// 题目（GET /result/question/{questionId}?sessionId=…）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// 题干，可能内嵌数学公式标记
    #[serde(default, deserialize_with = "null_as_default")]
    pub instruction: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub question_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub possible_responses: Vec<PossibleResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_type: Option<String>,
    /// 本题限时（秒），浮点数取整
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<u32>,
}

/// 响应外层包装 `{ question: … }`
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionEnvelope {
    pub question: Question,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleResponse {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub possible_response: String,
}

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
    FreeText,
    Code,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        if self.question_type == "MCQ" {
            QuestionKind::MultipleChoice
        } else if self.text_type.as_deref() == Some("code") {
            QuestionKind::Code
        } else {
            QuestionKind::FreeText
        }
    }

    /// 限时，未配置时为 0
    pub fn time_allotment(&self) -> u32 {
        self.time.unwrap_or(0)
    }
}

/// 下一题查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// 还有题目要作答
    Question(String),
    /// 已无题目（"result"、null 或空字符串）
    Finished,
}

impl NextStep {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(id) if !id.is_empty() && id != RESULT_SENTINEL => NextStep::Question(id.to_string()),
            _ => NextStep::Finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, NextStep::Finished)
    }
}

/// GET /result/{sessionId}/nextQuestion 的响应体
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestionResponse {
    #[serde(default, deserialize_with = "deserialize_next_step")]
    pub next_question_id: Option<NextStep>,
}

impl NextQuestionResponse {
    pub fn step(&self) -> NextStep {
        self.next_question_id.clone().unwrap_or(NextStep::Finished)
    }
}

fn deserialize_next_step<'de, D>(deserializer: D) -> Result<Option<NextStep>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(Some(NextStep::from_raw(raw.as_deref())))
}
