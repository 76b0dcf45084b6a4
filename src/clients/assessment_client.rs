/// 测评后端客户端
///
/// 封装所有与 /result/* 接口相关的调用逻辑
use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::HttpExecutor;
use crate::models::{
    CandidateResponse, NextQuestionResponse, NextStep, Question, QuestionEnvelope, TestMetadata,
};

/// 测评后端能力
///
/// 题目流程只依赖这个 trait，测试中可替换为内存实现
#[async_trait]
pub trait AssessmentBackend: Send + Sync {
    /// 获取测试元数据
    async fn fetch_test(&self, test_id: &str) -> AppResult<TestMetadata>;

    /// 查询下一题；`current_question_id` 为 None 时返回第一题（冷启动查询）
    async fn next_question(
        &self,
        session_id: &str,
        current_question_id: Option<&str>,
    ) -> AppResult<NextStep>;

    /// 获取单道题目内容
    async fn fetch_question(&self, question_id: &str, session_id: &str) -> AppResult<Question>;

    /// 提交答案，成功时无返回内容
    async fn submit_response(&self, response: &CandidateResponse) -> AppResult<()>;
}

/// 基于 HTTP 的测评后端客户端
#[derive(Clone)]
pub struct AssessmentClient {
    executor: HttpExecutor,
}

impl AssessmentClient {
    /// 创建新的测评客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            executor: HttpExecutor::new(config)?,
        })
    }

    pub fn with_executor(executor: HttpExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl AssessmentBackend for AssessmentClient {
    async fn fetch_test(&self, test_id: &str) -> AppResult<TestMetadata> {
        self.executor
            .get_json(&["result", "test", test_id], &[])
            .await
    }

    async fn next_question(
        &self,
        session_id: &str,
        current_question_id: Option<&str>,
    ) -> AppResult<NextStep> {
        let segments = ["result", session_id, "nextQuestion"];
        let response: NextQuestionResponse = match current_question_id {
            Some(current) => {
                self.executor
                    .get_json(&segments, &[("currentQuestionId", current)])
                    .await?
            }
            None => self.executor.get_json(&segments, &[]).await?,
        };

        let step = response.step();
        debug!("下一题 (当前 {:?}): {:?}", current_question_id, step);
        Ok(step)
    }

    async fn fetch_question(&self, question_id: &str, session_id: &str) -> AppResult<Question> {
        let envelope: QuestionEnvelope = self
            .executor
            .get_json(&["result", "question", question_id], &[("sessionId", session_id)])
            .await?;
        Ok(envelope.question)
    }

    async fn submit_response(&self, response: &CandidateResponse) -> AppResult<()> {
        debug!(
            "提交答案 Payload: question={} len={}",
            response.question_id,
            response.response.len()
        );
        self.executor.post_json(&["result", "response"], response).await
    }
}
