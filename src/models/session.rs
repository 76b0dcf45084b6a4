//! 会话上下文
//!
//! 封装"我正在参加哪一场测试的哪一次会话"这一信息，
//! 由入口显式构建并传给加载器和题目流程

use std::fmt::Display;

use crate::error::SessionError;
use crate::infrastructure::TimerKey;

/// 当前会话上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCtx {
    /// 测试ID（路径参数）
    pub test_id: String,

    /// 会话ID（查询参数 sessionId，后端称 testResultId）
    pub session_id: String,
}

impl SessionCtx {
    pub fn new(test_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            session_id: session_id.into(),
        }
    }

    /// 从入口参数构建上下文，sessionId 缺失或为空时返回错误
    pub fn from_entry(
        test_id: impl Into<String>,
        session_id: Option<&str>,
    ) -> Result<Self, SessionError> {
        match session_id.map(str::trim) {
            Some(id) if !id.is_empty() => Ok(Self::new(test_id, id)),
            _ => Err(SessionError::MissingSession),
        }
    }

    /// 某道题的计时器存储键
    pub fn timer_key(&self, question_id: &str) -> TimerKey {
        TimerKey::new(&self.session_id, question_id)
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[测试 ID#{} 会话#{}]", self.test_id, self.session_id)
    }
}
