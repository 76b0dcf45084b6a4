//! 页面导航目标

use std::fmt::Display;

use crate::models::SessionCtx;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// 测试说明页 /test/{testId}?sessionId=…
    Instructions { test_id: String, session_id: String },
    /// 答题页 /test/{testId}/question/{questionId}?sessionId=…
    Question {
        test_id: String,
        question_id: String,
        session_id: String,
    },
    /// 结果页 /test/{testId}/result?sessionId=…
    Result { test_id: String, session_id: String },
}

impl Route {
    pub fn instructions(ctx: &SessionCtx) -> Self {
        Route::Instructions {
            test_id: ctx.test_id.clone(),
            session_id: ctx.session_id.clone(),
        }
    }

    pub fn question(ctx: &SessionCtx, question_id: impl Into<String>) -> Self {
        Route::Question {
            test_id: ctx.test_id.clone(),
            question_id: question_id.into(),
            session_id: ctx.session_id.clone(),
        }
    }

    pub fn result(ctx: &SessionCtx) -> Self {
        Route::Result {
            test_id: ctx.test_id.clone(),
            session_id: ctx.session_id.clone(),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Instructions {
                test_id,
                session_id,
            } => format!("/test/{}?sessionId={}", test_id, session_id),
            Route::Question {
                test_id,
                question_id,
                session_id,
            } => format!(
                "/test/{}/question/{}?sessionId={}",
                test_id, question_id, session_id
            ),
            Route::Result {
                test_id,
                session_id,
            } => format!("/test/{}/result?sessionId={}", test_id, session_id),
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
