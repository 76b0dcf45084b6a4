//! 测试说明页加载器 - 流程层
//!
//! 进入说明页时获取测试元数据，并用冷启动查询判断该会话是否已经提交过。
//! 本模块不修改任何后端状态，只决定导航目标。

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::AssessmentBackend;
use crate::error::AppResult;
use crate::models::{NextStep, Route, SessionCtx, TestMetadata};

pub const TEST_LOAD_FAILED: &str = "Impossible de charger le test";
pub const TEST_START_FAILED: &str = "Impossible de démarrer le test";

/// 说明页的显示状态
#[derive(Debug, Clone)]
pub enum LoaderView {
    /// 入口缺少 sessionId
    MissingSession,
    /// 元数据获取失败，无重试
    Failed(String),
    Ready {
        ctx: SessionCtx,
        test: TestMetadata,
        /// 冷启动查询返回结果哨兵：显示"已提交"而不是开始按钮
        already_submitted: bool,
    },
}

/// 点击"开始"的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Navigate(Route),
    AlreadyCompleted,
}

pub struct SessionLoader {
    backend: Arc<dyn AssessmentBackend>,
}

impl SessionLoader {
    pub fn new(backend: Arc<dyn AssessmentBackend>) -> Self {
        Self { backend }
    }

    /// 加载说明页
    pub async fn load(&self, test_id: &str, session_id: Option<&str>) -> LoaderView {
        let ctx = match SessionCtx::from_entry(test_id, session_id) {
            Ok(ctx) => ctx,
            Err(_) => {
                warn!("⚠️ 入口缺少 sessionId (测试 {})", test_id);
                return LoaderView::MissingSession;
            }
        };

        let test = match self.backend.fetch_test(&ctx.test_id).await {
            Ok(test) => test,
            Err(e) if e.is_not_found() => {
                warn!("{} 测试不存在", ctx);
                return LoaderView::Failed(TEST_LOAD_FAILED.to_string());
            }
            Err(e) => {
                error!("{} 获取测试失败: {}", ctx, e);
                return LoaderView::Failed(TEST_LOAD_FAILED.to_string());
            }
        };
        info!("{} 📄 测试: {}", ctx, test.title);

        // 探测失败时按"未提交"处理
        let already_submitted = match self.backend.next_question(&ctx.session_id, None).await {
            Ok(step) => step.is_finished(),
            Err(e) => {
                warn!("{} 冷启动查询失败: {}", ctx, e);
                false
            }
        };
        if already_submitted {
            info!("{} ✓ 测试已提交", ctx);
        }

        LoaderView::Ready {
            ctx,
            test,
            already_submitted,
        }
    }

    /// 开始测试：重新发起冷启动查询并导航到第一道待答题目
    ///
    /// 查询失败是致命错误，由调用方以警告框形式展示 `TEST_START_FAILED`
    pub async fn start(&self, ctx: &SessionCtx) -> AppResult<StartOutcome> {
        let step = self
            .backend
            .next_question(&ctx.session_id, None)
            .await
            .map_err(|e| {
                error!("{} 无法获取第一道题: {}", ctx, e);
                e
            })?;

        Ok(match step {
            NextStep::Question(id) => {
                info!("{} ▶️ 开始答题，第一题 {}", ctx, id);
                StartOutcome::Navigate(Route::question(ctx, id))
            }
            NextStep::Finished => StartOutcome::AlreadyCompleted,
        })
    }
}
