//! 单题答题流程 - 流程层
//!
//! 核心职责：一次只显示一道题，收集答案、提交、再决定下一步
//!
//! 状态流转：
//! 1. Loading → Ready（题目获取成功）
//! 2. Loading → Redirecting（题目获取失败，但已知下一题或已知是最后一题）
//! 3. Loading → Failed（题目获取失败且没有任何恢复信息）
//! 4. Ready → Submitting → Advanced / Finished
//!
//! 下一题探测与题目获取并行发出，探测慢或失败不会阻塞 Ready。
//! 超时自动提交与手动提交走同一条路径。

use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clients::AssessmentBackend;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, SessionError};
use crate::infrastructure::TimerStore;
use crate::models::{CandidateResponse, NextStep, Question, QuestionKind, Route, SessionCtx};
use crate::services::{
    render_instruction, CodeLanguage, Countdown, HtmlMathRenderer, LanguageSelection,
    MathRenderer, TickOutcome,
};
use crate::utils::truncate_text;

pub const QUESTION_LOAD_FAILED: &str = "Impossible de charger la question";
pub const NEXT_LABEL: &str = "Question suivante";
pub const FINISH_LABEL: &str = "Terminer le test";

/// 答题流程状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Loading,
    Ready,
    Submitting,
    /// 题目加载失败后的自动跳转
    Redirecting(Route),
    /// 已提交，前往下一题
    Advanced(Route),
    /// 已提交最后一题，前往结果页
    Finished(Route),
    /// 无法恢复的加载失败，只显示消息
    Failed(String),
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Loading => "Loading",
            FlowState::Ready => "Ready",
            FlowState::Submitting => "Submitting",
            FlowState::Redirecting(_) => "Redirecting",
            FlowState::Advanced(_) => "Advanced",
            FlowState::Finished(_) => "Finished",
            FlowState::Failed(_) => "Failed",
        }
    }

    /// 离开本题时的导航目标
    pub fn route(&self) -> Option<&Route> {
        match self {
            FlowState::Redirecting(route)
            | FlowState::Advanced(route)
            | FlowState::Finished(route) => Some(route),
            _ => None,
        }
    }
}

/// 答题流程依赖
///
/// 每道题创建一个 `QuestionFlow`，依赖在题目之间复用
#[derive(Clone)]
pub struct FlowDeps {
    pub backend: Arc<dyn AssessmentBackend>,
    pub timers: Arc<dyn TimerStore>,
    pub renderer: Arc<dyn MathRenderer>,
    pub default_language: CodeLanguage,
}

impl FlowDeps {
    pub fn new(
        backend: Arc<dyn AssessmentBackend>,
        timers: Arc<dyn TimerStore>,
        config: &Config,
    ) -> Self {
        let default_language =
            CodeLanguage::from_value(&config.default_code_language).unwrap_or_else(|e| {
                warn!("{}，使用 PHP", e);
                CodeLanguage::Php
            });
        Self {
            backend,
            timers,
            renderer: Arc::new(HtmlMathRenderer),
            default_language,
        }
    }
}

/// 单题答题流程
pub struct QuestionFlow {
    deps: FlowDeps,
    ctx: SessionCtx,
    question_id: String,
    state: FlowState,
    question: Option<Question>,
    rendered_instruction: String,
    response: String,
    language: Option<LanguageSelection>,
    countdown: Option<Countdown>,
    auto_submitted: bool,
    prefetch: Option<JoinHandle<Option<NextStep>>>,
    next_step: Option<NextStep>,
}

impl QuestionFlow {
    pub fn new(deps: FlowDeps, ctx: SessionCtx, question_id: impl Into<String>) -> Self {
        Self {
            deps,
            ctx,
            question_id: question_id.into(),
            state: FlowState::Loading,
            question: None,
            rendered_instruction: String::new(),
            response: String::new(),
            language: None,
            countdown: None,
            auto_submitted: false,
            prefetch: None,
            next_step: None,
        }
    }

    /// 加载题目
    ///
    /// 只有计时器存储读写失败会返回错误；网络失败都转换为状态
    pub async fn load(&mut self) -> AppResult<&FlowState> {
        self.state = FlowState::Loading;
        self.spawn_prefetch();

        match self
            .deps
            .backend
            .fetch_question(&self.question_id, &self.ctx.session_id)
            .await
        {
            Ok(question) => self.enter_ready(question)?,
            Err(e @ AppError::Api(ApiError::JsonParseFailed { .. })) => {
                error!("{} 题目 {} 内容无法解析: {}", self.ctx, self.question_id, e);
                self.state = self.recover().await;
            }
            Err(e) => {
                warn!("{} 题目 {} 加载失败: {}", self.ctx, self.question_id, e);
                self.state = self.recover().await;
            }
        }

        Ok(&self.state)
    }

    /// 在后台查询"当前题之后是哪一题"
    fn spawn_prefetch(&mut self) {
        let backend = self.deps.backend.clone();
        let session_id = self.ctx.session_id.clone();
        let question_id = self.question_id.clone();

        self.next_step = None;
        self.prefetch = Some(tokio::spawn(async move {
            match backend.next_question(&session_id, Some(&question_id)).await {
                Ok(step) => Some(step),
                Err(e) => {
                    debug!("下一题探测失败: {}", e);
                    None
                }
            }
        }));
    }

    fn enter_ready(&mut self, question: Question) -> AppResult<()> {
        let key = self.ctx.timer_key(&self.question_id);
        let countdown = Countdown::resume_or_start(
            self.deps.timers.clone(),
            key,
            question.time_allotment(),
        )?;

        self.rendered_instruction =
            render_instruction(&question.instruction, self.deps.renderer.as_ref());
        if question.kind() == QuestionKind::Code && self.language.is_none() {
            let selection =
                LanguageSelection::detect(&question.instruction, self.deps.default_language);
            debug!(
                "代码语言: {} (自动识别: {})",
                selection.selected().label(),
                selection.was_detected()
            );
            self.language = Some(selection);
        }

        info!(
            "{} 📝 题目 {} ({} 剩余) {}",
            self.ctx,
            self.question_id,
            countdown.display(),
            truncate_text(&question.instruction, 80)
        );

        self.countdown = Some(countdown);
        self.question = Some(question);
        self.state = FlowState::Ready;
        Ok(())
    }

    /// 题目加载失败后的自愈：优先跳到已知的下一题，其次结果页
    async fn recover(&mut self) -> FlowState {
        let step = self.await_prefetch().await.cloned();
        match step {
            Some(NextStep::Question(id)) => {
                info!("{} ↪️ 自动跳转到题目 {}", self.ctx, id);
                FlowState::Redirecting(Route::question(&self.ctx, id))
            }
            Some(NextStep::Finished) => {
                info!("{} ↪️ 已是最后一题，跳转到结果页", self.ctx);
                FlowState::Redirecting(Route::result(&self.ctx))
            }
            None => FlowState::Failed(QUESTION_LOAD_FAILED.to_string()),
        }
    }

    /// 等待下一题探测完成
    pub async fn await_prefetch(&mut self) -> Option<&NextStep> {
        if let Some(handle) = self.prefetch.take() {
            self.next_step = handle.await.ok().flatten();
        }
        self.next_step.as_ref()
    }

    /// 不等待地收取已完成的探测结果
    fn poll_prefetch(&mut self) {
        let finished = self
            .prefetch
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(mut handle) = self.prefetch.take() {
            match (&mut handle).now_or_never() {
                Some(result) => self.next_step = result.ok().flatten(),
                None => self.prefetch = Some(handle),
            }
        }
    }

    /// 探测已返回结果哨兵时为 true；探测未完成或失败时为 false
    pub fn is_last_question(&mut self) -> bool {
        self.poll_prefetch();
        matches!(self.next_step, Some(NextStep::Finished))
    }

    pub fn submit_label(&mut self) -> &'static str {
        if self.is_last_question() {
            FINISH_LABEL
        } else {
            NEXT_LABEL
        }
    }

    // ========== 答题输入 ==========

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.state == FlowState::Ready {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                expected: "Ready",
                actual: self.state.name().to_string(),
            })
        }
    }

    pub fn set_response(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_ready()?;
        self.response = text.into();
        Ok(())
    }

    /// 追加一行（文本题 / 代码题）
    pub fn append_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.ensure_ready()?;
        if !self.response.is_empty() {
            self.response.push('\n');
        }
        self.response.push_str(line);
        Ok(())
    }

    /// 选择题：保存所选选项的显示文本
    pub fn select_option(&mut self, index: usize) -> Result<&str, SessionError> {
        self.ensure_ready()?;
        let options = self
            .question
            .as_ref()
            .map(|q| q.possible_responses.as_slice())
            .unwrap_or_default();
        let option = options
            .get(index)
            .ok_or(SessionError::OptionOutOfRange {
                index,
                max_index: options.len().saturating_sub(1),
            })?;
        self.response = option.possible_response.clone();
        Ok(&self.response)
    }

    pub fn select_language(&mut self, lang: CodeLanguage) -> Result<(), SessionError> {
        self.ensure_ready()?;
        match self.language.as_mut() {
            Some(selection) => selection.override_with(lang),
            None => {
                return Err(SessionError::InvalidState {
                    expected: "code question",
                    actual: "non-code question".to_string(),
                })
            }
        }
        Ok(())
    }

    // ========== 计时与提交 ==========

    /// 每秒调用一次；到零时自动提交当前答案（可能为空）
    pub async fn tick(&mut self) -> AppResult<&FlowState> {
        if self.state != FlowState::Ready || self.auto_submitted {
            return Ok(&self.state);
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return Ok(&self.state);
        };

        let outcome = if countdown.is_expired() {
            countdown.clear()?;
            TickOutcome::Expired
        } else {
            countdown.tick()?
        };

        if outcome == TickOutcome::Expired {
            info!("{} ⏰ 题目 {} 时间到，自动提交", self.ctx, self.question_id);
            self.auto_submitted = true;
            return self.submit().await;
        }
        Ok(&self.state)
    }

    /// 提交当前答案并决定下一步
    ///
    /// 只在 Ready 状态生效；提交或后续查询失败时静默回到 Ready
    pub async fn submit(&mut self) -> AppResult<&FlowState> {
        if self.state != FlowState::Ready {
            debug!("忽略提交: 当前状态 {}", self.state.name());
            return Ok(&self.state);
        }

        if let Some(countdown) = self.countdown.as_mut() {
            countdown.clear()?;
        }
        self.state = FlowState::Submitting;

        let body = CandidateResponse::new(&self.ctx, &self.question_id, self.response.clone());
        match self.send(&body).await {
            Ok(NextStep::Finished) => {
                info!("{} 🏁 最后一题已提交", self.ctx);
                self.state = FlowState::Finished(Route::result(&self.ctx));
            }
            Ok(NextStep::Question(id)) => {
                info!("{} ✓ 题目 {} 已提交，下一题 {}", self.ctx, self.question_id, id);
                self.state = FlowState::Advanced(Route::question(&self.ctx, id));
            }
            Err(e) => {
                warn!(
                    "{} ⚠️ 题目 {} 提交失败（静默处理）: {}",
                    self.ctx, self.question_id, e
                );
                self.state = FlowState::Ready;
            }
        }
        Ok(&self.state)
    }

    async fn send(&self, body: &CandidateResponse) -> AppResult<NextStep> {
        self.deps.backend.submit_response(body).await?;
        self.deps
            .backend
            .next_question(&self.ctx.session_id, Some(&self.question_id))
            .await
    }

    // ========== 视图数据 ==========

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn ctx(&self) -> &SessionCtx {
        &self.ctx
    }

    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn rendered_instruction(&self) -> &str {
        &self.rendered_instruction
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn language(&self) -> Option<CodeLanguage> {
        self.language.map(|l| l.selected())
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.countdown.as_ref().map(Countdown::remaining)
    }

    pub fn remaining_display(&self) -> String {
        self.countdown
            .as_ref()
            .map(Countdown::display)
            .unwrap_or_else(|| "00:00".to_string())
    }
}
