//! 单个会话驱动器 - 编排层
//!
//! ## 职责
//!
//! 按 `Route` 循环驱动一次完整测评：说明页 → 第 N 题 → … → 结果页。
//!
//! ## 核心功能
//!
//! 1. **说明页**：调用 `SessionLoader`，打印测试信息，等待回车开始
//! 2. **答题页**：每道题创建一个 `QuestionFlow`，用 `tokio::select!`
//!    同时等待输入行和每秒一次的计时 tick
//! 3. **导航**：根据流程状态给出的 `Route` 进入下一页
//!
//! 计时器 `Interval` 在进入题目时创建、离开题目时随作用域销毁，
//! 不会有上一题的 tick 落到下一题上。

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, SessionError};
use crate::models::{QuestionKind, Route, SessionCtx};
use crate::orchestrator::terminal_view::{
    countdown_line, instructions_screen, question_screen, ALREADY_SUBMITTED, TEST_COMPLETED,
};
use crate::services::CodeLanguage;
use crate::workflow::question_flow::{FINISH_LABEL, QUESTION_LOAD_FAILED};
use crate::workflow::session_loader::TEST_START_FAILED;
use crate::workflow::{FlowDeps, FlowState, LoaderView, QuestionFlow, SessionLoader, StartOutcome};

pub const INPUT_CLOSED: &str = "Entrée fermée, test non démarré";

const INPUT_NAME: &str = "<stdin>";
const OUTPUT_NAME: &str = "<stdout>";

/// 一次运行的结局
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// 到达结果页
    Completed { answered: usize },
    /// 会话此前已经提交
    AlreadyCompleted,
    /// 停在错误消息上
    Aborted(String),
}

enum Event {
    Tick,
    Line(Option<String>),
}

/// 会话驱动器
///
/// `R` 是输入（通常是 stdin），`W` 是输出（通常是 stdout）
pub struct SessionRunner<R, W> {
    loader: SessionLoader,
    deps: FlowDeps,
    input: Option<Lines<R>>,
    out: W,
    answered: usize,
}

impl<R, W> SessionRunner<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(deps: FlowDeps, input: R, out: W) -> Self {
        Self {
            loader: SessionLoader::new(deps.backend.clone()),
            deps,
            input: Some(input.lines()),
            out,
            answered: 0,
        }
    }

    /// 本次运行提交成功的题目数
    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// 从入口路由开始跑完整个会话
    pub async fn run(&mut self, test_id: &str, session_id: Option<&str>) -> AppResult<RunOutcome> {
        let ctx = match self.loader.load(test_id, session_id).await {
            LoaderView::MissingSession => {
                return self.abort(SessionError::MissingSession.to_string());
            }
            LoaderView::Failed(message) => return self.abort(message),
            LoaderView::Ready {
                ctx,
                test,
                already_submitted,
            } => {
                self.say(&instructions_screen(&test, already_submitted))?;
                if already_submitted {
                    return Ok(RunOutcome::AlreadyCompleted);
                }
                ctx
            }
        };

        if self.read_line().await?.is_none() {
            info!("{} 输入已关闭，未开始测试", ctx);
            return self.abort(INPUT_CLOSED.to_string());
        }

        let mut route = match self.loader.start(&ctx).await {
            Ok(StartOutcome::Navigate(route)) => route,
            Ok(StartOutcome::AlreadyCompleted) => {
                self.say(ALREADY_SUBMITTED)?;
                return Ok(RunOutcome::AlreadyCompleted);
            }
            Err(_) => return self.abort(TEST_START_FAILED.to_string()),
        };

        loop {
            debug!("{} 🧭 导航到 {}", ctx, route);
            route = match route {
                Route::Question { question_id, .. } => {
                    match self.run_question(&ctx, question_id).await? {
                        Some(next) => next,
                        None => {
                            return Ok(RunOutcome::Aborted(QUESTION_LOAD_FAILED.to_string()))
                        }
                    }
                }
                Route::Result { .. } => {
                    self.say(TEST_COMPLETED)?;
                    return Ok(RunOutcome::Completed {
                        answered: self.answered,
                    });
                }
                other @ Route::Instructions { .. } => {
                    warn!("{} 答题中不应回到说明页: {}", ctx, other);
                    return Ok(RunOutcome::Aborted(other.path()));
                }
            };
        }
    }

    /// 驱动一道题，返回离开本题后的导航目标；无法恢复时返回 `None`
    async fn run_question(
        &mut self,
        ctx: &SessionCtx,
        question_id: String,
    ) -> AppResult<Option<Route>> {
        let mut flow = QuestionFlow::new(self.deps.clone(), ctx.clone(), question_id);
        match flow.load().await?.clone() {
            FlowState::Ready => {}
            FlowState::Failed(message) => {
                self.say(&message)?;
                return Ok(None);
            }
            other => return Ok(other.route().cloned()),
        }
        let screen = question_screen(&mut flow);
        self.say(&screen)?;
        let mut last_announced = flow.is_last_question();

        // 恢复时已经为零：不等一秒，立即触发超时提交
        if flow.remaining_secs() == Some(0) {
            flow.tick().await?;
        }

        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if let Some(route) = flow.state().route() {
                if !matches!(flow.state(), FlowState::Redirecting(_)) {
                    self.answered += 1;
                }
                return Ok(Some(route.clone()));
            }

            let event = tokio::select! {
                _ = ticker.tick() => Event::Tick,
                line = next_line(&mut self.input), if self.input.is_some() => {
                    Event::Line(line.map_err(|e| AppError::file_read_failed(INPUT_NAME, e))?)
                }
            };

            match event {
                Event::Tick => {
                    flow.tick().await?;
                    if flow.state() == &FlowState::Ready {
                        if let Some(line) = flow.remaining_secs().and_then(countdown_line) {
                            self.say(&line)?;
                        }
                        // 探测结果晚到时更新按钮文字
                        if !last_announced && flow.is_last_question() {
                            last_announced = true;
                            self.say(&format!("[:submit] {}", FINISH_LABEL))?;
                        }
                    }
                }
                Event::Line(None) => {
                    info!("{} 输入已关闭，等待计时结束", ctx);
                    self.input = None;
                }
                Event::Line(Some(line)) => self.handle_input(&mut flow, &line).await?,
            }
        }
    }

    async fn handle_input(&mut self, flow: &mut QuestionFlow, line: &str) -> AppResult<()> {
        let command = line.trim();
        let feedback = match command {
            ":submit" => {
                flow.submit().await?;
                return Ok(());
            }
            ":clear" => flow.set_response("").map(|_| None),
            _ if command.starts_with(":lang") => {
                CodeLanguage::from_value(command.trim_start_matches(":lang"))
                    .and_then(|lang| {
                        flow.select_language(lang)?;
                        Ok(lang)
                    })
                    .map(|lang| Some(format!("Langage : {}", lang.label())))
            }
            _ => answer(flow, line),
        };

        match feedback {
            Ok(Some(message)) => self.say(&message),
            Ok(None) => Ok(()),
            Err(e) => {
                warn!("{} 输入被拒绝: {}", flow.ctx(), e);
                self.say(&format!("⚠️ {}", e))
            }
        }
    }

    async fn read_line(&mut self) -> AppResult<Option<String>> {
        let line = next_line(&mut self.input)
            .await
            .map_err(|e| AppError::file_read_failed(INPUT_NAME, e))?;
        if line.is_none() {
            self.input = None;
        }
        Ok(line)
    }

    fn abort(&mut self, message: String) -> AppResult<RunOutcome> {
        self.say(&message)?;
        Ok(RunOutcome::Aborted(message))
    }

    fn say(&mut self, text: &str) -> AppResult<()> {
        writeln!(self.out, "{}", text)
            .and_then(|_| self.out.flush())
            .map_err(|e| AppError::file_write_failed(OUTPUT_NAME, e))
    }
}

/// 选择题按编号选择，文本题和代码题逐行追加
fn answer(flow: &mut QuestionFlow, line: &str) -> Result<Option<String>, SessionError> {
    let kind = flow.question().map(|q| q.kind());
    if kind != Some(QuestionKind::MultipleChoice) {
        flow.append_line(line)?;
        return Ok(None);
    }

    let max_index = flow
        .question()
        .map(|q| q.possible_responses.len().saturating_sub(1))
        .unwrap_or_default();
    let index = line
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or(SessionError::OptionOutOfRange {
            index: 0,
            max_index,
        })?;
    let chosen = flow.select_option(index)?;
    Ok(Some(format!("Réponse sélectionnée : {}", chosen)))
}

/// 输入已关闭时永远挂起，让 `select!` 只剩计时分支
async fn next_line<R>(input: &mut Option<Lines<R>>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    match input {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}
