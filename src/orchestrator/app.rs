//! 应用生命周期 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源创建和一次会话的运行。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件，创建 HTTP 客户端和计时器存储
//! 2. **会话运行**：把 stdin / stdout 交给 `SessionRunner`
//! 3. **结束统计**：记录本次提交的题目数和最终结局

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::clients::AssessmentClient;
use crate::config::Config;
use crate::infrastructure::FileTimerStore;
use crate::models::{Route, SessionCtx};
use crate::orchestrator::session_runner::{RunOutcome, SessionRunner};
use crate::utils::logging::{append_log_line, init_log_file, log_session_finished, log_startup};
use crate::workflow::FlowDeps;

/// 应用主结构
pub struct App {
    config: Config,
    deps: FlowDeps,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        let client = AssessmentClient::new(&config).context("无法创建后端客户端")?;
        let timers = FileTimerStore::new(&config.timer_store_path);
        let deps = FlowDeps::new(Arc::new(client), Arc::new(timers), &config);

        Ok(Self { config, deps })
    }

    /// 运行一次会话（入口：/test/{testId}?sessionId=…）
    pub async fn run(&self, test_id: &str, session_id: Option<&str>) -> Result<RunOutcome> {
        let ctx = SessionCtx::from_entry(test_id, session_id).ok();
        match &ctx {
            Some(ctx) => {
                log_startup(&self.config, ctx);
                info!("🧭 入口 {}", Route::instructions(ctx));
            }
            None => warn!("⚠️ 测试 {} 缺少 sessionId", test_id),
        }

        let input = BufReader::new(tokio::io::stdin());
        let mut runner = SessionRunner::new(self.deps.clone(), input, std::io::stdout());
        let outcome = runner.run(test_id, session_id).await?;

        info!("🏁 会话结局: {:?}", outcome);
        append_log_line(
            &self.config.output_log_file,
            &format!("测试 {} 结局: {:?}", test_id, outcome),
        )?;
        if let Some(ctx) = &ctx {
            log_session_finished(ctx, runner.answered(), &self.config.output_log_file);
        }

        Ok(outcome)
    }
}
