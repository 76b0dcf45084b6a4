//! # Assessment Runner
//!
//! 候选人在线测评的终端客户端：加载测试说明，逐题作答，按题计时并在超时后自动提交
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `HttpExecutor` - 唯一的 HTTP client owner，提供 get_json / post_json
//! - `TimerStore` - 剩余秒数的持久化键值存储
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - `AssessmentBackend` 后端契约及其 HTTP 实现
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `Countdown` - 单题倒计时
//! - `render_instruction` - 数学公式渲染
//! - `detect_language` - 代码题语言识别
//!
//! ### ④ 流程层（Workflow）
//! - `SessionLoader` - 说明页：元数据 + 是否已提交
//! - `QuestionFlow` - 单题：加载 → 作答 → 提交 → 下一题
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/app` - 资源与生命周期
//! - `orchestrator/session_runner` - 终端上的页面导航循环
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{AssessmentBackend, AssessmentClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FileTimerStore, HttpExecutor, MemoryTimerStore, TimerStore};
pub use models::{Question, Route, SessionCtx, TestMetadata};
pub use orchestrator::{App, RunOutcome, SessionRunner};
pub use workflow::{FlowDeps, FlowState, QuestionFlow, SessionLoader};
