//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把流程层的状态机接到终端上，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用生命周期
//! - 初始化日志文件、HTTP 客户端、计时器存储
//! - 运行一次会话并输出统计
//!
//! ### `session_runner` - 单个会话驱动器
//! - 按 `Route` 在说明页、题目页、结果页之间导航
//! - 每道题一个 `QuestionFlow` 和一个 1 秒计时器
//! - 解析输入命令（选项编号、`:submit`、`:lang`、`:clear`）
//!
//! ### `terminal_view` - 终端视图
//! - 把测试信息和题目格式化为文本
//!
//! ## 层次关系
//!
//! ```text
//! app (资源与生命周期)
//!     ↓
//! session_runner (处理 Route 序列)
//!     ↓
//! workflow::SessionLoader / QuestionFlow (处理单页)
//!     ↓
//! services (能力层：countdown / math_markup / language)
//!     ↓
//! infrastructure (基础设施：HttpExecutor / TimerStore)
//! ```

pub mod app;
pub mod session_runner;
pub mod terminal_view;

// 重新导出主要类型
pub use app::App;
pub use session_runner::{RunOutcome, SessionRunner};
