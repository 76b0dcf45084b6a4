/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::SessionCtx;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n测评会话日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))
}

/// 追加一行带时间戳的记录到日志文件
pub fn append_log_line(log_file_path: &str, line: &str) -> AppResult<()> {
    use std::io::Write;

    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .and_then(|mut file| {
            writeln!(
                file,
                "[{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                line
            )
        })
        .map_err(|e| AppError::file_write_failed(log_file_path, e))
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, ctx: &SessionCtx) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 候选人测评模式");
    info!("🌐 后端地址: {}", config.api_base_url);
    info!("⏱️ 计时器存储: {}", config.timer_store_path);
    info!("📋 {}", ctx);
    info!("{}", "=".repeat(60));
}

/// 记录会话结束信息
///
/// # 参数
/// - `answered`: 本次运行提交的题目数
pub fn log_session_finished(ctx: &SessionCtx, answered: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 测评结束 {}", ctx);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 本次提交: {} 题", answered);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
