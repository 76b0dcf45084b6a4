use anyhow::{bail, Result};
use assessment_runner::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);

    let mut args = std::env::args().skip(1);
    let Some(test_id) = args.next() else {
        bail!("用法: assessment_runner <testId> <sessionId>");
    };
    let session_id = args.next();

    // 初始化并运行应用
    App::initialize(config)
        .await?
        .run(&test_id, session_id.as_deref())
        .await?;

    Ok(())
}
