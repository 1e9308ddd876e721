use anyhow::Result;
use job_auto_apply::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    if let Err(e) = logger::init_with_file(&config.output_log_file, config.verbose_logging) {
        logger::init();
        tracing::warn!("⚠️ 无法写入日志文件 {}: {}", config.output_log_file, e);
    }

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
