use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// 初始化日志输出
/// 默认级别为 info，可通过 RUST_LOG 覆盖（例如 `RUST_LOG=fragmentarium=debug`）
pub fn init() -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::default().add_directive("info".parse()?),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}
