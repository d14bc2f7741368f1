use anyhow::Context;
use logkit_demos::app::tracing::init_tracing;
use logkit_demos::demo::file_logging::{DEFAULT_PORT, FileLoggingDemo};
use logkit_demos::env::port_from_env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let demo = FileLoggingDemo::new("logs", logkit::version::get());
    demo.run(port_from_env(DEFAULT_PORT))
        .await
        .with_context(|| format!("file logging demo failed (logs in {})", demo.logs_dir().display()))?;
    Ok(())
}
