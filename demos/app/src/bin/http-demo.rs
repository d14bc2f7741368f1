use anyhow::Context;
use logkit_demos::app::tracing::init_tracing;
use logkit_demos::demo::http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    http::run().await.context("http demo failed")?;
    Ok(())
}
