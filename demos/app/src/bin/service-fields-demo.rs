use anyhow::Context;
use logkit_demos::app::tracing::init_tracing;
use logkit_demos::demo::service_fields;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    service_fields::run()
        .await
        .context("service fields demo failed")?;
    Ok(())
}
