use anyhow::Context;
use clap::Parser;
use logkit_demos::app::tracing::init_tracing;
use logkit_demos::demo::config_driven::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    config_driven::run(cli).await.context("config demo failed")?;
    Ok(())
}
