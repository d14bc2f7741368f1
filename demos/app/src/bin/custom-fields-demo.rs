use logkit_demos::app::tracing::init_tracing;
use logkit_demos::demo::custom_fields;

fn main() -> anyhow::Result<()> {
    init_tracing();
    custom_fields::run(logkit::version::get(), &["stdout".to_string()])?;
    Ok(())
}
