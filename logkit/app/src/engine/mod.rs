//! Back-ends behind a [`crate::Logger`].
//!
//! Both engines receive fully assembled [`Record`]s (level already checked,
//! constant and call fields merged) and share the same [`Sinks`], so the bytes
//! written for a record are the same whichever engine is selected. They differ
//! in the path a record takes to the sinks:
//!
//! ```text
//! native:  Logger → NativeBackend → Sinks
//! tracing: Logger → tracing::Dispatch (Registry + LevelFilter + RecordLayer) → Sinks
//! ```

mod dispatch;
mod native;

use std::sync::Arc;

use crate::level::Level;
use crate::option::Engine;
use crate::record::Record;
use crate::sink::Sinks;

pub(crate) use dispatch::TracingBackend;
pub(crate) use native::NativeBackend;

pub(crate) trait Backend: Send + Sync {
    fn emit(&self, record: Record);

    fn flush(&self);
}

pub(crate) fn build(engine: Engine, sinks: Arc<Sinks>, level: Level) -> Box<dyn Backend> {
    match engine {
        Engine::Native => Box::new(NativeBackend::new(sinks)),
        Engine::Tracing => Box::new(TracingBackend::new(sinks, level)),
    }
}
