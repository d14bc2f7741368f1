use std::sync::Arc;

use super::Backend;
use crate::record::Record;
use crate::sink::{self, Sinks};

pub(crate) struct NativeBackend {
    sinks: Arc<Sinks>,
}

impl NativeBackend {
    pub(crate) fn new(sinks: Arc<Sinks>) -> Self {
        Self { sinks }
    }
}

impl Backend for NativeBackend {
    fn emit(&self, record: Record) {
        sink::report(self.sinks.write(&record));
    }

    fn flush(&self) {
        self.sinks.flush();
    }
}
