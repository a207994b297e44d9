//! `log` backend that writes to X-Plane's Log.txt via `XPLMDebugString`.

use std::sync::Arc;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::xplm_shim::XplmApi;

pub struct XplmLogger {
    xplm: Arc<dyn XplmApi>,
    level: LevelFilter,
}

impl XplmLogger {
    pub fn new(xplm: Arc<dyn XplmApi>, level: LevelFilter) -> Self {
        Self { xplm, level }
    }

    /// Install as the process-wide logger. Fails if one is already set,
    /// e.g. when the plugin is reloaded without restarting the sim.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for XplmLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.xplm.log(&format!("FBW [{}] {}\n", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}
