use alloc::string::{String, ToString};

use log::debug;
use owo_colors::OwoColorize;

use crate::pipeline::{PathGetter, PipelineInit};
use crate::{Event, EventProcessor, PipelineProcessor, ReactorError};

/// Logs every event at `debug` level, with the path reported by the nearest
/// path-tracking stage ahead of it, and forwards it unchanged.
#[derive(Debug)]
pub struct DebugReactor {
    label: String,
    path: Option<PathGetter>,
}

impl DebugReactor {
    /// A reactor prefixing its log lines with `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: None,
        }
    }
}

impl Default for DebugReactor {
    fn default() -> Self {
        Self::new("events")
    }
}

impl PipelineProcessor for DebugReactor {
    fn init(&mut self, init: &mut PipelineInit<'_, '_>) {
        self.path = init.last_path_getter();
    }

    fn process_event(
        &mut self,
        ev: Event,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let path = match &self.path {
            Some(pg) => pg.path().to_string(),
            None => "<path unknown>".to_string(),
        };
        debug!(
            "{} {}: {}",
            self.label.bright_black(),
            path.blue(),
            ev.kind().yellow()
        );
        next.process_event(ev)
    }
}
