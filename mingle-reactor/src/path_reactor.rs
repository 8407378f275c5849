use alloc::rc::Rc;
use core::cell::RefCell;

use mingle_core::IdPath;

use crate::pipeline::PathGetter;
use crate::{Event, EventKind, EventProcessor, EventStack, MapTracker, PipelineProcessor, ReactorError, StackFrame};

/// Tracks the path of each event in a stream without validating the stream.
///
/// As a pipeline stage it updates its stack around forwarding each event;
/// [`EventPathReactor::pre_process`] and [`EventPathReactor::post_process`]
/// let other stages drive it by hand.
#[derive(Debug, Default)]
pub struct EventPathReactor {
    stack: Rc<RefCell<EventStack>>,
}

impl EventPathReactor {
    /// A tracker positioned before the first event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the stack for an event about to be forwarded.
    pub fn pre_process(&mut self, kind: &EventKind) {
        let mut stack = self.stack.borrow_mut();
        match kind {
            EventKind::FieldStart(fld) => stack.push(StackFrame::Field(fld.clone())),
            EventKind::MapStart | EventKind::StructStart(_) => {
                stack.prepare_list_val();
                stack.push(StackFrame::Map(MapTracker::default()));
            }
            EventKind::ListStart(_) => {
                stack.prepare_list_val();
                stack.push(StackFrame::List(None));
            }
            EventKind::Value(_) => stack.prepare_list_val(),
            EventKind::End => {
                stack.pop();
            }
        }
    }

    /// Updates the stack after an event was forwarded: a completed value
    /// closes the field it belonged to.
    pub fn post_process(&mut self, kind: &EventKind) {
        if matches!(kind, EventKind::Value(_) | EventKind::End) {
            let mut stack = self.stack.borrow_mut();
            if let Some(StackFrame::Field(_)) = stack.peek() {
                stack.pop();
            }
        }
    }

    /// The path of the current position.
    pub fn path(&self) -> IdPath {
        self.stack.borrow().path()
    }

    /// The current position's path appended onto `prefix`.
    pub fn append_path(&self, prefix: &IdPath) -> IdPath {
        self.stack.borrow().append_path(prefix)
    }

    /// A handle reporting the path of the current position.
    pub fn getter(&self) -> PathGetter {
        let stack = Rc::clone(&self.stack);
        PathGetter::new(move || stack.borrow().path())
    }
}

impl PipelineProcessor for EventPathReactor {
    fn path_getter(&self) -> Option<PathGetter> {
        Some(self.getter())
    }

    fn process_event(
        &mut self,
        ev: Event,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let kind = ev.kind().clone();
        self.pre_process(&kind);
        next.process_event(ev)?;
        self.post_process(&kind);
        Ok(())
    }
}

/// Stamps every event with its path, optionally under a start path.
#[derive(Debug, Default)]
pub struct PathSettingProcessor {
    start: IdPath,
    tracker: EventPathReactor,
}

impl PathSettingProcessor {
    /// Stamps paths relative to the top-level value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps paths under `start`.
    pub fn with_start_path(start: IdPath) -> Self {
        Self {
            start,
            tracker: EventPathReactor::new(),
        }
    }
}

impl PipelineProcessor for PathSettingProcessor {
    fn path_getter(&self) -> Option<PathGetter> {
        Some(self.tracker.getter().prefixed(self.start.clone()))
    }

    fn process_event(
        &mut self,
        ev: Event,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let kind = ev.kind().clone();
        self.tracker.pre_process(&kind);
        let path = self.tracker.append_path(&self.start);
        next.process_event(ev.with_path(path))?;
        self.tracker.post_process(&kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use mingle_core::{Identifier, ListTypeRef};
    use mingle_testhelpers::test;

    use crate::ProcessorFn;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    fn stamped(start: IdPath, evs: Vec<Event>) -> Result<Vec<String>, ReactorError> {
        let mut ps = PathSettingProcessor::with_start_path(start);
        let mut out = Vec::new();
        let mut sink = ProcessorFn::new(|ev: Event| {
            out.push(ev.path().map(ToString::to_string).unwrap_or_default());
            Ok(())
        });
        for ev in evs {
            ps.process_event(ev, &mut sink)?;
        }
        drop(sink);
        Ok(out)
    }

    #[test]
    fn paths_follow_fields_and_list_indices() {
        let paths = stamped(
            IdPath::root(),
            vec![
                Event::map_start(),
                Event::field_start(id("f1")),
                Event::list_start(ListTypeRef::opaque()),
                Event::value(1i32),
                Event::map_start(),
                Event::field_start(id("f2")),
                Event::value(2i32),
                Event::end(),
                Event::end(),
                Event::field_start(id("f3")),
                Event::value(3i32),
                Event::end(),
            ],
        )?;
        assert_eq!(
            paths,
            ["", "f1", "f1", "f1[0]", "f1[1]", "f1[1].f2", "f1[1].f2", "f1[1]", "f1", "f3", "f3", ""]
        );
    }

    #[test]
    fn start_paths_prefix_every_event() {
        let start = IdPath::root().descend(id("req"));
        let paths = stamped(
            start,
            vec![
                Event::list_start(ListTypeRef::opaque()),
                Event::value(1i32),
                Event::end(),
            ],
        )?;
        assert_eq!(paths, ["req", "req[0]", "req"]);
    }
}
