//! Turning values into event streams.

use alloc::vec;
use alloc::vec::Vec;

use log::trace;
use mingle_core::{IdPath, Identifier, ListTypeRef, QualifiedTypeName, Value};

use crate::{Event, EventKind, EventProcessor, PathSettingProcessor, ReactorError, ReactorPipeline};

/// Shorthand for feeding hand-written event sequences to a processor.
pub struct EventSender<'p, P: ?Sized> {
    processor: &'p mut P,
}

impl<'p, P: EventProcessor + ?Sized> EventSender<'p, P> {
    /// Sends to `processor`.
    pub fn new(processor: &'p mut P) -> Self {
        Self { processor }
    }

    fn send(&mut self, kind: EventKind) -> Result<&mut Self, ReactorError> {
        self.processor.process_event(Event::new(kind))?;
        Ok(self)
    }

    /// Sends a struct start.
    pub fn start_struct(&mut self, qn: QualifiedTypeName) -> Result<&mut Self, ReactorError> {
        self.send(EventKind::StructStart(qn))
    }

    /// Sends a map start.
    pub fn start_map(&mut self) -> Result<&mut Self, ReactorError> {
        self.send(EventKind::MapStart)
    }

    /// Sends a list start.
    pub fn start_list(&mut self, lt: ListTypeRef) -> Result<&mut Self, ReactorError> {
        self.send(EventKind::ListStart(lt))
    }

    /// Sends a field start.
    pub fn start_field(&mut self, fld: Identifier) -> Result<&mut Self, ReactorError> {
        self.send(EventKind::FieldStart(fld))
    }

    /// Sends a scalar value.
    pub fn value(&mut self, v: impl Into<Value>) -> Result<&mut Self, ReactorError> {
        self.send(EventKind::Value(v.into()))
    }

    /// Sends an end.
    pub fn end(&mut self) -> Result<&mut Self, ReactorError> {
        self.send(EventKind::End)
    }
}

enum VisitTask<'v> {
    Value(&'v Value),
    Field(&'v Identifier),
    End,
}

/// Feeds `value` to `processor` as a depth-first event stream: structs and
/// maps as a start, then each field's name and value, then an end; lists as
/// a start, each element, then an end; everything else as a single value
/// event. Stops at the first error.
pub fn visit_value<P: EventProcessor + ?Sized>(
    value: &Value,
    processor: &mut P,
) -> Result<(), ReactorError> {
    trace!("Visiting {}", value.type_of());
    let mut tasks = vec![VisitTask::Value(value)];
    while let Some(task) = tasks.pop() {
        let ev = match task {
            VisitTask::Field(fld) => Event::field_start(fld.clone()),
            VisitTask::End => Event::end(),
            VisitTask::Value(Value::Struct(s)) => {
                push_fields(&mut tasks, s.fields().iter());
                Event::struct_start(s.type_name().clone())
            }
            VisitTask::Value(Value::SymbolMap(m)) => {
                push_fields(&mut tasks, m.iter());
                Event::map_start()
            }
            VisitTask::Value(Value::List(l)) => {
                tasks.push(VisitTask::End);
                tasks.extend(l.values().iter().rev().map(VisitTask::Value));
                Event::list_start(l.list_type().clone())
            }
            VisitTask::Value(v) => Event::value(v.clone()),
        };
        processor.process_event(ev)?;
    }
    Ok(())
}

/// Queues the fields of a map followed by its end, first field on top.
fn push_fields<'v>(
    tasks: &mut Vec<VisitTask<'v>>,
    fields: impl Iterator<Item = (&'v Identifier, &'v Value)>,
) {
    tasks.push(VisitTask::End);
    let fields: Vec<_> = fields.collect();
    for (fld, v) in fields.into_iter().rev() {
        tasks.push(VisitTask::Value(v));
        tasks.push(VisitTask::Field(fld));
    }
}

/// Like [`visit_value`], but stamps each event with its path under `start`
/// before `processor` sees it.
pub fn visit_value_with_path<P: EventProcessor + ?Sized>(
    value: &Value,
    start: IdPath,
    processor: &mut P,
) -> Result<(), ReactorError> {
    let mut pip = ReactorPipeline::builder()
        .pipeline_processor(PathSettingProcessor::with_start_path(start))
        .event_processor(processor)
        .build();
    visit_value(value, &mut pip)
}
