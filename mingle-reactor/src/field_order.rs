//! Canonical field ordering for struct events.
//!
//! The reactor keeps one frame per open struct. A field that arrives in
//! canonical order streams straight through; one that arrives early is
//! buffered until every field ahead of it has been sent, or the struct
//! ends. Fields outside the canonical order are not tracked and stream
//! through as they come.

use std::collections::HashMap;

use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use log::trace;
use mingle_core::{IdPath, Identifier, QualifiedTypeName};
use owo_colors::OwoColorize;

use crate::pipeline::{PathGetter, PipelineInit};
use crate::{Event, EventKind, EventPathReactor, EventProcessor, PipelineProcessor, ReactorError};

/// Supplies the canonical order of a struct type's fields. Struct types
/// with an empty order are passed through unchanged.
pub trait FieldOrderGetter {
    /// The fields of `qn` in the order they should be sent.
    fn field_order_for(&self, qn: &QualifiedTypeName) -> Vec<Identifier>;
}

impl FieldOrderGetter for HashMap<QualifiedTypeName, Vec<Identifier>> {
    fn field_order_for(&self, qn: &QualifiedTypeName) -> Vec<Identifier> {
        self.get(qn).cloned().unwrap_or_default()
    }
}

#[derive(Debug)]
enum FieldState {
    Unseen,
    Forwarded,
    Buffered(Vec<Event>),
}

/// How an event moves the nesting depth inside a field's value.
#[derive(Clone, Copy, PartialEq)]
enum Shape {
    Open,
    Close,
    Scalar,
    Other,
}

impl Shape {
    fn of(kind: &EventKind) -> Self {
        match kind {
            EventKind::MapStart | EventKind::ListStart(_) => Shape::Open,
            EventKind::End => Shape::Close,
            EventKind::Value(_) => Shape::Scalar,
            EventKind::StructStart(_) | EventKind::FieldStart(_) => Shape::Other,
        }
    }
}

#[derive(Debug)]
struct OrderFrame {
    order: Vec<Identifier>,
    states: HashMap<Identifier, FieldState>,
    idx: usize,
    // events of the field being buffered
    acc: Option<Vec<Event>>,
    acc_field: Option<Identifier>,
    depth: usize,
    // path of the struct itself
    base_path: IdPath,
}

impl OrderFrame {
    fn new(order: Vec<Identifier>, base_path: IdPath) -> Self {
        let states = order
            .iter()
            .map(|fld| (fld.clone(), FieldState::Unseen))
            .collect();
        Self {
            order,
            states,
            idx: 0,
            acc: None,
            acc_field: None,
            depth: 0,
            base_path,
        }
    }

    fn next_field(&self) -> Option<&Identifier> {
        self.order.get(self.idx)
    }

    fn start_field(&mut self, fld: &Identifier, path: &PathGetter) -> Result<(), ReactorError> {
        if let Some(acc) = &self.acc {
            panic!("field {fld} started with {} buffered events pending", acc.len());
        }
        self.acc_field = Some(fld.clone());
        let seen = match self.states.get(fld) {
            None => return Ok(()),
            Some(FieldState::Unseen) => false,
            Some(FieldState::Forwarded | FieldState::Buffered(_)) => true,
        };
        if seen {
            return Err(ReactorError::structural(
                path.path(),
                format!("Multiple entries for field: {fld}"),
            ));
        }
        if self.next_field() == Some(fld) {
            self.states.insert(fld.clone(), FieldState::Forwarded);
        } else {
            trace!("{} buffering field {}", "field-order".bright_black(), fld.blue());
            self.acc = Some(Vec::new());
        }
        Ok(())
    }
}

/// Hands `ev` to the innermost frame that is buffering, or downstream if
/// none is.
fn send_event(
    frames: &mut [OrderFrame],
    ev: Event,
    next: &mut dyn EventProcessor,
) -> Result<(), ReactorError> {
    for frame in frames.iter_mut().rev() {
        if let Some(acc) = &mut frame.acc {
            acc.push(ev);
            return Ok(());
        }
    }
    next.process_event(ev)
}

/// Reorders the fields of struct events into a canonical order.
///
/// Only what must wait is buffered, and a value is never held past the end
/// of its struct. Nested structs are reordered independently, inside
/// whatever buffering their parent does. While buffered events are replayed
/// the reactor's path getter reports their original location.
pub struct FieldOrderReactor<G> {
    getter: G,
    frames: Vec<OrderFrame>,
    upstream: PathGetter,
    replay: Rc<RefCell<Option<PathGetter>>>,
}

impl<G: FieldOrderGetter> FieldOrderReactor<G> {
    /// A reactor ordering fields per `getter`.
    pub fn new(getter: G) -> Self {
        Self {
            getter,
            frames: Vec::new(),
            upstream: PathGetter::fixed(IdPath::root()),
            replay: Rc::new(RefCell::new(None)),
        }
    }

    fn start_struct(&mut self, qn: &QualifiedTypeName) {
        let order = self.getter.field_order_for(qn);
        if let Some(parent) = self.frames.last_mut() {
            // the parent sees the nested struct only through its end
            parent.depth += 1;
        }
        self.frames
            .push(OrderFrame::new(order, self.upstream.path()));
    }

    /// Sends `acc` through the frames below `upto`, reporting paths under
    /// `base`.
    fn replay(
        &mut self,
        upto: usize,
        base: &IdPath,
        acc: Vec<Event>,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let mut tracker = EventPathReactor::new();
        *self.replay.borrow_mut() = Some(tracker.getter().prefixed(base.clone()));
        let mut res = Ok(());
        for ev in acc {
            let kind = ev.kind().clone();
            tracker.pre_process(&kind);
            res = send_event(&mut self.frames[..upto], ev, next);
            if res.is_err() {
                break;
            }
            tracker.post_process(&kind);
        }
        *self.replay.borrow_mut() = None;
        res
    }

    fn send_ready_values(
        &mut self,
        i: usize,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        loop {
            let frame = &mut self.frames[i];
            let Some(fld) = frame.next_field().cloned() else {
                return Ok(());
            };
            if !matches!(frame.states.get(&fld), Some(FieldState::Buffered(_))) {
                return Ok(());
            }
            let Some(FieldState::Buffered(acc)) = frame.states.insert(fld, FieldState::Forwarded)
            else {
                unreachable!("state checked above");
            };
            frame.idx += 1;
            let base = frame.base_path.clone();
            self.replay(i + 1, &base, acc, next)?;
        }
    }

    fn field_completed(
        &mut self,
        i: usize,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let frame = &mut self.frames[i];
        let Some(fld) = frame.acc_field.take() else {
            panic!("field value completed with no field in progress");
        };
        if frame.next_field() == Some(&fld) {
            frame.idx += 1;
        }
        if let Some(acc) = frame.acc.take() {
            frame.states.insert(fld, FieldState::Buffered(acc));
            return Ok(());
        }
        self.send_ready_values(i, next)
    }

    fn complete_event(
        &mut self,
        i: usize,
        shape: Shape,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let frame = &mut self.frames[i];
        match shape {
            Shape::Open => frame.depth += 1,
            Shape::Close => frame.depth -= 1,
            Shape::Scalar | Shape::Other => {}
        }
        if frame.depth == 0 && matches!(shape, Shape::Close | Shape::Scalar) {
            return self.field_completed(i, next);
        }
        Ok(())
    }

    fn end_struct(
        &mut self,
        mut frame: OrderFrame,
        ev: Event,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        if frame.acc.is_some() {
            panic!("struct ended while a field is being buffered");
        }
        let upto = self.frames.len();
        for fld in &frame.order[frame.idx..] {
            if let Some(FieldState::Buffered(acc)) = frame.states.remove(fld) {
                self.replay(upto, &frame.base_path, acc, next)?;
            }
        }
        send_event(&mut self.frames[..upto], ev, next)
    }
}

impl<G: FieldOrderGetter> PipelineProcessor for FieldOrderReactor<G> {
    fn init(&mut self, init: &mut PipelineInit<'_, '_>) {
        let structural = init.ensure_structural();
        self.upstream = init.last_path_getter().unwrap_or(structural);
    }

    fn path_getter(&self) -> Option<PathGetter> {
        let replay = Rc::clone(&self.replay);
        let upstream = self.upstream.clone();
        Some(PathGetter::new(move || match &*replay.borrow() {
            Some(pg) => pg.path(),
            None => upstream.path(),
        }))
    }

    fn process_event(
        &mut self,
        ev: Event,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        if let EventKind::StructStart(qn) = ev.kind() {
            self.start_struct(qn);
        }
        let Some(top) = self.frames.last_mut() else {
            return next.process_event(ev);
        };
        if matches!(ev.kind(), EventKind::End) && top.depth == 0 {
            let Some(frame) = self.frames.pop() else {
                unreachable!("frame checked above");
            };
            self.end_struct(frame, ev, next)?;
            return match self.frames.len() {
                0 => Ok(()),
                n => self.complete_event(n - 1, Shape::Close, next),
            };
        }
        if let EventKind::FieldStart(fld) = ev.kind() {
            if top.acc_field.is_none() {
                top.start_field(fld, &self.upstream)?;
            }
        }
        let shape = Shape::of(ev.kind());
        let i = self.frames.len() - 1;
        send_event(&mut self.frames[..=i], ev, next)?;
        self.complete_event(i, shape, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use mingle_testhelpers::test;

    use crate::{DiscardProcessor, ProcessorFn, ReactorPipeline};

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    fn orders(qn: &QualifiedTypeName, flds: &[&str]) -> HashMap<QualifiedTypeName, Vec<Identifier>> {
        let mut m = HashMap::new();
        m.insert(qn.clone(), flds.iter().map(|f| id(f)).collect());
        m
    }

    /// Feeds `evs` through a field order reactor and records what comes out
    /// along with the reactor's path for each event.
    fn reorder(
        getter: HashMap<QualifiedTypeName, Vec<Identifier>>,
        evs: Vec<Event>,
    ) -> Result<Vec<String>, ReactorError> {
        let out = RefCell::new(Vec::new());
        let pg: RefCell<Option<PathGetter>> = RefCell::new(None);
        let mut pip = ReactorPipeline::builder()
            .pipeline_processor(FieldOrderReactor::new(getter))
            .event_processor(ProcessorFn::new(|ev: Event| {
                let path = pg
                    .borrow()
                    .as_ref()
                    .map(|g| g.path().to_string())
                    .unwrap_or_default();
                out.borrow_mut().push(format!("{} @ {path}", ev.kind()));
                Ok(())
            }))
            .build();
        *pg.borrow_mut() = pip.last_path_getter();
        for ev in evs {
            pip.process_event(ev)?;
        }
        drop(pip);
        Ok(out.into_inner())
    }

    fn field(name: &str, v: i32) -> [Event; 2] {
        [Event::field_start(id(name)), Event::value(v)]
    }

    #[test]
    fn buffered_fields_replay_in_order() {
        let qn = QualifiedTypeName::parse("ns1@v1/S1")?;
        let mut evs = vec![Event::struct_start(qn.clone())];
        evs.extend(field("c", 3));
        evs.extend(field("a", 1));
        evs.extend(field("b", 2));
        evs.push(Event::end());

        let out = reorder(orders(&qn, &["a", "b", "c"]), evs)?;
        assert_eq!(
            out,
            [
                "struct-start ns1@v1/S1 @ ",
                "field a @ a",
                "value 1 @ a",
                "field b @ b",
                "value 2 @ b",
                "field c @ c",
                "value 3 @ c",
                "end @ ",
            ]
        );
    }

    #[test]
    fn unordered_fields_stream_through() {
        let qn = QualifiedTypeName::parse("ns1@v1/S1")?;
        let mut evs = vec![Event::struct_start(qn.clone())];
        evs.extend(field("b", 2));
        evs.extend(field("x", 9));
        evs.extend(field("a", 1));
        evs.push(Event::end());

        let out = reorder(orders(&qn, &["a", "b"]), evs)?;
        assert_eq!(
            out,
            [
                "struct-start ns1@v1/S1 @ ",
                "field x @ x",
                "value 9 @ x",
                "field a @ a",
                "value 1 @ a",
                "field b @ b",
                "value 2 @ b",
                "end @ ",
            ]
        );
    }

    #[test]
    fn missing_fields_flush_at_struct_end() {
        let qn = QualifiedTypeName::parse("ns1@v1/S1")?;
        let mut evs = vec![Event::struct_start(qn.clone())];
        evs.extend(field("c", 3));
        evs.extend(field("b", 2));
        evs.push(Event::end());

        let out = reorder(orders(&qn, &["a", "b", "c"]), evs)?;
        let kinds: Vec<&str> = out.iter().map(|s| s.split(" @").next().unwrap_or("")).collect();
        assert_eq!(
            kinds,
            ["struct-start ns1@v1/S1", "field b", "value 2", "field c", "value 3", "end"]
        );
    }

    #[test]
    fn nested_structs_reorder_inside_buffers() {
        let outer = QualifiedTypeName::parse("ns1@v1/Outer")?;
        let inner = QualifiedTypeName::parse("ns1@v1/Inner")?;
        let mut getter = orders(&outer, &["a", "b"]);
        getter.insert(inner.clone(), vec![id("x"), id("y")]);

        let mut evs = vec![
            Event::struct_start(outer),
            Event::field_start(id("b")),
            Event::struct_start(inner),
        ];
        evs.extend(field("y", 2));
        evs.extend(field("x", 1));
        evs.push(Event::end());
        evs.extend(field("a", 0));
        evs.push(Event::end());

        let out = reorder(getter, evs)?;
        assert_eq!(
            out,
            [
                "struct-start ns1@v1/Outer @ ",
                "field a @ a",
                "value 0 @ a",
                "field b @ b",
                "struct-start ns1@v1/Inner @ b",
                "field x @ b.x",
                "value 1 @ b.x",
                "field y @ b.y",
                "value 2 @ b.y",
                "end @ b",
                "end @ ",
            ]
        );
    }

    #[test]
    fn lists_inside_buffered_fields_stay_whole() {
        let qn = QualifiedTypeName::parse("ns1@v1/S1")?;
        let evs = vec![
            Event::struct_start(qn.clone()),
            Event::field_start(id("b")),
            Event::list_start(mingle_core::ListTypeRef::opaque()),
            Event::value(1i32),
            Event::map_start(),
            Event::end(),
            Event::end(),
            Event::field_start(id("a")),
            Event::value(0i32),
            Event::end(),
        ];
        let out = reorder(orders(&qn, &["a", "b"]), evs)?;
        assert_eq!(
            out,
            [
                "struct-start ns1@v1/S1 @ ",
                "field a @ a",
                "value 0 @ a",
                "field b @ b",
                "list-start mingle:core@v1/Value* @ b",
                "value 1 @ b[0]",
                "map-start @ b[1]",
                "end @ b[1]",
                "end @ b",
                "end @ ",
            ]
        );
    }

    #[test]
    #[should_panic(expected = "no field in progress")]
    fn value_in_an_ordered_struct_without_a_field_is_fatal() {
        let qn = QualifiedTypeName::parse("ns1@v1/S1").unwrap();
        let mut fo = FieldOrderReactor::new(orders(&qn, &["a", "b"]));
        fo.process_event(Event::struct_start(qn), &mut DiscardProcessor)
            .unwrap();
        let _ = fo.process_event(Event::value(1i32), &mut DiscardProcessor);
    }
}
