//! Type-directed casting of an event stream.
//!
//! A [`CastReactor`] is built around an expected type and walks the
//! incoming events against it with a stack of cast frames, one per open
//! list, map or struct. Scalars are converted through the atomic cast table
//! in [`atomic`] and checked against any restriction on their target type;
//! composites are checked for shape and passed on. A [`CastInterface`] can
//! type struct fields, let bare maps stand in for structs, and take over
//! individual atomic casts.

pub mod atomic;

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use log::trace;
use mingle_core::{
    AtomicTypeRef, CoreType, IdPath, Identifier, ListTypeRef, QualifiedTypeName, TypeRef, Value,
};
use owo_colors::OwoColorize;

use crate::pipeline::{PathGetter, PipelineInit};
use crate::{Event, EventKind, EventProcessor, PipelineProcessor, ReactorError};

/// Resolves the expected type of each field of a map or struct.
pub trait FieldTyper {
    /// The type expected for `fld`. `path` reports the field's location.
    fn field_type_of(&self, fld: &Identifier, path: &PathGetter) -> Result<TypeRef, ReactorError>;
}

/// Expects the universal top type for every field.
///
/// The top type is not nullable, so a null field value fails with a
/// null-value error. Maps holding nulls need a typer that answers with a
/// nullable type.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueFieldTyper;

impl FieldTyper for ValueFieldTyper {
    fn field_type_of(&self, _: &Identifier, _: &PathGetter) -> Result<TypeRef, ReactorError> {
        Ok(TypeRef::value())
    }
}

/// Hooks a [`CastReactor`] consults for schema knowledge it does not have
/// itself. Every method has a default that knows nothing.
pub trait CastInterface {
    /// Whether a bare map may stand in for a struct of type `qn`.
    fn infer_struct_for(&self, _qn: &QualifiedTypeName) -> bool {
        false
    }

    /// The field typer for structs of type `qn`; `None` types every field
    /// as a value.
    fn field_typer_for(
        &self,
        _qn: &QualifiedTypeName,
        _path: &PathGetter,
    ) -> Result<Option<Box<dyn FieldTyper>>, ReactorError> {
        Ok(None)
    }

    /// Casts `v` to `at` in place of the built-in table, or returns `None`
    /// to leave the cast to it. Restrictions on `at` are still enforced on
    /// the result.
    fn cast_atomic(
        &self,
        _v: &Value,
        _at: &AtomicTypeRef,
        _path: &PathGetter,
    ) -> Option<Result<Value, ReactorError>> {
        None
    }
}

/// A [`CastInterface`] with no schema knowledge.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCastInterface;

impl CastInterface for DefaultCastInterface {}

#[derive(Debug)]
struct ListCast {
    list_type: ListTypeRef,
    saw_values: bool,
}

struct MapCast {
    field_type: Option<TypeRef>,
    typer: Box<dyn FieldTyper>,
}

impl MapCast {
    fn new(typer: Box<dyn FieldTyper>) -> Self {
        Self {
            field_type: None,
            typer,
        }
    }
}

enum CastFrame {
    /// The slot for the top-level value.
    Expected(TypeRef),
    List(ListCast),
    Map(MapCast),
}

/// Casts a stream of events to an expected type, forwarding type-correct
/// events.
///
/// Needs a [`StructuralReactor`](crate::StructuralReactor) upstream and
/// installs one accepting any top-level value if there is none.
pub struct CastReactor<I = DefaultCastInterface> {
    iface: I,
    stack: Vec<CastFrame>,
    start: IdPath,
    path: PathGetter,
}

impl CastReactor<DefaultCastInterface> {
    /// A reactor casting to `expected` with no schema knowledge.
    pub fn with_default(expected: TypeRef, start: IdPath) -> Self {
        Self::new(expected, DefaultCastInterface, start)
    }
}

impl<I: CastInterface> CastReactor<I> {
    /// A reactor casting to `expected`, consulting `iface`. Errors are
    /// reported at paths under `start`.
    pub fn new(expected: TypeRef, iface: I, start: IdPath) -> Self {
        let path = PathGetter::fixed(start.clone());
        Self {
            iface,
            stack: vec![CastFrame::Expected(expected)],
            start,
            path,
        }
    }

    /// The interface this reactor consults.
    pub fn interface(&self) -> &I {
        &self.iface
    }

    fn current_path(&self) -> IdPath {
        self.path.path()
    }

    fn type_cast_error(&self, expected: TypeRef, actual: TypeRef) -> ReactorError {
        ReactorError::type_cast(self.current_path(), expected, actual)
    }

    /// The type expected at the current position. Reading it from a list
    /// frame counts as the list receiving a value when `note_list_value` is
    /// set.
    fn slot_type(&mut self, note_list_value: bool) -> TypeRef {
        match self.stack.last_mut() {
            Some(CastFrame::Expected(t)) => t.clone(),
            Some(CastFrame::List(lc)) => {
                if note_list_value {
                    lc.saw_values = true;
                }
                lc.list_type.element().clone()
            }
            Some(CastFrame::Map(mc)) => match &mc.field_type {
                Some(t) => t.clone(),
                None => panic!("value in a map cast frame before any field start"),
            },
            None => panic!("cast reactor stack is empty"),
        }
    }

    fn cast_atomic(
        &self,
        v: &Value,
        at: &AtomicTypeRef,
        call_type: &TypeRef,
    ) -> Result<Value, ReactorError> {
        let path = self.current_path();
        let res = match self.iface.cast_atomic(v, at, &self.path) {
            Some(res) => res?,
            None => atomic::cast_atomic_unrestricted(v, at, call_type, &path)?,
        };
        atomic::check_restriction(&res, at, &path)?;
        Ok(res)
    }

    /// Casts `v` into `slot`. `None` means `v` is a null admitted by a
    /// nullable slot and passes through untouched.
    fn complete_value(&self, v: &Value, slot: &TypeRef) -> Result<Option<Value>, ReactorError> {
        let mut t = slot;
        loop {
            match t {
                TypeRef::Nullable(nt) => {
                    if let Value::Null = v {
                        return Ok(None);
                    }
                    t = nt.inner();
                }
                TypeRef::Atomic(at) => return self.cast_atomic(v, at, slot).map(Some),
                TypeRef::List(_) => return Err(self.type_cast_error(slot.clone(), v.type_of())),
            }
        }
    }

    fn value(&mut self, ev: Event, next: &mut dyn EventProcessor) -> Result<(), ReactorError> {
        let slot = self.slot_type(true);
        let EventKind::Value(v) = ev.kind() else {
            unreachable!("value() called for {}", ev.kind().name())
        };
        match self.complete_value(v, &slot)? {
            None => next.process_event(ev),
            Some(v2) => next.process_event(ev.with_kind(EventKind::Value(v2))),
        }
    }

    fn start_list(
        &mut self,
        ev: Event,
        event_type: &ListTypeRef,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let slot = self.slot_type(false);
        let (list_type, ev) = match slot.unwrap_nullable() {
            TypeRef::List(lt) => (lt.clone(), ev.with_kind(EventKind::ListStart(lt.clone()))),
            t if t.is_value() => (ListTypeRef::opaque(), ev),
            _ => {
                return Err(self.type_cast_error(slot.clone(), TypeRef::List(event_type.clone())));
            }
        };
        self.stack.push(CastFrame::List(ListCast {
            list_type,
            saw_values: false,
        }));
        next.process_event(ev)
    }

    fn start_map(&mut self, ev: Event, next: &mut dyn EventProcessor) -> Result<(), ReactorError> {
        let slot = self.slot_type(false);
        let t = slot.unwrap_nullable();
        if t.is_symbol_map() || t.is_value() {
            self.stack
                .push(CastFrame::Map(MapCast::new(Box::new(ValueFieldTyper))));
            return next.process_event(ev);
        }
        if let TypeRef::Atomic(at) = t {
            if self.iface.infer_struct_for(at.name()) {
                let qn = at.name().clone();
                trace!("Inferring struct {} for a bare map", qn.blue());
                let ev = ev.with_kind(EventKind::StructStart(qn.clone()));
                return self.complete_start_struct(ev, &qn, &slot, next);
            }
        }
        Err(self.type_cast_error(slot, TypeRef::core(CoreType::SymbolMap)))
    }

    fn complete_start_struct(
        &mut self,
        ev: Event,
        qn: &QualifiedTypeName,
        slot: &TypeRef,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let t = slot.unwrap_nullable();
        let ev = match t {
            TypeRef::Atomic(at) if at.name() == qn || t.is_value() => ev,
            TypeRef::Atomic(_) if t.is_symbol_map() => ev.with_kind(EventKind::MapStart),
            _ => return Err(self.type_cast_error(slot.clone(), TypeRef::atomic(qn.clone()))),
        };
        let typer = self
            .iface
            .field_typer_for(qn, &self.path)?
            .unwrap_or_else(|| Box::new(ValueFieldTyper));
        self.stack.push(CastFrame::Map(MapCast::new(typer)));
        next.process_event(ev)
    }

    fn start_field(
        &mut self,
        ev: Event,
        fld: &Identifier,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let Some(CastFrame::Map(mc)) = self.stack.last_mut() else {
            panic!("field start for '{fld}' outside of a map cast frame");
        };
        mc.field_type = Some(mc.typer.field_type_of(fld, &self.path)?);
        next.process_event(ev)
    }

    fn end(&mut self, ev: Event, next: &mut dyn EventProcessor) -> Result<(), ReactorError> {
        let Some(frame) = self.stack.pop() else {
            panic!("end with an empty cast reactor stack");
        };
        if let Some(CastFrame::List(lc)) = self.stack.last_mut() {
            lc.saw_values = true;
        }
        match frame {
            CastFrame::Map(_) => next.process_event(ev),
            CastFrame::List(lc) => {
                if !(lc.saw_values || lc.list_type.allows_empty()) {
                    return Err(ReactorError::value(self.current_path(), "List is empty"));
                }
                next.process_event(ev)
            }
            CastFrame::Expected(t) => panic!("end with no open composite (expecting {t})"),
        }
    }
}

impl<I: CastInterface> PipelineProcessor for CastReactor<I> {
    fn init(&mut self, init: &mut PipelineInit<'_, '_>) {
        let structural = init.ensure_structural();
        self.path = init
            .last_path_getter()
            .unwrap_or(structural)
            .prefixed(self.start.clone());
    }

    fn path_getter(&self) -> Option<PathGetter> {
        Some(self.path.clone())
    }

    fn process_event(
        &mut self,
        ev: Event,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        trace!(
            "{} {} at depth {}",
            "cast".bright_black(),
            ev.kind().yellow(),
            self.stack.len()
        );
        match ev.kind().clone() {
            EventKind::Value(_) => self.value(ev, next),
            EventKind::ListStart(lt) => self.start_list(ev, &lt, next),
            EventKind::MapStart => self.start_map(ev, next),
            EventKind::StructStart(qn) => {
                let slot = self.slot_type(false);
                if let TypeRef::List(_) = slot {
                    return Err(self.type_cast_error(slot, TypeRef::atomic(qn)));
                }
                self.complete_start_struct(ev, &qn, &slot, next)
            }
            EventKind::FieldStart(fld) => self.start_field(ev, &fld, next),
            EventKind::End => self.end(ev, next),
        }
    }
}
