use core::fmt;

use mingle_core::{CoreType, IdPath, Identifier, ListTypeRef, QualifiedTypeName, TypeRef, Value};

/// What an [`Event`] says about the value being streamed.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    /// A struct of the given type begins; its fields follow, then `End`.
    StructStart(QualifiedTypeName),
    /// An untyped symbol map begins; its fields follow, then `End`.
    MapStart,
    /// A list begins; its elements follow, then `End`. The type is a hint
    /// from the producer.
    ListStart(ListTypeRef),
    /// The next value belongs to this field of the enclosing map or struct.
    FieldStart(Identifier),
    /// A scalar value.
    Value(Value),
    /// Closes the innermost open struct, map or list.
    End,
}

impl EventKind {
    /// Short name of the event kind, e.g. `struct-start`.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::StructStart(_) => "struct-start",
            EventKind::MapStart => "map-start",
            EventKind::ListStart(_) => "list-start",
            EventKind::FieldStart(_) => "field",
            EventKind::Value(_) => "value",
            EventKind::End => "end",
        }
    }

    /// True for the three kinds that open a composite value.
    pub fn is_start(&self) -> bool {
        matches!(
            self,
            EventKind::StructStart(_) | EventKind::MapStart | EventKind::ListStart(_)
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::StructStart(qn) => write!(f, "struct-start {qn}"),
            EventKind::ListStart(lt) => write!(f, "list-start {lt}"),
            EventKind::FieldStart(fld) => write!(f, "field {fld}"),
            EventKind::Value(v) => write!(f, "value {v}"),
            EventKind::MapStart | EventKind::End => f.write_str(self.name()),
        }
    }
}

/// One step of a push-style traversal of a value, optionally stamped with
/// the path it occurred at.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    kind: EventKind,
    path: Option<IdPath>,
}

impl Event {
    /// An event of `kind` without a path.
    pub fn new(kind: EventKind) -> Self {
        Self { kind, path: None }
    }

    /// `struct-start qn`
    pub fn struct_start(qn: QualifiedTypeName) -> Self {
        Self::new(EventKind::StructStart(qn))
    }

    /// `map-start`
    pub fn map_start() -> Self {
        Self::new(EventKind::MapStart)
    }

    /// `list-start lt`
    pub fn list_start(lt: ListTypeRef) -> Self {
        Self::new(EventKind::ListStart(lt))
    }

    /// `field fld`
    pub fn field_start(fld: Identifier) -> Self {
        Self::new(EventKind::FieldStart(fld))
    }

    /// `value v`
    pub fn value(v: impl Into<Value>) -> Self {
        Self::new(EventKind::Value(v.into()))
    }

    /// `end`
    pub fn end() -> Self {
        Self::new(EventKind::End)
    }

    /// The event kind and payload.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Consumes the event, keeping only its kind.
    pub fn into_kind(self) -> EventKind {
        self.kind
    }

    /// The path stamped on the event, if any.
    pub fn path(&self) -> Option<&IdPath> {
        self.path.as_ref()
    }

    /// The same event stamped with `path`.
    pub fn with_path(mut self, path: IdPath) -> Self {
        self.path = Some(path);
        self
    }

    /// The same event with any path removed.
    pub fn without_path(mut self) -> Self {
        self.path = None;
        self
    }

    /// An event of `kind` carrying this event's path.
    pub fn with_kind(&self, kind: EventKind) -> Self {
        Self {
            kind,
            path: self.path.clone(),
        }
    }

    /// The type of the value this event stands for: the runtime type of a
    /// scalar, the list type of a list start, the struct type of a struct
    /// start and `SymbolMap` for a map start. Fields and ends have none.
    pub fn type_of(&self) -> Option<TypeRef> {
        match &self.kind {
            EventKind::Value(v) => Some(v.type_of()),
            EventKind::ListStart(lt) => Some(TypeRef::List(lt.clone())),
            EventKind::MapStart => Some(TypeRef::core(CoreType::SymbolMap)),
            EventKind::StructStart(qn) => Some(TypeRef::atomic(qn.clone())),
            EventKind::FieldStart(_) | EventKind::End => None,
        }
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Event::new(kind)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        match &self.path {
            Some(p) if !p.is_empty() => write!(f, " @ {p}"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mingle_testhelpers::test;

    #[test]
    fn events_display_kind_payload_and_path() {
        let ev = Event::value(12i32);
        assert_eq!(ev.to_string(), "value 12");

        let path = IdPath::root().descend(Identifier::new("f1")?);
        let ev = Event::field_start(Identifier::new("f2")?).with_path(path);
        assert_eq!(ev.to_string(), "field f2 @ f1");

        let ev = Event::struct_start(QualifiedTypeName::parse("ns1@v1/S1")?);
        assert_eq!(ev.to_string(), "struct-start ns1@v1/S1");
        assert_eq!(Event::list_start(ListTypeRef::opaque()).to_string(), "list-start mingle:core@v1/Value*");
    }

    #[test]
    fn with_kind_keeps_the_path() {
        let path = IdPath::root().index(3);
        let ev = Event::value("1").with_path(path.clone());
        let cast = ev.with_kind(EventKind::Value(Value::Int32(1)));
        assert_eq!(cast.path(), Some(&path));
        assert_eq!(cast.kind(), &EventKind::Value(Value::Int32(1)));
    }

    #[test]
    fn type_of_events() {
        assert_eq!(Event::map_start().type_of(), Some(TypeRef::core(CoreType::SymbolMap)));
        assert_eq!(Event::value(true).type_of(), Some(TypeRef::core(CoreType::Boolean)));
        assert_eq!(Event::end().type_of(), None);
    }
}
