#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use mingle_core::{AtomicTypeRef, CoreType, Identifier, QualifiedTypeName, TypeRef, Value};
use mingle_reactor::{
    CastInterface, Event, EventProcessor, FieldTyper, PathGetter, ReactorError,
};

pub fn id(s: &str) -> Identifier {
    Identifier::new(s).unwrap()
}

pub fn qn(s: &str) -> QualifiedTypeName {
    QualifiedTypeName::parse(s).unwrap()
}

/// Field types for one struct type; unknown fields are an error.
#[derive(Clone, Default)]
pub struct StructFields(pub HashMap<Identifier, TypeRef>);

impl FieldTyper for StructFields {
    fn field_type_of(&self, fld: &Identifier, path: &PathGetter) -> Result<TypeRef, ReactorError> {
        self.0.get(fld).cloned().ok_or_else(|| {
            ReactorError::value(path.path(), format!("Unrecognized field: {fld}"))
        })
    }
}

/// A small schema: struct field types, struct types that bare maps may
/// stand in for, and an atomic override turning `"${n}"` into an Int64.
#[derive(Clone, Default)]
pub struct TestSchema {
    pub structs: HashMap<QualifiedTypeName, StructFields>,
    pub inferable: HashSet<QualifiedTypeName>,
    pub expand_vars: bool,
}

impl TestSchema {
    pub fn with_struct(mut self, name: &str, fields: &[(&str, TypeRef)]) -> Self {
        let fields = fields
            .iter()
            .map(|(f, t)| (id(f), t.clone()))
            .collect();
        self.structs.insert(qn(name), StructFields(fields));
        self
    }

    pub fn inferring(mut self, name: &str) -> Self {
        self.inferable.insert(qn(name));
        self
    }
}

impl CastInterface for TestSchema {
    fn infer_struct_for(&self, qn: &QualifiedTypeName) -> bool {
        self.inferable.contains(qn)
    }

    fn field_typer_for(
        &self,
        qn: &QualifiedTypeName,
        _path: &PathGetter,
    ) -> Result<Option<Box<dyn FieldTyper>>, ReactorError> {
        Ok(self
            .structs
            .get(qn)
            .map(|f| Box::new(f.clone()) as Box<dyn FieldTyper>))
    }

    fn cast_atomic(
        &self,
        v: &Value,
        at: &AtomicTypeRef,
        path: &PathGetter,
    ) -> Option<Result<Value, ReactorError>> {
        if !self.expand_vars || at.core_type() != Some(CoreType::Int64) {
            return None;
        }
        let Value::String(s) = v else { return None };
        let var = s.strip_prefix("${")?.strip_suffix('}')?;
        Some(
            var.parse::<i64>()
                .map(Value::Int64)
                .map_err(|_| ReactorError::value(path.path(), format!("Bad variable: {s}"))),
        )
    }
}

/// Records each event it sees as text.
#[derive(Default)]
pub struct EventRecorder {
    pub events: Vec<String>,
}

impl EventProcessor for EventRecorder {
    fn process_event(&mut self, ev: Event) -> Result<(), ReactorError> {
        self.events.push(ev.to_string());
        Ok(())
    }
}
