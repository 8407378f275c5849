use alloc::format;
use alloc::vec::Vec;

use mingle_core::{
    IdPath, Identifier, List, ListTypeRef, QualifiedTypeName, Struct, SymbolMap, Value,
};

use crate::{Event, EventKind, EventProcessor, ReactorError};

#[derive(Debug)]
enum Acc {
    /// A map, or a struct when it has a type name.
    Map {
        type_name: Option<QualifiedTypeName>,
        fields: SymbolMap,
        pending: Option<Identifier>,
    },
    List {
        list_type: ListTypeRef,
        values: Vec<Value>,
    },
}

impl Acc {
    fn map(type_name: Option<QualifiedTypeName>) -> Self {
        Acc::Map {
            type_name,
            fields: SymbolMap::new(),
            pending: None,
        }
    }
}

/// Assembles the value an event stream describes.
///
/// Errors are reported at the path stamped on the offending event, or at
/// the root if it carries none.
#[derive(Debug, Default)]
pub struct ValueBuilder {
    stack: Vec<Acc>,
    value: Option<Value>,
}

impl ValueBuilder {
    /// A builder that has seen no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the top-level value is complete.
    pub fn is_done(&self) -> bool {
        self.value.is_some()
    }

    /// The completed value.
    pub fn value(&self) -> Result<&Value, ReactorError> {
        self.value
            .as_ref()
            .ok_or_else(|| ReactorError::structural(IdPath::root(), "Value is not yet built"))
    }

    /// Consumes the builder, returning the completed value.
    pub fn into_value(self) -> Result<Value, ReactorError> {
        self.value
            .ok_or_else(|| ReactorError::structural(IdPath::root(), "Value is not yet built"))
    }

    fn value_ready(&mut self, v: Value, path: &IdPath) -> Result<(), ReactorError> {
        match self.stack.last_mut() {
            None if self.value.is_some() => Err(ReactorError::structural(
                path.clone(),
                "Value is already built",
            )),
            None => {
                self.value = Some(v);
                Ok(())
            }
            Some(Acc::List { values, .. }) => {
                values.push(v);
                Ok(())
            }
            Some(Acc::Map {
                fields, pending, ..
            }) => {
                let Some(fld) = pending.take() else {
                    return Err(ReactorError::structural(
                        path.clone(),
                        format!("Expected field name or end of fields but got {v}"),
                    ));
                };
                fields.try_insert(fld.clone(), v).map_err(|_| {
                    ReactorError::structural(
                        path.clone(),
                        format!("Multiple entries for field: {fld}"),
                    )
                })
            }
        }
    }

    fn start_field(&mut self, fld: &Identifier, path: &IdPath) -> Result<(), ReactorError> {
        match self.stack.last_mut() {
            Some(Acc::Map { pending, .. }) => match pending {
                Some(prev) => Err(ReactorError::structural(
                    path.clone(),
                    format!("Saw start of field '{fld}' while expecting a value for '{prev}'"),
                )),
                None => {
                    *pending = Some(fld.clone());
                    Ok(())
                }
            },
            Some(Acc::List { .. }) | None => Err(ReactorError::structural(
                path.clone(),
                format!("Field '{fld}' started outside of a map"),
            )),
        }
    }

    fn end(&mut self, path: &IdPath) -> Result<(), ReactorError> {
        let v = match self.stack.pop() {
            None => {
                return Err(ReactorError::structural(
                    path.clone(),
                    "End with no open map, struct or list",
                ));
            }
            Some(Acc::Map {
                pending: Some(fld),
                ..
            }) => {
                return Err(ReactorError::structural(
                    path.clone(),
                    format!("Saw end while expecting value for field '{fld}'"),
                ));
            }
            Some(Acc::Map {
                type_name: Some(qn),
                fields,
                ..
            }) => Value::Struct(Struct::new(qn, fields)),
            Some(Acc::Map {
                type_name: None,
                fields,
                ..
            }) => Value::SymbolMap(fields),
            Some(Acc::List { list_type, values }) => Value::List(List::new(list_type, values)),
        };
        self.value_ready(v, path)
    }
}

impl EventProcessor for ValueBuilder {
    fn process_event(&mut self, ev: Event) -> Result<(), ReactorError> {
        let path = ev.path().cloned().unwrap_or_default();
        match ev.into_kind() {
            EventKind::Value(v) => self.value_ready(v, &path),
            EventKind::StructStart(qn) => {
                self.stack.push(Acc::map(Some(qn)));
                Ok(())
            }
            EventKind::MapStart => {
                self.stack.push(Acc::map(None));
                Ok(())
            }
            EventKind::ListStart(list_type) => {
                self.stack.push(Acc::List {
                    list_type,
                    values: Vec::new(),
                });
                Ok(())
            }
            EventKind::FieldStart(fld) => self.start_field(&fld, &path),
            EventKind::End => self.end(&path),
        }
    }
}
