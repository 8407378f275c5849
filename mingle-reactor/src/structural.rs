use alloc::format;
use alloc::rc::Rc;
use core::cell::{Ref, RefCell};
use core::fmt;

use log::trace;
use mingle_core::Identifier;
use owo_colors::OwoColorize;

use crate::pipeline::{PathGetter, ReactorKey, STRUCTURAL_REACTOR_KEY};
use crate::{
    Event, EventKind, EventProcessor, EventStack, MapTracker, PipelineProcessor, ReactorError,
    StackFrame,
};

/// The shape of the single top-level value a [`StructuralReactor`] accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopType {
    /// Anything: a scalar, list, map or struct.
    Value,
    /// Only a list.
    List,
    /// A map, or a struct.
    Map,
    /// Only a struct.
    Struct,
}

impl fmt::Display for TopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TopType::Value => "value",
            TopType::List => "list",
            TopType::Map => "map",
            TopType::Struct => "struct",
        })
    }
}

impl TopType {
    fn admits(self, kind: &EventKind) -> bool {
        match self {
            TopType::Value => true,
            TopType::List => matches!(kind, EventKind::ListStart(_)),
            TopType::Map => matches!(kind, EventKind::MapStart | EventKind::StructStart(_)),
            TopType::Struct => matches!(kind, EventKind::StructStart(_)),
        }
    }
}

#[derive(Debug)]
struct StructuralState {
    stack: EventStack,
    top: TopType,
    done: bool,
}

impl StructuralState {
    fn err(&self, msg: impl Into<alloc::string::String>) -> ReactorError {
        ReactorError::structural(self.stack.path(), msg)
    }

    fn check_active(&self, call: &str) -> Result<(), ReactorError> {
        if self.done {
            return Err(self.err(format!("{call}() called, but struct is built")));
        }
        Ok(())
    }

    fn top_type_error(&self, val_name: &str) -> ReactorError {
        self.err(format!("Expected {} but got {val_name}", self.top))
    }

    /// Checks that a value may appear here. `kind` is only consulted at the
    /// top level, where it is matched against the declared top type.
    fn check_value(&self, val_name: &str, kind: &EventKind) -> Result<(), ReactorError> {
        match self.stack.peek() {
            None if self.top.admits(kind) => Ok(()),
            None => Err(self.top_type_error(val_name)),
            Some(StackFrame::Field(_) | StackFrame::List(_)) => Ok(()),
            Some(StackFrame::Map(m)) if m.pending.is_some() => Ok(()),
            Some(StackFrame::Map(_)) => Err(self.err(format!(
                "Expected field name or end of fields but got {val_name}"
            ))),
        }
    }

    fn start_map(&mut self, call: &str, val_name: &str, kind: &EventKind) -> Result<(), ReactorError> {
        self.check_active(call)?;
        self.check_value(val_name, kind)?;
        self.stack.prepare_list_val();
        self.stack.push(StackFrame::Map(MapTracker::default()));
        Ok(())
    }

    fn start_list(&mut self, kind: &EventKind) -> Result<(), ReactorError> {
        self.check_active("StartList")?;
        self.check_value("list start", kind)?;
        self.stack.prepare_list_val();
        self.stack.push(StackFrame::List(None));
        Ok(())
    }

    fn start_field(&mut self, fld: &Identifier) -> Result<(), ReactorError> {
        self.check_active("StartField")?;
        let path = self.stack.path();
        match self.stack.peek_mut() {
            None => Err(ReactorError::structural(
                path,
                format!("Expected {} but got field '{fld}'", TopType::Struct),
            )),
            Some(StackFrame::List(_)) => Err(ReactorError::structural(
                path,
                format!("Expected list value but got start of field '{fld}'"),
            )),
            Some(StackFrame::Field(pending)) => Err(ReactorError::structural(
                path,
                format!("Saw start of field '{fld}' while expecting a value for '{pending}'"),
            )),
            Some(StackFrame::Map(m)) => {
                if let Some(pending) = &m.pending {
                    panic!("field {fld} started while {pending} is still pending");
                }
                if !m.seen.insert(fld.clone()) {
                    return Err(ReactorError::structural(
                        path,
                        format!("Multiple entries for field: {fld}"),
                    ));
                }
                m.pending = Some(fld.clone());
                self.stack.push(StackFrame::Field(fld.clone()));
                Ok(())
            }
        }
    }

    fn value(&mut self, kind: &EventKind) -> Result<(), ReactorError> {
        self.check_active("Value")?;
        self.check_value("value", kind)?;
        self.stack.prepare_list_val();
        if self.stack.is_empty() {
            self.done = true;
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), ReactorError> {
        self.check_active("End")?;
        match self.stack.pop() {
            None => Err(self.top_type_error("end")),
            Some(StackFrame::Field(fld)) => Err(self.err(format!(
                "Saw end while expecting value for field '{fld}'"
            ))),
            Some(StackFrame::Map(_) | StackFrame::List(_)) => {
                // closing a nested composite completes a value of its parent
                if self.stack.is_empty() {
                    self.done = true;
                    Ok(())
                } else {
                    self.check_value("value", &EventKind::End)
                }
            }
        }
    }

    /// Validates `kind` and updates the stack. Returns whether the event
    /// completes a value.
    fn update(&mut self, kind: &EventKind) -> Result<bool, ReactorError> {
        match kind {
            EventKind::StructStart(_) => self.start_map("StartStruct", "struct start", kind).map(|_| false),
            EventKind::MapStart => self.start_map("StartMap", "map start", kind).map(|_| false),
            EventKind::ListStart(_) => self.start_list(kind).map(|_| false),
            EventKind::FieldStart(fld) => self.start_field(fld).map(|_| false),
            EventKind::Value(_) => self.value(kind).map(|_| true),
            EventKind::End => self.end().map(|_| true),
        }
    }

    fn downstream_done(&mut self, completes_value: bool) {
        if !completes_value {
            return;
        }
        if let Some(StackFrame::Field(_)) = self.stack.peek() {
            self.stack.pop();
        }
        if let Some(StackFrame::Map(m)) = self.stack.peek_mut() {
            m.pending = None;
        }
    }
}

/// Checks that an event stream is well formed and describes exactly one
/// value of the declared [`TopType`].
///
/// Every start must be closed by an `End`, a map's fields must be unique,
/// and every field must be followed by exactly one value. Once the top-level
/// value completes, the reactor refuses further events.
///
/// The reactor registers under [`STRUCTURAL_REACTOR_KEY`] so other stages
/// can share its stack and path rather than track their own.
pub struct StructuralReactor {
    state: Rc<RefCell<StructuralState>>,
}

impl StructuralReactor {
    /// A reactor accepting one value of shape `top`.
    pub fn new(top: TopType) -> Self {
        Self {
            state: Rc::new(RefCell::new(StructuralState {
                stack: EventStack::new(),
                top,
                done: false,
            })),
        }
    }

    /// The declared top-level shape.
    pub fn top_type(&self) -> TopType {
        self.state.borrow().top
    }

    /// Whether the top-level value has completed.
    pub fn is_done(&self) -> bool {
        self.state.borrow().done
    }

    /// The live structural stack.
    pub fn stack(&self) -> Ref<'_, EventStack> {
        Ref::map(self.state.borrow(), |s| &s.stack)
    }

    /// A handle reporting the path of the current position.
    pub fn getter(&self) -> PathGetter {
        let state = Rc::clone(&self.state);
        PathGetter::new(move || state.borrow().stack.path())
    }
}

impl PipelineProcessor for StructuralReactor {
    fn key(&self) -> Option<ReactorKey> {
        Some(STRUCTURAL_REACTOR_KEY)
    }

    fn path_getter(&self) -> Option<PathGetter> {
        Some(self.getter())
    }

    fn process_event(
        &mut self,
        ev: Event,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError> {
        let completes_value = {
            let mut state = self.state.borrow_mut();
            trace!(
                "{} {} at depth {}",
                "structural".bright_black(),
                ev.kind().yellow(),
                state.stack.depth()
            );
            state.update(ev.kind())?
        };
        next.process_event(ev)?;
        self.state.borrow_mut().downstream_done(completes_value);
        Ok(())
    }
}
