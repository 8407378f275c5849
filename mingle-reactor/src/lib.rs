#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

use mingle_core::{IdPath, TypeRef, Value};

mod error;
pub use error::*;

mod event;
pub use event::*;

pub mod pipeline;
pub use pipeline::{
    DiscardProcessor, EventProcessor, PathGetter, PipelineInit, PipelineProcessor, ProcessorFn,
    ReactorKey, ReactorPipeline, ReactorPipelineBuilder, STRUCTURAL_REACTOR_KEY,
};

mod stack;
pub use stack::*;

mod structural;
pub use structural::*;

// Path tracking without validation
mod path_reactor;
pub use path_reactor::*;

pub mod cast;
pub use cast::{CastInterface, CastReactor, DefaultCastInterface, FieldTyper, ValueFieldTyper};

mod field_order;
pub use field_order::*;

mod value_builder;
pub use value_builder::*;

mod visit;
pub use visit::*;

mod debug;
pub use debug::*;

/// Casts `value` to `ty` with no schema knowledge beyond the type itself.
/// Errors are reported at paths under `start`.
pub fn cast_value(value: &Value, ty: &TypeRef, start: IdPath) -> Result<Value, ReactorError> {
    cast_value_with(value, ty, DefaultCastInterface, start)
}

/// Casts `value` to `ty`, consulting `iface` for struct field types, struct
/// inference and atomic cast overrides.
pub fn cast_value_with<I: CastInterface>(
    value: &Value,
    ty: &TypeRef,
    iface: I,
    start: IdPath,
) -> Result<Value, ReactorError> {
    let mut vb = ValueBuilder::new();
    let mut pip = ReactorPipeline::builder()
        .pipeline_processor(CastReactor::new(ty.clone(), iface, start))
        .event_processor(&mut vb)
        .build();
    visit_value(value, &mut pip)?;
    drop(pip);
    vb.into_value()
}
