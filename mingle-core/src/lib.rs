#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod error;
pub use error::*;

// Field identifiers and qualified type names
mod ident;
pub use ident::*;

mod path;
pub use path::*;

mod restriction;
pub use restriction::*;

// Type trees over qualified names
mod types;
pub use types::*;

mod value;
pub use value::*;
