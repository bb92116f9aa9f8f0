//! Foundation types for trimerge.
//!
//! This crate provides the vocabulary shared by every trimerge crate: where a
//! value lives inside a document, which of the three versions it came from,
//! and what shape it has.
//!
//! # Key Types
//!
//! - [`Path`] -- Dotted, index-free location of a field inside a document
//! - [`Side`] -- One of the three versions taking part in a merge
//! - [`Shape`] -- Coarse structural kind of a JSON value (scalar, object, list)

pub mod error;
pub mod path;
pub mod side;

pub use error::TypeError;
pub use path::Path;
pub use side::{Shape, Side};
