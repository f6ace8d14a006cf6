//! ldmlpath - Canonical locale-data path model
//!
//! Parses the XPath-like micro-grammar used to address locale-data records
//! (`//ldml/foo[@bar="baz"]`) into an immutable, structurally shared path
//! tree, classifies every attribute as distinguishing, value, or metadata,
//! and walks a backing store as `(DataPath, DataValue)` pairs.
//!
//! Components:
//! - [`AttributeKey`]: interned `(element, attribute)` identity
//! - [`DataPath`]: immutable path node chain with cached structural hash
//! - [`DataValue`]: value string + value attributes + owning path
//! - [`Dtd`]: the injected schema collaborator (classification oracle)
//! - [`DataSource`]: ordered traversal and point lookup over a [`RawStore`]
//!
//! The schema and the storage engine stay outside this crate; both are
//! consumed through traits so the core parses and classifies the same way
//! against a synthetic schema as against the real one.

mod error;
#[cfg(test)]
mod fixtures;
mod intern;
mod key;
mod path;
mod schema;
mod source;
mod value;

pub use error::{PathError, SourceError};
pub use key::AttributeKey;
pub use path::DataPath;
pub use schema::{AttributeCategory, DataType, Dtd};
pub use source::{
    DataSource, MemoryStore, PathOrder, RawStore, ValueVisitor, INHERITANCE_MARKER,
};
pub use value::DataValue;
