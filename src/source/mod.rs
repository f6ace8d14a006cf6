//! Traversal over a backing store of raw path records.
//!
//! The store owns the raw strings and their ordering; this module turns
//! them into `(DataPath, DataValue)` pairs. Consecutive records in
//! lexicographic order share long parent chains, so the traversal parses
//! through a prefix-reuse cursor instead of reparsing every path from the
//! root.

mod memory;

pub use memory::MemoryStore;

use tracing::{debug, trace};

use crate::error::SourceError;
use crate::path::parser::{self, PrefixCursor};
use crate::path::DataPath;
use crate::schema::Dtd;
use crate::value::DataValue;

/// Reserved value marking "no explicit value here; inherited from
/// elsewhere". Records carrying it are skipped during traversal.
pub const INHERITANCE_MARKER: &str = "↑↑↑";

/// The order in which a store hands out raw paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathOrder {
    /// Whatever native order the store provides; cheapest.
    Arbitrary,
    /// Lexicographic order on the raw path string. Because lexicographic
    /// comparison resolves at the first differing character, and elements
    /// and attributes are serialized left to right, paths sharing a common
    /// ancestor prefix are always visited consecutively. This order needs
    /// no schema knowledge and maximizes parent-chain reuse while parsing.
    NestedGrouping,
    /// Schema-declared canonical order; costlier to produce, required when
    /// output must match the canonical schema-ordered serialization.
    Dtd,
}

/// The storage collaborator: owns raw records and their orderings.
///
/// All blocking I/O lives behind this trait; the traversal treats every
/// method as a synchronous call.
pub trait RawStore {
    /// Iterate all distinguishing path strings in the requested order.
    /// Ordering (including the DTD comparator) is the store's concern; the
    /// traversal never re-sorts.
    fn paths(&self, order: PathOrder) -> Box<dyn Iterator<Item = String> + '_>;

    /// The string value stored at a distinguishing path, if any.
    fn string_value(&self, path: &str) -> Option<String>;

    /// The fully attributed form of a distinguishing path, including value
    /// and metadata attributes.
    fn full_path(&self, path: &str) -> Option<String>;
}

impl<S: RawStore + ?Sized> RawStore for &S {
    fn paths(&self, order: PathOrder) -> Box<dyn Iterator<Item = String> + '_> {
        (**self).paths(order)
    }

    fn string_value(&self, path: &str) -> Option<String> {
        (**self).string_value(path)
    }

    fn full_path(&self, path: &str) -> Option<String> {
        (**self).full_path(path)
    }
}

/// Receives one value per emitted record during traversal.
pub trait ValueVisitor {
    /// An error return aborts the traversal and propagates to the caller.
    fn visit(&mut self, value: &DataValue) -> anyhow::Result<()>;
}

/// Serves classified `(path, value)` records from a raw store.
pub struct DataSource<S, D> {
    store: S,
    dtd: D,
}

impl<S: RawStore, D: Dtd> DataSource<S, D> {
    pub fn new(store: S, dtd: D) -> Self {
        DataSource { store, dtd }
    }

    /// Walk every record in the requested order, invoking `visitor` once
    /// per emitted value.
    ///
    /// Records with no stored value, or whose value is the inheritance
    /// marker, are skipped silently. Paths that are not leaf paths, or that
    /// the schema says not to emit, are parsed (their chain may be a parent
    /// of later records) but not visited.
    pub fn accept(&self, order: PathOrder, visitor: &mut dyn ValueVisitor) -> Result<(), SourceError> {
        // Cursor and sink are local to this call: concurrent traversals of
        // the same source never share parse state.
        let mut cursor = PrefixCursor::new();
        let mut value_attrs = Vec::new();
        let mut emitted = 0usize;
        let mut skipped = 0usize;
        debug!(?order, "starting traversal");

        for dist in self.store.paths(order) {
            let Some(value) = self.store.string_value(&dist) else {
                trace!(path = %dist, "no stored value, skipping");
                skipped += 1;
                continue;
            };
            if value == INHERITANCE_MARKER {
                trace!(path = %dist, "inherited value, skipping");
                skipped += 1;
                continue;
            }
            let full = self.store.full_path(&dist).unwrap_or(dist);

            value_attrs.clear();
            let path = cursor.process(&full, &self.dtd, &mut value_attrs)?;

            if self.dtd.is_leaf_path(&path) && self.dtd.should_emit(&path) {
                let value =
                    DataValue::from_parts(value, std::mem::take(&mut value_attrs), path)?;
                visitor.visit(&value).map_err(SourceError::Visitor)?;
                emitted += 1;
            }
        }

        debug!(emitted, skipped, "traversal complete");
        Ok(())
    }

    /// Point lookup of the value at an already-built path.
    ///
    /// Bypasses the traversal machinery: the store is asked directly for
    /// the fully attributed form and the value, and attributes are
    /// classified with the path's already-known data type.
    pub fn get(&self, path: &DataPath) -> Result<Option<DataValue>, SourceError> {
        let store_path = path.to_store_string();
        let Some(value) = self.store.string_value(&store_path) else {
            return Ok(None);
        };
        let full = self.store.full_path(&store_path).unwrap_or(store_path);
        let attrs = parser::collect_value_attributes(&full, path.data_type(), &self.dtd)?;
        Ok(Some(DataValue::from_parts(value, attrs, path.clone())?))
    }
}
