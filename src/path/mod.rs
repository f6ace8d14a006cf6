//! The immutable path-tree model.
//!
//! A [`DataPath`] is one element of a distinguishing path, linked to its
//! parent; the leaf node *is* the path. Nodes are immutable once built and
//! cheap to share: cloning a path clones an `Arc` handle, and sibling
//! records built through the traversal cursor reuse their common parent
//! chain instead of re-parsing it.

pub(crate) mod parser;
mod scan;

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::PathError;
use crate::intern::Symbol;
use crate::key::AttributeKey;
use crate::schema::{DataType, Dtd};
use crate::value::DataValue;

/// Attribute name the storage collaborator uses for the sort index.
pub(crate) const SORT_INDEX_ATTRIBUTE: &str = "_q";

/// One stored attribute with its DTD-declared position.
///
/// The declared index is resolved once, when the attribute is classified,
/// so rendering never has to consult the schema again. Undeclared
/// attributes carry `None` and sort after declared ones, by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OrderedAttr {
    pub key: AttributeKey,
    pub value: Box<str>,
    pub order: Option<u32>,
}

/// Canonical attribute order: declared index first, undeclared last by name.
pub(crate) fn cmp_declared(a: &OrderedAttr, b: &OrderedAttr) -> Ordering {
    match (a.order, b.order) {
        (Some(x), Some(y)) => x
            .cmp(&y)
            .then_with(|| a.key.attribute_name().cmp(b.key.attribute_name())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.key.attribute_name().cmp(b.key.attribute_name()),
    }
}

struct Node {
    parent: Option<DataPath>,
    element: Symbol,
    sort_index: Option<u32>,
    /// Distinguishing attributes only, held in declared order.
    attributes: Box<[OrderedAttr]>,
    dtype: DataType,
    depth: u16,
    /// Structural hash over the full chain, computed once at construction.
    hash: u64,
}

/// An element of a distinguishing path, with its parent chain.
#[derive(Clone)]
pub struct DataPath {
    inner: Arc<Node>,
}

impl DataPath {
    /// Parse a raw path string into its distinguishing path.
    ///
    /// The input may carry value and metadata attributes; they are
    /// classified and discarded here. Fails on grammar violations and on an
    /// unknown root element.
    pub fn parse<D: Dtd + ?Sized>(raw: &str, dtd: &D) -> Result<DataPath, PathError> {
        parser::parse_distinguishing(raw, dtd)
    }

    pub(crate) fn new_node(
        parent: Option<DataPath>,
        element: Symbol,
        sort_index: Option<u32>,
        mut attributes: Vec<OrderedAttr>,
        dtype: DataType,
    ) -> DataPath {
        attributes.sort_by(|a, b| cmp_declared(a, b));
        let depth = parent.as_ref().map_or(1, |p| p.inner.depth + 1);
        let hash = structural_hash(parent.as_ref(), element, sort_index, &attributes, dtype);
        DataPath {
            inner: Arc::new(Node {
                parent,
                element,
                sort_index,
                attributes: attributes.into_boxed_slice(),
                dtype,
                depth,
                hash,
            }),
        }
    }

    /// This element's name.
    pub fn element_name(&self) -> &'static str {
        self.inner.element.as_str()
    }

    /// The parent node, or `None` at the root.
    pub fn parent(&self) -> Option<&DataPath> {
        self.inner.parent.as_ref()
    }

    /// Number of elements in the chain, root included.
    pub fn depth(&self) -> usize {
        usize::from(self.inner.depth)
    }

    /// The sort index disambiguating otherwise-identical siblings, if any.
    pub fn sort_index(&self) -> Option<u32> {
        self.inner.sort_index
    }

    /// The data type resolved from the root element.
    pub fn data_type(&self) -> DataType {
        self.inner.dtype
    }

    /// This node's distinguishing attributes, in declared order.
    pub fn attributes(&self) -> impl Iterator<Item = (AttributeKey, &str)> + '_ {
        self.inner.attributes.iter().map(|a| (a.key, &*a.value))
    }

    /// Look up a distinguishing attribute anywhere on the chain.
    ///
    /// Walks parent links until a node's element matches the key's element
    /// and declares the attribute; ancestors past a matching element are
    /// still searched, so a repeated element name cannot shadow an
    /// ancestor's attribute.
    pub fn get(&self, key: AttributeKey) -> Option<&str> {
        let mut node = Some(self);
        while let Some(p) = node {
            if p.inner.element == key.element() {
                if let Some(a) = p.inner.attributes.iter().find(|a| a.key == key) {
                    return Some(&a.value);
                }
            }
            node = p.inner.parent.as_ref();
        }
        None
    }

    /// Render in the storage collaborator's form: the `#N` sort index
    /// expands to its synthetic `[@_q="N"]` attribute spelling.
    pub fn to_store_string(&self) -> String {
        let mut out = String::with_capacity(64);
        self.render_into(&mut out, None, true);
        out
    }

    /// Render the full path for `value`, interleaving its value attributes
    /// into each element in declared order. Value attributes can legally
    /// sort before distinguishing attributes within the same element.
    pub(crate) fn render_with(&self, value: &DataValue) -> String {
        let mut out = String::with_capacity(64);
        self.render_into(&mut out, Some(value), false);
        out
    }

    /// Whether two handles share the same node allocation. Identity sharing
    /// is an optimization, never a correctness requirement; only tests
    /// observe it.
    #[cfg(test)]
    pub(crate) fn same_node(&self, other: &DataPath) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn render_into(&self, out: &mut String, value: Option<&DataValue>, store_form: bool) {
        use std::fmt::Write;

        let mut chain = Vec::with_capacity(self.depth());
        let mut node = Some(self);
        while let Some(p) = node {
            chain.push(p);
            node = p.inner.parent.as_ref();
        }
        chain.reverse();

        // Value attributes grouped by element; each group is consumed at the
        // first node carrying that element name.
        let mut value_attrs: HashMap<Symbol, Vec<&OrderedAttr>> = HashMap::new();
        if let Some(v) = value {
            for a in v.ordered_attrs() {
                value_attrs.entry(a.key.element()).or_default().push(a);
            }
        }

        for (i, p) in chain.iter().enumerate() {
            let node = &*p.inner;
            out.push_str(if i == 0 { "//" } else { "/" });
            out.push_str(node.element.as_str());
            if let Some(q) = node.sort_index {
                if store_form {
                    let _ = write!(out, "[@{}=\"{}\"]", SORT_INDEX_ATTRIBUTE, q);
                } else {
                    let _ = write!(out, "#{}", q);
                }
            }
            match value_attrs.remove(&node.element) {
                Some(extra) => {
                    let mut merged: Vec<&OrderedAttr> =
                        node.attributes.iter().chain(extra).collect();
                    merged.sort_by(|a, b| cmp_declared(a, b));
                    for a in merged {
                        write_attr(out, a);
                    }
                }
                None => {
                    for a in node.attributes.iter() {
                        write_attr(out, a);
                    }
                }
            }
        }
    }
}

fn write_attr(out: &mut String, attr: &OrderedAttr) {
    use std::fmt::Write;
    let _ = write!(out, "[@{}=\"{}\"]", attr.key.attribute_name(), attr.value);
}

fn structural_hash(
    parent: Option<&DataPath>,
    element: Symbol,
    sort_index: Option<u32>,
    attributes: &[OrderedAttr],
    dtype: DataType,
) -> u64 {
    let mut h = DefaultHasher::new();
    match parent {
        Some(p) => p.inner.hash.hash(&mut h),
        None => 0u64.hash(&mut h),
    }
    element.hash(&mut h);
    sort_index.hash(&mut h);
    dtype.hash(&mut h);
    for a in attributes {
        a.key.hash(&mut h);
        a.value.hash(&mut h);
    }
    h.finish()
}

impl PartialEq for DataPath {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        let (a, b) = (&*self.inner, &*other.inner);
        a.hash == b.hash
            && a.depth == b.depth
            && a.element == b.element
            && a.sort_index == b.sort_index
            && a.dtype == b.dtype
            && a.attributes == b.attributes
            && a.parent == b.parent
    }
}

impl Eq for DataPath {}

impl Hash for DataPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash);
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(64);
        self.render_into(&mut out, None, false);
        f.write_str(&out)
    }
}

impl fmt::Debug for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(element: &str, name: &str, value: &str, order: Option<u32>) -> OrderedAttr {
        OrderedAttr {
            key: AttributeKey::new(element, name),
            value: value.into(),
            order,
        }
    }

    fn node(
        parent: Option<DataPath>,
        element: &str,
        attrs: Vec<OrderedAttr>,
        sort_index: Option<u32>,
    ) -> DataPath {
        DataPath::new_node(
            parent,
            Symbol::new(element),
            sort_index,
            attrs,
            DataType::new("ldml"),
        )
    }

    fn chain() -> DataPath {
        let root = node(None, "ldml", vec![], None);
        let mid = node(
            Some(root),
            "localeDisplayNames",
            vec![attr("localeDisplayNames", "type", "x", Some(0))],
            None,
        );
        node(Some(mid), "language", vec![], None)
    }

    #[test]
    fn test_display() {
        assert_eq!(
            chain().to_string(),
            "//ldml/localeDisplayNames[@type=\"x\"]/language"
        );
    }

    #[test]
    fn test_sort_index_rendering() {
        let root = node(None, "ldml", vec![], None);
        let leaf = node(
            Some(root),
            "foo",
            vec![attr("foo", "bar", "baz", None)],
            Some(3),
        );
        assert_eq!(leaf.to_string(), "//ldml/foo#3[@bar=\"baz\"]");
        assert_eq!(leaf.to_store_string(), "//ldml/foo[@_q=\"3\"][@bar=\"baz\"]");
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let a = chain();
        let b = chain();
        assert!(!Arc::ptr_eq(&a.inner, &b.inner));
        assert_eq!(a, b);
        assert_eq!(a.inner.hash, b.inner.hash);
    }

    #[test]
    fn test_inequality_on_attribute_value() {
        let root = node(None, "ldml", vec![], None);
        let a = node(
            Some(root.clone()),
            "foo",
            vec![attr("foo", "type", "x", None)],
            None,
        );
        let b = node(Some(root), "foo", vec![attr("foo", "type", "y", None)], None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_get_walks_ancestors() {
        let path = chain();
        let key = AttributeKey::new("localeDisplayNames", "type");
        assert_eq!(path.get(key), Some("x"));
        assert_eq!(path.get(AttributeKey::new("language", "type")), None);
        assert_eq!(path.get(AttributeKey::new("localeDisplayNames", "alt")), None);
    }

    #[test]
    fn test_attributes_sorted_at_construction() {
        // Handed in out of declared order; stored canonically.
        let root = node(None, "ldml", vec![], None);
        let leaf = node(
            Some(root),
            "foo",
            vec![
                attr("foo", "zzz", "1", None),
                attr("foo", "alt", "2", Some(1)),
                attr("foo", "type", "3", Some(0)),
            ],
            None,
        );
        assert_eq!(
            leaf.to_string(),
            "//ldml/foo[@type=\"3\"][@alt=\"2\"][@zzz=\"1\"]"
        );
    }

    #[test]
    fn test_depth() {
        assert_eq!(chain().depth(), 3);
        assert_eq!(node(None, "ldml", vec![], None).depth(), 1);
    }
}
