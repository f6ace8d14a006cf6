//! The value model: a leaf datum with its value attributes and path.
//!
//! A [`DataValue`] holds only the "value" attributes; distinguishing
//! attributes live on the associated [`DataPath`] and metadata attributes
//! were discarded during classification. Value-attribute order is stable
//! (element encounter order, root to leaf) but callers should look
//! attributes up by key rather than rely on position.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::PathError;
use crate::key::AttributeKey;
use crate::path::{parser, DataPath, OrderedAttr};
use crate::schema::{DataType, Dtd};

/// An immutable record value: primary string, value attributes, path.
#[derive(Clone)]
pub struct DataValue {
    value: Box<str>,
    attributes: Box<[OrderedAttr]>,
    path: DataPath,
    /// Cached to avoid rehashing the attribute list per comparison.
    hash: u64,
}

impl DataValue {
    /// Parse a fully attributed path string into a value.
    ///
    /// Distinguishing attributes go to the resulting path, value attributes
    /// to the value, metadata attributes are dropped. The primary `value`
    /// may be empty but always exists; absence is the store's concern.
    pub fn parse<D: Dtd + ?Sized>(
        raw: &str,
        value: impl Into<String>,
        dtd: &D,
    ) -> Result<DataValue, PathError> {
        let mut sink = Vec::new();
        let path = parser::parse_full(raw, dtd, &mut sink)?;
        DataValue::from_parts(value.into(), sink, path)
    }

    pub(crate) fn from_parts(
        value: String,
        attributes: Vec<OrderedAttr>,
        path: DataPath,
    ) -> Result<DataValue, PathError> {
        // Attribute keys were vetted at classification; values still need
        // checking, since the quote is the grammar's value delimiter.
        for a in &attributes {
            if a.value.contains('"') {
                return Err(PathError::InvalidAttributeValue(a.value.to_string()));
            }
        }
        let attributes = attributes.into_boxed_slice();
        let hash = {
            let mut h = DefaultHasher::new();
            value.hash(&mut h);
            for a in attributes.iter() {
                a.key.hash(&mut h);
                a.value.hash(&mut h);
            }
            path.hash(&mut h);
            h.finish()
        };
        Ok(DataValue {
            value: value.into_boxed_str(),
            attributes,
            path,
            hash,
        })
    }

    /// The primary value. Empty for elements with no explicit value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Look up an attribute on this value or its distinguishing path.
    ///
    /// The two attribute sets are disjoint by classification, so the value
    /// attributes are tried first and the path is the fallback.
    pub fn get(&self, key: AttributeKey) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| &*a.value)
            .or_else(|| self.path.get(key))
    }

    /// The data type, as defined by the path.
    pub fn data_type(&self) -> DataType {
        self.path.data_type()
    }

    /// The value attributes, in stable encounter order.
    pub fn value_attributes(&self) -> impl Iterator<Item = (AttributeKey, &str)> + '_ {
        self.attributes.iter().map(|a| (a.key, &*a.value))
    }

    /// The distinguishing path this value belongs to.
    pub fn path(&self) -> &DataPath {
        &self.path
    }

    /// The combined full path, with value attributes interleaved into each
    /// element in declared order. Value attributes do not always follow the
    /// distinguishing attributes; declared order can place them first.
    pub fn full_path(&self) -> String {
        self.path.render_with(self)
    }

    pub(crate) fn ordered_attrs(&self) -> &[OrderedAttr] {
        &self.attributes
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.attributes == other.attributes
            && self.path == other.path
    }
}

impl Eq for DataValue {}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "attributes={:?}, path={}", self.attributes, self.path)
        } else if self.attributes.is_empty() {
            write!(f, "value={:?}, path={}", self.value, self.path)
        } else {
            write!(
                f,
                "value={:?}, attributes={:?}, path={}",
                self.value, self.attributes, self.path
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FakeDtd;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &DataValue) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_parse_value_example() {
        let v = DataValue::parse("//ldml/foo[@bar=\"baz\"]", "hello", &FakeDtd).unwrap();
        assert_eq!(v.value(), "hello");
        assert_eq!(v.path().to_string(), "//ldml/foo[@bar=\"baz\"]");
        assert_eq!(v.value_attributes().count(), 0);
        assert_eq!(v.data_type().xml_name(), "ldml");
    }

    #[test]
    fn test_empty_value_is_valid() {
        let v = DataValue::parse("//ldml/foo[@bar=\"baz\"]", "", &FakeDtd).unwrap();
        assert_eq!(v.value(), "");
    }

    #[test]
    fn test_get_prefers_value_attributes_then_path() {
        let v = DataValue::parse(
            "//ldml/foo[@type=\"t\"][@casing=\"lower\"]",
            "x",
            &FakeDtd,
        )
        .unwrap();
        assert_eq!(v.get(AttributeKey::new("foo", "casing")), Some("lower"));
        assert_eq!(v.get(AttributeKey::new("foo", "type")), Some("t"));
        assert_eq!(v.get(AttributeKey::new("foo", "nope")), None);
    }

    #[test]
    fn test_full_path_interleaves_in_declared_order() {
        // casing (value) is declared before type (distinguishing), so the
        // full path puts it first within the element.
        let v = DataValue::parse(
            "//ldml/foo[@type=\"t\"][@casing=\"lower\"]",
            "x",
            &FakeDtd,
        )
        .unwrap();
        assert_eq!(v.path().to_string(), "//ldml/foo[@type=\"t\"]");
        assert_eq!(
            v.full_path(),
            "//ldml/foo[@casing=\"lower\"][@type=\"t\"]"
        );
    }

    #[test]
    fn test_full_path_with_sort_index() {
        let v = DataValue::parse("//ldml/foo#3[@bar=\"baz\"]", "x", &FakeDtd).unwrap();
        assert_eq!(v.full_path(), "//ldml/foo#3[@bar=\"baz\"]");
    }

    #[test]
    fn test_equality_and_hash_contract() {
        let a = DataValue::parse("//ldml/foo[@casing=\"c\"][@bar=\"b\"]", "v", &FakeDtd).unwrap();
        let b = DataValue::parse("//ldml/foo[@casing=\"c\"][@bar=\"b\"]", "v", &FakeDtd).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let different_value =
            DataValue::parse("//ldml/foo[@casing=\"c\"][@bar=\"b\"]", "w", &FakeDtd).unwrap();
        assert_ne!(a, different_value);

        let different_attr =
            DataValue::parse("//ldml/foo[@casing=\"d\"][@bar=\"b\"]", "v", &FakeDtd).unwrap();
        assert_ne!(a, different_attr);

        let different_path =
            DataValue::parse("//ldml/qux[@casing=\"c\"][@bar=\"b\"]", "v", &FakeDtd).unwrap();
        assert_ne!(a, different_path);
    }

    #[test]
    fn test_rejects_quote_in_value_attribute() {
        let path = DataPath::parse("//ldml/foo", &FakeDtd).unwrap();
        let attrs = vec![OrderedAttr {
            key: AttributeKey::new("foo", "references"),
            value: "say \"hi\"".into(),
            order: None,
        }];
        let err = DataValue::from_parts("v".to_string(), attrs, path).unwrap_err();
        assert!(matches!(err, PathError::InvalidAttributeValue(_)));
    }
}
