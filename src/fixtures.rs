//! Synthetic schema for tests.
//!
//! The real schema rules are an external collaborator, so tests run against
//! this small stand-in: attribute names starting with `_` are metadata,
//! `casing` and `references` are value attributes, everything else is
//! distinguishing. A handful of names carry a declared order, with `casing`
//! (a value attribute) deliberately ordered before `type` (distinguishing)
//! to exercise interleaved rendering.

use crate::key::AttributeKey;
use crate::path::DataPath;
use crate::schema::{AttributeCategory, DataType, Dtd};

pub(crate) struct FakeDtd;

const DECLARED_ORDER: &[&str] = &["casing", "type", "alt", "count", "references"];
const VALUE_ATTRIBUTES: &[&str] = &["casing", "references"];

impl Dtd for FakeDtd {
    fn data_type_of(&self, root_element: &str) -> Option<DataType> {
        matches!(root_element, "ldml" | "supplementalData").then(|| DataType::new(root_element))
    }

    fn classify(&self, _data_type: DataType, key: AttributeKey) -> AttributeCategory {
        let name = key.attribute_name();
        if name.starts_with('_') {
            AttributeCategory::Metadata
        } else if VALUE_ATTRIBUTES.contains(&name) {
            AttributeCategory::Value
        } else {
            AttributeCategory::Distinguishing
        }
    }

    fn attribute_index(&self, _data_type: DataType, key: AttributeKey) -> Option<u32> {
        DECLARED_ORDER
            .iter()
            .position(|n| *n == key.attribute_name())
            .map(|i| i as u32)
    }

    fn is_leaf_path(&self, path: &DataPath) -> bool {
        path.depth() >= 2
    }

    fn should_emit(&self, path: &DataPath) -> bool {
        path.element_name() != "private"
    }
}
