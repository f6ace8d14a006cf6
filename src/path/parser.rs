//! Parser for the path micro-grammar, and the prefix-reuse cursor.
//!
//! Grammar, per path element: an element name, an optional `#N` sort index,
//! then zero or more `[@name="value"]` attribute declarations. A path is
//! `//` followed by one or more `/`-separated elements. Values may contain
//! any character except the quote delimiter, including `/`.
//!
//! Bulk traversal parses thousands of consecutive paths that share long
//! parent chains. [`PrefixCursor`] keeps one frame per parsed segment (raw
//! text, built node, that segment's value attributes) so an unchanged
//! leading run of segments costs one string compare each instead of a parse,
//! a classification pass, and a node allocation.

use memchr::memchr2;

use super::scan::Scanner;
use super::{DataPath, OrderedAttr, SORT_INDEX_ATTRIBUTE};
use crate::error::PathError;
use crate::intern::Symbol;
use crate::key::AttributeKey;
use crate::schema::{AttributeCategory, DataType, Dtd};

/// Parse a raw path into its distinguishing path, discarding value
/// attributes.
pub(crate) fn parse_distinguishing<D: Dtd + ?Sized>(
    raw: &str,
    dtd: &D,
) -> Result<DataPath, PathError> {
    let mut discard = Vec::new();
    PrefixCursor::new().process(raw, dtd, &mut discard)
}

/// Parse a fully attributed path, pushing value attributes into `sink`.
pub(crate) fn parse_full<D: Dtd + ?Sized>(
    raw: &str,
    dtd: &D,
    sink: &mut Vec<OrderedAttr>,
) -> Result<DataPath, PathError> {
    PrefixCursor::new().process(raw, dtd, sink)
}

/// Classify a fully attributed path with an already-known data type and
/// collect only its value attributes. Used by point lookup, where the
/// distinguishing path is already built and no nodes are needed.
pub(crate) fn collect_value_attributes<D: Dtd + ?Sized>(
    raw: &str,
    dtype: DataType,
    dtd: &D,
) -> Result<Vec<OrderedAttr>, PathError> {
    let mut out = Vec::new();
    for seg in split_segments(raw)? {
        let parts = scan_segment(seg, raw)?;
        let element = Symbol::new(parts.name);
        for (aname, avalue) in parts.attributes {
            let key = AttributeKey::from_symbols(element, Symbol::new(aname));
            if dtd.classify(dtype, key) == AttributeCategory::Value {
                out.push(OrderedAttr {
                    key,
                    value: avalue.into(),
                    order: dtd.attribute_index(dtype, key),
                });
            }
        }
    }
    Ok(out)
}

/// One parsed-and-classified segment retained between consecutive records.
struct SegmentFrame {
    /// The segment's raw text, exactly as it appeared in the path string.
    raw: Box<str>,
    node: DataPath,
    /// Value attributes this segment contributed, replayed on reuse so a
    /// shared prefix still surfaces its value attributes on every record.
    value_attrs: Box<[OrderedAttr]>,
}

/// Traversal-local parse state. One cursor per traversal; never shared.
pub(crate) struct PrefixCursor {
    frames: Vec<SegmentFrame>,
}

impl PrefixCursor {
    pub fn new() -> Self {
        PrefixCursor { frames: Vec::new() }
    }

    /// Parse `raw`, reusing every leading segment whose raw text matches the
    /// previous record's. Reused segments keep their nodes and replay their
    /// cached value attributes into `value_sink`; only the differing suffix
    /// is scanned, classified, and built fresh.
    pub fn process<D: Dtd + ?Sized>(
        &mut self,
        raw: &str,
        dtd: &D,
        value_sink: &mut Vec<OrderedAttr>,
    ) -> Result<DataPath, PathError> {
        let segs = split_segments(raw)?;

        let mut reuse = 0;
        while reuse < self.frames.len()
            && reuse < segs.len()
            && *self.frames[reuse].raw == *segs[reuse]
        {
            reuse += 1;
        }
        self.frames.truncate(reuse);
        for frame in &self.frames {
            value_sink.extend(frame.value_attrs.iter().cloned());
        }

        let mut leaf = self.frames.last().map(|f| f.node.clone());
        for seg in &segs[reuse..] {
            let parts = scan_segment(seg, raw)?;
            let element = Symbol::new(parts.name);
            let dtype = match &leaf {
                Some(node) => node.data_type(),
                None => dtd
                    .data_type_of(parts.name)
                    .ok_or_else(|| PathError::UnknownDataType(parts.name.to_string()))?,
            };

            let mut distinguishing = Vec::new();
            let mut values = Vec::new();
            for (aname, avalue) in parts.attributes {
                let key = AttributeKey::from_symbols(element, Symbol::new(aname));
                let attr = || OrderedAttr {
                    key,
                    value: avalue.into(),
                    order: dtd.attribute_index(dtype, key),
                };
                match dtd.classify(dtype, key) {
                    AttributeCategory::Distinguishing => distinguishing.push(attr()),
                    AttributeCategory::Value => values.push(attr()),
                    AttributeCategory::Metadata => {}
                }
            }

            let node =
                DataPath::new_node(leaf.clone(), element, parts.sort_index, distinguishing, dtype);
            value_sink.extend(values.iter().cloned());
            self.frames.push(SegmentFrame {
                raw: (*seg).into(),
                node: node.clone(),
                value_attrs: values.into_boxed_slice(),
            });
            leaf = Some(node);
        }

        match leaf {
            Some(node) => Ok(node),
            None => Err(PathError::malformed(raw, "empty path")),
        }
    }
}

struct RawSegment<'a> {
    name: &'a str,
    sort_index: Option<u32>,
    attributes: Vec<(&'a str, &'a str)>,
}

/// Split a raw path into its element segments, quote-aware so attribute
/// values may contain `/`.
fn split_segments(raw: &str) -> Result<Vec<&str>, PathError> {
    let rest = raw
        .strip_prefix("//")
        .ok_or_else(|| PathError::malformed(raw, "missing '//' root marker"))?;
    let bytes = rest.as_bytes();
    let mut segs = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    let mut in_quote = false;
    while let Some(off) = memchr2(b'/', b'"', &bytes[pos..]) {
        let i = pos + off;
        if bytes[i] == b'"' {
            in_quote = !in_quote;
        } else if !in_quote {
            if i == start {
                return Err(PathError::malformed(raw, "empty path element"));
            }
            segs.push(&rest[start..i]);
            start = i + 1;
        }
        pos = i + 1;
    }
    if in_quote {
        return Err(PathError::malformed(raw, "unterminated attribute value"));
    }
    if start == rest.len() {
        return Err(PathError::malformed(raw, "empty path element"));
    }
    segs.push(&rest[start..]);
    Ok(segs)
}

/// Scan one segment into its parts. The synthetic `_q` attribute and the
/// `#N` shorthand are both captured as the sort index and never surfaced as
/// ordinary attributes.
fn scan_segment<'a>(seg: &'a str, full_path: &str) -> Result<RawSegment<'a>, PathError> {
    let mut sc = Scanner::new(seg);
    let name = sc
        .read_name()
        .ok_or_else(|| PathError::malformed(full_path, "expected element name"))?;

    let mut sort_index = None;
    if sc.eat(b'#') {
        sort_index = Some(parse_sort_index(
            sc.read_digits()
                .ok_or_else(|| PathError::malformed(full_path, "invalid sort index"))?,
            full_path,
        )?);
    }

    let mut attributes = Vec::new();
    while !sc.is_eof() {
        if !sc.eat(b'[') {
            return Err(PathError::malformed(
                full_path,
                "unexpected character in path element",
            ));
        }
        if !sc.eat(b'@') {
            return Err(PathError::malformed(
                full_path,
                "expected '@' in attribute declaration",
            ));
        }
        let aname = sc
            .read_name()
            .ok_or_else(|| PathError::malformed(full_path, "expected attribute name"))?;
        if !sc.eat(b'=') {
            return Err(PathError::malformed(
                full_path,
                "expected '=' after attribute name",
            ));
        }
        if !sc.eat(b'"') {
            return Err(PathError::malformed(
                full_path,
                "attribute value must be quoted",
            ));
        }
        let start = sc.position();
        let end = sc
            .find_byte(b'"')
            .ok_or_else(|| PathError::malformed(full_path, "unterminated attribute value"))?;
        let value = sc.slice(start, end);
        sc.set_position(end + 1);
        if !sc.eat(b']') {
            return Err(PathError::malformed(
                full_path,
                "unterminated attribute bracket",
            ));
        }

        if aname == SORT_INDEX_ATTRIBUTE {
            sort_index = Some(parse_sort_index(value, full_path)?);
        } else {
            attributes.push((aname, value));
        }
    }

    Ok(RawSegment {
        name,
        sort_index,
        attributes,
    })
}

fn parse_sort_index(digits: &str, full_path: &str) -> Result<u32, PathError> {
    digits
        .parse::<u32>()
        .map_err(|_| PathError::malformed(full_path, "invalid sort index"))
}
