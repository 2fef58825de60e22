//! Record reconstruction from dotted header paths.
//!
//! A row is first nested into a [`RawRecord`] tree by walking the header paths
//! in lockstep with the row tokens, then projected into the fixed
//! [`ParsedRecord`] shape. Both steps are tolerant by default: short rows leave
//! trailing fields absent, extra tokens are ignored, and an unparsable age
//! becomes `None`. [`RecordBuilder`] can be switched to strict mode, which
//! rejects those rows instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::RowError, header::HeaderSchema};

pub const NAME_KEY: &str = "name";
pub const FIRST_NAME_KEY: &str = "firstName";
pub const LAST_NAME_KEY: &str = "lastName";
pub const AGE_KEY: &str = "age";
pub const ADDRESS_KEY: &str = "address";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    Leaf(String),
    Node(BTreeMap<String, RawRecord>),
}

impl Default for RawRecord {
    fn default() -> Self {
        RawRecord::Node(BTreeMap::new())
    }
}

impl RawRecord {
    pub fn get(&self, key: &str) -> Option<&RawRecord> {
        match self {
            RawRecord::Node(children) => children.get(key),
            RawRecord::Leaf(_) => None,
        }
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&RawRecord> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            RawRecord::Leaf(value) => Some(value),
            RawRecord::Node(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            RawRecord::Leaf(value) => Value::String(value.clone()),
            RawRecord::Node(children) => Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_json()))
                    .collect(),
            ),
        }
    }

    /// Sets `segments` to `value`, creating intermediate nodes as needed.
    ///
    /// A non-empty scalar sitting on an intermediate segment blocks the
    /// deeper path and the value is dropped; an empty scalar is replaced by a
    /// node. The final segment is always overwritten, and an absent value
    /// removes whatever was there.
    fn insert(children: &mut BTreeMap<String, RawRecord>, segments: &[String], value: Option<&str>) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        if rest.is_empty() {
            match value {
                Some(value) => {
                    children.insert(head.clone(), RawRecord::Leaf(value.to_string()));
                }
                None => {
                    children.remove(head);
                }
            }
            return;
        }
        let child = children.entry(head.clone()).or_default();
        if matches!(child, RawRecord::Leaf(existing) if existing.is_empty()) {
            *child = RawRecord::default();
        }
        if let RawRecord::Node(grandchildren) = child {
            Self::insert(grandchildren, rest, value);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Address {
    fn from_raw(raw: Option<&RawRecord>) -> Self {
        let field = |key: &str| {
            raw.and_then(|node| node.get(key))
                .and_then(RawRecord::as_leaf)
                .map(str::to_string)
        };
        Self {
            line1: field("line1"),
            line2: field("line2"),
            city: field("city"),
            state: field("state"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line1.is_none() && self.line2.is_none() && self.city.is_none() && self.state.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub name: String,
    /// `None` when the age leaf was absent or not numeric.
    pub age: Option<i64>,
    pub address: Address,
    pub additional_info: Map<String, Value>,
}

/// Nests `tokens` under the paths of `header` by position.
pub fn nest(header: &HeaderSchema, tokens: &[String]) -> RawRecord {
    let mut root = BTreeMap::new();
    for (idx, path) in header.paths().iter().enumerate() {
        let value = tokens.get(idx).map(String::as_str);
        RawRecord::insert(&mut root, path.segments(), value);
    }
    RawRecord::Node(root)
}

pub fn project(raw: RawRecord) -> ParsedRecord {
    let mut top = match raw {
        RawRecord::Node(children) => children,
        RawRecord::Leaf(_) => BTreeMap::new(),
    };
    let name = top.remove(NAME_KEY);
    let age = top.remove(AGE_KEY);
    let address = top.remove(ADDRESS_KEY);

    let name_part = |key: &str| {
        name.as_ref()
            .and_then(|node| node.get(key))
            .and_then(RawRecord::as_leaf)
            .unwrap_or("")
    };

    ParsedRecord {
        name: format!("{} {}", name_part(FIRST_NAME_KEY), name_part(LAST_NAME_KEY)),
        age: age
            .as_ref()
            .and_then(RawRecord::as_leaf)
            .and_then(parse_leading_integer),
        address: Address::from_raw(address.as_ref()),
        additional_info: top
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    }
}

/// Parses an optional sign followed by leading digits, ignoring any trailing
/// text. A `0x`/`0X` prefix switches to hexadecimal. Returns `None` when there
/// are no digits or the value does not fit in an `i64`.
pub fn parse_leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, unsigned) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let (radix, body) = match unsigned.get(..2) {
        Some("0x" | "0X") => (16, &unsigned[2..]),
        _ => (10, unsigned),
    };
    let digits = body
        .bytes()
        .take_while(|byte| char::from(*byte).is_digit(radix))
        .count();
    if digits == 0 {
        return None;
    }
    let magnitude = i64::from_str_radix(&body[..digits], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Builds [`ParsedRecord`]s for every row of one stream.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    header: HeaderSchema,
    strict: bool,
}

impl RecordBuilder {
    pub fn new(header: HeaderSchema, strict: bool) -> Self {
        Self { header, strict }
    }

    pub fn header(&self) -> &HeaderSchema {
        &self.header
    }

    pub fn build(&self, tokens: &[String]) -> Result<ParsedRecord, RowError> {
        if self.strict && tokens.len() != self.header.len() {
            return Err(RowError::Arity {
                expected: self.header.len(),
                found: tokens.len(),
            });
        }
        let raw = nest(&self.header, tokens);
        if self.strict {
            let age = raw.get(AGE_KEY).and_then(RawRecord::as_leaf).unwrap_or("");
            if age.parse::<i64>().is_err() {
                return Err(RowError::InvalidAge(age.to_string()));
            }
        }
        Ok(project(raw))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn header(line: &str) -> HeaderSchema {
        HeaderSchema::parse(line, b',')
    }

    #[test]
    fn nest_builds_intermediate_levels() {
        let raw = nest(&header("a.b.c,a.b.d,a.e,f"), &tokens(&["1", "2", "3", "4"]));
        assert_eq!(raw.get_path(&["a", "b", "c"]).and_then(RawRecord::as_leaf), Some("1"));
        assert_eq!(raw.get_path(&["a", "b", "d"]).and_then(RawRecord::as_leaf), Some("2"));
        assert_eq!(raw.get_path(&["a", "e"]).and_then(RawRecord::as_leaf), Some("3"));
        assert_eq!(raw.get("f").and_then(RawRecord::as_leaf), Some("4"));
    }

    #[test]
    fn short_rows_leave_trailing_paths_absent() {
        let raw = nest(&header("name.firstName,name.lastName,extra.note"), &tokens(&["Ann"]));
        assert_eq!(raw.get_path(&["name", "firstName"]).and_then(RawRecord::as_leaf), Some("Ann"));
        assert!(raw.get_path(&["name", "lastName"]).is_none());
        // intermediate node still exists, leaf does not
        assert_eq!(raw.get("extra"), Some(&RawRecord::default()));
    }

    #[test]
    fn extra_tokens_are_ignored() {
        let raw = nest(&header("age"), &tokens(&["30", "surplus", "more"]));
        assert_eq!(raw.to_json(), json!({"age": "30"}));
    }

    #[test]
    fn scalar_blocks_deeper_path_but_empty_scalar_does_not() {
        let raw = nest(&header("a,a.b"), &tokens(&["x", "y"]));
        assert_eq!(raw.to_json(), json!({"a": "x"}));

        let raw = nest(&header("a,a.b"), &tokens(&["", "y"]));
        assert_eq!(raw.to_json(), json!({"a": {"b": "y"}}));
    }

    #[test]
    fn later_duplicate_path_wins() {
        let raw = nest(&header("x.y,x.y"), &tokens(&["first", "second"]));
        assert_eq!(raw.to_json(), json!({"x": {"y": "second"}}));
        let raw = nest(&header("a.b,a"), &tokens(&["1", "2"]));
        assert_eq!(raw.to_json(), json!({"a": "2"}));
    }

    #[test]
    fn projects_jane_doe() {
        let raw = nest(
            &header("name.firstName,name.lastName,age,address.city"),
            &tokens(&["Jane", "Doe", "34", "Springfield"]),
        );
        let record = project(raw);
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.age, Some(34));
        assert_eq!(
            record.address,
            Address {
                city: Some("Springfield".into()),
                ..Address::default()
            }
        );
        assert!(record.additional_info.is_empty());
    }

    #[test]
    fn non_numeric_age_becomes_sentinel() {
        let raw = nest(&header("name.firstName,name.lastName,age"), &tokens(&["Ann", "Lee", "abc"]));
        let record = project(raw);
        assert_eq!(record.name, "Ann Lee");
        assert_eq!(record.age, None);
        assert!(record.address.is_empty());
        assert!(record.additional_info.is_empty());
    }

    #[test]
    fn missing_name_parts_keep_the_separator() {
        let record = project(nest(&header("name.lastName,age"), &tokens(&["Lee", "5"])));
        assert_eq!(record.name, " Lee");
        let record = project(nest(&header("name.firstName"), &tokens(&["Ann"])));
        assert_eq!(record.name, "Ann ");
        let record = project(nest(&header("age"), &tokens(&["5"])));
        assert_eq!(record.name, " ");
    }

    #[test]
    fn unknown_address_fields_are_dropped() {
        let record = project(nest(
            &header("address.line1,address.zip,address.state"),
            &tokens(&["1 Main St", "12345", "IL"]),
        ));
        assert_eq!(record.address.line1.as_deref(), Some("1 Main St"));
        assert_eq!(record.address.state.as_deref(), Some("IL"));
        assert!(record.additional_info.is_empty());
        assert_eq!(
            serde_json::to_value(&record.address).expect("encode"),
            json!({"line1": "1 Main St", "state": "IL"})
        );
    }

    #[test]
    fn scalar_address_projects_to_empty_address() {
        let record = project(nest(&header("address"), &tokens(&["somewhere"])));
        assert!(record.address.is_empty());
    }

    #[test]
    fn other_groups_land_in_additional_info() {
        let record = project(nest(
            &header("name.firstName,name.lastName,age,job.title,job.org.name,hobby"),
            &tokens(&["Jo", "Ray", "41", "Engineer", "Acme", "chess"]),
        ));
        assert_eq!(
            Value::Object(record.additional_info),
            json!({
                "job": {"title": "Engineer", "org": {"name": "Acme"}},
                "hobby": "chess"
            })
        );
    }

    #[test]
    fn leading_integer_parsing() {
        assert_eq!(parse_leading_integer("34"), Some(34));
        assert_eq!(parse_leading_integer("34abc"), Some(34));
        assert_eq!(parse_leading_integer("3.7"), Some(3));
        assert_eq!(parse_leading_integer("-5"), Some(-5));
        assert_eq!(parse_leading_integer("+8"), Some(8));
        assert_eq!(parse_leading_integer("abc"), None);
        assert_eq!(parse_leading_integer(""), None);
        assert_eq!(parse_leading_integer("-"), None);
        assert_eq!(parse_leading_integer("99999999999999999999"), None);
    }

    #[test]
    fn hex_prefix_is_honoured() {
        assert_eq!(parse_leading_integer("0x1A"), Some(26));
        assert_eq!(parse_leading_integer("0X1f years"), Some(31));
        assert_eq!(parse_leading_integer("-0x10"), Some(-16));
        assert_eq!(parse_leading_integer("0x"), None);
        assert_eq!(parse_leading_integer("0xg"), None);
        assert_eq!(parse_leading_integer("012"), Some(12));
    }

    #[test]
    fn strict_builder_rejects_shape_problems() {
        let builder = RecordBuilder::new(header("name.firstName,name.lastName,age"), true);
        assert_eq!(
            builder.build(&tokens(&["Ann", "Lee"])),
            Err(RowError::Arity {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            builder.build(&tokens(&["Ann", "Lee", "34abc"])),
            Err(RowError::InvalidAge("34abc".into()))
        );
        let record = builder.build(&tokens(&["Ann", "Lee", "34"])).expect("valid row");
        assert_eq!(record.age, Some(34));
    }

    #[test]
    fn lenient_builder_accepts_shape_problems() {
        let builder = RecordBuilder::new(header("name.firstName,name.lastName,age"), false);
        let record = builder.build(&tokens(&["Ann"])).expect("lenient");
        assert_eq!(record.name, "Ann ");
        assert_eq!(record.age, None);
    }
}
