//! Variable type registry and the coerced values path variables produce.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// The type of a `{name:type}` placeholder.
///
/// Each type carries the regular expression one path segment must match and
/// the native Rust type the segment is converted into. Tags are looked up
/// case-insensitively and unknown tags fall back to [`VarType::Str`].
///
/// | Tag       | Native type | Segment pattern                                  |
/// |-----------|-------------|--------------------------------------------------|
/// | `str`     | `String`    | URL-safe characters, no `/`                      |
/// | `int64`   | `i64`       | optionally signed decimal integer                |
/// | `float64` | `f64`       | optionally signed decimal, optional fraction     |
/// | `uuid4`   | `Uuid`      | lowercase UUIDv4, dashed or undashed             |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Str,
    Int64,
    Float64,
    Uuid4,
}

impl VarType {
    pub const ALL: [VarType; 4] = [VarType::Str, VarType::Int64, VarType::Float64, VarType::Uuid4];

    /// Resolves a type tag. Never fails: unknown tags resolve to `Str`.
    ///
    /// ```
    /// use pathrouter::router::VarType;
    ///
    /// assert_eq!(VarType::lookup("INT64"), VarType::Int64);
    /// assert_eq!(VarType::lookup("date"), VarType::Str);
    /// ```
    pub fn lookup(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
            .unwrap_or(VarType::Str)
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Uuid4 => "uuid4",
        }
    }

    /// Unanchored pattern for a single segment. None of them can match `/`.
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Str => r"[-a-zA-Z0-9@:%._+~#=]+",
            Self::Int64 => r"[-+]?[0-9]+",
            Self::Float64 => r"[-+]?(?:[0-9]*\.)?[0-9]+",
            Self::Uuid4 => {
                r"(?:[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}|[0-9a-f]{12}4[0-9a-f]{3}[89ab][0-9a-f]{15})"
            }
        }
    }

    /// Converts a segment that already matched [`pattern`](Self::pattern).
    ///
    /// Returns `None` only when the pattern admits a literal the native type
    /// cannot hold, e.g. an `int64` segment wider than 64 bits.
    pub fn coerce(self, raw: &str) -> Option<PathValue> {
        match self {
            Self::Str => Some(PathValue::Str(raw.to_owned())),
            Self::Int64 => raw.parse().ok().map(PathValue::Int),
            Self::Float64 => raw.parse().ok().map(PathValue::Float),
            Self::Uuid4 => Uuid::parse_str(raw).ok().map(PathValue::Uuid),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A path variable converted to its native type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathValue {
    Str(String),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
}

impl PathValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Uuid(id) => write!(f, "{id}"),
        }
    }
}

/// Named arguments handed to a handler: variable name → coerced value.
///
/// Serializes as a plain JSON object, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PathArgs {
    map: BTreeMap<String, PathValue>,
}

impl PathArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value. A later variable with the same name replaces an earlier one.
    pub fn insert(&mut self, name: impl Into<String>, value: PathValue) {
        self.map.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PathValue> {
        self.map.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PathValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PathValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(PathValue::as_f64)
    }

    pub fn get_uuid(&self, name: &str) -> Option<Uuid> {
        self.get(name).and_then(PathValue::as_uuid)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathValue)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn segment_matches(kind: VarType, segment: &str) -> bool {
        Regex::new(&format!("^(?:{})$", kind.pattern()))
            .unwrap()
            .is_match(segment)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(VarType::lookup("str"), VarType::Str);
        assert_eq!(VarType::lookup("Int64"), VarType::Int64);
        assert_eq!(VarType::lookup("FLOAT64"), VarType::Float64);
        assert_eq!(VarType::lookup("uUiD4"), VarType::Uuid4);
    }

    #[test]
    fn unknown_tags_fall_back_to_str() {
        assert_eq!(VarType::lookup("date"), VarType::Str);
        assert_eq!(VarType::lookup(""), VarType::Str);
        assert_eq!(VarType::lookup("int32"), VarType::Str);
    }

    #[test]
    fn str_pattern_rejects_slash() {
        assert!(segment_matches(VarType::Str, "abc-1"));
        assert!(segment_matches(VarType::Str, "user@example.com"));
        assert!(!segment_matches(VarType::Str, "a/b"));
        assert!(!segment_matches(VarType::Str, ""));
    }

    #[test]
    fn int_pattern_accepts_signs_only_with_digits() {
        for ok in ["0", "42", "-7", "+13"] {
            assert!(segment_matches(VarType::Int64, ok), "{ok}");
        }
        for bad in ["abc", "4.2", "-", "1e3", "٣"] {
            assert!(!segment_matches(VarType::Int64, bad), "{bad}");
        }
    }

    #[test]
    fn float_pattern() {
        for ok in ["1", "1.5", "-0.25", "+.5", ".5"] {
            assert!(segment_matches(VarType::Float64, ok), "{ok}");
        }
        for bad in ["1.", "abc", "1.2.3", "NaN"] {
            assert!(!segment_matches(VarType::Float64, bad), "{bad}");
        }
    }

    #[test]
    fn uuid_pattern_accepts_dashed_and_undashed_v4() {
        assert!(segment_matches(VarType::Uuid4, "9b2f6c1e-3a4d-4e5f-8a6b-7c8d9e0f1a2b"));
        assert!(segment_matches(VarType::Uuid4, "9b2f6c1e3a4d4e5f8a6b7c8d9e0f1a2b"));
        // version nibble must be 4
        assert!(!segment_matches(VarType::Uuid4, "9b2f6c1e-3a4d-1e5f-8a6b-7c8d9e0f1a2b"));
        // mixed dash placement is not canonical
        assert!(!segment_matches(VarType::Uuid4, "9b2f6c1e-3a4d4e5f-8a6b-7c8d9e0f1a2b"));
    }

    #[test]
    fn every_accepted_literal_coerces() {
        assert_eq!(VarType::Int64.coerce("+13"), Some(PathValue::Int(13)));
        assert_eq!(VarType::Float64.coerce("+.5"), Some(PathValue::Float(0.5)));
        assert_eq!(VarType::Float64.coerce("42"), Some(PathValue::Float(42.0)));
        let undashed = VarType::Uuid4.coerce("9b2f6c1e3a4d4e5f8a6b7c8d9e0f1a2b");
        let dashed = VarType::Uuid4.coerce("9b2f6c1e-3a4d-4e5f-8a6b-7c8d9e0f1a2b");
        assert!(undashed.is_some());
        assert_eq!(undashed, dashed);
    }

    #[test]
    fn int_overflow_does_not_coerce() {
        assert_eq!(VarType::Int64.coerce("99999999999999999999"), None);
    }

    #[test]
    fn args_serialize_as_flat_object() {
        let mut args = PathArgs::new();
        args.insert("n", PathValue::Int(42));
        args.insert("kid", PathValue::Str("abc-1".into()));
        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"{"kid":"abc-1","n":42}"#);
        assert_eq!(args.get_i64("n"), Some(42));
        assert_eq!(args.get_str("n"), None);
    }
}
