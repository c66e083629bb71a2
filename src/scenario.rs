use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

/// One independent request/assert unit.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub expected_status: u16,
    pub expectations: Vec<(JsonPath, Predicate)>,
}

impl Scenario {
    pub fn new(name: &str, method: Method, path: &str) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            body: None,
            expected_status: 200,
            expectations: vec![],
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// Adds a JSON path assertion, checked in insertion order.
    pub fn expect_json(mut self, path: &str, predicate: Predicate) -> Result<Self, JsonPathError> {
        let path = JsonPath::from_str(path)?;
        self.expectations.push((path, predicate));
        Ok(self)
    }

    /// Value of a top level field in the request body, used for equality
    /// against echoed input.
    pub fn input(&self, field: &str) -> Value {
        self.body
            .as_ref()
            .and_then(|b| b.get(field))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Path into a decoded JSON body: dotted keys with optional `[n]` indices,
/// e.g. `data[0].name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JsonPathError {
    #[error("path is empty")]
    Empty,
    #[error("empty key at byte {0}")]
    EmptyKey(usize),
    #[error("unclosed `[` at byte {0}")]
    UnclosedIndex(usize),
    #[error("`{0}` is not an array index")]
    BadIndex(String),
}

impl FromStr for JsonPath {
    type Err = JsonPathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(JsonPathError::Empty);
        }

        let mut segments = vec![];
        let mut offset = 0;

        for part in raw.split('.') {
            let key_end = part.find('[').unwrap_or(part.len());
            let key = &part[..key_end];

            // `[0].id` style parts are allowed only after a key
            if key.is_empty() && (key_end == part.len() || segments.is_empty()) {
                return Err(JsonPathError::EmptyKey(offset));
            }
            if !key.is_empty() {
                segments.push(Segment::Key(key.into()));
            }

            let mut rest = &part[key_end..];
            let mut pos = offset + key_end;
            while let Some(stripped) = rest.strip_prefix('[') {
                let close = stripped.find(']').ok_or(JsonPathError::UnclosedIndex(pos))?;
                let index = &stripped[..close];
                let index = index
                    .parse::<usize>()
                    .map_err(|_| JsonPathError::BadIndex(index.into()))?;
                segments.push(Segment::Index(index));
                rest = &stripped[close + 1..];
                pos += close + 2;
            }

            if !rest.is_empty() {
                return Err(JsonPathError::BadIndex(rest.into()));
            }

            offset += part.len() + 1;
        }

        Ok(Self {
            raw: raw.into(),
            segments,
        })
    }
}

impl JsonPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |value, segment| match segment {
                Segment::Key(key) => value.get(key.as_str()),
                Segment::Index(i) => value.get(*i),
            })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    NotNull,
    Contains(String),
    Equals(Value),
    NonEmptyArray,
    HasKeys(Vec<String>),
}

impl Predicate {
    /// Checks a resolved value. `None` means the path did not resolve.
    pub fn holds(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match self {
            Predicate::NotNull => !value.is_null(),
            Predicate::Contains(needle) => value.as_str().is_some_and(|s| s.contains(needle)),
            Predicate::Equals(expected) => value == expected,
            Predicate::NonEmptyArray => value.as_array().is_some_and(|a| !a.is_empty()),
            Predicate::HasKeys(keys) => value
                .as_object()
                .is_some_and(|o| keys.iter().all(|k| o.contains_key(k))),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::NotNull => write!(f, "not null"),
            Predicate::Contains(s) => write!(f, "contains {s:?}"),
            Predicate::Equals(v) => write!(f, "equals {v}"),
            Predicate::NonEmptyArray => write!(f, "non-empty array"),
            Predicate::HasKeys(keys) => write!(f, "has keys [{}]", keys.join(", ")),
        }
    }
}
