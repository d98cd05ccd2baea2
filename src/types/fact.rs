use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::EngineError;

/// Key under which the match path is written onto every fact when an
/// execution finishes.
pub const MATCH_PATH_KEY: &str = "matchPath";

/// A single structured record in the working set.
///
/// Fields are addressed by dot-separated paths like `"user.profile.age"`.
/// Cloning a `Fact` is a deep clone and `==` is deep equality, which is what
/// the engine relies on for mutation detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fact {
    data: Map<String, Value>,
}

impl Fact {
    /// Create an empty fact.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value at a dot-separated path. Creates intermediate objects as needed.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    /// Insert a value at a dot-separated path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = path.split('.').collect();
        Self::insert_recursive(&mut self.data, &segments, value.into());
    }

    /// Look up a value by dot-separated path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        Self::get_recursive(&self.data, &segments)
    }

    /// Remove the value at a dot-separated path, returning it if present.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        Self::remove_recursive(&mut self.data, &segments)
    }

    /// The rule references recorded by the last execution, if this fact has
    /// been through one.
    #[must_use]
    pub fn match_path(&self) -> Option<Vec<&str>> {
        match self.data.get(MATCH_PATH_KEY)? {
            Value::Array(items) => items.iter().map(Value::as_str).collect(),
            _ => None,
        }
    }

    pub(crate) fn set_match_path(&mut self, path: &[String]) {
        let items = path.iter().cloned().map(Value::String).collect();
        self.data.insert(MATCH_PATH_KEY.to_owned(), Value::Array(items));
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Convert into a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }

    fn insert_recursive(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
        match segments {
            [] => {}
            [last] => {
                map.insert((*last).to_owned(), value);
            }
            [first, rest @ ..] => {
                let entry = map
                    .entry((*first).to_owned())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                if let Value::Object(nested) = entry {
                    Self::insert_recursive(nested, rest, value);
                }
            }
        }
    }

    fn get_recursive<'a>(map: &'a Map<String, Value>, segments: &[&str]) -> Option<&'a Value> {
        match segments {
            [] => None,
            [last] => map.get(*last),
            [first, rest @ ..] => match map.get(*first)? {
                Value::Object(nested) => Self::get_recursive(nested, rest),
                _ => None,
            },
        }
    }

    fn remove_recursive(map: &mut Map<String, Value>, segments: &[&str]) -> Option<Value> {
        match segments {
            [] => None,
            [last] => map.remove(*last),
            [first, rest @ ..] => match map.get_mut(*first)? {
                Value::Object(nested) => Self::remove_recursive(nested, rest),
                _ => None,
            },
        }
    }
}

impl From<Map<String, Value>> for Fact {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl TryFrom<Value> for Fact {
    type Error = EngineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(EngineError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }
}

impl From<Fact> for Value {
    fn from(fact: Fact) -> Self {
        fact.into_value()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
