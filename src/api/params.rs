//! Named request parameters
//!
//! Lookups return `None` both when a key is missing and when its value has
//! the wrong shape; handlers turn that into an invalid-params response.

use serde_json::{Map, Value};

use super::errors::RpcError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Accept a JSON object; `null` means no parameters
    pub fn from_value(value: Value) -> Result<Self, RpcError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(RpcError::invalid_params("params must be a json object")),
        }
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Signed integer given as a whole number or a decimal string
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Non-negative integer that fits in 32 bits
    pub fn uint(&self, key: &str) -> Option<u32> {
        self.int(key).and_then(|n| u32::try_from(n).ok())
    }

    /// Array of strings; any non-string element rejects the whole array
    pub fn array_string(&self, key: &str) -> Option<Vec<String>> {
        self.0
            .get(key)?
            .as_array()?
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        Params::from_value(value).unwrap()
    }

    #[test]
    fn test_numbers() {
        let p = params(json!({"a": 7, "b": 3.0, "c": "12", "d": -1, "e": 1.5, "f": true}));
        assert_eq!(p.int("a"), Some(7));
        assert_eq!(p.int("b"), Some(3));
        assert_eq!(p.int("c"), Some(12));
        assert_eq!(p.int("e"), None);
        assert_eq!(p.int("f"), None);
        assert_eq!(p.uint("d"), None);
        assert_eq!(p.uint("a"), Some(7));
        assert_eq!(p.int("missing"), None);
    }

    #[test]
    fn test_strings_and_arrays() {
        let p = params(json!({"s": "x", "arr": ["a", "b"], "mixed": ["a", 1], "flag": false}));
        assert_eq!(p.string("s"), Some("x"));
        assert_eq!(p.string("arr"), None);
        assert_eq!(p.array_string("arr"), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(p.array_string("mixed"), None);
        assert_eq!(p.bool("flag"), Some(false));
    }

    #[test]
    fn test_shape() {
        assert!(params(Value::Null).is_empty());
        assert!(Params::from_value(json!([1, 2])).is_err());
    }
}
