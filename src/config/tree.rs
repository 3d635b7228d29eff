//! Cursor over the parsed document tree.
//!
//! The binder walks the generic [`Value`] tree produced by the JSONC parse
//! in a single recursive descent. Every accessor tracks the dot-separated
//! key path from the document root so that errors name the offending key.

use crate::{
    common::*,
    error::{ConfigError, Result},
};

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) struct Node<'a> {
    path: String,
    map: &'a Map<String, Value>,
}

impl<'a> Node<'a> {
    pub fn root(value: &'a Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                path: String::new(),
                map,
            }),
            other => Err(ConfigError::type_mismatch(
                "",
                "an object",
                json_type(other),
            )),
        }
    }

    pub fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_owned()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    fn required(&self, key: &str) -> Result<&'a Value> {
        self.get(key)
            .ok_or_else(|| ConfigError::missing(self.path_of(key)))
    }

    pub fn missing(&self, key: &str) -> ConfigError {
        ConfigError::missing(self.path_of(key))
    }

    pub fn out_of_range(
        &self,
        key: &str,
        constraint: impl Into<String>,
        value: impl Display,
    ) -> ConfigError {
        ConfigError::out_of_range(self.path_of(key), constraint, value)
    }

    pub fn inconsistent(&self, key: &str, message: impl Into<String>) -> ConfigError {
        ConfigError::inconsistent(self.path_of(key), message)
    }

    /// Required nested object.
    pub fn child(&self, key: &str) -> Result<Node<'a>> {
        match self.required(key)? {
            Value::Object(map) => Ok(Node {
                path: self.path_of(key),
                map,
            }),
            other => Err(ConfigError::type_mismatch(
                self.path_of(key),
                "an object",
                json_type(other),
            )),
        }
    }

    /// Optional nested object; `None` when the key is absent.
    pub fn child_opt(&self, key: &str) -> Result<Option<Node<'a>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Node {
                path: self.path_of(key),
                map,
            })),
            Some(other) => Err(ConfigError::type_mismatch(
                self.path_of(key),
                "an object",
                json_type(other),
            )),
        }
    }

    pub fn string(&self, key: &str) -> Result<String> {
        match self.required(key)? {
            Value::String(text) => Ok(text.clone()),
            other => Err(ConfigError::type_mismatch(
                self.path_of(key),
                "a string",
                json_type(other),
            )),
        }
    }

    pub fn string_or(&self, key: &str, default: &str) -> Result<String> {
        match self.get(key) {
            None => Ok(default.to_owned()),
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Err(ConfigError::type_mismatch(
                self.path_of(key),
                "a string",
                json_type(other),
            )),
        }
    }

    pub fn path_buf(&self, key: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(self.string(key)?))
    }

    pub fn boolean_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(other) => Err(ConfigError::type_mismatch(
                self.path_of(key),
                "a boolean",
                json_type(other),
            )),
        }
    }

    /// Required finite float.
    pub fn float(&self, key: &str) -> Result<f64> {
        self.float_value(key, self.required(key)?)
    }

    /// Optional finite float with a schema default.
    pub fn float_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => self.float_value(key, value),
        }
    }

    pub fn nonnegative_float_or(&self, key: &str, default: f64) -> Result<f64> {
        let value = self.float_or(key, default)?;
        if value < 0.0 {
            return Err(self.out_of_range(key, "a non-negative number", value));
        }
        Ok(value)
    }

    fn float_value(&self, key: &str, value: &Value) -> Result<f64> {
        let number = match value {
            Value::Number(number) => number,
            other => {
                return Err(ConfigError::type_mismatch(
                    self.path_of(key),
                    "a number",
                    json_type(other),
                ))
            }
        };
        match number.as_f64().filter(|value| value.is_finite()) {
            Some(value) => Ok(value),
            None => Err(self.out_of_range(key, "a finite number", number)),
        }
    }

    /// Required positive integer.
    pub fn positive_int(&self, key: &str) -> Result<NonZeroUsize> {
        positive_int_value(&self.path_of(key), self.required(key)?)
    }

    /// Required sequence of positive integers. When `expect_len` is given,
    /// a sequence of any other length is a validation error.
    pub fn positive_int_seq(
        &self,
        key: &str,
        expect_len: Option<usize>,
    ) -> Result<Vec<NonZeroUsize>> {
        let path = self.path_of(key);
        let items = match self.required(key)? {
            Value::Array(items) => items,
            other => {
                return Err(ConfigError::type_mismatch(
                    path,
                    "an array of positive integers",
                    json_type(other),
                ))
            }
        };
        if let Some(len) = expect_len {
            if items.len() != len {
                return Err(ConfigError::out_of_range(
                    path,
                    format!("exactly {} elements", len),
                    format!("{} elements", items.len()),
                ));
            }
        }
        items
            .iter()
            .enumerate()
            .map(|(index, item)| positive_int_value(&format!("{}[{}]", path, index), item))
            .collect()
    }

    /// Required keyword field, matched exactly against a fixed allowed set.
    pub fn keyword<T>(
        &self,
        key: &str,
        allowed: &'static [&'static str],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T> {
        self.keyword_value(key, allowed, parse, self.required(key)?)
    }

    /// Optional keyword field; `None` when the key is absent.
    pub fn keyword_opt<T>(
        &self,
        key: &str,
        allowed: &'static [&'static str],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => self.keyword_value(key, allowed, parse, value).map(Some),
        }
    }

    fn keyword_value<T>(
        &self,
        key: &str,
        allowed: &'static [&'static str],
        parse: impl Fn(&str) -> Option<T>,
        value: &Value,
    ) -> Result<T> {
        let text = match value {
            Value::String(text) => text,
            other => {
                return Err(ConfigError::type_mismatch(
                    self.path_of(key),
                    "a keyword string",
                    json_type(other),
                ))
            }
        };
        parse(text).ok_or_else(|| ConfigError::unknown_keyword(self.path_of(key), allowed, text.clone()))
    }

    /// Required sequence of keyword strings, each matched against the
    /// allowed set; errors are indexed (`dataset[1]`).
    pub fn keyword_seq<T>(
        &self,
        key: &str,
        allowed: &'static [&'static str],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Vec<T>> {
        let path = self.path_of(key);
        let items = match self.required(key)? {
            Value::Array(items) => items,
            other => {
                return Err(ConfigError::type_mismatch(
                    path,
                    "an array of keywords",
                    json_type(other),
                ))
            }
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let item_path = format!("{}[{}]", path, index);
                let text = match item {
                    Value::String(text) => text,
                    other => {
                        return Err(ConfigError::type_mismatch(
                            item_path,
                            "a keyword string",
                            json_type(other),
                        ))
                    }
                };
                parse(text).ok_or_else(|| ConfigError::unknown_keyword(item_path, allowed, text.clone()))
            })
            .collect()
    }
}

// The json5 parser hands every number over as a double, so integers arrive
// as e.g. 32.0 and never satisfy Number::as_u64 directly.
fn positive_int_value(path: &str, value: &Value) -> Result<NonZeroUsize> {
    let number = match value {
        Value::Number(number) => number,
        other => {
            return Err(ConfigError::type_mismatch(
                path,
                "a positive integer",
                json_type(other),
            ))
        }
    };
    let integer = number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.fract() == 0.0 && *value >= 0.0 && *value <= usize::MAX as f64)
            .map(|value| value as u64)
    });
    integer
        .and_then(|value| usize::try_from(value).ok())
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| ConfigError::out_of_range(path, "a positive integer", number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationReason;

    fn parse(text: &str) -> Value {
        json5::from_str(text).unwrap()
    }

    #[test]
    fn missing_key_names_the_full_path() {
        let doc = parse(r#"{ outer: { present: 1 } }"#);
        let root = Node::root(&doc).unwrap();
        let outer = root.child("outer").unwrap();
        let err = outer.string("absent").unwrap_err();
        assert_eq!(err.path(), Some("outer.absent"));
    }

    #[test]
    fn type_mismatch_reports_json_type() {
        let doc = parse(r#"{ flag: "yes" }"#);
        let root = Node::root(&doc).unwrap();
        let err = root.boolean_or("flag", false).unwrap_err();
        match err {
            ConfigError::Validation { reason, .. } => assert_eq!(
                reason,
                ValidationReason::TypeMismatch {
                    expected: "a boolean",
                    found: "a string",
                }
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn integers_survive_the_double_representation() {
        let doc = parse(r#"{ batch_size: 32 }"#);
        let root = Node::root(&doc).unwrap();
        assert_eq!(root.positive_int("batch_size").unwrap().get(), 32);
    }

    #[test]
    fn zero_and_fractional_are_not_positive_integers() {
        let doc = parse(r#"{ zero: 0, frac: 2.5 }"#);
        let root = Node::root(&doc).unwrap();
        assert!(root.positive_int("zero").is_err());
        assert!(root.positive_int("frac").is_err());
    }

    #[test]
    fn fixed_length_sequence_is_enforced() {
        let doc = parse(r#"{ image_size: [256, 256, 3] }"#);
        let root = Node::root(&doc).unwrap();
        let err = root.positive_int_seq("image_size", Some(2)).unwrap_err();
        assert_eq!(err.path(), Some("image_size"));
    }

    #[test]
    fn sequence_errors_are_indexed() {
        let doc = parse(r#"{ layers: [3, -4, 6, 3] }"#);
        let root = Node::root(&doc).unwrap();
        let err = root.positive_int_seq("layers", None).unwrap_err();
        assert_eq!(err.path(), Some("layers[1]"));
    }

    #[test]
    fn keywords_match_exactly() {
        const ALLOWED: &[&str] = &["stepLR", "multiStepLR"];
        let parse_name = |text: &str| ALLOWED.iter().find(|name| **name == text).copied();

        let doc = parse(r#"{ name: "stepLR" }"#);
        let root = Node::root(&doc).unwrap();
        assert_eq!(root.keyword("name", ALLOWED, parse_name).unwrap(), "stepLR");

        let doc = parse(r#"{ name: "steplr" }"#);
        let root = Node::root(&doc).unwrap();
        let err = root.keyword("name", ALLOWED, parse_name).unwrap_err();
        assert!(err.to_string().contains("stepLR, multiStepLR"));
    }

    #[test]
    fn defaults_fill_absent_optional_keys() {
        let doc = parse(r#"{}"#);
        let root = Node::root(&doc).unwrap();
        assert_eq!(root.string_or("log_file", "logs.txt").unwrap(), "logs.txt");
        assert_eq!(root.float_or("z_weight", 1.0).unwrap(), 1.0);
        assert!(root.boolean_or("shuffle_data", true).unwrap());
    }
}
