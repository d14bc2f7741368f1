//! Lenient deserializers for string-typed config keys.
//!
//! YAML and the environment overlay both type a bare `2` or `1.0` as a
//! number; string keys accept any scalar and keep its text.

use std::collections::BTreeMap;

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

fn scalar_text<E: Error>(value: Value) -> Result<String, E> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        Value::Tagged(tagged) => scalar_text(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => {
            Err(E::custom("invalid type: expected a scalar value"))
        }
    }
}

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?)
}

pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => scalar_text(value).map(Some),
    }
}

/// A sequence of scalars; a single scalar is a one-element list.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.into_iter().map(scalar_text).collect(),
        value => scalar_text(value).map(|item| vec![item]),
    }
}

pub fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(BTreeMap::new()),
        Value::Mapping(map) => map
            .into_iter()
            .map(|(key, value)| Ok((scalar_text(key)?, scalar_text(value)?)))
            .collect(),
        _ => Err(D::Error::custom("invalid type: expected a mapping")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "string")]
        version: String,
        #[serde(default, deserialize_with = "optional_string")]
        level: Option<String>,
        #[serde(default, deserialize_with = "string_list")]
        paths: Vec<String>,
        #[serde(default, deserialize_with = "string_map")]
        headers: BTreeMap<String, String>,
    }

    fn sample(yaml: &str) -> Result<Sample, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    #[test]
    fn test_numbers_and_bools_keep_their_text() {
        let parsed = sample("version: 2\nlevel: true\npaths: [1, out.log]\nheaders: {x-tenant: 42}\n")
            .unwrap();
        assert_eq!(parsed.version, "2");
        assert_eq!(parsed.level.as_deref(), Some("true"));
        assert_eq!(parsed.paths, vec!["1", "out.log"]);
        assert_eq!(parsed.headers["x-tenant"], "42");
    }

    #[test]
    fn test_null_and_single_scalar() {
        let parsed = sample("version: ~\nlevel: ~\npaths: stdout\n").unwrap();
        assert_eq!(parsed.version, "");
        assert_eq!(parsed.level, None);
        assert_eq!(parsed.paths, vec!["stdout"]);
        assert!(parsed.headers.is_empty());
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let err = sample("version: {major: 1}\n").unwrap_err();
        assert!(err.to_string().contains("expected a scalar value"));
    }
}
