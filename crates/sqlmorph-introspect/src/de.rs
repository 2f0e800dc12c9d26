//! Lenient deserializers for catalog values.
//!
//! Engines disagree on how they report flags and lists: PostgreSQL has real
//! booleans and arrays, MySQL reports flags as integers and lists as
//! `GROUP_CONCAT` strings, SQL Server returns `bit`s.

use serde::de::{Deserialize, Deserializer, Error};
use serde_json::Value;

/// `true`, `1`, `'YES'`, `'Y'`, `'t'` and `'1'` are truthy; null is false.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(value) => Ok(value),
        Value::Number(number) => Ok(number.as_f64().is_some_and(|value| value != 0.0)),
        Value::String(text) => Ok(matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "1" | "y" | "yes" | "t" | "true" | "on"
        )),
        other => Err(D::Error::custom(format!("expected a flag, found {other}"))),
    }
}

/// Integers that may arrive as numbers or numeric strings.
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number
            .as_i64()
            .or_else(|| number.as_u64().map(|value| value.min(i64::MAX as u64) as i64))
            .or_else(|| number.as_f64().map(|value| value as i64))),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|err| D::Error::custom(format!("invalid integer '{text}': {err}"))),
        other => Err(D::Error::custom(format!("expected an integer, found {other}"))),
    }
}

pub fn i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_i64(deserializer)?.unwrap_or_default())
}

/// Lists reported either as arrays or as comma-separated strings.
pub fn list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect()),
        Value::String(text) if text.is_empty() => Ok(Vec::new()),
        Value::String(text) => Ok(text.split(',').map(|item| item.trim().to_string()).collect()),
        other => Err(D::Error::custom(format!("expected a list, found {other}"))),
    }
}

pub fn id_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    list(deserializer)?
        .into_iter()
        .map(|item| {
            item.parse::<i64>()
                .map_err(|err| D::Error::custom(format!("invalid id '{item}': {err}")))
        })
        .collect()
}

/// Text that may be null; null becomes the empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::flag")]
        flag: bool,
        #[serde(default, deserialize_with = "super::opt_i64")]
        number: Option<i64>,
        #[serde(default, deserialize_with = "super::list")]
        items: Vec<String>,
        #[serde(default, deserialize_with = "super::id_list")]
        ids: Vec<i64>,
    }

    #[test]
    fn accepts_each_engine_spelling() {
        let probe: Probe = serde_json::from_value(json!({
            "flag": "YES",
            "number": "42",
            "items": "a,b, c",
            "ids": ["23", 25]
        }))
        .unwrap();
        assert!(probe.flag);
        assert_eq!(probe.number, Some(42));
        assert_eq!(probe.items, vec!["a", "b", "c"]);
        assert_eq!(probe.ids, vec![23, 25]);

        let probe: Probe = serde_json::from_value(json!({
            "flag": 0,
            "number": null,
            "items": null
        }))
        .unwrap();
        assert!(!probe.flag);
        assert_eq!(probe.number, None);
        assert!(probe.items.is_empty());
        assert!(probe.ids.is_empty());
    }
}
