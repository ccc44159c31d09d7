//! Lenient deserializers for OSM's loosely typed JSON.
//!
//! OSM encodes identifiers as strings in some responses and numbers in
//! others, and flags as `true`, `"1"` or `1` depending on the endpoint.

use std::marker::PhantomData;

use serde::de::{self, IgnoredAny};
use serde::Deserialize;
use serde_json::Value;

/// Deserialize a string, number or null into a `String` (null → empty).
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct StringOrNumberVisitor;

    impl<'de> de::Visitor<'de> for StringOrNumberVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

/// Deserialize `true`/`false`, `1`/`0`, `"1"`/`"0"` or `"true"`/`"false"`.
pub fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct BoolVisitor;

    impl<'de> de::Visitor<'de> for BoolVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a boolean, 0/1, or string flag")
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v != 0)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v != 0)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(false)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(BoolVisitor)
}

/// Deserialize a keyed object into its entries, in response order,
/// accepting `[]` for "no entries".
///
/// PHP serializes an empty associative array as a JSON list.
pub fn entries_or_empty<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: serde::Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> de::Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an object or an empty list")
        }

        fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            match seq.next_element::<IgnoredAny>()? {
                None => Ok(Vec::new()),
                Some(_) => Err(de::Error::custom("expected an object, found a non-empty list")),
            }
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(EntriesVisitor(PhantomData))
}

/// Render a loose JSON scalar as the string OSM meant.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Record {
        #[serde(deserialize_with = "string_or_number")]
        id: String,
        #[serde(default, deserialize_with = "flexible_bool")]
        active: bool,
    }

    #[test]
    fn test_string_or_number() {
        let r: Record = serde_json::from_str(r#"{"id": 12}"#).unwrap();
        assert_eq!(r.id, "12");
        let r: Record = serde_json::from_str(r#"{"id": "12"}"#).unwrap();
        assert_eq!(r.id, "12");
        let r: Record = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert_eq!(r.id, "");
    }

    #[test]
    fn test_flexible_bool() {
        for (json, expected) in [
            (r#"{"id":"1","active":true}"#, true),
            (r#"{"id":"1","active":"1"}"#, true),
            (r#"{"id":"1","active":1}"#, true),
            (r#"{"id":"1","active":"0"}"#, false),
            (r#"{"id":"1","active":false}"#, false),
            (r#"{"id":"1"}"#, false),
        ] {
            let r: Record = serde_json::from_str(json).unwrap();
            assert_eq!(r.active, expected, "{}", json);
        }
    }

    #[derive(Deserialize)]
    struct Keyed {
        #[serde(deserialize_with = "entries_or_empty")]
        data: Vec<(String, u32)>,
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        #[allow(dead_code)]
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct KeyedNamed {
        #[serde(deserialize_with = "entries_or_empty")]
        #[allow(dead_code)]
        data: Vec<(String, Named)>,
    }

    #[test]
    fn test_entries_keep_response_order() {
        let k: Keyed = serde_json::from_str(r#"{"data": {"99": 1, "100": 2, "5": 3}}"#).unwrap();
        let keys: Vec<&str> = k.data.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["99", "100", "5"]);
        assert_eq!(k.data[1].1, 2);
    }

    #[test]
    fn test_entries_accept_empty_list() {
        let k: Keyed = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(k.data.is_empty());
        assert!(serde_json::from_str::<Keyed>(r#"{"data": [1]}"#).is_err());
    }

    #[test]
    fn test_entry_error_keeps_field_context() {
        let err = serde_json::from_str::<KeyedNamed>(r#"{"data": {"1": {"name": "a"}, "2": {}}}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("missing field `name`"), "{}", err);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&Value::from("Yes")), "Yes");
        assert_eq!(value_to_string(&Value::from(3)), "3");
        assert_eq!(value_to_string(&Value::Null), "");
        assert_eq!(value_to_string(&Value::Bool(true)), "true");
    }
}
