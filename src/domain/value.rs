use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Dynamically typed value manipulated by condition expressions.
///
/// Numbers are fixed-point decimals so that every node computes the same
/// result; maps are ordered so iteration and encoding are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(Decimal),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the runtime type, used in type mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Approximate size: one unit per scalar, element or entry, plus one
    /// per byte of string data and map keys.
    pub fn footprint(&self) -> usize {
        match self {
            Value::Nil | Value::Bool(_) | Value::Number(_) => 1,
            Value::String(s) => s.len().max(1),
            Value::List(items) => items
                .iter()
                .fold(1usize, |acc, item| acc.saturating_add(item.footprint())),
            Value::Map(map) => map.iter().fold(1usize, |acc, (key, item)| {
                acc.saturating_add(key.len()).saturating_add(item.footprint())
            }),
        }
    }

    /// Convert a JSON document into a value.
    ///
    /// Integers are taken verbatim; other numbers go through their shortest
    /// textual form so the conversion never depends on float formatting
    /// details of the host. Numbers outside the decimal range become `Nil`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => number_from_json(n).map_or(Value::Nil, Value::Number),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Canonical JSON text: sorted keys, no whitespace, normalized numbers.
    pub fn to_json_string(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    fn write_json(&self, out: &mut String) {
        match self {
            Value::Nil => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&n.normalize().to_string()),
            Value::String(s) => push_json_str(out, s),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_json(out);
                }
                out.push(']');
            }
            Value::Map(map) => {
                out.push('{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    push_json_str(out, key);
                    out.push(':');
                    item.write_json(out);
                }
                out.push('}');
            }
        }
    }
}

fn push_json_str(out: &mut String, s: &str) {
    // serde_json escaping of a plain &str cannot fail
    match serde_json::to_string(s) {
        Ok(escaped) => out.push_str(&escaped),
        Err(_) => out.push_str("\"\""),
    }
}

fn number_from_json(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            other => write!(f, "{}", other.to_json_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match n.fract().is_zero().then(|| n.to_i64()).flatten() {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_str(&n.normalize().to_string()),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from_json(&json))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(Decimal::from(n as u64))
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_equality_ignores_scale() {
        assert_eq!(
            Value::Number(Decimal::new(10, 1)),
            Value::Number(Decimal::new(1, 0))
        );
    }

    #[test]
    fn test_footprint_counts_nested_data() {
        assert_eq!(Value::Nil.footprint(), 1);
        assert_eq!(Value::from("").footprint(), 1);
        assert_eq!(Value::from("abcd").footprint(), 4);

        let value = Value::Map(BTreeMap::from([(
            "ab".to_string(),
            Value::List(vec![Value::from("xyz"), Value::Bool(true)]),
        )]));
        // map 1 + key 2 + list 1 + "xyz" 3 + bool 1
        assert_eq!(value.footprint(), 8);
    }

    #[test]
    fn test_from_json_preserves_structure() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"b": [1, "x", null], "a": {"c": true}, "d": 0.5}"#).unwrap();
        let value = Value::from_json(&json);

        let map = value.as_map().unwrap();
        assert_eq!(map["a"], Value::Map(BTreeMap::from([("c".to_string(), Value::Bool(true))])));
        assert_eq!(
            map["b"],
            Value::List(vec![Value::from(1i64), Value::from("x"), Value::Nil])
        );
        assert_eq!(map["d"], Value::Number(Decimal::new(5, 1)));
    }

    #[test]
    fn test_canonical_json_is_sorted_and_compact() {
        let value = Value::Map(BTreeMap::from([
            ("z".to_string(), Value::Number(Decimal::new(1500, 3))),
            ("a".to_string(), Value::from("q\"uote")),
        ]));

        assert_eq!(value.to_json_string(), r#"{"a":"q\"uote","z":1.5}"#);
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let value: Value = serde_yaml::from_str("[1, two, {k: 3}]").unwrap();
        assert_eq!(value.as_list().unwrap().len(), 3);
        assert_eq!(value.as_list().unwrap()[1], Value::from("two"));
    }

    #[test]
    fn test_serialize_numbers() {
        assert_eq!(serde_json::to_string(&Value::from(42i64)).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&Value::Number(Decimal::new(125, 2))).unwrap(),
            "\"1.25\""
        );
    }
}
