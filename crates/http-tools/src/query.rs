//! Query-string serialization following `OpenAPI` parameter styles.

use crate::catalog::QuerySerialization;
use openapiv3::QueryStyle;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryPair {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) allow_reserved: bool,
}

impl QueryPair {
    pub(crate) fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            allow_reserved: false,
        }
    }
}

/// Serialize one argument into zero or more query pairs.
///
/// Empty values (`""`, `[]`, `{}`) are dropped unless the parameter is required or allows empty
/// values.
pub(crate) fn serialize_query_param(
    name: &str,
    value: &Value,
    required: bool,
    ser: &QuerySerialization,
) -> Vec<QueryPair> {
    let allow_reserved = ser.allow_reserved;
    let pair = |key: String, value: String| QueryPair {
        key,
        value,
        allow_reserved,
    };

    if is_empty_query_value(value) {
        return if ser.allow_empty_value || required {
            vec![pair(name.to_string(), String::new())]
        } else {
            Vec::new()
        };
    }

    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(value_to_string).collect();
            match ser.style {
                QueryStyle::Form if ser.explode => items
                    .into_iter()
                    .map(|v| pair(name.to_string(), v))
                    .collect(),
                QueryStyle::SpaceDelimited => vec![pair(name.to_string(), items.join(" "))],
                QueryStyle::PipeDelimited => vec![pair(name.to_string(), items.join("|"))],
                QueryStyle::Form | QueryStyle::DeepObject => {
                    vec![pair(name.to_string(), items.join(","))]
                }
            }
        }
        Value::Object(map) => match ser.style {
            QueryStyle::DeepObject => map
                .iter()
                .map(|(k, v)| pair(format!("{name}[{k}]"), value_to_string(v)))
                .collect(),
            QueryStyle::Form if ser.explode => map
                .iter()
                .map(|(k, v)| pair(k.clone(), value_to_string(v)))
                .collect(),
            QueryStyle::Form => {
                let flat: Vec<String> = map
                    .iter()
                    .flat_map(|(k, v)| [k.clone(), value_to_string(v)])
                    .collect();
                vec![pair(name.to_string(), flat.join(","))]
            }
            QueryStyle::SpaceDelimited | QueryStyle::PipeDelimited => {
                vec![pair(name.to_string(), object_to_json(map))]
            }
        },
        _ => vec![pair(name.to_string(), value_to_string(value))],
    }
}

/// Join pairs into a query string (without the leading `?`).
pub(crate) fn build_query_string(pairs: &[QueryPair]) -> String {
    pairs
        .iter()
        .map(|p| {
            let keep_in_value: fn(u8) -> bool = if p.allow_reserved {
                is_unreserved_or_reserved
            } else {
                is_unreserved
            };
            format!(
                "{}={}",
                percent_encode(&p.key, is_unreserved),
                percent_encode(&p.value, keep_in_value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Encode a value for use as a single path segment.
pub(crate) fn encode_path_segment(s: &str) -> String {
    percent_encode(s, is_path_safe)
}

/// Render a JSON value the way it appears in a URL or header.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn object_to_json(map: &Map<String, Value>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

fn is_empty_query_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

fn percent_encode(s: &str, keep: fn(u8) -> bool) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if keep(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}

// `&` and `=` stay encoded even when reserved characters are allowed, so pairs still split.
fn is_unreserved_or_reserved(b: u8) -> bool {
    is_unreserved(b)
        || matches!(
            b,
            b':' | b'/'
                | b'?'
                | b'['
                | b']'
                | b'@'
                | b'!'
                | b'$'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
        )
}

fn is_path_safe(b: u8) -> bool {
    is_unreserved(b)
        || matches!(
            b,
            b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=' | b':' | b'@'
        )
}
