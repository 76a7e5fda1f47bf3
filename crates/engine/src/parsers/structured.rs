//! Structured-payload field parsers: embedded JSON and `key=value` lists.

use serde_json::{Map, Value};

use super::{Parsed, ParserData};

/// One JSON value starting at the current offset; the remainder of the line
/// is untouched. Produces the parsed value, so a `.`-named edge merges the
/// object into the enclosing record.
pub(super) fn json(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
    match stream.next()? {
        Ok(value) => {
            let len = stream.byte_offset();
            Some(Parsed::new(len, capture.then_some(value)))
        }
        Err(_) => None,
    }
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-'
}

/// One `key=value` pair at the start of `s`: `(consumed, key, value)`.
fn pair(s: &str) -> Option<(usize, &str, &str)> {
    let b = s.as_bytes();
    let key_len = b.iter().take_while(|b| is_key_byte(**b)).count();
    if key_len == 0 || b.get(key_len) != Some(&b'=') {
        return None;
    }
    let key = &s[..key_len];
    let after = &s[key_len + 1..];
    if let Some(quoted) = after.strip_prefix('"') {
        let inner = quoted.find('"')?;
        Some((key_len + 1 + inner + 2, key, &quoted[..inner]))
    } else {
        let value_len = after.find(' ').unwrap_or(after.len());
        Some((key_len + 1 + value_len, key, &after[..value_len]))
    }
}

/// A run of space-separated `key=value` pairs, at least one. Values may be
/// double-quoted. Produces an object, one entry per pair.
pub(super) fn name_value_list(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let mut map = Map::new();
    let (mut consumed, key, value) = pair(rest)?;
    map.insert(key.to_string(), Value::String(value.to_string()));
    loop {
        let Some(after_sep) = rest[consumed..].strip_prefix(' ') else {
            break;
        };
        let Some((len, key, value)) = pair(after_sep) else {
            break;
        };
        map.insert(key.to_string(), Value::String(value.to_string()));
        consumed += 1 + len;
    }
    Some(Parsed::new(consumed, capture.then_some(Value::Object(map))))
}
