//! Text-shaped field parsers: literals, numbers, words, quoted strings and
//! the terminator-driven family (`string-to`, `char-to`, `char-sep`).

use serde_json::{Number, Value};

use crate::error::BuildError;

use super::{Parsed, ParserData};

fn capture_str(capture: bool, s: &str) -> Option<Value> {
    capture.then(|| Value::String(s.to_string()))
}

fn one_char(parser: &'static str, extra: Option<&str>) -> Result<char, BuildError> {
    let extra = extra.ok_or(BuildError::MissingArgument { parser })?;
    let mut chars = extra.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(BuildError::BadArgument {
            parser,
            reason: format!("expected exactly one character, got '{extra}'"),
        }),
    }
}

pub(super) fn construct_literal(extra: Option<&str>, _config: Option<&Value>) -> Result<ParserData, BuildError> {
    let lit = extra.ok_or(BuildError::MissingArgument { parser: "literal" })?;
    Ok(ParserData::Literal(lit.to_string()))
}

pub(super) fn literal(input: &str, offs: usize, data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let Some(ParserData::Literal(lit)) = data else {
        return None;
    };
    if !input[offs..].starts_with(lit.as_str()) {
        return None;
    }
    Some(Parsed::new(lit.len(), capture_str(capture, lit)))
}

pub(super) fn number(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if len == 0 {
        return None;
    }
    let text = &rest[..len];
    let value = capture.then(|| match text.parse::<u64>() {
        Ok(n) => Value::Number(Number::from(n)),
        Err(_) => Value::String(text.to_string()),
    });
    Some(Parsed::new(len, value))
}

pub(super) fn float(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = input[offs..].as_bytes();
    let mut i = 0;
    if rest.first() == Some(&b'-') {
        i += 1;
    }
    let int_digits = rest[i..].iter().take_while(|b| b.is_ascii_digit()).count();
    i += int_digits;
    if int_digits == 0 {
        return None;
    }
    if rest.get(i) == Some(&b'.') {
        let frac_digits = rest[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    let text = &input[offs..offs + i];
    let value = capture.then(|| {
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string()))
    });
    Some(Parsed::new(i, value))
}

pub(super) fn construct_hexnumber(extra: Option<&str>, _config: Option<&Value>) -> Result<ParserData, BuildError> {
    let max = match extra {
        None => u64::MAX,
        Some(s) => s.parse().map_err(|_| BuildError::BadArgument {
            parser: "hexnumber",
            reason: format!("max value is not a number: '{s}'"),
        })?,
    };
    Ok(ParserData::MaxValue(max))
}

pub(super) fn hexnumber(input: &str, offs: usize, data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let digits = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))?;
    let ndigits = digits.bytes().take_while(|b| b.is_ascii_hexdigit()).count();
    if ndigits == 0 {
        return None;
    }
    let parsed = u64::from_str_radix(&digits[..ndigits], 16).ok()?;
    if let Some(ParserData::MaxValue(max)) = data {
        if parsed > *max {
            return None;
        }
    }
    let len = 2 + ndigits;
    Some(Parsed::new(len, capture_str(capture, &rest[..len])))
}

pub(super) fn whitespace(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let len = rest
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if len == 0 {
        return None;
    }
    Some(Parsed::new(len, capture_str(capture, &rest[..len])))
}

/// One or more characters up to the next space or end of input.
pub(super) fn word(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let len = rest.find(' ').unwrap_or(rest.len());
    if len == 0 {
        return None;
    }
    Some(Parsed::new(len, capture_str(capture, &rest[..len])))
}

pub(super) fn alpha(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let len = rest
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if len == 0 {
        return None;
    }
    Some(Parsed::new(len, capture_str(capture, &rest[..len])))
}

/// Everything up to end of input, including nothing. Matches
/// unconditionally, so it must be the last edge installed on a node.
pub(super) fn rest(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    Some(Parsed::new(rest.len(), capture_str(capture, rest)))
}

/// A double-quoted run. The quotes are consumed but stripped from the value;
/// no escape sequences.
pub(super) fn quoted_string(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = input[offs..].strip_prefix('"')?;
    let inner = rest.find('"')?;
    Some(Parsed::new(inner + 2, capture_str(capture, &rest[..inner])))
}

/// Optionally quoted: a quoted run when the input starts with `"`, a plain
/// word otherwise.
pub(super) fn op_quoted_string(input: &str, offs: usize, data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    if input[offs..].starts_with('"') {
        quoted_string(input, offs, data, capture)
    } else {
        word(input, offs, data, capture)
    }
}

pub(super) fn construct_string_to(extra: Option<&str>, _config: Option<&Value>) -> Result<ParserData, BuildError> {
    let landmark = extra.ok_or(BuildError::MissingArgument { parser: "string-to" })?;
    if landmark.is_empty() {
        return Err(BuildError::BadArgument {
            parser: "string-to",
            reason: "landmark must not be empty".to_string(),
        });
    }
    Ok(ParserData::Landmark(landmark.to_string()))
}

/// Everything before the configured landmark string; fails when the
/// landmark is absent. The landmark itself is not consumed.
pub(super) fn string_to(input: &str, offs: usize, data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let Some(ParserData::Landmark(landmark)) = data else {
        return None;
    };
    let rest = &input[offs..];
    let idx = rest.find(landmark.as_str())?;
    Some(Parsed::new(idx, capture_str(capture, &rest[..idx])))
}

pub(super) fn construct_char_to(extra: Option<&str>, _config: Option<&Value>) -> Result<ParserData, BuildError> {
    Ok(ParserData::Terminator(one_char("char-to", extra)?))
}

/// One or more characters before the configured terminator; fails when the
/// terminator is absent. The terminator is not consumed.
pub(super) fn char_to(input: &str, offs: usize, data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let Some(ParserData::Terminator(term)) = data else {
        return None;
    };
    let rest = &input[offs..];
    let idx = rest.find(*term)?;
    if idx == 0 {
        return None;
    }
    Some(Parsed::new(idx, capture_str(capture, &rest[..idx])))
}

pub(super) fn construct_char_sep(extra: Option<&str>, _config: Option<&Value>) -> Result<ParserData, BuildError> {
    Ok(ParserData::Separator(one_char("char-sep", extra)?))
}

/// Characters up to the configured separator or end of input; may be empty.
pub(super) fn char_sep(input: &str, offs: usize, data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let Some(ParserData::Separator(sep)) = data else {
        return None;
    };
    let rest = &input[offs..];
    let len = rest.find(*sep).unwrap_or(rest.len());
    Some(Parsed::new(len, capture_str(capture, &rest[..len])))
}
