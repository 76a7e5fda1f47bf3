//! Address-shaped field parsers.

use std::net::Ipv6Addr;

use serde_json::Value;

use super::{Parsed, ParserData};

fn capture_str(capture: bool, s: &str) -> Option<Value> {
    capture.then(|| Value::String(s.to_string()))
}

/// Dotted-quad IPv4 address; each octet 0-255.
pub(super) fn ipv4(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let b = input[offs..].as_bytes();
    let mut i = 0;
    for group in 0..4 {
        if group > 0 {
            if b.get(i) != Some(&b'.') {
                return None;
            }
            i += 1;
        }
        let start = i;
        while i < b.len() && b[i].is_ascii_digit() && i - start < 3 {
            i += 1;
        }
        if i == start {
            return None;
        }
        let octet: u32 = input[offs + start..offs + i].parse().ok()?;
        if octet > 255 {
            return None;
        }
    }
    Some(Parsed::new(i, capture_str(capture, &input[offs..offs + i])))
}

/// IPv6 address. Collects the maximal run of address characters and lets
/// the standard library validate, shrinking from the right so that trailing
/// punctuation (a sentence period, a colon) does not defeat the match.
pub(super) fn ipv6(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let run = rest
        .bytes()
        .take_while(|b| b.is_ascii_hexdigit() || *b == b':' || *b == b'.')
        .count();
    if run < 2 || !rest[..run].contains(':') {
        return None;
    }
    for end in (2..=run).rev() {
        if rest[..end].parse::<Ipv6Addr>().is_ok() {
            return Some(Parsed::new(end, capture_str(capture, &rest[..end])));
        }
    }
    None
}

/// EUI-48 MAC address: six hex pairs joined by `:` or `-`, one separator
/// style throughout.
pub(super) fn mac48(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let b = input[offs..].as_bytes();
    if b.len() < 17 {
        return None;
    }
    let sep = b[2];
    if sep != b':' && sep != b'-' {
        return None;
    }
    for group in 0..6 {
        let at = group * 3;
        if !b[at].is_ascii_hexdigit() || !b[at + 1].is_ascii_hexdigit() {
            return None;
        }
        if group < 5 && b[at + 2] != sep {
            return None;
        }
    }
    Some(Parsed::new(17, capture_str(capture, &input[offs..offs + 17])))
}
