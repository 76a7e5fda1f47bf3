//! Timestamp-shaped field parsers.

use serde_json::Value;

use super::{Parsed, ParserData};

fn capture_str(capture: bool, s: &str) -> Option<Value> {
    capture.then(|| Value::String(s.to_string()))
}

fn digits2(b: &[u8], at: usize) -> Option<u32> {
    let hi = *b.get(at)?;
    let lo = *b.get(at + 1)?;
    if !hi.is_ascii_digit() || !lo.is_ascii_digit() {
        return None;
    }
    Some((hi - b'0') as u32 * 10 + (lo - b'0') as u32)
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// RFC 3164 header timestamp: `Mmm (d)d HH:MM:SS`, day space- or
/// zero-padded.
pub(super) fn rfc3164_date(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let b = rest.as_bytes();
    if b.len() < 4 || b[3] != b' ' || !MONTHS.iter().any(|m| m.as_bytes() == &b[..3]) {
        return None;
    }
    let mut i = 4;
    if *b.get(i)? == b' ' {
        i += 1; // space-padded single-digit day
    }
    let day_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let day: u32 = rest[day_start..i].parse().ok()?;
    if !(1..=31).contains(&day) || i - day_start > 2 {
        return None;
    }
    if *b.get(i)? != b' ' {
        return None;
    }
    i += 1;
    let time_len = hms(b, i, 24)?;
    i += time_len;
    Some(Parsed::new(i, capture_str(capture, &rest[..i])))
}

/// RFC 5424 timestamp, which is RFC 3339. The candidate run ends at the
/// next space; chrono does the validation.
pub(super) fn rfc5424_date(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let candidate = &rest[..rest.find(' ').unwrap_or(rest.len())];
    if candidate.len() < 19 {
        return None;
    }
    chrono::DateTime::parse_from_rfc3339(candidate).ok()?;
    Some(Parsed::new(candidate.len(), capture_str(capture, candidate)))
}

/// `YYYY-MM-DD`.
pub(super) fn iso_date(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    if rest.len() < 10 || !rest.is_char_boundary(10) {
        return None;
    }
    let candidate = &rest[..10];
    chrono::NaiveDate::parse_from_str(candidate, "%Y-%m-%d").ok()?;
    Some(Parsed::new(10, capture_str(capture, candidate)))
}

/// `HH:MM:SS` starting at `at`; returns the byte length on success.
/// `max_hour` bounds the hour field (exclusive for 24, inclusive for 12).
fn hms(b: &[u8], at: usize, max_hour: u32) -> Option<usize> {
    let hour = digits2(b, at)?;
    let ok_hour = if max_hour == 24 { hour < 24 } else { (1..=max_hour).contains(&hour) };
    if !ok_hour || *b.get(at + 2)? != b':' {
        return None;
    }
    let minute = digits2(b, at + 3)?;
    if minute > 59 || *b.get(at + 5)? != b':' {
        return None;
    }
    let second = digits2(b, at + 6)?;
    if second > 59 {
        return None;
    }
    Some(8)
}

pub(super) fn time_24hr(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let len = hms(rest.as_bytes(), 0, 24)?;
    Some(Parsed::new(len, capture_str(capture, &rest[..len])))
}

pub(super) fn time_12hr(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let len = hms(rest.as_bytes(), 0, 12)?;
    Some(Parsed::new(len, capture_str(capture, &rest[..len])))
}

/// Kernel ring-buffer timestamp: `[seconds.micros]` with six fractional
/// digits, e.g. `[ 1203.900888]`.
pub(super) fn kernel_timestamp(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let b = rest.as_bytes();
    if b.first() != Some(&b'[') {
        return None;
    }
    let mut i = 1;
    while i < b.len() && b[i] == b' ' {
        i += 1;
    }
    let sec_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    if i == sec_start || i - sec_start > 12 || b.get(i) != Some(&b'.') {
        return None;
    }
    i += 1;
    let frac_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    if i - frac_start != 6 || b.get(i) != Some(&b']') {
        return None;
    }
    i += 1;
    Some(Parsed::new(i, capture_str(capture, &rest[..i])))
}

/// `H+:MM:SS` elapsed time; the hour field is unbounded.
pub(super) fn duration(input: &str, offs: usize, _data: Option<&ParserData>, capture: bool) -> Option<Parsed> {
    let rest = &input[offs..];
    let b = rest.as_bytes();
    let hours = b.iter().take_while(|c| c.is_ascii_digit()).count();
    if hours == 0 || b.get(hours) != Some(&b':') {
        return None;
    }
    let minute = digits2(b, hours + 1)?;
    if minute > 59 || b.get(hours + 3) != Some(&b':') {
        return None;
    }
    let second = digits2(b, hours + 4)?;
    if second > 59 {
        return None;
    }
    let len = hours + 6;
    Some(Parsed::new(len, capture_str(capture, &rest[..len])))
}
