//! Field parser registry — a fixed, ordered table of built-in parsers.
//!
//! A [`ParserId`] is the parser's position in the table. That position is
//! part of the rulebase compatibility contract, so the table is strictly
//! append-only: new parsers go at the end, existing entries never move.

mod datetime;
mod network;
mod structured;
mod text;

use serde_json::Value;

use crate::error::BuildError;

/// Identifier of a built-in field parser. The numeric value is the parser's
/// index in the registry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParserId(pub(crate) usize);

impl ParserId {
    pub fn name(self) -> &'static str {
        REGISTRY[self.0].name
    }
}

/// The literal parser; the builder and the optimizer special-case it.
pub const LITERAL: ParserId = ParserId(0);

/// Per-edge configuration owned by the edge and interpreted only by the
/// parser named on that edge.
#[derive(Debug, Clone, PartialEq)]
pub enum ParserData {
    /// `literal`: the byte run to match. Single characters at build time,
    /// fused into longer runs by the optimizer.
    Literal(String),
    /// `string-to`: the landmark string terminating the field.
    Landmark(String),
    /// `char-to`: the character terminating the field (must be present).
    Terminator(char),
    /// `char-sep`: the separator character (end of input also ends the field).
    Separator(char),
    /// `hexnumber`: optional upper bound on the accepted value.
    MaxValue(u64),
}

/// A successful parser application.
pub(crate) struct Parsed {
    /// Bytes consumed from the given offset.
    pub len: usize,
    /// Extracted value; `None` when capture was suppressed or the parser
    /// produces nothing.
    pub value: Option<Value>,
}

impl Parsed {
    pub(crate) fn new(len: usize, value: Option<Value>) -> Self {
        Self { len, value }
    }
}

pub(crate) type ConstructFn = fn(Option<&str>, Option<&Value>) -> Result<ParserData, BuildError>;

/// Parser entry point. Inspects `input[offs..]`; returns `None` when the
/// input does not match. Must not produce a value unless `capture` is set.
pub(crate) type ParseFn = fn(input: &str, offs: usize, data: Option<&ParserData>, capture: bool) -> Option<Parsed>;

pub struct ParserInfo {
    pub name: &'static str,
    pub(crate) construct: Option<ConstructFn>,
    pub(crate) parse: ParseFn,
}

/// The registry. Initialization order defines the parser ids; entries are
/// append-only (see module docs).
pub(crate) static REGISTRY: &[ParserInfo] = &[
    ParserInfo { name: "literal", construct: Some(text::construct_literal), parse: text::literal },
    ParserInfo { name: "date-rfc3164", construct: None, parse: datetime::rfc3164_date },
    ParserInfo { name: "date-rfc5424", construct: None, parse: datetime::rfc5424_date },
    ParserInfo { name: "number", construct: None, parse: text::number },
    ParserInfo { name: "float", construct: None, parse: text::float },
    ParserInfo { name: "hexnumber", construct: Some(text::construct_hexnumber), parse: text::hexnumber },
    ParserInfo { name: "kernel-timestamp", construct: None, parse: datetime::kernel_timestamp },
    ParserInfo { name: "whitespace", construct: None, parse: text::whitespace },
    ParserInfo { name: "ipv4", construct: None, parse: network::ipv4 },
    ParserInfo { name: "ipv6", construct: None, parse: network::ipv6 },
    ParserInfo { name: "word", construct: None, parse: text::word },
    ParserInfo { name: "alpha", construct: None, parse: text::alpha },
    ParserInfo { name: "rest", construct: None, parse: text::rest },
    ParserInfo { name: "op-quoted-string", construct: None, parse: text::op_quoted_string },
    ParserInfo { name: "quoted-string", construct: None, parse: text::quoted_string },
    ParserInfo { name: "date-iso", construct: None, parse: datetime::iso_date },
    ParserInfo { name: "time-24hr", construct: None, parse: datetime::time_24hr },
    ParserInfo { name: "time-12hr", construct: None, parse: datetime::time_12hr },
    ParserInfo { name: "duration", construct: None, parse: datetime::duration },
    ParserInfo { name: "name-value-list", construct: None, parse: structured::name_value_list },
    ParserInfo { name: "json", construct: None, parse: structured::json },
    ParserInfo { name: "mac48", construct: None, parse: network::mac48 },
    ParserInfo { name: "string-to", construct: Some(text::construct_string_to), parse: text::string_to },
    ParserInfo { name: "char-to", construct: Some(text::construct_char_to), parse: text::char_to },
    ParserInfo { name: "char-sep", construct: Some(text::construct_char_sep), parse: text::char_sep },
];

/// Look up a parser id by its registry name. Linear scan; the table has a
/// few dozen entries.
pub fn id_of(name: &str) -> Option<ParserId> {
    REGISTRY.iter().position(|p| p.name == name).map(ParserId)
}

pub(crate) fn info(id: ParserId) -> &'static ParserInfo {
    &REGISTRY[id.0]
}

/// Fuse two literal payloads; used by the optimizer to collapse
/// single-character literal runs back into multi-character runs.
pub(crate) fn combine_literal(left: &mut ParserData, right: ParserData) {
    if let (ParserData::Literal(dst), ParserData::Literal(src)) = (left, right) {
        dst.push_str(&src);
    }
}
