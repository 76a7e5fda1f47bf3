use thiserror::Error;

/// Errors raised while building the parse graph from a rulebase.
///
/// Build errors leave the graph in its previous valid state; the offending
/// line is skipped only in the sense that nothing past the error is installed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown parser '{name}' (line {line})")]
    UnknownParser { name: String, line: usize },

    #[error("unknown user type '@{name}' (line {line})")]
    UnknownType { name: String, line: usize },

    #[error("malformed sample (line {line}): {reason}")]
    BadSample { line: usize, reason: String },

    #[error("malformed rulebase line {line}: {reason}")]
    BadLine { line: usize, reason: String },

    #[error("parser '{parser}' requires configuration data")]
    MissingArgument { parser: &'static str },

    #[error("invalid configuration for parser '{parser}': {reason}")]
    BadArgument { parser: &'static str, reason: String },
}

/// No rule matched the input line.
///
/// Not a hard failure: the record handed to [`Context::normalize`] still
/// carries `originalmsg` and `unparsed-data` so the caller can route the
/// line to a raw sink.
///
/// [`Context::normalize`]: crate::Context::normalize
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no rule matched; input unparsed from offset {unparsed_from}")]
pub struct NoMatch {
    /// Furthest input offset any attempted path consumed.
    pub unparsed_from: usize,
}
