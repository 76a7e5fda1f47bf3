// Parse-DAG log normalization engine.
//
// A rulebase of samples is compiled into a parse graph (one component per
// user-defined type plus a main component). At runtime each input line is
// walked through the graph; field parsers label the edges and extracted
// values are folded into a JSON record.

pub mod annot;
pub mod context;
pub mod error;
pub mod parsers;
pub mod pdag;
pub mod rulebase;

pub use annot::{Annotator, RuleAnnotations};
pub use context::Context;
pub use error::{BuildError, NoMatch};
pub use parsers::{id_of, ParserId};
pub use pdag::{NodeId, TypeId};

/// Field name that discards the extracted value.
pub const DISCARD_NAME: &str = "-";
/// Field name that merges an object value into the enclosing record.
pub const MERGE_NAME: &str = ".";
/// Record key for the tags of the winning terminal node.
pub const EVENT_TAGS_KEY: &str = "event.tags";
/// Record key for the full input line, attached when no rule matched.
pub const ORIGINAL_MSG_KEY: &str = "originalmsg";
/// Record key for the input suffix past the match watermark, attached when no rule matched.
pub const UNPARSED_DATA_KEY: &str = "unparsed-data";
