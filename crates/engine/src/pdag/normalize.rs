//! Normalizer — recursive backtracking walk of the parse graph.

use serde_json::{Map, Value};
use tracing::trace;

use crate::context::Context;
use crate::error::NoMatch;
use crate::parsers::{self, Parsed};
use crate::pdag::{EdgeKind, NodeId};
use crate::{DISCARD_NAME, EVENT_TAGS_KEY, MERGE_NAME, ORIGINAL_MSG_KEY, UNPARSED_DATA_KEY};

/// Where a successful walk ended.
#[derive(Debug, Clone, Copy)]
struct MatchEnd {
    node: NodeId,
    offs: usize,
}

impl Context {
    /// Match `line` against the main component and fill `record` with the
    /// extracted fields.
    ///
    /// On success the winning terminal's tags are attached under
    /// `event.tags` and the annotator (if any) runs once. On failure the
    /// record carries `originalmsg` and `unparsed-data` instead, the
    /// latter cut at the furthest offset any attempted path consumed.
    pub fn normalize(&self, line: &str, record: &mut Map<String, Value>) -> Result<(), NoMatch> {
        let mut watermark = 0;
        let end = self.normalize_rec(self.root, line, 0, false, &mut watermark, record);

        match end {
            Some(end) => {
                trace!(end_node = end.node.0, parsed_to = watermark, "match");
                if let Some(tags) = self.node(end.node).tags() {
                    record.insert(EVENT_TAGS_KEY.to_string(), tags.clone());
                    if let (Some(annotator), Value::Array(tags)) = (&self.annotator, tags) {
                        annotator.annotate(record, tags);
                    }
                }
                Ok(())
            }
            None => {
                trace!(parsed_to = watermark, "no match");
                record.insert(ORIGINAL_MSG_KEY.to_string(), Value::String(line.to_string()));
                record.insert(
                    UNPARSED_DATA_KEY.to_string(),
                    Value::String(line[watermark..].to_string()),
                );
                Err(NoMatch { unparsed_from: watermark })
            }
        }
    }

    /// One step of the walk: try each outgoing edge of `node` in insertion
    /// order; the first edge whose subtree completes records a match. After
    /// the edge loop the node's own terminal status is checked regardless —
    /// a terminal reached with the input exhausted (or during a partial,
    /// user-type walk) takes over as the end node even when a zero-width
    /// edge already matched deeper.
    ///
    /// `watermark` only ever advances and records the furthest offset any
    /// attempted edge consumed, matched or not.
    fn normalize_rec(
        &self,
        node: NodeId,
        input: &str,
        offs: usize,
        partial: bool,
        watermark: &mut usize,
        out: &mut Map<String, Value>,
    ) -> Option<MatchEnd> {
        let dag = self.node(node);
        let mut matched = None;

        for edge in dag.edges() {
            if matched.is_some() {
                break;
            }
            if self.debug {
                trace!(offs, partial, field = %edge.name, "trying edge");
            }
            let Some(parsed) = self.try_edge(edge, input, offs, watermark) else {
                continue;
            };

            let next = offs + parsed.len;
            let mut local = next;
            let sub = self.normalize_rec(edge.child, input, next, partial, &mut local, out);
            if local > *watermark {
                *watermark = local;
            }
            match sub {
                Some(end) => {
                    fold_value(&edge.name, parsed.value, out);
                    matched = Some(end);
                }
                // Subtree refused the rest of the input: drop the value and
                // backtrack to the next edge.
                None => drop(parsed.value),
            }
        }

        if dag.is_terminal() && (offs == input.len() || partial) {
            // This node wins as the end node (its tags apply), even over a
            // subtree that matched through a zero-width edge. Values folded
            // by that subtree stay, so the end offset keeps the deeper
            // position for an enclosing partial walk to resume from.
            let end_offs = matched.map_or(offs, |m| m.offs);
            matched = Some(MatchEnd { node, offs: end_offs });
        }
        matched
    }

    /// Apply one edge at `offs`. Built-ins call straight into the registry;
    /// a custom-type edge runs a partial walk of the type's component and
    /// reports the walk's end offset as its consumed length.
    fn try_edge(&self, edge: &crate::pdag::ParserEdge, input: &str, offs: usize, watermark: &mut usize) -> Option<Parsed> {
        match edge.kind {
            EdgeKind::Builtin(id) => {
                let capture = edge.name != DISCARD_NAME;
                (parsers::info(id).parse)(input, offs, edge.data.as_ref(), capture)
            }
            EdgeKind::Custom(ty) => {
                let mut sub = Map::new();
                let mut inner_watermark = offs;
                let end = self.normalize_rec(
                    self.type_root(ty),
                    input,
                    offs,
                    true,
                    &mut inner_watermark,
                    &mut sub,
                );
                if inner_watermark > *watermark {
                    *watermark = inner_watermark;
                }
                let end = end?;
                trace!(ty = self.type_name(ty), consumed = end.offs - offs, "custom type matched");
                Some(Parsed::new(end.offs - offs, Some(Value::Object(sub))))
            }
        }
    }
}

/// Fold an extracted value into the record.
///
/// `-` discards; `.` merges an object value entry-by-entry into the current
/// level (last write wins), while a non-object value falls through and is
/// attached under the literal name `.`.
fn fold_value(name: &str, value: Option<Value>, out: &mut Map<String, Value>) {
    let Some(value) = value else { return };
    if name == DISCARD_NAME {
        return;
    }
    if name == MERGE_NAME {
        if let Value::Object(entries) = value {
            for (key, val) in entries {
                out.insert(key, val);
            }
            return;
        }
    }
    out.insert(name.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::id_of;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn field(ctx: &mut Context, at: &mut NodeId, name: &str, parser: &str, extra: Option<&str>) {
        let spec = ctx.new_edge(name, id_of(parser).unwrap(), extra, None).unwrap();
        ctx.add_parser(at, spec);
    }

    /// `login from %ip:ipv4%` and `login from %host:word%`.
    fn login_rules() -> Context {
        let mut ctx = Context::new();
        let mut a = ctx.root();
        ctx.add_literal_run(&mut a, "login from ");
        field(&mut ctx, &mut a, "ip", "ipv4", None);
        ctx.set_terminal(a);

        let mut b = ctx.root();
        ctx.add_literal_run(&mut b, "login from ");
        field(&mut ctx, &mut b, "host", "word", None);
        ctx.set_terminal(b);
        ctx
    }

    #[test]
    fn test_first_matching_edge_wins() {
        let ctx = login_rules();

        let mut record = Map::new();
        ctx.normalize("login from 10.0.0.1", &mut record).unwrap();
        assert_eq!(record.get("ip"), Some(&json!("10.0.0.1")));
        assert!(record.get("host").is_none());

        let mut record = Map::new();
        ctx.normalize("login from server01", &mut record).unwrap();
        assert_eq!(record.get("host"), Some(&json!("server01")));
        assert!(record.get("ip").is_none());
    }

    #[test]
    fn test_no_match_attaches_original_and_unparsed() {
        let ctx = login_rules();
        let mut record = Map::new();
        let err = ctx.normalize("logout by bob", &mut record).unwrap_err();

        assert_eq!(record.get(ORIGINAL_MSG_KEY), Some(&json!("logout by bob")));
        let unparsed = record.get(UNPARSED_DATA_KEY).and_then(Value::as_str).unwrap();
        assert_eq!(&"logout by bob"[err.unparsed_from..], unparsed);
    }

    #[test]
    fn test_watermark_reflects_deepest_attempt() {
        let mut ctx = Context::new();
        let mut at = ctx.root();
        ctx.add_literal_run(&mut at, "ab");
        field(&mut ctx, &mut at, "n", "number", None);
        ctx.set_terminal(at);

        // literals match through "ab", number fails on "X"
        let mut record = Map::new();
        let err = ctx.normalize("abX", &mut record).unwrap_err();
        assert_eq!(err.unparsed_from, 2);
        assert_eq!(record.get(UNPARSED_DATA_KEY), Some(&json!("X")));
    }

    #[test]
    fn test_input_must_be_fully_consumed() {
        let mut ctx = Context::new();
        let mut at = ctx.root();
        ctx.add_literal_run(&mut at, "ok");
        ctx.set_terminal(at);

        let mut record = Map::new();
        assert!(ctx.normalize("ok", &mut record).is_ok());

        let mut record = Map::new();
        assert!(ctx.normalize("ok then some", &mut record).is_err());
    }

    #[test]
    fn test_empty_input_matches_only_terminal_root() {
        let mut ctx = Context::new();
        let mut record = Map::new();
        assert!(ctx.normalize("", &mut record).is_err());

        let root = ctx.root();
        ctx.set_terminal(root);
        let mut record = Map::new();
        assert!(ctx.normalize("", &mut record).is_ok());
        assert!(record.is_empty());
    }

    #[test]
    fn test_discard_name_suppresses_field() {
        let mut ctx = Context::new();
        let mut at = ctx.root();
        ctx.add_literal_run(&mut at, "A");
        field(&mut ctx, &mut at, "-", "char-to", Some("B"));
        ctx.add_literal_run(&mut at, "B");
        ctx.set_terminal(at);

        let mut record = Map::new();
        ctx.normalize("AxyzB", &mut record).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_merge_name_spreads_object() {
        let mut ctx = Context::new();
        let mut at = ctx.root();
        field(&mut ctx, &mut at, ".", "json", None);
        ctx.set_terminal(at);

        let mut record = Map::new();
        record.insert("b".to_string(), json!("old"));
        ctx.normalize(r#"{"a":1,"b":2}"#, &mut record).unwrap();
        assert_eq!(record.get("a"), Some(&json!(1)));
        // last write wins
        assert_eq!(record.get("b"), Some(&json!(2)));
        assert!(record.get(".").is_none());
    }

    #[test]
    fn test_merge_name_with_scalar_falls_through() {
        let mut ctx = Context::new();
        let mut at = ctx.root();
        field(&mut ctx, &mut at, ".", "number", None);
        ctx.set_terminal(at);

        let mut record = Map::new();
        ctx.normalize("42", &mut record).unwrap();
        assert_eq!(record.get("."), Some(&json!(42)));
    }

    #[test]
    fn test_backtracking_tries_edges_in_insertion_order() {
        let mut ctx = Context::new();
        // first alternative: word followed by "!" — fails on plain input
        let mut a = ctx.root();
        field(&mut ctx, &mut a, "w", "char-to", Some("!"));
        ctx.add_literal_run(&mut a, "!");
        ctx.set_terminal(a);
        // second alternative: rest of line
        let mut b = ctx.root();
        field(&mut ctx, &mut b, "r", "rest", None);
        ctx.set_terminal(b);

        let mut record = Map::new();
        ctx.normalize("hello!", &mut record).unwrap();
        assert_eq!(record.get("w"), Some(&json!("hello")));

        let mut record = Map::new();
        ctx.normalize("hello", &mut record).unwrap();
        assert_eq!(record.get("r"), Some(&json!("hello")));
    }

    #[test]
    fn test_failed_branch_leaves_no_fields_behind() {
        let mut ctx = Context::new();
        let mut a = ctx.root();
        field(&mut ctx, &mut a, "num", "number", None);
        ctx.add_literal_run(&mut a, "s");
        ctx.set_terminal(a);
        let mut b = ctx.root();
        field(&mut ctx, &mut b, "all", "rest", None);
        ctx.set_terminal(b);

        // number matches "42" but the required "s" literal fails; the "num"
        // value must not leak into the record of the winning alternative
        let mut record = Map::new();
        ctx.normalize("42x", &mut record).unwrap();
        assert!(record.get("num").is_none());
        assert_eq!(record.get("all"), Some(&json!("42x")));
    }

    #[test]
    fn test_custom_type_partial_match_hands_back_leftover() {
        let mut ctx = Context::new();
        let ty = ctx.define_type("endpoint");
        let mut t = ctx.type_root(ty);
        field(&mut ctx, &mut t, "addr", "ipv4", None);
        ctx.add_literal_run(&mut t, ":");
        field(&mut ctx, &mut t, "port", "number", None);
        ctx.set_terminal(t);

        let mut at = ctx.root();
        ctx.add_literal_run(&mut at, "conn ");
        let spec = ctx.new_custom_edge("peer", ty);
        ctx.add_parser(&mut at, spec);
        ctx.add_literal_run(&mut at, " closed");
        ctx.set_terminal(at);

        let mut record = Map::new();
        ctx.normalize("conn 10.0.0.1:22 closed", &mut record).unwrap();
        assert_eq!(record.get("peer"), Some(&json!({"addr": "10.0.0.1", "port": 22})));
    }

    #[test]
    fn test_custom_type_merge_into_record() {
        let mut ctx = Context::new();
        let ty = ctx.define_type("kv");
        let mut t = ctx.type_root(ty);
        field(&mut ctx, &mut t, "k", "alpha", None);
        ctx.set_terminal(t);

        let mut at = ctx.root();
        let spec = ctx.new_custom_edge(".", ty);
        ctx.add_parser(&mut at, spec);
        ctx.set_terminal(at);

        let mut record = Map::new();
        ctx.normalize("abc", &mut record).unwrap();
        assert_eq!(record.get("k"), Some(&json!("abc")));
        assert!(record.get(".").is_none());
    }

    #[test]
    fn test_tags_and_annotator_on_success() {
        struct Counting(Arc<AtomicUsize>);
        impl crate::Annotator for Counting {
            fn annotate(&self, record: &mut Map<String, Value>, tags: &[Value]) {
                self.0.fetch_add(1, Ordering::Relaxed);
                record.insert("seen-tags".to_string(), Value::from(tags.len() as u64));
            }
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let mut ctx = Context::new();
        let mut at = ctx.root();
        ctx.add_literal_run(&mut at, "x");
        ctx.set_terminal(at);
        ctx.extend_tags(at, ["auth", "ssh"]);
        ctx.set_annotator(Box::new(Counting(Arc::clone(&hits))));

        let mut record = Map::new();
        ctx.normalize("x", &mut record).unwrap();
        assert_eq!(record.get(EVENT_TAGS_KEY), Some(&json!(["auth", "ssh"])));
        assert_eq!(record.get("seen-tags"), Some(&json!(2)));
        assert_eq!(hits.load(Ordering::Relaxed), 1);

        // failure path must not annotate
        let mut record = Map::new();
        assert!(ctx.normalize("y", &mut record).is_err());
        assert!(record.get(EVENT_TAGS_KEY).is_none());
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_normalize_does_not_mutate_shared_graph() {
        let ctx = login_rules();
        let before = ctx.node_count();
        let mut record = Map::new();
        let _ = ctx.normalize("login from 10.0.0.1", &mut record);
        let _ = ctx.normalize("garbage", &mut Map::new());
        assert_eq!(ctx.node_count(), before);
    }

    #[test]
    fn test_fold_value_rules() {
        let mut out = Map::new();
        fold_value("-", Some(json!("dropped")), &mut out);
        assert!(out.is_empty());

        fold_value(".", Some(json!({"a": 1})), &mut out);
        assert_eq!(out.get("a"), Some(&json!(1)));

        fold_value(".", Some(json!("scalar")), &mut out);
        assert_eq!(out.get("."), Some(&json!("scalar")));

        fold_value("name", Some(json!(7)), &mut out);
        assert_eq!(out.get("name"), Some(&json!(7)));

        fold_value("name", None, &mut out);
        assert_eq!(out.get("name"), Some(&json!(7)));
    }
}
