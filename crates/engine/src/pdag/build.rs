//! Builder — edge factories and the `add_parser` growth operation.

use serde_json::Value;
use tracing::{debug, trace};

use crate::context::Context;
use crate::error::BuildError;
use crate::parsers::{self, ParserData, ParserId, LITERAL};
use crate::pdag::{EdgeKind, NodeId, ParserEdge, TypeId};
use crate::DISCARD_NAME;

/// An edge prepared for installation; `add_parser` either appends it or
/// merges it into an equivalent existing edge.
#[derive(Debug)]
pub struct EdgeSpec {
    pub(crate) kind: EdgeKind,
    pub(crate) name: String,
    pub(crate) prio: i32,
    pub(crate) data: Option<ParserData>,
}

impl Context {
    /// Prepare an edge for the built-in parser `id`, running the parser's
    /// construct hook on `extra`/`config` when it has one.
    pub fn new_edge(
        &self,
        name: &str,
        id: ParserId,
        extra: Option<&str>,
        config: Option<&Value>,
    ) -> Result<EdgeSpec, BuildError> {
        let data = match parsers::info(id).construct {
            Some(construct) => Some(construct(extra, config)?),
            None => None,
        };
        Ok(EdgeSpec {
            kind: EdgeKind::Builtin(id),
            name: name.to_string(),
            prio: 0,
            data,
        })
    }

    /// Prepare an edge recursing into the user-defined type `ty`.
    pub fn new_custom_edge(&self, name: &str, ty: TypeId) -> EdgeSpec {
        EdgeSpec {
            kind: EdgeKind::Custom(ty),
            name: name.to_string(),
            prio: 0,
            data: None,
        }
    }

    /// Prepare a one-character discard literal. Samples are split into
    /// these so that shared prefixes merge; the optimizer fuses the runs
    /// back together.
    pub fn new_literal_edge(&self, lit: char) -> EdgeSpec {
        EdgeSpec {
            kind: EdgeKind::Builtin(LITERAL),
            name: DISCARD_NAME.to_string(),
            prio: 0,
            data: Some(ParserData::Literal(lit.to_string())),
        }
    }

    /// Install `spec` on the node `*at` points to and advance `*at` to the
    /// edge's child.
    ///
    /// An existing edge with the same kind and name is considered
    /// equivalent and reused — except for literals, which are equivalent
    /// only when the stored character also matches. The provided spec is
    /// consumed either way.
    pub fn add_parser(&mut self, at: &mut NodeId, spec: EdgeSpec) {
        let node = &self.nodes[at.0];
        for (i, edge) in node.edges.iter().enumerate() {
            if edge.kind != spec.kind || edge.name != spec.name {
                continue;
            }
            if spec.kind == EdgeKind::Builtin(LITERAL) && edge.data != spec.data {
                continue;
            }
            trace!(node = at.0, edge = i, "merging into existing edge");
            *at = edge.child;
            return;
        }

        let child = self.new_node();
        debug!(node = at.0, child = child.0, name = %spec.name, "appending edge");
        self.nodes[at.0].edges.push(ParserEdge {
            kind: spec.kind,
            name: spec.name,
            prio: spec.prio,
            data: spec.data,
            child,
        });
        *at = child;
    }

    /// Split `sample` into per-character literal edges starting at `*at`,
    /// advancing the cursor through each.
    pub fn add_literal_run(&mut self, at: &mut NodeId, sample: &str) {
        for c in sample.chars() {
            let spec = self.new_literal_edge(c);
            self.add_parser(at, spec);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::id_of;

    #[test]
    fn test_add_parser_appends_and_advances() {
        let mut ctx = Context::new();
        let mut at = ctx.root();
        let spec = ctx.new_edge("ip", id_of("ipv4").unwrap(), None, None).unwrap();
        ctx.add_parser(&mut at, spec);

        assert_ne!(at, ctx.root());
        assert_eq!(ctx.node(ctx.root()).edges().len(), 1);
        assert_eq!(ctx.node(ctx.root()).edges()[0].name(), "ip");
        assert_eq!(ctx.node(ctx.root()).edges()[0].child(), at);
    }

    #[test]
    fn test_add_parser_merges_equivalent_edges() {
        let mut ctx = Context::new();
        let mut first = ctx.root();
        let spec = ctx.new_edge("ip", id_of("ipv4").unwrap(), None, None).unwrap();
        ctx.add_parser(&mut first, spec);

        let mut second = ctx.root();
        let spec = ctx.new_edge("ip", id_of("ipv4").unwrap(), None, None).unwrap();
        ctx.add_parser(&mut second, spec);

        assert_eq!(first, second);
        assert_eq!(ctx.node(ctx.root()).edges().len(), 1);
    }

    #[test]
    fn test_add_parser_keeps_distinct_names_apart() {
        let mut ctx = Context::new();
        let mut a = ctx.root();
        let spec = ctx.new_edge("ip", id_of("ipv4").unwrap(), None, None).unwrap();
        ctx.add_parser(&mut a, spec);

        let mut b = ctx.root();
        let spec = ctx.new_edge("addr", id_of("ipv4").unwrap(), None, None).unwrap();
        ctx.add_parser(&mut b, spec);

        assert_ne!(a, b);
        assert_eq!(ctx.node(ctx.root()).edges().len(), 2);
    }

    #[test]
    fn test_literal_edges_merge_per_character() {
        let mut ctx = Context::new();
        let mut a = ctx.root();
        let spec = ctx.new_literal_edge('u');
        ctx.add_parser(&mut a, spec);

        // same character merges
        let mut b = ctx.root();
        let spec = ctx.new_literal_edge('u');
        ctx.add_parser(&mut b, spec);
        assert_eq!(a, b);
        assert_eq!(ctx.node(ctx.root()).edges().len(), 1);

        // different character forks
        let mut c = ctx.root();
        let spec = ctx.new_literal_edge('v');
        ctx.add_parser(&mut c, spec);
        assert_ne!(a, c);
        assert_eq!(ctx.node(ctx.root()).edges().len(), 2);
    }

    #[test]
    fn test_no_duplicate_kind_name_pairs_after_build() {
        let mut ctx = Context::new();
        for _ in 0..3 {
            let mut at = ctx.root();
            ctx.add_literal_run(&mut at, "user=");
            let spec = ctx.new_edge("who", id_of("word").unwrap(), None, None).unwrap();
            ctx.add_parser(&mut at, spec);
        }
        let mut stack = vec![ctx.root()];
        while let Some(id) = stack.pop() {
            let node = ctx.node(id);
            for (i, a) in node.edges().iter().enumerate() {
                for b in &node.edges()[i + 1..] {
                    let same = a.kind() == b.kind() && a.name() == b.name();
                    assert!(!same, "duplicate edge key on node {id:?}");
                }
                stack.push(a.child());
            }
        }
    }

    #[test]
    fn test_shared_prefix_shares_path() {
        let mut ctx = Context::new();
        let mut a = ctx.root();
        ctx.add_literal_run(&mut a, "user=");
        let before = ctx.node_count();

        let mut b = ctx.root();
        ctx.add_literal_run(&mut b, "user=");
        assert_eq!(a, b);
        assert_eq!(ctx.node_count(), before);
    }

    #[test]
    fn test_construct_failure_surfaces() {
        let ctx = Context::new();
        assert!(ctx.new_edge("f", id_of("char-to").unwrap(), None, None).is_err());
        assert!(ctx.new_edge("f", id_of("char-to").unwrap(), Some(":"), None).is_ok());
    }
}
