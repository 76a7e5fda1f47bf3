//! Optimizer — literal-path compaction.
//!
//! The builder splits literals one character per edge so shared prefixes
//! merge; after the rulebase is installed this pass fuses the runs back
//! into multi-character literals. Both halves matter: without the split,
//! prefixes don't share; without the fuse, every matched character costs a
//! node traversal.

use tracing::{debug, trace};

use crate::context::Context;
use crate::parsers::{self, LITERAL};
use crate::pdag::{EdgeKind, NodeId};
use crate::DISCARD_NAME;

impl Context {
    /// Run the optimizer over every component: each user-defined type,
    /// then the main pdag. Idempotent; must not run concurrently with
    /// `normalize`.
    pub fn optimize(&mut self) {
        for i in 0..self.types.len() {
            debug!(component = %self.types[i].name, "optimizing component");
            let root = self.types[i].root;
            self.optimize_component(root);
        }
        debug!("optimizing main component");
        let root = self.root;
        self.optimize_component(root);
    }

    fn optimize_component(&mut self, node: NodeId) {
        for i in 0..self.nodes[node.0].edges.len() {
            self.compact_literal_path(node, i);
            let child = self.nodes[node.0].edges[i].child;
            self.optimize_component(child);
        }
    }

    /// Local fixpoint: while edge `i` of `node` is a discard literal whose
    /// child has exactly one outgoing edge that is also a discard literal,
    /// pull the child's payload up and splice the child out.
    ///
    /// A literal that carries a real field name, or an intermediate node
    /// that is terminal (or tagged), has semantics of its own and stops the
    /// compaction.
    fn compact_literal_path(&mut self, node: NodeId, i: usize) {
        loop {
            let edge = &self.nodes[node.0].edges[i];
            if edge.kind != EdgeKind::Builtin(LITERAL) || edge.name != DISCARD_NAME {
                return;
            }
            let child = edge.child;
            let child_node = &self.nodes[child.0];
            if child_node.terminal || child_node.tags.is_some() || child_node.edges.len() != 1 {
                return;
            }
            let next = &child_node.edges[0];
            if next.kind != EdgeKind::Builtin(LITERAL) || next.name != DISCARD_NAME {
                return;
            }
            let grandchild = next.child;

            let Some(suffix) = self.nodes[child.0].edges[0].data.take() else {
                return;
            };
            let Some(payload) = self.nodes[node.0].edges[i].data.as_mut() else {
                return;
            };
            trace!(node = node.0, spliced = child.0, "fusing literal run");
            parsers::combine_literal(payload, suffix);
            self.nodes[node.0].edges[i].child = grandchild;
            // The spliced node stays in the arena until the context drops;
            // it is no longer reachable from any component.
            self.nodes[child.0].edges.clear();
            self.live_nodes -= 1;
        }
    }
}
