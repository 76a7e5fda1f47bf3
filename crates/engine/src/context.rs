//! Context — the process-wide handle owning the node arena, the main
//! component, and the user-defined type table.

use serde_json::Value;
use tracing::debug;

use crate::annot::Annotator;
use crate::pdag::{Node, NodeId, TypeId};

pub(crate) struct UserType {
    pub(crate) name: String,
    pub(crate) root: NodeId,
}

pub struct Context {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) types: Vec<UserType>,
    pub(crate) annotator: Option<Box<dyn Annotator>>,
    pub(crate) debug: bool,
    /// Nodes reachable from some component root. Diverges from the arena
    /// length once the optimizer splices nodes out.
    pub(crate) live_nodes: usize,
}

impl Context {
    pub fn new() -> Self {
        let mut ctx = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            types: Vec::new(),
            annotator: None,
            debug: false,
            live_nodes: 0,
        };
        ctx.root = ctx.new_node();
        ctx
    }

    /// Allocate an empty node in the arena.
    pub fn new_node(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        self.live_nodes += 1;
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Root of the main component.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes still wired into some component.
    pub fn node_count(&self) -> usize {
        self.live_nodes
    }

    /// Look up a user-defined type by name.
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.types.iter().position(|t| t.name == name).map(TypeId)
    }

    /// Get or create the user-defined type `name`, returning its handle.
    pub fn define_type(&mut self, name: &str) -> TypeId {
        if let Some(ty) = self.find_type(name) {
            return ty;
        }
        let root = self.new_node();
        debug!(name, "defining user type");
        self.types.push(UserType { name: name.to_string(), root });
        TypeId(self.types.len() - 1)
    }

    pub fn type_root(&self, ty: TypeId) -> NodeId {
        self.types[ty.0].root
    }

    pub fn type_name(&self, ty: TypeId) -> &str {
        &self.types[ty.0].name
    }

    /// Mark `node` as a valid end of a match.
    pub fn set_terminal(&mut self, node: NodeId) {
        self.node_mut(node).terminal = true;
    }

    /// Replace the tags attached to `node`.
    pub fn set_tags(&mut self, node: NodeId, tags: Value) {
        self.node_mut(node).tags = Some(tags);
    }

    /// Union `tags` into the node's tag array, preserving first-seen order.
    pub fn extend_tags<'a>(&mut self, node: NodeId, tags: impl IntoIterator<Item = &'a str>) {
        let slot = &mut self.node_mut(node).tags;
        if !matches!(slot, Some(Value::Array(_))) {
            *slot = Some(Value::Array(Vec::new()));
        }
        if let Some(Value::Array(existing)) = slot {
            for tag in tags {
                if !existing.iter().any(|t| t.as_str() == Some(tag)) {
                    existing.push(Value::String(tag.to_string()));
                }
            }
        }
    }

    /// Install the annotator invoked on tagged matches.
    pub fn set_annotator(&mut self, annotator: Box<dyn Annotator>) {
        self.annotator = Some(annotator);
    }

    pub fn has_annotator(&self) -> bool {
        self.annotator.is_some()
    }

    /// Enable per-edge trace output during normalization.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
