//! Diagnostics — read-only walkers: textual dump, DOT export, statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use serde::Serialize;

use crate::context::Context;
use crate::parsers::ParserData;
use crate::pdag::{EdgeKind, NodeId};

/// Statistics for one pdag component.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdagStats {
    pub nodes: usize,
    pub terminal_nodes: usize,
    pub parser_edges: usize,
    pub longest_path: usize,
    pub max_edges_per_node: usize,
    /// edge count per node → number of nodes with that count
    pub edges_per_node: BTreeMap<usize, usize>,
    /// parser name → number of edges using it (`@type` for custom types)
    pub per_parser: BTreeMap<String, usize>,
}

/// Statistics for every component of a context: each user-defined type,
/// then the main pdag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FullStats {
    pub types: Vec<(String, PdagStats)>,
    pub main: PdagStats,
}

impl Context {
    fn edge_label(&self, kind: EdgeKind) -> String {
        match kind {
            EdgeKind::Builtin(id) => id.name().to_string(),
            EdgeKind::Custom(ty) => format!("@{}", self.type_name(ty)),
        }
    }

    /// Indented textual dump of one component.
    pub fn dump_component(&self, root: NodeId) -> String {
        let mut out = String::new();
        self.dump_rec(root, 0, &mut out);
        out
    }

    /// Dump of every component: user-defined types first, then the main pdag.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for ty in &self.types {
            let _ = writeln!(out, "COMPONENT: {}", ty.name);
            self.dump_rec(ty.root, 0, &mut out);
        }
        out.push_str("MAIN COMPONENT:\n");
        self.dump_rec(self.root, 0, &mut out);
        out
    }

    fn dump_rec(&self, id: NodeId, level: usize, out: &mut String) {
        let node = self.node(id);
        let indent = "  ".repeat(level);
        let term = if node.is_terminal() { " [TERM]" } else { "" };
        let _ = writeln!(out, "{indent}node {}{term} ({} edges)", id.0, node.edges().len());
        for edge in node.edges() {
            let _ = writeln!(
                out,
                "{indent}field type '{}', name '{}'",
                self.edge_label(edge.kind),
                edge.name
            );
            self.dump_rec(edge.child, level + 1, out);
        }
    }

    /// DOT graph of one component. Nodes are labeled `n`, leaves bold;
    /// edges are dotted and labeled `parser:literal-payload`.
    pub fn dot_graph(&self, root: NodeId) -> String {
        let mut out = String::from("digraph pdag {\n");
        self.dot_rec(root, &mut out);
        out.push_str("}\n");
        out
    }

    fn dot_rec(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        let style = if node.is_leaf() { " style=\"bold\"" } else { "" };
        let _ = writeln!(out, "n{} [ label=\"n\"{style}]", id.0);
        for edge in node.edges() {
            let mut label = self.edge_label(edge.kind);
            label.push(':');
            if let Some(ParserData::Literal(lit)) = &edge.data {
                label.extend(lit.chars().filter(|c| *c != '\\' && *c != '"'));
            }
            let _ = writeln!(out, "n{} -> n{} [label=\"{label}\" style=\"dotted\"]", id.0, edge.child.0);
            self.dot_rec(edge.child, out);
        }
    }

    /// Gather statistics for one component.
    pub fn component_stats(&self, root: NodeId) -> PdagStats {
        let mut stats = PdagStats::default();
        let longest = self.stats_rec(root, &mut stats);
        stats.longest_path = longest;
        stats
    }

    /// Gather statistics for the full context.
    pub fn full_stats(&self) -> FullStats {
        FullStats {
            types: self
                .types
                .iter()
                .map(|t| (t.name.clone(), self.component_stats(t.root)))
                .collect(),
            main: self.component_stats(self.root),
        }
    }

    fn stats_rec(&self, id: NodeId, stats: &mut PdagStats) -> usize {
        let node = self.node(id);
        stats.nodes += 1;
        if node.is_terminal() {
            stats.terminal_nodes += 1;
        }
        let nedges = node.edges().len();
        stats.parser_edges += nedges;
        stats.max_edges_per_node = stats.max_edges_per_node.max(nedges);
        *stats.edges_per_node.entry(nedges).or_insert(0) += 1;

        let mut max_path = 0;
        for edge in node.edges() {
            *stats.per_parser.entry(self.edge_label(edge.kind)).or_insert(0) += 1;
            max_path = max_path.max(self.stats_rec(edge.child, stats));
        }
        max_path + 1
    }
}

impl fmt::Display for PdagStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes.............: {:4}", self.nodes)?;
        writeln!(f, "terminal nodes....: {:4}", self.terminal_nodes)?;
        writeln!(f, "parser entries....: {:4}", self.parser_edges)?;
        writeln!(f, "longest path......: {:4}", self.longest_path)?;
        writeln!(f, "parser type counts:")?;
        for (name, count) in &self.per_parser {
            writeln!(f, "\t{name:>20}: {count}")?;
        }
        writeln!(f, "parsers per node:")?;
        writeln!(f, "\tmax:\t{:4}", self.max_edges_per_node)?;
        for (nedges, count) in &self.edges_per_node {
            writeln!(f, "\t{nedges}:\t{count:4}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FullStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "User-Defined Types\n==================")?;
        writeln!(f, "number types: {}", self.types.len())?;
        for (name, _) in &self.types {
            writeln!(f, "type: {name}")?;
        }
        for (name, stats) in &self.types {
            writeln!(f, "\ntype PDAG: {name}\n----------")?;
            write!(f, "{stats}")?;
        }
        writeln!(f, "\nMain PDAG\n=========")?;
        write!(f, "{}", self.main)
    }
}
