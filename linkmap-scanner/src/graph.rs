//! Directed page graph built up during a crawl.
//!
//! Nodes are absolute URLs compared as plain strings. Edges point from the
//! discovered page back to the page that referenced it, and are recorded at
//! most once per `(from, to)` pair.

use crate::error::GraphError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write;
use tracing::debug;

/// Extra rendering attributes attached to a node.
pub type Attributes = BTreeMap<String, String>;

pub const DEFAULT_GRAPH_NAME: &str = "web";
pub const DEFAULT_RANK_DIR: &str = "LR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub attributes: Attributes,
}

#[derive(Debug)]
pub struct LinkGraph {
    name: String,
    rank_dir: String,
    graph: DiGraph<Page, ()>,
    index: HashMap<String, NodeIndex>,
    handled_edges: HashSet<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphExport {
    pub name: String,
    pub directed: bool,
    pub rank_dir: String,
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeExport {
    pub url: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeExport {
    pub from: String,
    pub to: String,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::named(DEFAULT_GRAPH_NAME)
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rank_dir: DEFAULT_RANK_DIR.to_string(),
            graph: DiGraph::new(),
            index: HashMap::new(),
            handled_edges: HashSet::new(),
        }
    }

    pub fn with_rank_dir(mut self, rank_dir: &str) -> Self {
        self.rank_dir = rank_dir.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Registers a page. Adding the same URL twice is an error; callers
    /// are expected to dedup before getting here.
    pub fn add_node(&mut self, id: &str, attributes: Attributes) -> Result<NodeIndex, GraphError> {
        if self.has_node(id) {
            return Err(GraphError::DuplicateNode(id.to_string()));
        }

        let idx = self.graph.add_node(Page {
            url: id.to_string(),
            attributes,
        });
        self.index.insert(id.to_string(), idx);
        Ok(idx)
    }

    /// Records `from -> to` once. Returns whether a new edge was added.
    ///
    /// Declines silently when `from` was never registered, which is how
    /// links to limit-gated pages drop out of the graph.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let Some(&from_idx) = self.index.get(from) else {
            debug!("Dropping edge {} -> {}: source is not a node", from, to);
            return false;
        };
        let Some(&to_idx) = self.index.get(to) else {
            debug!("Dropping edge {} -> {}: target is not a node", from, to);
            return false;
        };

        if !self
            .handled_edges
            .insert((from.to_string(), to.to_string()))
        {
            return false;
        }

        self.graph.add_edge(from_idx, to_idx, ());
        true
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.handled_edges
            .contains(&(from.to_string(), to.to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Pages in the order they were registered.
    pub fn nodes(&self) -> impl Iterator<Item = &Page> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Edges as `(from, to)` URL pairs in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph.edge_references().map(move |edge| {
            (
                self.graph[edge.source()].url.as_str(),
                self.graph[edge.target()].url.as_str(),
            )
        })
    }

    /// Graphviz DOT text. Output depends only on insertion order, so
    /// identical crawls produce identical bytes.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_dot().into_bytes()
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out, "digraph {} {{", quote(&self.name));
        let _ = writeln!(out, "\trankdir={};", quote(&self.rank_dir));

        for page in self.nodes() {
            if page.attributes.is_empty() {
                let _ = writeln!(out, "\t{};", quote(&page.url));
            } else {
                let attrs: Vec<String> = page
                    .attributes
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, quote(v)))
                    .collect();
                let _ = writeln!(out, "\t{} [ {} ];", quote(&page.url), attrs.join(", "));
            }
        }

        // dir=back draws the arrow from the referencing page to the referenced one
        for (from, to) in self.edges() {
            let _ = writeln!(out, "\t{}->{} [ dir=back ];", quote(from), quote(to));
        }

        out.push_str("}\n");
        out
    }

    pub fn export(&self) -> GraphExport {
        GraphExport {
            name: self.name.clone(),
            directed: true,
            rank_dir: self.rank_dir.clone(),
            nodes: self
                .nodes()
                .map(|page| NodeExport {
                    url: page.url.clone(),
                    attributes: page.attributes.clone(),
                })
                .collect(),
            edges: self
                .edges()
                .map(|(from, to)| EdgeExport {
                    from: from.to_string(),
                    to: to.to_string(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export())
    }
}

impl Default for LinkGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// DOT double-quoted identifier. Only `"` is an escape inside one, so
/// backslashes pass through untouched.
fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
