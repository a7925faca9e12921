use std::collections::BTreeMap;

use geo::Coord;
use serde::Deserialize;

/// Travel mode the street network is filtered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    #[default]
    Walk,
    Drive,
    Bike,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Walk => "walk",
            NetworkType::Drive => "drive",
            NetworkType::Bike => "bike",
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intersection or path point. `x` = longitude, `y` = latitude (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: u64,
    pub coord: Coord<f64>,
}

/// Directed traversable segment between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: u64,
    pub to: u64,
    pub network_type: NetworkType,
    pub name: Option<String>,
    /// OSM `highway` tag value
    pub highway: Option<String>,
    pub length_m: f64,
}

/// Street network for one place and travel mode.
///
/// `Graph::default()` is the empty graph, used as "no network" input to
/// [`crate::compute_centroid`]. Fetchers never return it: a region without
/// edges is an acquisition error.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<u64, Node>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Build a graph, returning the first edge whose endpoints are not both
    /// in `nodes`.
    pub fn try_new(
        nodes: impl IntoIterator<Item = Node>,
        edges: Vec<Edge>,
    ) -> Result<Self, (u64, u64)> {
        let nodes: BTreeMap<u64, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();

        if let Some(bad) = edges
            .iter()
            .find(|e| !nodes.contains_key(&e.from) || !nodes.contains_key(&e.to))
        {
            return Err((bad.from, bad.to));
        }

        Ok(Self { nodes, edges })
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: u64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set each edge's `length_m` from its endpoints
    pub(crate) fn measure_edges(&mut self, length: impl Fn(&Node, &Node) -> f64) {
        for edge in &mut self.edges {
            if let (Some(from), Some(to)) = (self.nodes.get(&edge.from), self.nodes.get(&edge.to)) {
                edge.length_m = length(from, to);
            }
        }
    }

    /// Endpoint coordinates of an edge
    pub fn edge_coords(&self, edge: &Edge) -> Option<(Coord<f64>, Coord<f64>)> {
        Some((self.nodes.get(&edge.from)?.coord, self.nodes.get(&edge.to)?.coord))
    }
}
