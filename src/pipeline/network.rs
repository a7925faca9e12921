use tracing::info;

use crate::api::MapDataProvider;
use crate::domain::{Edge, Graph, NetworkType, Node, PlaceDescriptor};
use crate::error::{AcquisitionFailure, Dataset, Error, Result};
use crate::geometry::Projector;

/// Fetch the street network for `place`.
///
/// Makes exactly one provider call. Provider failures, a network without
/// edges, and edges pointing at unknown nodes all surface as
/// [`Error::Acquisition`]; an empty graph is never returned.
pub fn fetch_network<P>(
    provider: &P,
    place: &PlaceDescriptor,
    network_type: NetworkType,
) -> Result<Graph>
where
    P: MapDataProvider + ?Sized,
{
    info!(place = %place, %network_type, "downloading street network");
    let fail = |source: AcquisitionFailure| {
        Error::acquisition(place.identifier(), Dataset::Network, source)
    };

    let raw = provider
        .fetch_graph(place, network_type)
        .map_err(|e| fail(e.into()))?;

    if raw.edges.is_empty() {
        return Err(fail(AcquisitionFailure::EmptyNetwork));
    }

    let crs = raw.crs;
    let nodes: Vec<Node> = raw
        .nodes
        .into_iter()
        .map(|n| Node {
            id: n.id,
            coord: crs.to_wgs84(n.coord),
        })
        .collect();

    // Edges get their lengths once endpoints are validated
    let edges = raw
        .edges
        .into_iter()
        .map(|e| Edge {
            from: e.from,
            to: e.to,
            network_type,
            name: e.name,
            highway: e.highway,
            length_m: 0.0,
        })
        .collect();

    let mut graph = Graph::try_new(nodes, edges)
        .map_err(|(from, to)| fail(AcquisitionFailure::DanglingEdge { from, to }))?;
    graph.measure_edges(edge_length);

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "street network graph created"
    );
    Ok(graph)
}

fn edge_length(from: &Node, to: &Node) -> f64 {
    Projector::new((from.coord.y, from.coord.x)).distance(from.coord, to.coord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RawGraph;
    use crate::geometry::Crs;
    use crate::pipeline::resolve;
    use crate::test_support::{StubProvider, raw_edge, raw_node, triangle_graph};
    use geo::Coord;

    #[test]
    fn test_fetch_triangle() {
        let provider = StubProvider::new(Some(triangle_graph()), None);
        let place = resolve("Salzburg, Austria").unwrap();

        let graph = fetch_network(&provider, &place, NetworkType::Walk).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.edges().iter().all(|e| e.network_type == NetworkType::Walk));
        // ~0.01° lat and ~0.02° lon apart, roughly 1.9 km
        let first = &graph.edges()[0];
        assert!(first.length_m > 1500.0 && first.length_m < 2500.0);
        assert_eq!(provider.calls(), (1, 0));
    }

    #[test]
    fn test_zero_edges_is_acquisition_error() {
        let raw = RawGraph {
            nodes: vec![raw_node(1, 47.80, 13.04)],
            ..RawGraph::default()
        };
        let provider = StubProvider::new(Some(raw), None);
        let place = resolve("Salzburg, Austria").unwrap();

        let err = fetch_network(&provider, &place, NetworkType::Drive).unwrap_err();
        assert!(matches!(
            err,
            Error::Acquisition {
                dataset: Dataset::Network,
                source: AcquisitionFailure::EmptyNetwork,
                ..
            }
        ));
    }

    #[test]
    fn test_provider_failure_is_acquisition_error() {
        let provider = StubProvider::new(None, None);
        let place = resolve("Nowhere In Particular").unwrap();

        let err = fetch_network(&provider, &place, NetworkType::Walk).unwrap_err();
        assert!(matches!(
            err,
            Error::Acquisition {
                source: AcquisitionFailure::Provider(_),
                ..
            }
        ));
    }

    #[test]
    fn test_dangling_edge_is_acquisition_error() {
        let mut raw = triangle_graph();
        raw.edges.push(raw_edge(3, 42));
        let provider = StubProvider::new(Some(raw), None);
        let place = resolve("Salzburg, Austria").unwrap();

        let err = fetch_network(&provider, &place, NetworkType::Walk).unwrap_err();
        assert!(matches!(
            err,
            Error::Acquisition {
                source: AcquisitionFailure::DanglingEdge { from: 3, to: 42 },
                ..
            }
        ));
    }

    #[test]
    fn test_web_mercator_nodes_are_reconciled() {
        let raw = RawGraph {
            crs: Crs::WebMercator,
            nodes: vec![
                Node {
                    id: 1,
                    coord: Coord { x: 0.0, y: 0.0 },
                },
                Node {
                    id: 2,
                    coord: Coord {
                        x: 1_451_606.0,
                        y: 6_073_646.0,
                    },
                },
            ],
            edges: vec![raw_edge(1, 2)],
        };
        let provider = StubProvider::new(Some(raw), None);
        let place = resolve("Salzburg, Austria").unwrap();

        let graph = fetch_network(&provider, &place, NetworkType::Walk).unwrap();
        let salzburg = graph.node(2).unwrap().coord;
        assert!((salzburg.x - 13.04).abs() < 0.01);
        assert!((salzburg.y - 47.80).abs() < 0.01);
    }
}
