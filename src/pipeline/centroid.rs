use geo::Coord;

use crate::domain::{Centroid, FeatureCollection, Graph};
use crate::error::{Error, Result};

/// Planar mean of all graph node coordinates and feature representative
/// points.
///
/// Coordinates are summed in a fixed order (nodes by id, then features in
/// collection order), so identical inputs give bit-identical results. Either
/// input may be empty; both empty is [`Error::InsufficientData`].
pub fn compute_centroid(graph: &Graph, features: &FeatureCollection) -> Result<Centroid> {
    let node_coords = graph.nodes().map(|n| n.coord);
    mean(node_coords.chain(features.points())).ok_or(Error::InsufficientData)
}

fn mean(coords: impl Iterator<Item = Coord<f64>>) -> Option<Centroid> {
    let mut sum_lat = 0.0;
    let mut sum_lon = 0.0;
    let mut count = 0usize;

    for c in coords {
        sum_lat += c.y;
        sum_lon += c.x;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    Some(Centroid {
        latitude: sum_lat / count as f64,
        longitude: sum_lon / count as f64,
        count,
    })
}
