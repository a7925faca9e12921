use crate::api::overpass::{Element, OverpassResponse};
use crate::api::provider::{RawEdge, RawFeature};
use crate::domain::{FeatureId, Geometry, NetworkType, Node};
use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Direction(s) a way may be traversed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Oneway {
    Forward,
    Reverse,
    Both,
}

impl Oneway {
    fn from_tags(tags: Option<&HashMap<String, String>>, network_type: NetworkType) -> Self {
        // Pedestrians may walk against the flow of traffic
        if network_type == NetworkType::Walk {
            return Oneway::Both;
        }

        match tags.and_then(|t| t.get("oneway")).map(String::as_str) {
            Some("yes" | "true" | "1") => Oneway::Forward,
            Some("-1" | "reverse") => Oneway::Reverse,
            _ => Oneway::Both,
        }
    }
}

fn build_node_lookup(response: &OverpassResponse) -> HashMap<u64, Coord<f64>> {
    response
        .elements
        .iter()
        .filter(|e| e.type_ == "node")
        .filter_map(|e| {
            let lat = e.lat?;
            let lon = e.lon?;
            Some((e.id, Coord { x: lon, y: lat }))
        })
        .collect()
}

/// Resolve node refs, dropping refs with no coordinates in the response
fn resolve_way_refs(node_refs: &[u64], nodes: &HashMap<u64, Coord<f64>>) -> Vec<u64> {
    node_refs
        .iter()
        .copied()
        .filter(|id| nodes.contains_key(id))
        .collect()
}

fn is_closed_way(refs: &[u64]) -> bool {
    refs.len() >= 4 && refs.first() == refs.last()
}

/// Parse Overpass response into street network nodes and edges
///
/// # Algorithm
/// 1. Build node_id → coordinate lookup from all node elements
/// 2. For each way, resolve node refs and emit an edge per consecutive pair,
///    in the direction(s) allowed by its `oneway` tag
/// 3. Keep only nodes referenced by an edge
pub fn parse_graph(
    response: &OverpassResponse,
    network_type: NetworkType,
) -> (Vec<Node>, Vec<RawEdge>) {
    let lookup = build_node_lookup(response);
    let mut edges = Vec::new();
    let mut used: HashSet<u64> = HashSet::new();

    for element in &response.elements {
        if element.type_ != "way" {
            continue;
        }

        let node_refs = match &element.nodes {
            Some(n) => n,
            None => continue,
        };

        let refs = resolve_way_refs(node_refs, &lookup);
        if refs.len() < 2 {
            continue;
        }

        let tags = element.tags.as_ref();
        let name = tags.and_then(|t| t.get("name")).cloned();
        let highway = tags.and_then(|t| t.get("highway")).cloned();
        let oneway = Oneway::from_tags(tags, network_type);

        for pair in refs.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                continue;
            }

            let mut push = |from: u64, to: u64| {
                edges.push(RawEdge {
                    from,
                    to,
                    name: name.clone(),
                    highway: highway.clone(),
                });
            };
            match oneway {
                Oneway::Forward => push(a, b),
                Oneway::Reverse => push(b, a),
                Oneway::Both => {
                    push(a, b);
                    push(b, a);
                }
            }
            used.insert(a);
            used.insert(b);
        }
    }

    // BTreeMap keeps node output ordered by id
    let nodes: BTreeMap<u64, Coord<f64>> = lookup
        .into_iter()
        .filter(|(id, _)| used.contains(id))
        .collect();

    let nodes = nodes
        .into_iter()
        .map(|(id, coord)| Node { id, coord })
        .collect();

    (nodes, edges)
}

fn has_tags(element: &Element) -> bool {
    element.tags.as_ref().is_some_and(|t| !t.is_empty())
}

fn is_area_relation(element: &Element) -> bool {
    let kind = element.tags.as_ref().and_then(|t| t.get("type"));
    matches!(kind.map(String::as_str), Some("multipolygon" | "boundary"))
}

/// Join member ways end to end into closed rings of node ids.
///
/// Ways are reversed where needed. Chains that never close are dropped.
fn assemble_rings(mut segments: Vec<Vec<u64>>) -> Vec<Vec<u64>> {
    let mut rings = Vec::new();

    while let Some(mut ring) = segments.pop() {
        loop {
            if is_closed_way(&ring) {
                rings.push(ring);
                break;
            }
            let Some(&tail) = ring.last() else { break };
            let next = segments
                .iter()
                .position(|s| s.first() == Some(&tail) || s.last() == Some(&tail));
            let Some(index) = next else { break };

            let mut segment = segments.swap_remove(index);
            if segment.first() != Some(&tail) {
                segment.reverse();
            }
            ring.extend(segment.into_iter().skip(1));
        }
    }

    rings
}

fn ring_coords(ring: &[u64], lookup: &HashMap<u64, Coord<f64>>) -> LineString<f64> {
    ring.iter().filter_map(|id| lookup.get(id).copied()).collect()
}

/// Build a multipolygon from a relation's outer and inner member ways.
///
/// Each inner ring is attached to the first outer ring containing it. When no
/// outer ring closes, the mean of all member coordinates stands in as a
/// point.
fn relation_geometry(
    element: &Element,
    ways: &HashMap<u64, &Vec<u64>>,
    lookup: &HashMap<u64, Coord<f64>>,
) -> Option<Geometry> {
    let members = element.members.as_ref()?;
    let mut outer = Vec::new();
    let mut inner = Vec::new();

    for member in members.iter().filter(|m| m.type_ == "way") {
        let Some(node_refs) = ways.get(&member.ref_) else {
            continue;
        };
        let refs = resolve_way_refs(node_refs, lookup);
        if refs.len() < 2 {
            continue;
        }
        match member.role.as_str() {
            "inner" => inner.push(refs),
            _ => outer.push(refs),
        }
    }

    let mut polygons: Vec<Polygon<f64>> = assemble_rings(outer.clone())
        .iter()
        .map(|ring| Polygon::new(ring_coords(ring, lookup), vec![]))
        .collect();

    if polygons.is_empty() {
        let coords: Vec<Coord<f64>> = outer
            .iter()
            .flatten()
            .filter_map(|id| lookup.get(id).copied())
            .collect();
        if coords.is_empty() {
            return None;
        }
        let n = coords.len() as f64;
        let (x, y) = coords.iter().fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
        return Some(Geometry::Point(Point::new(x / n, y / n)));
    }

    for ring in assemble_rings(inner) {
        let ring = ring_coords(&ring, lookup);
        let Some(&first) = ring.0.first() else {
            continue;
        };
        if let Some(poly) = polygons
            .iter_mut()
            .find(|p| p.contains(&Point::from(first)))
        {
            poly.interiors_push(ring);
        }
    }

    Some(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
}

/// Parse Overpass response into tagged features
///
/// Tagged nodes become points, tagged closed ways become polygons and
/// multipolygon relations become multipolygons. Open ways and other
/// relations are skipped. When an element appears more than once only the
/// first is kept.
pub fn parse_features(response: &OverpassResponse) -> Vec<RawFeature> {
    let lookup = build_node_lookup(response);
    let ways: HashMap<u64, &Vec<u64>> = response
        .elements
        .iter()
        .filter(|e| e.type_ == "way")
        .filter_map(|e| Some((e.id, e.nodes.as_ref()?)))
        .collect();
    let mut seen: HashSet<FeatureId> = HashSet::new();
    let mut features = Vec::new();

    for element in &response.elements {
        if !has_tags(element) {
            continue;
        }

        let (id, geometry) = match element.type_.as_str() {
            "node" => {
                let (Some(lat), Some(lon)) = (element.lat, element.lon) else {
                    continue;
                };
                (FeatureId::node(element.id), Geometry::Point(Point::new(lon, lat)))
            }
            "way" => {
                let node_refs = match &element.nodes {
                    Some(n) => n,
                    None => continue,
                };
                let refs = resolve_way_refs(node_refs, &lookup);
                if !is_closed_way(&refs) {
                    continue;
                }
                let ring = refs
                    .iter()
                    .filter_map(|id| lookup.get(id))
                    .map(|c| (c.x, c.y))
                    .collect();
                (FeatureId::way(element.id), Geometry::polygon(ring))
            }
            "relation" if is_area_relation(element) => {
                let Some(geometry) = relation_geometry(element, &ways, &lookup) else {
                    continue;
                };
                (FeatureId::relation(element.id), geometry)
            }
            _ => continue,
        };

        if !seen.insert(id) {
            continue;
        }

        features.push(RawFeature {
            id,
            geometry,
            tags: element.tags.clone().unwrap_or_default(),
        });
    }

    features
}
