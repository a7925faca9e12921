use geo::Polygon;
use serde_json::{Map, Value, json};

use super::{MAX_ZOOM, MapArtifact, MapRenderer, RenderError};
use crate::domain::{Centroid, Feature, FeatureCollection, Geometry, Graph};
use crate::geometry::BoundingBox;

/// Exports the street network and POIs as one GeoJSON `FeatureCollection`.
///
/// Street edges are `LineString`s with `layer: "street"`; POIs keep their
/// geometry and carry `layer: "poi"` plus a display `category`. The map
/// centre and zoom are stored as foreign members `center` (`[lon, lat]`) and
/// `zoom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonRenderer {
    pub pretty: bool,
}

impl GeoJsonRenderer {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

fn street_features(graph: &Graph) -> impl Iterator<Item = Value> + '_ {
    graph.edges().iter().filter_map(move |edge| {
        let (a, b) = graph.edge_coords(edge)?;
        Some(json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": [[a.x, a.y], [b.x, b.y]],
            },
            "properties": {
                "layer": "street",
                "name": edge.name,
                "highway": edge.highway,
                "network_type": edge.network_type.as_str(),
                "length_m": edge.length_m,
                "from": edge.from,
                "to": edge.to,
            },
        }))
    })
}

fn poi_geometry(geometry: &Geometry) -> Value {
    match geometry {
        Geometry::Point(p) => json!({
            "type": "Point",
            "coordinates": [p.x(), p.y()],
        }),
        Geometry::Polygon(poly) => json!({
            "type": "Polygon",
            "coordinates": polygon_rings(poly),
        }),
        Geometry::MultiPolygon(multi) => json!({
            "type": "MultiPolygon",
            "coordinates": multi.0.iter().map(polygon_rings).collect::<Vec<_>>(),
        }),
    }
}

fn polygon_rings(poly: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(poly.exterior())
        .chain(poly.interiors())
        .map(|ring| ring.0.iter().map(|c| [c.x, c.y]).collect())
        .collect()
}

fn poi_feature(feature: &Feature) -> Value {
    json!({
        "type": "Feature",
        "id": feature.id.to_string(),
        "geometry": poi_geometry(&feature.geometry),
        "properties": {
            "layer": "poi",
            "name": feature.name.as_deref().unwrap_or("Unnamed POI"),
            "category": feature.display_category().as_str(),
            "categories": feature.categories,
        },
    })
}

impl MapRenderer for GeoJsonRenderer {
    fn render(
        &self,
        graph: &Graph,
        features: &FeatureCollection,
        centroid: &Centroid,
        zoom: u8,
    ) -> Result<MapArtifact, RenderError> {
        if zoom > MAX_ZOOM {
            return Err(RenderError::InvalidZoom(zoom));
        }

        let items: Vec<Value> = street_features(graph)
            .chain(features.iter().map(poi_feature))
            .collect();

        let mut doc = Map::new();
        doc.insert("type".to_string(), json!("FeatureCollection"));

        let coords = graph
            .nodes()
            .map(|n| n.coord)
            .chain(features.points())
            .collect::<Vec<_>>();
        if let Some(bbox) = BoundingBox::from_coords(&coords) {
            doc.insert("bbox".to_string(), json!(bbox.to_geojson()));
        }

        doc.insert(
            "center".to_string(),
            json!([centroid.longitude, centroid.latitude]),
        );
        doc.insert("zoom".to_string(), json!(zoom));
        doc.insert("features".to_string(), Value::Array(items));

        let doc = Value::Object(doc);
        let content = if self.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };

        Ok(MapArtifact {
            media_type: "application/geo+json",
            content,
        })
    }
}
