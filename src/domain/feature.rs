use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use geo::{Centroid, Coord, LineString, MultiPolygon, Point, Polygon};

/// OSM element type a feature was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

/// Unique feature identifier: element type plus OSM id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId {
    pub kind: ElementKind,
    pub id: u64,
}

impl FeatureId {
    pub fn node(id: u64) -> Self {
        Self {
            kind: ElementKind::Node,
            id,
        }
    }

    pub fn way(id: u64) -> Self {
        Self {
            kind: ElementKind::Way,
            id,
        }
    }

    pub fn relation(id: u64) -> Self {
        Self {
            kind: ElementKind::Relation,
            id,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        };
        write!(f, "{}/{}", kind, self.id)
    }
}

/// Feature geometry in WGS84 (`x` = lon, `y` = lat)
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    /// Area assembled from a multipolygon relation
    MultiPolygon(MultiPolygon<f64>),
}

fn ring_is_valid(ring: &LineString<f64>) -> bool {
    ring.0.len() >= 4 && ring.0.iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

fn polygon_is_valid(poly: &Polygon<f64>) -> bool {
    ring_is_valid(poly.exterior()) && poly.interiors().iter().all(ring_is_valid)
}

fn map_polygon(poly: Polygon<f64>, f: &impl Fn(Coord<f64>) -> Coord<f64>) -> Polygon<f64> {
    let (exterior, interiors) = poly.into_inner();
    let map_ring =
        |ring: LineString<f64>| -> LineString<f64> { ring.0.into_iter().map(f).collect() };
    Polygon::new(
        map_ring(exterior),
        interiors.into_iter().map(map_ring).collect(),
    )
}

impl Geometry {
    /// Build a polygon from an outer ring of (lon, lat) pairs
    pub fn polygon(ring: Vec<(f64, f64)>) -> Self {
        Geometry::Polygon(Polygon::new(ring.into(), vec![]))
    }

    /// A geometry is usable when it has coordinates and all are finite.
    /// Every polygon ring needs at least three corners plus the closing
    /// coordinate; a multipolygon needs at least one polygon.
    pub fn is_valid(&self) -> bool {
        match self {
            Geometry::Point(p) => p.x().is_finite() && p.y().is_finite(),
            Geometry::Polygon(poly) => polygon_is_valid(poly),
            Geometry::MultiPolygon(multi) => {
                !multi.0.is_empty() && multi.0.iter().all(polygon_is_valid)
            }
        }
    }

    /// Point used for aggregation: the point itself, or the area centroid.
    ///
    /// Always `Some` for a geometry that passes [`Geometry::is_valid`].
    pub fn representative_point(&self) -> Option<Coord<f64>> {
        match self {
            Geometry::Point(p) => Some(p.0),
            Geometry::Polygon(poly) => poly.centroid().map(|c| c.0),
            Geometry::MultiPolygon(multi) => multi.centroid().map(|c| c.0),
        }
    }

    pub(crate) fn map_coords(self, f: impl Fn(Coord<f64>) -> Coord<f64>) -> Self {
        match self {
            Geometry::Point(p) => Geometry::Point(Point(f(p.0))),
            Geometry::Polygon(poly) => Geometry::Polygon(map_polygon(poly, &f)),
            Geometry::MultiPolygon(multi) => Geometry::MultiPolygon(
                multi.0.into_iter().map(|p| map_polygon(p, &f)).collect(),
            ),
        }
    }
}

/// Category filter: key (e.g. "amenity") to accepted values.
/// An empty value set accepts any value of that key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter(BTreeMap<String, BTreeSet<String>>);

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values for `key`, merging with any already present
    pub fn insert<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn with<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(key, values);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse `key=value1,value2` or a bare `key`
    pub fn parse_entry(entry: &str) -> Option<(String, Vec<String>)> {
        let (key, values) = match entry.split_once('=') {
            Some((k, v)) => (k.trim(), v),
            None => (entry.trim(), ""),
        };
        if key.is_empty() {
            return None;
        }

        let values = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        Some((key.to_string(), values))
    }
}

impl<K, V> FromIterator<(K, V)> for TagFilter
where
    K: Into<String>,
    V: IntoIterator,
    V::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut filter = TagFilter::new();
        for (key, values) in iter {
            filter.insert(key, values);
        }
        filter
    }
}

/// How a POI is grouped on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiCategory {
    Attraction,
    Cafe,
    Park,
    Other,
}

impl PoiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiCategory::Attraction => "attraction",
            PoiCategory::Cafe => "cafe",
            PoiCategory::Park => "park",
            PoiCategory::Other => "other",
        }
    }
}

/// A tagged point or area of interest
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub name: Option<String>,
    /// Category key to values, e.g. `amenity -> [cafe]`. May be empty.
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Feature {
    pub fn has_category(&self, key: &str, value: &str) -> bool {
        self.categories
            .get(key)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    pub fn display_category(&self) -> PoiCategory {
        if self.has_category("tourism", "attraction") {
            PoiCategory::Attraction
        } else if self.has_category("amenity", "cafe") {
            PoiCategory::Cafe
        } else if self.has_category("leisure", "park") {
            PoiCategory::Park
        } else {
            PoiCategory::Other
        }
    }
}

/// Why a set of features cannot form a [`FeatureCollection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("duplicate feature {0}")]
    DuplicateId(FeatureId),
    #[error("feature {0} has no usable geometry")]
    InvalidGeometry(FeatureId),
}

/// Ordered features with unique ids and valid geometry.
///
/// `FeatureCollection::default()` is the empty collection.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    /// Build a collection, rejecting the first feature with unusable
    /// geometry or a repeated id
    pub fn try_new(features: Vec<Feature>) -> Result<Self, CollectionError> {
        let mut seen = HashSet::with_capacity(features.len());
        for feature in &features {
            if !feature.geometry.is_valid() {
                return Err(CollectionError::InvalidGeometry(feature.id));
            }
            if !seen.insert(feature.id) {
                return Err(CollectionError::DuplicateId(feature.id));
            }
        }
        Ok(Self { features })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// One representative coordinate per feature, in collection order
    pub fn points(&self) -> impl Iterator<Item = Coord<f64>> + '_ {
        self.features
            .iter()
            .filter_map(|f| f.geometry.representative_point())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
