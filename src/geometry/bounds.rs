use std::fmt;

use geo::Coord;

/// Bounding box in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting non-finite, inverted or out-of-range
    /// edges.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Option<Self> {
        let edges = [south, west, north, east];
        if edges.iter().any(|v| !v.is_finite()) {
            return None;
        }
        if south > north || west > east {
            return None;
        }
        if south < -90.0 || north > 90.0 || west < -180.0 || east > 180.0 {
            return None;
        }

        Some(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Parse `south,west,north,east`
    pub fn parse(text: &str) -> Option<Self> {
        let values: Vec<f64> = text
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;

        match values.as_slice() {
            &[south, west, north, east] => Self::new(south, west, north, east),
            _ => None,
        }
    }

    /// Box spanning `radius_m` around a (lat, lon) centre
    pub fn around(center: (f64, f64), radius_m: u32) -> Option<Self> {
        let (lat, lon) = center;
        let radius_km = radius_m as f64 / 1000.0;

        // 1 degree latitude ≈ 111 km, longitude shrinks with cos(lat)
        let lat_delta = radius_km / 111.0;
        let lon_delta = radius_km / (111.0 * lat.to_radians().cos());

        Self::new(
            (lat - lat_delta).max(-90.0),
            (lon - lon_delta).max(-180.0),
            (lat + lat_delta).min(90.0),
            (lon + lon_delta).min(180.0),
        )
    }

    /// Smallest box enclosing the given coordinates (`x` = lon, `y` = lat)
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord<f64>>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;

        let mut bbox = Self {
            south: first.y,
            west: first.x,
            north: first.y,
            east: first.x,
        };
        for c in iter {
            bbox.south = bbox.south.min(c.y);
            bbox.north = bbox.north.max(c.y);
            bbox.west = bbox.west.min(c.x);
            bbox.east = bbox.east.max(c.x);
        }

        Some(bbox)
    }

    pub fn contains(&self, coord: &Coord<f64>) -> bool {
        coord.y >= self.south
            && coord.y <= self.north
            && coord.x >= self.west
            && coord.x <= self.east
    }

    /// Order used by the GeoJSON `bbox` member
    pub fn to_geojson(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

/// Formats in Overpass QL order: `south,west,north,east`
impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}
