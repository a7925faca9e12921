use std::fmt;
use std::str::FromStr;

use geo::Coord;

/// WGS84 semi-major axis used by Web Mercator
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Meters per degree at equator
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Coordinate reference systems the pipeline can reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Crs {
    /// Geographic lon/lat degrees, EPSG:4326
    #[default]
    Wgs84,
    /// Spherical Mercator meters, EPSG:3857
    WebMercator,
}

impl Crs {
    pub fn code(&self) -> &'static str {
        match self {
            Crs::Wgs84 => "EPSG:4326",
            Crs::WebMercator => "EPSG:3857",
        }
    }

    /// Convert a coordinate in this CRS to WGS84 (`x` = lon, `y` = lat)
    pub fn to_wgs84(&self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Crs::Wgs84 => coord,
            Crs::WebMercator => {
                let lon = (coord.x / EARTH_RADIUS_M).to_degrees();
                let lat = (2.0 * (coord.y / EARTH_RADIUS_M).exp().atan()
                    - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                Coord { x: lon, y: lat }
            }
        }
    }
}

impl FromStr for Crs {
    type Err = String;

    /// Accepts `EPSG:4326`, `epsg:3857` or the bare number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = match trimmed.split_once(':') {
            Some((authority, number)) if authority.eq_ignore_ascii_case("epsg") => number,
            Some(_) => return Err(format!("unrecognized CRS code: {}", trimmed)),
            None => trimmed,
        };

        match number.trim() {
            "4326" => Ok(Crs::Wgs84),
            "3857" | "900913" => Ok(Crs::WebMercator),
            _ => Err(format!("unrecognized CRS code: {}", trimmed)),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Simple Mercator-like projection from WGS84 to local meters
///
/// Uses approximation suitable for city-scale networks:
/// - x = (lon - center_lon) * cos(center_lat) * 111320
/// - y = (lat - center_lat) * 111320
#[derive(Debug, Clone)]
pub struct Projector {
    center_lat: f64,
    center_lon: f64,
    cos_lat: f64,
}

impl Projector {
    /// Create a new projector centered at the given (lat, lon)
    pub fn new(center: (f64, f64)) -> Self {
        let (lat, lon) = center;
        Self {
            center_lat: lat,
            center_lon: lon,
            cos_lat: lat.to_radians().cos(),
        }
    }

    /// Project a lat/lon point to local meters
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = (lon - self.center_lon) * self.cos_lat * METERS_PER_DEGREE;
        let y = (lat - self.center_lat) * METERS_PER_DEGREE;

        (x, y)
    }

    /// Planar distance in meters between two WGS84 coordinates
    pub fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        let (ax, ay) = self.project(a.y, a.x);
        let (bx, by) = self.project(b.y, b.x);
        (bx - ax).hypot(by - ay)
    }
}
