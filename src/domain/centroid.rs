/// Representative map centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub latitude: f64,
    pub longitude: f64,
    /// Number of coordinates averaged
    pub count: usize,
}

impl Centroid {
    /// (lat, lon) pair
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl std::fmt::Display for Centroid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lat {:.4}, Lon {:.4}", self.latitude, self.longitude)
    }
}
