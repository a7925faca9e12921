use crate::geometry::{BoundingBox, Crs};

/// Geographic area the pipeline fetches data for
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// Free-text name to be geocoded by the provider (e.g. "Salzburg, Austria")
    Named(String),
    /// Explicit bounding box, no geocoding needed
    Bounds(BoundingBox),
}

/// A validated, normalized place identifier
///
/// Built by [`crate::pipeline::resolve`]; equality is case-insensitive on the
/// identifier.
#[derive(Debug, Clone)]
pub struct PlaceDescriptor {
    identifier: String,
    key: String,
    region: Region,
    crs: Crs,
}

impl PlaceDescriptor {
    pub(crate) fn new(identifier: String, region: Region, crs: Crs) -> Self {
        let key = identifier.to_lowercase();
        Self {
            identifier,
            key,
            region,
            crs,
        }
    }

    /// The trimmed identifier as supplied by the caller
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Lowercased identifier used for comparisons
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }
}

impl PartialEq for PlaceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.crs == other.crs
    }
}

impl std::fmt::Display for PlaceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.identifier)
    }
}
