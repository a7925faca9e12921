pub mod geojson;

pub use geojson::GeoJsonRenderer;

use thiserror::Error;

use crate::domain::{Centroid, FeatureCollection, Graph};

/// Zoom levels accepted by slippy-map viewers
pub const MAX_ZOOM: u8 = 20;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("zoom level {0} is outside 0..=20")]
    InvalidZoom(u8),

    #[error("failed to serialize map: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A rendered map, ready to be written out by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct MapArtifact {
    pub media_type: &'static str,
    pub content: String,
}

/// Turns pipeline output into a displayable map
pub trait MapRenderer {
    fn render(
        &self,
        graph: &Graph,
        features: &FeatureCollection,
        centroid: &Centroid,
        zoom: u8,
    ) -> Result<MapArtifact, RenderError>;
}
