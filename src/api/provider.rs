//! Capability interface for map-data sources and the raw data they return.

use std::collections::HashMap;

use crate::domain::{FeatureId, Geometry, NetworkType, Node, PlaceDescriptor, TagFilter};
use crate::error::ProviderError;
use crate::geometry::Crs;

/// Edge as delivered by a provider, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RawEdge {
    pub from: u64,
    pub to: u64,
    pub name: Option<String>,
    pub highway: Option<String>,
}

/// Street network data in the provider's coordinate system
#[derive(Debug, Clone, Default)]
pub struct RawGraph {
    pub crs: Crs,
    pub nodes: Vec<Node>,
    pub edges: Vec<RawEdge>,
}

/// Feature as delivered by a provider, with all of its source tags
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub tags: HashMap<String, String>,
}

/// Feature data in the provider's coordinate system
#[derive(Debug, Clone, Default)]
pub struct RawFeatures {
    pub crs: Crs,
    pub features: Vec<RawFeature>,
}

/// Source of street networks and tagged features.
///
/// Implementations must surface failures (unknown place, transport errors)
/// as `Err` rather than returning empty data. Empty data is only returned
/// when the request succeeded and nothing matched.
pub trait MapDataProvider {
    /// Street network for `place`, filtered for `network_type`
    fn fetch_graph(
        &self,
        place: &PlaceDescriptor,
        network_type: NetworkType,
    ) -> Result<RawGraph, ProviderError>;

    /// Features for `place` matching any of `tags`
    fn fetch_features(
        &self,
        place: &PlaceDescriptor,
        tags: &TagFilter,
    ) -> Result<RawFeatures, ProviderError>;
}

impl<P: MapDataProvider + ?Sized> MapDataProvider for &P {
    fn fetch_graph(
        &self,
        place: &PlaceDescriptor,
        network_type: NetworkType,
    ) -> Result<RawGraph, ProviderError> {
        (**self).fetch_graph(place, network_type)
    }

    fn fetch_features(
        &self,
        place: &PlaceDescriptor,
        tags: &TagFilter,
    ) -> Result<RawFeatures, ProviderError> {
        (**self).fetch_features(place, tags)
    }
}
