pub mod centroid;
pub mod feature;
pub mod graph;
pub mod place;

pub use centroid::Centroid;
pub use feature::{
    CollectionError, ElementKind, Feature, FeatureCollection, FeatureId, Geometry, PoiCategory,
    TagFilter,
};
pub use graph::{Edge, Graph, NetworkType, Node};
pub use place::{PlaceDescriptor, Region};
