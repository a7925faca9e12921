pub mod nominatim;
pub mod overpass;
pub mod provider;

pub use nominatim::geocode_place;
pub use overpass::{OverpassProvider, Member, OverpassResponse};
pub use provider::{MapDataProvider, RawEdge, RawFeature, RawFeatures, RawGraph};
