//! findmyroute - Fetch OpenStreetMap street networks and points of interest
//! for a place and work out where to centre a map of them.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod osm;
pub mod pipeline;
pub mod render;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AcquisitionFailure, Dataset, Error, ProviderError, Result};
pub use pipeline::{
    MapPlan, Pipeline, compute_centroid, fetch_features, fetch_network, resolve,
};
