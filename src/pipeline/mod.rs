//! Place resolution, data acquisition and map placement.
//!
//! ```text
//! resolve ──┬── fetch_network ──┬── compute_centroid ── MapRenderer
//!           └── fetch_features ─┘
//! ```

pub mod centroid;
pub mod features;
pub mod network;
pub mod resolver;

pub use centroid::compute_centroid;
pub use features::fetch_features;
pub use network::fetch_network;
pub use resolver::{resolve, resolve_bounds, resolve_with_crs};

use std::thread;

use tracing::{info, warn};

use crate::api::MapDataProvider;
use crate::domain::{Centroid, FeatureCollection, Graph, NetworkType, PlaceDescriptor, TagFilter};
use crate::error::Result;

/// Both datasets for one place, each with its own outcome
#[derive(Debug)]
pub struct Acquired {
    pub network: Result<Graph>,
    pub features: Result<FeatureCollection>,
}

/// Everything a renderer needs to draw the map
#[derive(Debug)]
pub struct MapPlan {
    pub place: PlaceDescriptor,
    pub graph: Graph,
    pub features: FeatureCollection,
    pub centroid: Centroid,
    /// Set when points of interest could not be fetched and the plan fell
    /// back to an empty collection
    pub feature_error: Option<crate::Error>,
}

/// Runs the pipeline steps against one provider
pub struct Pipeline<P> {
    provider: P,
}

impl<P> Pipeline<P>
where
    P: MapDataProvider + Sync,
{
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch the network and the features concurrently.
    ///
    /// The two results are independent; the caller decides how to combine
    /// them.
    pub fn acquire(
        &self,
        place: &PlaceDescriptor,
        network_type: NetworkType,
        tags: &TagFilter,
    ) -> Acquired {
        let provider = &self.provider;

        thread::scope(|s| {
            let features = s.spawn(|| fetch_features(provider, place, tags));
            let network = fetch_network(provider, place, network_type);
            let features = match features.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            Acquired { network, features }
        })
    }

    /// Resolve, acquire and place the map.
    ///
    /// A missing street network aborts; missing points of interest degrade to
    /// an empty collection recorded in [`MapPlan::feature_error`].
    pub fn run(
        &self,
        identifier: &str,
        network_type: NetworkType,
        tags: &TagFilter,
    ) -> Result<MapPlan> {
        let place = resolve(identifier)?;
        self.plan(place, network_type, tags)
    }

    /// [`Pipeline::run`] for an already resolved place
    pub fn plan(
        &self,
        place: PlaceDescriptor,
        network_type: NetworkType,
        tags: &TagFilter,
    ) -> Result<MapPlan> {
        let Acquired { network, features } = self.acquire(&place, network_type, tags);
        let graph = network?;

        let (features, feature_error) = match features {
            Ok(features) => (features, None),
            Err(e) => {
                warn!(error = %e, "continuing without points of interest");
                (FeatureCollection::empty(), Some(e))
            }
        };

        let centroid = compute_centroid(&graph, &features)?;
        info!(%centroid, points = centroid.count, "map centre computed");

        Ok(MapPlan {
            place,
            graph,
            features,
            centroid,
            feature_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::api::RawFeatures;
    use crate::test_support::{StubProvider, raw_point, triangle_graph};

    fn cafes() -> TagFilter {
        TagFilter::new().with("amenity", ["cafe"])
    }

    #[test]
    fn test_run_combines_both_datasets() {
        let raw = RawFeatures {
            features: vec![raw_point(10, 47.80, 13.04, &[("amenity", "cafe")])],
            ..RawFeatures::default()
        };
        let pipeline = Pipeline::new(StubProvider::new(Some(triangle_graph()), Some(raw)));

        let plan = pipeline
            .run(" Salzburg, Austria ", NetworkType::Walk, &cafes())
            .unwrap();
        assert_eq!(plan.place.identifier(), "Salzburg, Austria");
        assert_eq!(plan.graph.node_count(), 3);
        assert_eq!(plan.features.len(), 1);
        assert_eq!(plan.centroid.count, 4);
        assert!(plan.feature_error.is_none());
        assert_eq!(pipeline.provider().calls(), (1, 1));
    }

    #[test]
    fn test_feature_failure_degrades_to_empty() {
        let pipeline = Pipeline::new(StubProvider::new(Some(triangle_graph()), None));

        let plan = pipeline
            .run("Salzburg, Austria", NetworkType::Walk, &cafes())
            .unwrap();
        assert!(plan.features.is_empty());
        assert_eq!(plan.centroid.count, 3);
        assert!(matches!(plan.feature_error, Some(Error::Acquisition { .. })));
    }

    #[test]
    fn test_network_failure_aborts() {
        let pipeline = Pipeline::new(StubProvider::new(None, Some(RawFeatures::default())));

        let err = pipeline
            .run("Salzburg, Austria", NetworkType::Walk, &cafes())
            .unwrap_err();
        assert!(matches!(err, Error::Acquisition { .. }));
    }

    #[test]
    fn test_invalid_place_never_reaches_provider() {
        let pipeline = Pipeline::new(StubProvider::new(Some(triangle_graph()), None));

        let err = pipeline.run("  ", NetworkType::Walk, &cafes()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(pipeline.provider().calls(), (0, 0));
    }

    #[test]
    fn test_acquire_reports_independently() {
        let pipeline = Pipeline::new(StubProvider::new(None, Some(RawFeatures::default())));
        let place = resolve("Salzburg, Austria").unwrap();

        let acquired = pipeline.acquire(&place, NetworkType::Drive, &cafes());
        assert!(acquired.network.is_err());
        assert!(acquired.features.unwrap().is_empty());
    }
}
