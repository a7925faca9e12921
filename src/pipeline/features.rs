use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::api::{MapDataProvider, RawFeature};
use crate::domain::{Feature, FeatureCollection, PlaceDescriptor, TagFilter};
use crate::error::{AcquisitionFailure, Dataset, Error, Result};
use crate::geometry::Crs;

/// Fetch points of interest for `place` matching `tags`.
///
/// `tags` must name at least one non-blank category key; this is checked
/// before the provider is called. Unlike [`super::fetch_network`], a place
/// with no matching features yields an empty collection rather than an
/// error.
pub fn fetch_features<P>(
    provider: &P,
    place: &PlaceDescriptor,
    tags: &TagFilter,
) -> Result<FeatureCollection>
where
    P: MapDataProvider + ?Sized,
{
    validate_tags(tags)?;

    info!(place = %place, ?tags, "downloading points of interest");
    let fail = |source: AcquisitionFailure| {
        Error::acquisition(place.identifier(), Dataset::Features, source)
    };

    let raw = provider
        .fetch_features(place, tags)
        .map_err(|e| fail(e.into()))?;

    let crs = raw.crs;
    let features: Vec<Feature> = raw
        .features
        .into_iter()
        .filter_map(|f| to_feature(f, crs, tags))
        .collect();

    let collection = FeatureCollection::try_new(features).map_err(|e| fail(e.into()))?;

    if collection.is_empty() {
        info!(place = %place, "no points of interest matched the given tags");
    } else {
        info!(count = collection.len(), "found points of interest");
    }
    Ok(collection)
}

fn validate_tags(tags: &TagFilter) -> Result<()> {
    if tags.is_empty() {
        return Err(Error::invalid("at least one tag category is required"));
    }
    if tags.keys().any(|k| k.trim().is_empty()) {
        return Err(Error::invalid("tag category keys must not be blank"));
    }
    Ok(())
}

/// Reproject and keep only the filter's category keys. Features without
/// usable geometry are skipped.
fn to_feature(raw: RawFeature, crs: Crs, tags: &TagFilter) -> Option<Feature> {
    let RawFeature {
        id,
        geometry,
        tags: raw_tags,
    } = raw;

    let geometry = geometry.map_coords(|c| crs.to_wgs84(c));
    if !geometry.is_valid() {
        let name = raw_tags.get("name").map_or("Unnamed POI", String::as_str);
        warn!(%id, name, "skipping feature with unusable geometry");
        return None;
    }

    let categories: BTreeMap<String, Vec<String>> = tags
        .keys()
        .filter_map(|key| {
            let values: Vec<String> = raw_tags
                .get(key)?
                .split(';')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            (!values.is_empty()).then(|| (key.to_string(), values))
        })
        .collect();

    Some(Feature {
        id,
        geometry,
        name: raw_tags.get("name").cloned(),
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RawFeatures;
    use crate::domain::{FeatureId, Geometry};
    use crate::pipeline::resolve;
    use crate::test_support::{StubProvider, raw_point};
    use geo::Point;

    fn cafes() -> TagFilter {
        TagFilter::new().with("amenity", ["cafe"])
    }

    #[test]
    fn test_empty_tags_rejected_before_provider_call() {
        let provider = StubProvider::new(None, Some(RawFeatures::default()));
        let place = resolve("Salzburg, Austria").unwrap();

        let err = fetch_features(&provider, &place, &TagFilter::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(provider.calls(), (0, 0));
    }

    #[test]
    fn test_blank_key_rejected() {
        let provider = StubProvider::default();
        let place = resolve("Salzburg, Austria").unwrap();
        let tags = TagFilter::new().with(" ", ["cafe"]);

        assert!(matches!(
            fetch_features(&provider, &place, &tags),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_results_is_empty_success() {
        let provider = StubProvider::new(None, Some(RawFeatures::default()));
        let place = resolve("Salzburg, Austria").unwrap();

        let features = fetch_features(&provider, &place, &cafes()).unwrap();
        assert!(features.is_empty());
        assert_eq!(provider.calls(), (0, 1));
    }

    #[test]
    fn test_categories_limited_to_filter_keys() {
        let raw = RawFeatures {
            features: vec![raw_point(
                7,
                47.80,
                13.04,
                &[
                    ("amenity", "cafe;restaurant"),
                    ("name", "Café Bazar"),
                    ("wheelchair", "yes"),
                ],
            )],
            ..RawFeatures::default()
        };
        let provider = StubProvider::new(None, Some(raw));
        let place = resolve("Salzburg, Austria").unwrap();

        let features = fetch_features(&provider, &place, &cafes()).unwrap();
        let feature = features.iter().next().unwrap();
        assert_eq!(feature.name.as_deref(), Some("Café Bazar"));
        assert_eq!(
            feature.categories.get("amenity"),
            Some(&vec!["cafe".to_string(), "restaurant".to_string()])
        );
        assert!(!feature.categories.contains_key("wheelchair"));
    }

    #[test]
    fn test_invalid_geometry_skipped() {
        let mut broken = raw_point(8, 47.80, 13.04, &[("amenity", "cafe")]);
        broken.geometry = Geometry::Point(Point::new(f64::NAN, 47.80));
        let raw = RawFeatures {
            features: vec![broken, raw_point(9, 47.80, 13.04, &[("amenity", "cafe")])],
            ..RawFeatures::default()
        };
        let provider = StubProvider::new(None, Some(raw));
        let place = resolve("Salzburg, Austria").unwrap();

        let features = fetch_features(&provider, &place, &cafes()).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features.iter().next().unwrap().id, FeatureId::node(9));
    }

    #[test]
    fn test_duplicate_ids_is_acquisition_error() {
        let raw = RawFeatures {
            features: vec![
                raw_point(9, 47.80, 13.04, &[("amenity", "cafe")]),
                raw_point(9, 47.81, 13.05, &[("amenity", "cafe")]),
            ],
            ..RawFeatures::default()
        };
        let provider = StubProvider::new(None, Some(raw));
        let place = resolve("Salzburg, Austria").unwrap();

        let err = fetch_features(&provider, &place, &cafes()).unwrap_err();
        assert!(matches!(
            err,
            Error::Acquisition {
                dataset: Dataset::Features,
                source: AcquisitionFailure::DuplicateFeature(id),
                ..
            } if id == FeatureId::node(9)
        ));
    }

    #[test]
    fn test_provider_failure_is_acquisition_error() {
        let provider = StubProvider::new(None, None);
        let place = resolve("Atlantis").unwrap();

        assert!(matches!(
            fetch_features(&provider, &place, &cafes()),
            Err(Error::Acquisition { .. })
        ));
    }
}
