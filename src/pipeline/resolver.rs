use crate::domain::{PlaceDescriptor, Region};
use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Crs};

/// Validate and normalize a place identifier.
///
/// The identifier is trimmed. Four comma-separated numbers
/// (`south,west,north,east`) forming a valid box select a bounding-box
/// region; anything else is treated as a name for the provider to geocode.
/// No network access happens here.
pub fn resolve(identifier: &str) -> Result<PlaceDescriptor> {
    resolve_with_crs(identifier, Crs::Wgs84.code())
}

/// Like [`resolve`], tagging the descriptor with an explicit CRS code
pub fn resolve_with_crs(identifier: &str, crs_code: &str) -> Result<PlaceDescriptor> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid("place identifier must not be empty"));
    }

    let crs: Crs = crs_code.parse().map_err(Error::InvalidInput)?;

    let region = match BoundingBox::parse(trimmed) {
        Some(bbox) => Region::Bounds(bbox),
        None => Region::Named(trimmed.to_string()),
    };

    Ok(PlaceDescriptor::new(trimmed.to_string(), region, crs))
}

/// Descriptor for an explicit bounding box
pub fn resolve_bounds(bbox: BoundingBox) -> PlaceDescriptor {
    PlaceDescriptor::new(bbox.to_string(), Region::Bounds(bbox), Crs::Wgs84)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Salzburg, Austria", "Salzburg, Austria")]
    #[case("  Salzburg, Austria\t", "Salzburg, Austria")]
    #[case("\nWien ", "Wien")]
    fn test_resolve_trims(#[case] input: &str, #[case] expected: &str) {
        let place = resolve(input).unwrap();
        assert_eq!(place.identifier(), expected);
        assert_eq!(place.crs(), Crs::Wgs84);
        assert_eq!(place.region(), &Region::Named(expected.to_string()));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn test_resolve_rejects_blank(#[case] input: &str) {
        assert!(matches!(resolve(input), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let a = resolve("Salzburg, Austria").unwrap();
        let b = resolve("SALZBURG, austria ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b.key(), "salzburg, austria");
        assert_eq!(b.identifier(), "SALZBURG, austria");
    }

    #[test]
    fn test_resolve_bbox_identifier() {
        let place = resolve("47.78,13.02,47.82,13.07").unwrap();
        assert_eq!(place.identifier(), "47.78,13.02,47.82,13.07");
        assert!(matches!(place.region(), Region::Bounds(b) if b.north == 47.82));
    }

    #[test]
    fn test_resolve_with_crs() {
        let place = resolve_with_crs("Salzburg", "epsg:3857").unwrap();
        assert_eq!(place.crs(), Crs::WebMercator);

        assert!(matches!(
            resolve_with_crs("Salzburg", "EPSG:99999"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resolve_bounds() {
        let bbox = BoundingBox::around((47.80, 13.04), 1000).unwrap();
        let place = resolve_bounds(bbox);
        assert_eq!(place.region(), &Region::Bounds(bbox));
        assert!(!place.identifier().is_empty());
    }
}
