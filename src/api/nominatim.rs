use reqwest::blocking::Client;
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::error::ProviderError;
use crate::geometry::BoundingBox;

#[derive(Debug, Deserialize)]
struct NominatimResult {
    display_name: String,
    /// `[south, north, west, east]` as strings
    boundingbox: [String; 4],
}

/// Geocode a place name to its bounding box.
///
/// Uses the Nominatim search API with `limit=1`.
/// Includes a 1 second delay for rate limiting (Nominatim ToS).
///
/// # Returns
/// * `Ok(bbox)` - Region of the best match
/// * `Err(ProviderError::PlaceNotFound)` - If nothing matched
pub fn geocode_place(
    client: &Client,
    base_url: &str,
    query: &str,
) -> Result<BoundingBox, ProviderError> {
    // Rate limiting - Nominatim requires max 1 request per second
    thread::sleep(Duration::from_secs(1));

    let response = client
        .get(base_url)
        .query(&[("q", query), ("format", "json"), ("limit", "1")])
        .send()?;

    if !response.status().is_success() {
        return Err(ProviderError::Status {
            service: "Nominatim",
            status: response.status().as_u16(),
        });
    }

    let body = response.text()?;
    let bbox = parse_search_response(&body, query)?;
    debug!(query, %bbox, "geocoded place");
    Ok(bbox)
}

fn parse_search_response(body: &str, query: &str) -> Result<BoundingBox, ProviderError> {
    let results: Vec<NominatimResult> =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode {
            service: "Nominatim",
            message: e.to_string(),
        })?;

    let result = results
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::PlaceNotFound(query.to_string()))?;

    let parsed: Result<Vec<f64>, _> = result.boundingbox.iter().map(|v| v.parse()).collect();
    let bbox = match parsed.as_deref() {
        Ok(&[south, north, west, east]) => BoundingBox::new(south, west, north, east),
        _ => None,
    };

    bbox.ok_or_else(|| ProviderError::Decode {
        service: "Nominatim",
        message: format!("invalid bounding box for {}", result.display_name),
    })
}
