use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::nominatim::geocode_place;
use crate::api::provider::{MapDataProvider, RawFeatures, RawGraph};
use crate::config::ProviderConfig;
use crate::domain::{NetworkType, PlaceDescriptor, Region, TagFilter};
use crate::error::ProviderError;
use crate::geometry::{BoundingBox, Crs};
use crate::osm::{parse_features, parse_graph};

/// Server-side timeout in the query header, in seconds
const QUERY_TIMEOUT_SECS: u64 = 180;

/// Raw Overpass API response
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,
}

/// A single element from Overpass (node, way or relation)
#[derive(Debug, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u64,
    #[serde(default)]
    pub nodes: Option<Vec<u64>>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub members: Option<Vec<Member>>,
}

/// Relation member reference
#[derive(Debug, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "ref")]
    pub ref_: u64,
    #[serde(default)]
    pub role: String,
}

/// Overpass QL tag filter for each travel mode.
///
/// Mirrors the OSMnx defaults: exclude highway types the mode cannot use,
/// explicit mode bans, and private access.
fn network_filter(network_type: NetworkType) -> &'static str {
    match network_type {
        NetworkType::Walk => concat!(
            r#"["highway"]["area"!~"yes"]"#,
            r#"["highway"!~"abandoned|bus_guideway|construction|cycleway|motor|no|planned|platform|proposed|raceway|razed"]"#,
            r#"["foot"!~"no"]["service"!~"private"]["access"!~"private"]"#,
        ),
        NetworkType::Drive => concat!(
            r#"["highway"]["area"!~"yes"]"#,
            r#"["highway"!~"abandoned|bridleway|bus_guideway|construction|corridor|cycleway|elevator|escalator|footway|no|path|pedestrian|planned|platform|proposed|raceway|razed|service|steps|track"]"#,
            r#"["motor_vehicle"!~"no"]["motorcar"!~"no"]"#,
            r#"["service"!~"alley|driveway|emergency_access|parking|parking_aisle|private"]["access"!~"private"]"#,
        ),
        NetworkType::Bike => concat!(
            r#"["highway"]["area"!~"yes"]"#,
            r#"["highway"!~"abandoned|bus_guideway|construction|corridor|elevator|escalator|footway|motor|no|planned|platform|proposed|raceway|razed|steps"]"#,
            r#"["bicycle"!~"no"]["service"!~"private"]["access"!~"private"]"#,
        ),
    }
}

/// Build the street network query for a bounding box
pub fn build_graph_query(bbox: &BoundingBox, network_type: NetworkType) -> String {
    format!(
        r#"[out:json][timeout:{timeout}];
(
  way{filter}({bbox});
);
out body;
>;
out skel qt;"#,
        timeout = QUERY_TIMEOUT_SECS,
        filter = network_filter(network_type),
        bbox = bbox,
    )
}

/// Build the feature query: one `nwr` clause per tag key
pub fn build_features_query(bbox: &BoundingBox, tags: &TagFilter) -> String {
    let clauses: Vec<String> = tags
        .iter()
        .map(|(key, values)| {
            let key = escape_string(key);
            if values.is_empty() {
                format!(r#"  nwr["{key}"]({bbox});"#)
            } else {
                let alternatives: Vec<String> =
                    values.iter().map(|v| escape_regex(v)).collect();
                format!(
                    r#"  nwr["{key}"~"^({})$"]({bbox});"#,
                    alternatives.join("|")
                )
            }
        })
        .collect();

    format!(
        r#"[out:json][timeout:{timeout}];
(
{clauses}
);
out body;
>;
out skel qt;"#,
        timeout = QUERY_TIMEOUT_SECS,
        clauses = clauses.join("\n"),
    )
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            out.push_str("\\\\");
        } else if c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Map data from Nominatim (geocoding) and the Overpass API (OSM data)
pub struct OverpassProvider {
    client: Client,
    config: ProviderConfig,
    /// Bounding boxes already geocoded, keyed by normalized place name
    geocoded: Mutex<HashMap<String, BoundingBox>>,
}

impl OverpassProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            geocoded: Mutex::new(HashMap::new()),
        })
    }

    /// Bounding box for `place`, geocoding a name at most once.
    ///
    /// The cache lock is held across the Nominatim request so concurrent
    /// fetches for the same place wait for a single lookup.
    fn region_bbox(&self, place: &PlaceDescriptor) -> Result<BoundingBox, ProviderError> {
        let name = match place.region() {
            Region::Bounds(bbox) => return Ok(*bbox),
            Region::Named(name) => name,
        };

        let mut geocoded = self.geocoded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bbox) = geocoded.get(place.key()) {
            debug!(place = %place, "using cached bounding box");
            return Ok(*bbox);
        }

        let bbox = geocode_place(&self.client, &self.config.nominatim_url, name)?;
        geocoded.insert(place.key().to_string(), bbox);
        Ok(bbox)
    }

    /// Execute an Overpass query, trying each mirror with retry on 429/504
    fn execute(&self, query: &str) -> Result<OverpassResponse, ProviderError> {
        let max_retries = self.config.max_retries.max(1);
        let mut last_error = String::from("no Overpass mirrors configured");

        for url in &self.config.overpass_urls {
            for attempt in 0..max_retries {
                if attempt > 0 {
                    // Overpass recommends waiting when overloaded
                    let wait_secs = self.config.retry_backoff_secs * u64::from(attempt);
                    warn!(
                        url = %url,
                        "Overpass API busy, retrying in {} seconds (attempt {}/{})",
                        wait_secs,
                        attempt + 1,
                        max_retries
                    );
                    std::thread::sleep(Duration::from_secs(wait_secs));
                }

                // Overpass expects form-encoded POST data: data=<query>
                let response = match self.client.post(url).form(&[("data", query)]).send() {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(url = %url, error = %e, "Overpass mirror unreachable");
                        last_error = e.to_string();
                        break;
                    }
                };

                match response.status().as_u16() {
                    200 => {
                        return response.json().map_err(|e| ProviderError::Decode {
                            service: "Overpass",
                            message: e.to_string(),
                        });
                    }
                    429 | 504 => {
                        last_error = format!(
                            "{} returned status {} (attempt {})",
                            url,
                            response.status(),
                            attempt + 1
                        );
                    }
                    status => {
                        return Err(ProviderError::Status {
                            service: "Overpass",
                            status,
                        });
                    }
                }
            }
        }

        Err(ProviderError::Exhausted {
            mirrors: self.config.overpass_urls.len(),
            last_error,
        })
    }
}

impl MapDataProvider for OverpassProvider {
    fn fetch_graph(
        &self,
        place: &PlaceDescriptor,
        network_type: NetworkType,
    ) -> Result<RawGraph, ProviderError> {
        let bbox = self.region_bbox(place)?;
        let query = build_graph_query(&bbox, network_type);
        debug!(%query, "requesting street network");

        let response = self.execute(&query)?;
        info!(
            place = %place,
            elements = response.elements.len(),
            "received street network elements"
        );

        let (nodes, edges) = parse_graph(&response, network_type);
        Ok(RawGraph {
            crs: Crs::Wgs84,
            nodes,
            edges,
        })
    }

    fn fetch_features(
        &self,
        place: &PlaceDescriptor,
        tags: &TagFilter,
    ) -> Result<RawFeatures, ProviderError> {
        let bbox = self.region_bbox(place)?;
        let query = build_features_query(&bbox, tags);
        debug!(%query, "requesting features");

        let response = self.execute(&query)?;
        info!(
            place = %place,
            elements = response.elements.len(),
            "received feature elements"
        );

        Ok(RawFeatures {
            crs: Crs::Wgs84,
            features: parse_features(&response),
        })
    }
}
