use thiserror::Error;

use crate::domain::{CollectionError, FeatureId};

/// Which dataset an acquisition error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Network,
    Features,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::Network => f.write_str("street network"),
            Dataset::Features => f.write_str("points of interest"),
        }
    }
}

/// Failures reported by a [`crate::api::MapDataProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("place could not be resolved to a region: {0}")]
    PlaceNotFound(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned error status: {status}")]
    Status { service: &'static str, status: u16 },

    #[error("failed to decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("all {mirrors} Overpass mirrors failed: {last_error}")]
    Exhausted { mirrors: usize, last_error: String },
}

/// Why a fetcher could not produce usable data.
#[derive(Debug, Error)]
pub enum AcquisitionFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("the region contains no traversable edges")]
    EmptyNetwork,

    #[error("edge {from} -> {to} references a node that is not in the graph")]
    DanglingEdge { from: u64, to: u64 },

    #[error("duplicate feature {0}")]
    DuplicateFeature(FeatureId),

    #[error("feature {0} has no usable geometry")]
    InvalidGeometry(FeatureId),
}

impl From<CollectionError> for AcquisitionFailure {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::DuplicateId(id) => AcquisitionFailure::DuplicateFeature(id),
            CollectionError::InvalidGeometry(id) => AcquisitionFailure::InvalidGeometry(id),
        }
    }
}

/// Errors surfaced by the pipeline components.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied malformed or empty arguments. Raised before any
    /// provider call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The data source could not supply usable data for the request.
    #[error("could not retrieve {dataset} for '{place}'")]
    Acquisition {
        place: String,
        dataset: Dataset,
        #[source]
        source: AcquisitionFailure,
    },

    /// Aggregation was asked to summarize an empty coordinate set.
    #[error("no coordinates available to compute a centroid")]
    InsufficientData,
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub(crate) fn acquisition(
        place: &str,
        dataset: Dataset,
        source: impl Into<AcquisitionFailure>,
    ) -> Self {
        Error::Acquisition {
            place: place.to_string(),
            dataset,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_error_keeps_source() {
        let err = Error::acquisition(
            "Salzburg, Austria",
            Dataset::Network,
            AcquisitionFailure::EmptyNetwork,
        );
        assert_eq!(
            err.to_string(),
            "could not retrieve street network for 'Salzburg, Austria'"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("the region contains no traversable edges")
        );
    }
}
