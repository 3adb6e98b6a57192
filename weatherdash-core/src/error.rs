use thiserror::Error;

/// Errors surfaced by the public core API.
///
/// Collaborator plumbing uses `anyhow` internally; only failures the caller has to act on
/// are turned into one of these variants.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Input outside the domain a utility accepts (moon-phase fraction, time-of-day string,
    /// zone name, coordinates).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The primary forecast could not be fetched or was unusable. No partial snapshot exists.
    #[error("failed to fetch weather for ({latitude}, {longitude})")]
    Fetch {
        latitude: f64,
        longitude: f64,
        #[source]
        source: anyhow::Error,
    },
}

impl WeatherError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        WeatherError::InvalidArgument(msg.into())
    }
}
