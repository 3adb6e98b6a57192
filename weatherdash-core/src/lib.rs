//! Core library for the `weatherdash` dashboard.
//!
//! This crate defines:
//! - Classification of raw readings (UV, AQI, pollen, wind, rain, compass, units)
//! - Day/night and moon-phase derivation
//! - Mapping of provider condition text onto a closed set of conditions
//! - Adapters that normalize each external provider into fixed-shape records
//! - The aggregator that assembles one [`WeatherSnapshot`] per fetch cycle
//! - Configuration and the saved-location store
//!
//! It is used by `weatherdash-cli`, but can also back other front ends.

pub mod aggregate;
pub mod astro;
pub mod classify;
pub mod condition;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use aggregate::Aggregator;
pub use condition::{Condition, map_condition};
pub use config::Config;
pub use error::WeatherError;
pub use model::{AirQualityRecord, Coordinates, PollenRecord, SeaData, WeatherSnapshot};
pub use provider::{AirQualitySource, ProviderId};
pub use store::{FileLocationStore, LocationStore, MemoryLocationStore, SavedLocation};
