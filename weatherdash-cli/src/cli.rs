use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Select};
use tracing::debug;
use weatherdash_core::{
    Aggregator, AirQualitySource, Config, Coordinates, FileLocationStore, LocationStore,
    ProviderId, SavedLocation,
    provider::{Geocoder, PlaceCandidate, geocode::NominatimGeocoder, http_client},
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "visualcrossing" or "google".
        provider: String,
    },

    /// Show the dashboard for a location.
    Show(ShowArgs),

    /// Look up places by name.
    Search {
        /// City or place name, at least 3 characters.
        query: String,
    },

    /// Manage saved locations.
    #[command(subcommand)]
    Saved(SavedCommand),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Search for a place and use the chosen result.
    #[arg(long, conflicts_with_all = ["lat", "lon", "saved"])]
    place: Option<String>,

    /// Name of a saved location. Defaults to the first saved location.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    saved: Option<String>,

    /// Display temperatures in Fahrenheit.
    #[arg(long)]
    fahrenheit: bool,

    /// Use a 12-hour clock for hourly times.
    #[arg(long)]
    twelve_hour: bool,
}

#[derive(Debug, Subcommand)]
pub enum SavedCommand {
    /// List saved locations.
    List,

    /// Save a location under a name. Re-saving the same coordinates renames it.
    Add {
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Remove the location at the given coordinates.
    Remove {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show(args) => show(args).await,
            Command::Search { query } => search(&query).await,
            Command::Saved(cmd) => saved(cmd),
        }
    }
}

fn configure(provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.upsert_provider_api_key(id, api_key.trim().to_string());

    if id == ProviderId::Google {
        let use_google = Confirm::new("Use Google for air quality as well?")
            .with_default(config.air_quality_source == AirQualitySource::Google)
            .prompt()
            .context("Failed to read answer")?;
        config.air_quality_source = if use_google {
            AirQualitySource::Google
        } else {
            AirQualitySource::OpenMeteo
        };
    }

    config.save()?;
    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(args: ShowArgs) -> Result<()> {
    let config = Config::load()?;
    let aggregator = Aggregator::from_config(&config)?;

    let coords = resolve_location(&args, &aggregator).await?;
    let fahrenheit = args.fahrenheit || config.fahrenheit;
    let use_24_hour_clock = config.use_24_hour_clock && !args.twelve_hour;
    debug!(%coords, fahrenheit, use_24_hour_clock, "showing dashboard");

    let snapshot = aggregator
        .fetch(coords.latitude, coords.longitude, use_24_hour_clock)
        .await?;

    let mut text = String::new();
    render::snapshot(&mut text, &snapshot, fahrenheit)?;
    print!("{text}");
    Ok(())
}

async fn resolve_location(args: &ShowArgs, aggregator: &Aggregator) -> Result<Coordinates> {
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        return Ok(Coordinates::new(lat, lon)?);
    }

    if let Some(query) = &args.place {
        let candidate = pick_candidate(aggregator.search_places(query).await?, query)?;
        return Ok(candidate.coordinates);
    }

    let store = FileLocationStore::open_default()?;
    let saved = store.list()?;
    let found = match &args.saved {
        Some(name) => saved.into_iter().find(|s| s.name.eq_ignore_ascii_case(name)),
        None => saved.into_iter().next(),
    };

    found.map(|s| s.coordinates).ok_or_else(|| match &args.saved {
        Some(name) => anyhow!(
            "No saved location named '{name}'.\nHint: run `weatherdash saved list`."
        ),
        None => anyhow!(
            "No location given and nothing saved yet.\n\
             Hint: pass --lat/--lon or --place, or run `weatherdash saved add`."
        ),
    })
}

fn pick_candidate(mut candidates: Vec<PlaceCandidate>, query: &str) -> Result<PlaceCandidate> {
    match candidates.len() {
        0 => bail!("No places found for '{query}'"),
        1 => Ok(candidates.remove(0)),
        _ => {
            let names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();
            let chosen = Select::new("Which place?", names.clone())
                .prompt()
                .context("Failed to read selection")?;
            let index = names.iter().position(|n| *n == chosen).unwrap_or(0);
            Ok(candidates.swap_remove(index))
        }
    }
}

async fn search(query: &str) -> Result<()> {
    // Geocoding is keyless, so search works before anything is configured.
    let config = Config::load()?;
    let geocoder =
        NominatimGeocoder::new(config.endpoints.geocoding.as_str(), http_client(&config)?);

    let candidates = geocoder.search(query).await?;
    if candidates.is_empty() {
        println!("No places found for '{query}' (queries need at least 3 characters).");
    }
    for c in candidates {
        println!("{:<40} {}", c.name, c.coordinates);
    }
    Ok(())
}

fn saved(cmd: SavedCommand) -> Result<()> {
    let store = FileLocationStore::open_default()?;

    match cmd {
        SavedCommand::List => {
            let locations = store.list()?;
            if locations.is_empty() {
                println!("No saved locations.");
            }
            for l in locations {
                println!("{:<30} {}", l.name, l.coordinates);
            }
        }
        SavedCommand::Add { name, lat, lon } => {
            let coordinates = Coordinates::new(lat, lon)?;
            store.put(SavedLocation { name: name.clone(), coordinates })?;
            println!("Saved '{name}' at {coordinates}");
        }
        SavedCommand::Remove { lat, lon } => {
            let coordinates = Coordinates::new(lat, lon)?;
            if store.delete(coordinates)? {
                println!("Removed location at {coordinates}");
            } else {
                println!("No saved location at {coordinates}");
            }
        }
    }

    Ok(())
}
