use std::path::PathBuf;

use campus_nav::{LatLng, TravelMode};
use clap::Parser;

use crate::commands::parse_lat_lng;
use crate::config::ConfigOverrides;
use crate::providers::LocationChoice;

/// Ask the campus navigation assistant from the terminal
#[derive(Parser, Debug)]
#[command(name = "campus-nav", version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides CAMPUS_NAV_BASE_URL and the config file)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path to a JSON config file (defaults to CAMPUS_NAV_CONFIG_PATH)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replay a scripted backend instead of calling the server
    #[arg(long)]
    pub mock: bool,

    /// Report a fixed position, e.g. `--fix 8.5569,39.2911`
    #[arg(long, value_name = "LAT,LNG", value_parser = parse_lat_lng, conflicts_with = "deny_location")]
    pub fix: Option<LatLng>,

    /// Behave as if location permission was refused
    #[arg(long)]
    pub deny_location: bool,

    /// Initial travel mode: walking, taxi or urgent
    #[arg(long, default_value = "walking", value_parser = parse_mode)]
    pub mode: TravelMode,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            config_path: self.config.clone(),
            mode: self.mode,
        }
    }

    pub fn location(&self) -> LocationChoice {
        match (self.fix, self.deny_location) {
            (Some(position), _) => LocationChoice::Fixed(position),
            (None, true) => LocationChoice::Denied,
            (None, false) => LocationChoice::Unsupported,
        }
    }
}

fn parse_mode(value: &str) -> Result<TravelMode, String> {
    TravelMode::parse(value).ok_or_else(|| format!("unknown travel mode '{value}'"))
}
