mod config;
mod connectivity;
mod controller;
mod geo;
mod position;
mod runner;
mod store;
mod track;
mod web;

use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;
use crate::geo::GeoPoint;
use crate::position::ReplaySource;
use crate::runner::Runner;
use crate::store::{MemoryStore, Settings};

#[derive(Parser)]
#[command(name = "track-o-mat")]
#[command(about = "Geofenced GPS track recorder with home network failover")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate { config: String },
    /// Replay a fix log on a simulated clock
    Replay {
        config: String,
        fixes: String,
        /// Home position as "lat,lon"
        #[arg(long)]
        home: Option<String>,
        #[arg(long)]
        ssid: Option<String>,
        #[arg(long)]
        secret: Option<String>,
    },
    /// Run the controller against a fix log in real time and serve the API
    Serve { config: String, fixes: String },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Replay {
            config,
            fixes,
            home,
            ssid,
            secret,
        } => replay(&config, &fixes, home.as_deref(), ssid, secret),
        Commands::Serve { config, fixes } => serve(&config, &fixes),
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Config error: {}", e);
            None
        }
    }
}

fn load_fixes(path: &str) -> Option<ReplaySource> {
    match ReplaySource::from_file(Path::new(path)) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Fix log error: {}", e);
            None
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    println!("Configuration is valid");
    println!(
        "  tracking geofence: {:.3} km, connectivity geofence: {:.3} km",
        config.geofence.radius_km,
        config.geofence.connectivity_radius_km.unwrap_or(config.geofence.radius_km)
    );
    println!(
        "  debounce: {} / {:.1} m",
        humantime::format_duration(config.tracking.min_interval),
        config.tracking.min_displacement_m
    );
    println!(
        "  dwell: {}, connect timeout: {}, lockout after {} failures",
        humantime::format_duration(config.connectivity.dwell),
        humantime::format_duration(config.connectivity.connect_timeout),
        config.connectivity.max_failures
    );
    println!("  tracks: {}", config.tracking.tracks_dir.display());
    ExitCode::SUCCESS
}

fn replay(
    config_path: &str,
    fixes_path: &str,
    home: Option<&str>,
    ssid: Option<String>,
    secret: Option<String>,
) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };
    let Some(source) = load_fixes(fixes_path) else {
        return ExitCode::FAILURE;
    };

    let mut store = MemoryStore::new();
    let mut settings = Settings::default();
    if let Some(home) = home {
        let Some(point) = GeoPoint::from_coordinates(home) else {
            eprintln!("Invalid home position: {}", home);
            return ExitCode::FAILURE;
        };
        if let Err(e) = settings.save_home(&mut store, point) {
            eprintln!("Failed to seed home: {}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Some(ssid) = ssid {
        let secret = secret.unwrap_or_default();
        if let Err(e) = settings.save_credentials(&mut store, &ssid, &secret) {
            eprintln!("Failed to seed credentials: {}", e);
            return ExitCode::FAILURE;
        }
    }

    println!("Replaying {} fixes", source.len());
    let summary = Runner {
        config,
        source,
        store,
    }
    .run();

    println!(
        "Replay completed: {} fixes over {} cycles, {} connect attempts",
        summary.fixes, summary.cycles, summary.connect_attempts
    );
    println!(
        "Final state: session {}, network {}",
        summary.status.session.state, summary.status.connectivity.role
    );
    ExitCode::SUCCESS
}

fn serve(config_path: &str, fixes_path: &str) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };
    let Some(source) = load_fixes(fixes_path) else {
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(web::run_server(config, source)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
