use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use routekit::TrackEnd;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Options;

/// GPX route summaries, edits and exports
#[derive(Parser)]
#[command(name = "routekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing .hgt elevation tiles
    #[arg(short, long, env = "ROUTEKIT_TILE_DIR", global = true)]
    tile_dir: Option<PathBuf>,

    /// Maximum tiles in cache
    #[arg(
        short,
        long,
        env = "ROUTEKIT_CACHE_SIZE",
        default_value = "100",
        global = true
    )]
    cache_size: u64,

    /// Never query remote elevation services
    #[arg(long, env = "ROUTEKIT_OFFLINE", global = true)]
    offline: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Which end of a track to cut or link.
#[derive(Clone, Copy, ValueEnum)]
enum End {
    Start,
    End,
}

impl From<End> for TrackEnd {
    fn from(end: End) -> Self {
        match end {
            End::Start => TrackEnd::Start,
            End::End => TrackEnd::End,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print totals and the waypoint table of a track
    Summary {
        /// GPX file
        input: PathBuf,

        /// Flat walking speed in km/h for time estimates
        #[arg(long, default_value = "5")]
        flat_kmh: f64,

        /// Ascent rate in m/h for time estimates
        #[arg(long, default_value = "600")]
        climb_rate: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Export a track as CSV waypoint table, GPX or GeoJSON
    Export {
        /// GPX file
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: commands::export::Format,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value = "5")]
        flat_kmh: f64,

        #[arg(long, default_value = "600")]
        climb_rate: f64,
    },

    /// Reverse the direction of a track
    Reverse {
        input: PathBuf,

        /// Output GPX file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cut a track at a point index
    Truncate {
        input: PathBuf,

        /// Remove points before the index (start) or after it (end)
        #[arg(long, value_enum)]
        from: End,

        /// Point index that becomes the new start or end
        #[arg(long)]
        index: usize,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a custom waypoint by coordinate or along-track distance
    AddWaypoint {
        input: PathBuf,

        #[arg(long, requires = "lon", conflicts_with = "distance")]
        lat: Option<f64>,

        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        /// Distance from the start in km
        #[arg(long, required_unless_present = "lat")]
        distance: Option<f64>,

        /// Waypoint name
        #[arg(long, default_value = "")]
        name: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a waypoint by index (as listed by `summary`)
    DeleteWaypoint {
        input: PathBuf,

        #[arg(long)]
        index: usize,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rename a waypoint by index (as listed by `summary`)
    RenameWaypoint {
        input: PathBuf,

        #[arg(long)]
        index: usize,

        #[arg(long)]
        name: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Join two tracks into one
    Link {
        first: PathBuf,

        second: PathBuf,

        /// End of the first track to link (`end` reverses it)
        #[arg(long, value_enum, default_value = "start")]
        first_end: End,

        /// End of the second track to link (`end` reverses it)
        #[arg(long, value_enum, default_value = "start")]
        second_end: End,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List elevation tiles available in the tile directory
    Tiles,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = Options {
        tile_dir: cli.tile_dir,
        cache_size: cli.cache_size,
        offline: cli.offline,
    };

    match cli.command {
        Commands::Summary {
            input,
            flat_kmh,
            climb_rate,
            json,
        } => commands::summary::run(&opts, input, commands::pace(flat_kmh, climb_rate), json),
        Commands::Export {
            input,
            format,
            output,
            flat_kmh,
            climb_rate,
        } => commands::export::run(&opts, input, format, output, commands::pace(flat_kmh, climb_rate)),
        Commands::Reverse { input, output } => commands::edit::reverse(&opts, input, output),
        Commands::Truncate {
            input,
            from,
            index,
            output,
        } => commands::edit::truncate(&opts, input, from.into(), index, output),
        Commands::AddWaypoint {
            input,
            lat,
            lon,
            distance,
            name,
            output,
        } => {
            let at = match (lat, lon, distance) {
                (Some(lat), Some(lon), _) => commands::edit::Position::Coordinate { lat, lon },
                (_, _, Some(km)) => commands::edit::Position::Distance(km),
                _ => anyhow::bail!("Either --lat/--lon or --distance is required"),
            };
            commands::edit::add_waypoint(&opts, input, at, &name, output)
        }
        Commands::DeleteWaypoint {
            input,
            index,
            output,
        } => commands::edit::delete_waypoint(&opts, input, index, output),
        Commands::RenameWaypoint {
            input,
            index,
            name,
            output,
        } => commands::edit::rename_waypoint(&opts, input, index, &name, output),
        Commands::Link {
            first,
            second,
            first_end,
            second_end,
            output,
        } => commands::link::run(&opts, first, first_end.into(), second, second_end.into(), output),
        Commands::Tiles => commands::tiles::run(opts.tile_dir),
    }
}
