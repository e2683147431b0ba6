//! Recompose CLI: compose, crop, and inspect layered images.
//!
//! Usage:
//!   recompose compose <REQUEST> -o <OUT>     Compose a base image and its layers
//!   recompose crop <IMAGE> -o <OUT>          Crop by fractional rectangle
//!   recompose extract <IMAGE> <REGIONS> -o <DIR>
//!                                            Split an image into layers
//!   recompose opacity <IMAGE> <VALUE> -o <OUT>
//!   recompose solid -o <OUT>                 Render a solid background
//!   recompose info <IMAGE>                   Show image information
//!   recompose snapshots [--versions]         List stored session snapshots
//!
//! Images may be given as file paths or `data:` URLs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recompose_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "recompose",
    about = "Split images into layers and compose them back",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a JSON request `{ "base": .., "layers": [..] }`
    Compose {
        /// Path to the request file
        request: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Crop an image by a fractional rectangle
    Crop {
        /// Image path or data URL
        image: String,

        #[arg(long, default_value = "0.0")]
        left: f64,

        #[arg(long, default_value = "0.0")]
        top: f64,

        #[arg(long, default_value = "1.0")]
        width: f64,

        #[arg(long, default_value = "1.0")]
        height: f64,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split an image into layers using a region list
    Extract {
        /// Image path or data URL
        image: String,

        /// Region JSON in the vision response shape
        regions: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "layers")]
        output: PathBuf,
    },

    /// Scale an image's alpha channel
    Opacity {
        /// Image path or data URL
        image: String,

        /// Opacity in [0, 1]
        value: f64,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render a solid colour background
    Solid {
        /// Hex colour, e.g. #1e293b
        #[arg(long, default_value = "#ffffff")]
        color: String,

        #[arg(long, default_value = "1024")]
        width: f64,

        #[arg(long, default_value = "768")]
        height: f64,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show image information
    Info {
        /// Image path or data URL
        image: String,
    },

    /// List stored session snapshots, newest first
    Snapshots {
        /// List automatic versions instead of saves
        #[arg(long)]
        versions: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::try_load_from(path)?,
        None => AppConfig::load(),
    };

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    recompose_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Compose { request, output } => {
            commands::compose::run(request, output, &config).await
        }
        Commands::Crop {
            image,
            left,
            top,
            width,
            height,
            output,
        } => commands::crop::run(image, left, top, width, height, output),
        Commands::Extract {
            image,
            regions,
            output,
        } => commands::extract::run(image, regions, output, &config),
        Commands::Opacity {
            image,
            value,
            output,
        } => commands::opacity::run(image, value, output),
        Commands::Solid {
            color,
            width,
            height,
            output,
        } => commands::solid::run(color, width, height, output),
        Commands::Info { image } => commands::info::run(image),
        Commands::Snapshots { versions } => commands::snapshots::run(versions, &config),
    }
}
