//! Relief CLI - Command-line interface for heightmap conversion

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{expand, export, import, inspect};

#[derive(Parser)]
#[command(name = "relief")]
#[command(about = "Convert and repair terrain heightmaps", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a heightmap through the full pipeline and write the 16-bit result
    Import {
        /// Path to a .raw, .png or .tif heightmap
        path: String,

        /// Output raw file
        #[arg(short, long, default_value = "heightmap16.raw")]
        output: String,

        /// Blur intensity (0..1), overrides the config file
        #[arg(long)]
        intensity: Option<f32>,

        /// Gaussian blur radius in samples, overrides the config file
        #[arg(long)]
        radius: Option<u32>,

        /// Blur kernel: gaussian, identity or none
        #[arg(long, default_value = "gaussian", value_parser = parse_kernel)]
        kernel: String,

        /// Write the unblurred heightmap if no blur kernel is available
        #[arg(long)]
        allow_unblurred: bool,
    },

    /// Reduce an image to 16-bit grayscale and export it as a raw file
    Export {
        /// Path to the source image
        image: String,

        /// Export name; written to Documents/<name>.raw
        #[arg(long, default_value = "heightmap")]
        name: String,

        /// Explicit output path, overrides --name
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Expand an 8-bit raw file to 16-bit without blurring
    Expand {
        /// Path to the 8-bit raw file
        input: String,

        /// Width in samples
        #[arg(long, default_value = "4096")]
        width: u32,

        /// Height in samples
        #[arg(long, default_value = "4096")]
        height: u32,

        /// Output raw file
        #[arg(short, long, default_value = "heightmap16.raw")]
        output: String,
    },

    /// Report a heightmap's format, dimensions and value range
    Inspect {
        /// Path to a .raw, .png or .tif heightmap
        path: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },
}

fn parse_kernel(s: &str) -> Result<String, String> {
    match s {
        "gaussian" | "identity" | "none" => Ok(s.to_string()),
        _ => Err(format!(
            "unknown kernel '{}'; valid values: gaussian, identity, none",
            s
        )),
    }
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            path,
            output,
            intensity,
            radius,
            kernel,
            allow_unblurred,
        } => import::run(import::ImportArgs {
            path,
            output,
            intensity,
            radius,
            kernel,
            allow_unblurred,
        }),
        Commands::Export {
            image,
            name,
            output,
        } => export::run(&image, &name, output.as_deref()),
        Commands::Expand {
            input,
            width,
            height,
            output,
        } => expand::run(&input, width, height, &output),
        Commands::Inspect { path, format } => inspect::run(&path, &format),
    }
}
