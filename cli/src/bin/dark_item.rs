use clap::{Parser, Subcommand};
use cli::{ConfigFile, ParamOverrides, resolve_params};
use color_eyre::eyre::Result;
use dark_item::{DetectParams, Pipeline, algorithms::OverlayRenderer};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the dominant dark item and print the result as JSON
    Detect {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,
        /// Parameter file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: ParamOverrides,
        /// Also write the result as GeoJSON to this path
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Draw the detected outline over the working-resolution image
    Overlay {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the PNG overlay
        #[arg(short, long)]
        output: PathBuf,
        /// Parameter file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: ParamOverrides,
    },
    /// Print the JSON schema of the parameter file
    Schema,
    /// Print the default parameters as TOML, or JSON with --json
    Defaults {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Detect {
            input,
            config,
            overrides,
            geojson,
        } => {
            let params = resolve_params(config.as_deref(), overrides)?;
            detect(input, &params, geojson.as_deref())?;
        }
        Commands::Overlay {
            input,
            output,
            config,
            overrides,
        } => {
            let params = resolve_params(config.as_deref(), overrides)?;
            overlay(input, output, &params)?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&DetectParams::schema())?);
        }
        Commands::Defaults { json } => {
            let defaults = DetectParams::default();
            let text = if *json {
                defaults.to_json()?
            } else {
                defaults.to_toml()?
            };
            println!("{text}");
        }
    }

    Ok(())
}

fn detect(input: &Path, params: &DetectParams, geojson: Option<&Path>) -> Result<()> {
    info!("Detecting dark item in {:?}", input);
    let bytes = std::fs::read(input)?;
    let result = dark_item::detect(&bytes, params)?;

    match &result.item {
        Some(item) => info!(
            "Selected item: area {:.1}, bbox {:?}, touches edge: {}",
            item.area, item.bbox, item.touches_edge
        ),
        None => warn!("No dark item found in {:?}", input),
    }

    if let Some(path) = geojson {
        result.save_geojson(path)?;
        info!("GeoJSON written to {:?}", path);
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn overlay(input: &Path, output: &Path, params: &DetectParams) -> Result<()> {
    let bytes = std::fs::read(input)?;
    let image = dark_item::decode(&bytes)?;
    let analysis = Pipeline::new(params).analyze(&image)?;
    if analysis.item.is_none() {
        warn!("No dark item found in {:?}, writing the plain working image", input);
    }

    let rendered = analysis.overlay(&OverlayRenderer::default());
    rendered.save_with_format(output, ImageFormat::Png)?;
    info!(
        "Overlay {}x{} written to {:?}",
        rendered.width(),
        rendered.height(),
        output
    );
    Ok(())
}
