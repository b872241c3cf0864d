//! Galaxy Flyer - interactive 3D galaxy survey viewer
//!
//! CLI commands:
//! - view: Open the viewer window (default)
//! - probe: Print the navigation readings for a camera pose
//! - inspect: Load both assets and summarize them

mod assets;
mod camera;
mod catalog;
mod config;
mod controls;
mod hud;
mod input;
mod logging;
mod navigation;
mod redshift;
mod render;
mod session;
mod viewer;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::assets::AssetSource;
use crate::camera::CameraState;
use crate::controls::SpeedSetting;
use crate::navigation::HudInputs;

#[derive(Parser)]
#[command(name = "galaxy_flyer")]
#[command(about = "Fly through a 3D galaxy survey")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to galaxy_flyer.yaml config
    #[arg(short, long, default_value = "galaxy_flyer.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the viewer window
    View,

    /// Print HUD readings for a camera pose (scene units)
    Probe {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        #[arg(long, allow_hyphen_values = true)]
        z: f64,

        /// Heading about +Y, degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        yaw: f64,

        /// Pitch about the local X axis, degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pitch: f64,

        /// Speed preset 0-9
        #[arg(long, default_value = "1")]
        speed: u8,
    },

    /// Load the catalog and redshift table and print a summary
    Inspect,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = config::Environment::load();
    let _log_guard = logging::init_logging(&env.log_dir);
    tracing::info!("Galaxy Flyer starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    let config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        config::Config::load(&cli.config)?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", cli.config);
        config::Config::default()
    };

    match cli.command.unwrap_or(Commands::View) {
        Commands::View => {
            let assets = assets::spawn_loaders(&config, &env);
            tracing::info!("Launching viewer");
            // The window blocks this thread; loaders keep running on the runtime workers
            tokio::task::block_in_place(|| viewer::run_viewer(config, assets))?;
        }

        Commands::Probe { x, y, z, yaw, pitch, speed } => {
            probe(&config, &env, [x, y, z], yaw, pitch, speed).await?;
        }

        Commands::Inspect => {
            inspect(&config, &env).await?;
        }
    }

    Ok(())
}

async fn probe(
    config: &config::Config,
    env: &config::Environment,
    position: [f64; 3],
    yaw: f64,
    pitch: f64,
    speed: u8,
) -> anyhow::Result<()> {
    let source = AssetSource::resolve(&config.assets.redshift_table, env.asset_base.as_deref());
    let table = match assets::load_redshift_table(&source).await {
        Ok(table) => Some(table),
        Err(e) => {
            log_error!(e, asset = %source);
            None
        }
    };

    let camera = CameraState::from_yaw_pitch(position, yaw, pitch);
    let hud = navigation::derive_hud(&HudInputs {
        camera: &camera,
        speed: SpeedSetting::from_level(speed)?,
        throttle_held: false,
        table: table.as_ref(),
        scale_factor: config.dataset.scale_factor,
        previous_heading: 0.0,
    });
    let sky = navigation::sky_projection(camera.position);

    println!("Position:   ({:.1}, {:.1}, {:.1})", hud.position[0], hud.position[1], hud.position[2]);
    println!("Map:        ({:.2}, {:.2}) heading {:.1}°", hud.map_x, hud.map_y, hud.map_heading_deg);
    println!(
        "Sky:        RA {:.1}° (label {:.0}°), Dec {:.1}°",
        hud.sky_ra_deg,
        sky.ra_label(),
        hud.sky_dec_deg
    );
    println!("Distance:   {:.0} Mpc", hud.radial_distance);
    println!(
        "Redshift:   {}",
        if hud.redshift_display.is_empty() { "unavailable" } else { hud.redshift_display.as_str() }
    );
    println!("Speed:      {} ({:.0}%)", hud.speed_display, hud.speed_fraction * 100.0);
    Ok(())
}

async fn inspect(config: &config::Config, env: &config::Environment) -> anyhow::Result<()> {
    let base = env.asset_base.as_deref();
    let catalog_source = AssetSource::resolve(&config.assets.catalog, base);
    let table_source = AssetSource::resolve(&config.assets.redshift_table, base);

    let (catalog, table) = tokio::join!(
        assets::load_catalog(&catalog_source, config.dataset.scale_factor),
        assets::load_redshift_table(&table_source),
    );

    println!("Catalog: {}", catalog_source);
    match catalog {
        Ok(catalog) => {
            println!("  {} galaxies", catalog.len());
            for (category, count) in catalog.counts() {
                println!("  - {:<4} {}", category.label(), count);
            }
            if let Some((min, max)) = catalog.bounds() {
                println!(
                    "  bounds ({:.0}, {:.0}, {:.0}) .. ({:.0}, {:.0}, {:.0})",
                    min[0], min[1], min[2], max[0], max[1], max[2]
                );
            }
        }
        Err(e) => println!("  [FAIL] {}", e),
    }

    println!();
    println!("Redshift table: {}", table_source);
    match table {
        Ok(table) => println!("  {}", table),
        Err(e) => println!("  [FAIL] {}", e),
    }

    Ok(())
}
