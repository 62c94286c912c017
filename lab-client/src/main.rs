use std::path::PathBuf;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use lab_render::RenderPlugin;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod companion;
mod config;
mod hud;
mod interaction;
mod plugins;
mod scene;
mod set_pieces;
mod sim;
mod sim_systems;

use config::LabConfig;

#[derive(Parser, Debug)]
#[command(version, about = "First-person walkthrough of the lab scene")]
struct Args {
    /// JSON config file; any field left out keeps its default
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log filter directives, overrides RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

fn init_tracing(directives: Option<&str>) {
    let filter = directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .compact()
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let config = match LabConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "failed to load config");
            std::process::exit(1);
        }
    };
    info!(scene = %config.assets.lab_scene, "starting lab walkthrough");

    App::new()
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Lab Walkthrough".into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins((
            RenderPlugin,
            plugins::ClientCorePlugin::new(config),
            plugins::ClientUiPlugin,
            plugins::ClientScenePlugin,
            plugins::ClientSimPlugin,
            plugins::ClientSetPiecePlugin,
            plugins::ClientCompanionPlugin,
        ))
        .run();
}
