//! Avatar builder - headless wardrobe host
//!
//! Runs the wardrobe session in a Bevy app and talks to the UI over
//! stdin/stdout. Configuration comes from the JSON file named by
//! `AVATAR_BUILDER_CONFIG`, or the built-in defaults.

use std::time::Duration;

use avatar_config::BuilderConfig;
use avatar_scene::WardrobePlugin;
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;

mod stdio;

use stdio::StdioBridgePlugin;

/// Frame interval of the headless loop
const TICK: Duration = Duration::from_millis(16);

fn main() -> AppExit {
    let config = match BuilderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("avatar-builder: {}", e);
            return AppExit::error();
        }
    };

    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(TICK)),
            bevy::log::LogPlugin {
                level: bevy::log::Level::INFO,
                ..default()
            },
        ))
        .add_plugins(WardrobePlugin::new(config))
        .add_plugins(StdioBridgePlugin)
        .run()
}
