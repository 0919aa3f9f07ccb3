use std::fs;

use anyhow::{Context, Result};
use log::{info, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use world_core::{World, WorldConfig};

const CONFIG_PATH: &str = "config.json";

fn load_config() -> Result<WorldConfig> {
    match fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => {
            serde_json::from_str(&contents).with_context(|| format!("parsing {}", CONFIG_PATH))
        }
        Err(_) => {
            info!("{} not found, using default WorldConfig", CONFIG_PATH);
            Ok(WorldConfig::default())
        }
    }
}

fn init_logging() -> Result<()> {
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    TermLogger::init(LevelFilter::Info, config, TerminalMode::Mixed, ColorChoice::Auto)
        .context("initializing terminal logger")
}

fn main() -> Result<()> {
    init_logging()?;

    let config = load_config()?;
    let world = World::new(config);

    info!(
        "world-core-server up; region_size={} party_max_members={} players={}",
        world.config.region_size,
        world.config.party_max_members,
        world.player_count()
    );

    Ok(())
}
