mod clock;
mod config;
mod food;
mod game;
mod input;
mod snake;
mod state;
mod term;

use std::{fs::File, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};
use log::info;

use config::{GameConfig, Speed};

/// Canvas coordinate; positions are multiples of the tile size.
pub type Coord = i32;
pub type Coords = (Coord, Coord);
pub type TermInt = u16;
pub type TermCoords = (TermInt, TermInt);

#[derive(Parser, Debug)]
#[command(name = "snake")]
#[command(version, about = "Terminal snake that forgives a few mistakes")]
struct Cli {
    /// YAML file with game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick speed
    #[arg(long, value_enum)]
    speed: Option<Speed>,

    /// Collisions allowed before the game ends
    #[arg(long)]
    max_mistakes: Option<u32>,

    /// Pause after a collision, in milliseconds
    #[arg(long)]
    resume_delay_ms: Option<u64>,

    /// Write logs to this file (the terminal is busy with the game)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Defaults, then the config file, then command line flags.
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let config = GameConfig::from_yaml_file(path)?;
                info!("Loaded config from {}", path.display());
                config
            }
            None => GameConfig::default(),
        };

        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(max_mistakes) = self.max_mistakes {
            config.max_mistakes = max_mistakes;
        }
        if let Some(delay) = self.resume_delay_ms {
            config.resume_delay_ms = delay;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logger(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            env_logger::Builder::from_env(Env::default().default_filter_or("info"))
                .target(Target::Pipe(Box::new(file)))
                .init();
        }
        // Stderr shares the screen with the game, so stay quiet unless asked
        None => env_logger::Builder::from_env(Env::default().default_filter_or("off")).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_file.as_deref())?;

    let config = cli.game_config()?;
    let mut game = game::SnakeGame::new(config)?;
    game.initialize()?;

    // Put the terminal back even if the game loop failed
    let result = game.run();
    let restored = game.restore();
    result?;
    restored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::try_parse_from(["snake"]).unwrap();
        assert_eq!(cli.game_config().unwrap(), GameConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "snake",
            "--speed", "fast",
            "--max-mistakes", "5",
            "--resume-delay-ms", "250",
        ])
        .unwrap();
        let config = cli.game_config().unwrap();

        assert_eq!(config.speed, Speed::Fast);
        assert_eq!(config.max_mistakes, 5);
        assert_eq!(config.resume_delay_ms, 250);
    }

    #[test]
    fn test_unknown_speed_is_rejected() {
        assert!(Cli::try_parse_from(["snake", "--speed", "ludicrous"]).is_err());
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let cli = Cli::try_parse_from(["snake", "--max-mistakes", "0"]).unwrap();
        assert!(cli.game_config().is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["snake", "--config", "/nonexistent/snake.yaml"]).unwrap();
        assert!(cli.game_config().is_err());
    }
}
