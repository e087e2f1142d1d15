use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::Coord;

pub const DEFAULT_CANVAS_SIZE: Coord = 400;
pub const DEFAULT_TILE_SIZE: Coord = 20;
pub const DEFAULT_INITIAL_LENGTH: usize = 3;
pub const DEFAULT_MAX_MISTAKES: u32 = 3;
pub const DEFAULT_RESUME_DELAY_MS: u64 = 1000;

/// Largest grid side, in tiles, that still fits a terminal.
const MAX_CELLS: Coord = 100;

/// Tick interval selector.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
    Insane,
}

impl Speed {
    pub fn tick_interval(self) -> Duration {
        let ms = match self {
            Speed::Slow => 200,
            Speed::Normal => 130,
            Speed::Fast => 80,
            Speed::Insane => 50,
        };
        Duration::from_millis(ms)
    }

    pub fn name(self) -> &'static str {
        match self {
            Speed::Slow => "slow",
            Speed::Normal => "normal",
            Speed::Fast => "fast",
            Speed::Insane => "insane",
        }
    }
}

/// Everything a game needs to know before the first tick.
///
/// Coordinates are in canvas units; the grid is `canvas_size / tile_size`
/// tiles on each side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub canvas_size: Coord,
    pub tile_size: Coord,
    pub initial_length: usize,
    pub max_mistakes: u32,
    pub resume_delay_ms: u64,
    pub speed: Speed,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            canvas_size: DEFAULT_CANVAS_SIZE,
            tile_size: DEFAULT_TILE_SIZE,
            initial_length: DEFAULT_INITIAL_LENGTH,
            max_mistakes: DEFAULT_MAX_MISTAKES,
            resume_delay_ms: DEFAULT_RESUME_DELAY_MS,
            speed: Speed::default(),
        }
    }
}

impl GameConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Failed to parse config")
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Number of tiles along one side of the grid.
    pub fn cells(&self) -> Coord {
        self.canvas_size / self.tile_size
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size <= 0 {
            bail!("tile_size must be positive, got {}", self.tile_size);
        }
        if self.canvas_size <= 0 {
            bail!("canvas_size must be positive, got {}", self.canvas_size);
        }
        if self.canvas_size % self.tile_size != 0 {
            bail!(
                "canvas_size {} is not a multiple of tile_size {}",
                self.canvas_size,
                self.tile_size
            );
        }
        if self.cells() > MAX_CELLS {
            bail!("grid of {} tiles per side is larger than the maximum of {}", self.cells(), MAX_CELLS);
        }
        if self.initial_length == 0 {
            bail!("initial_length must be at least 1");
        }

        // The snake starts at the center and trails to the left
        let cells = self.cells() as usize;
        if self.initial_length > cells / 2 + 1 {
            bail!(
                "initial_length {} does not fit on a {}x{} grid",
                self.initial_length,
                cells,
                cells
            );
        }
        if self.initial_length >= cells * cells {
            bail!("a {}x{} grid leaves no room for food", cells, cells);
        }
        if self.max_mistakes == 0 {
            bail!("max_mistakes must be at least 1");
        }
        Ok(())
    }
}
