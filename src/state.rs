//! Game state and the per-tick rules.
//!
//! Nothing in here touches the terminal or the clock. The game loop feeds
//! in ticks and key presses and draws whatever the returned outcome says
//! changed.

use log::{debug, info};
use rand::Rng;

use crate::config::GameConfig;
use crate::food::place_food;
use crate::snake::{Direction, Snake};
use crate::{Coord, Coords};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ending {
    OutOfMistakes,
    /// The snake filled the grid.
    BoardFull,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    /// Waiting out the delay after a mistake.
    Paused,
    GameOver(Ending),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Collision {
    Wall,
    SelfBite,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing moved.
    Idle,
    Moved { new_head: Coords, old_head: Coords, old_tail: Option<Coords>, ate: bool },
    Mistake { collision: Collision, mistakes: u32 },
    /// The move that filled the grid; the game is over after it.
    BoardFull { new_head: Coords, old_head: Coords },
    GameOver(Ending),
}

pub struct GameState {
    snake: Snake,
    food: Coords,
    /// `None` while halted after a mistake.
    direction: Option<Direction>,
    /// Direction of the last successful move.
    heading: Direction,
    score: u32,
    mistakes: u32,
    last_collision: Option<Collision>,
    phase: Phase,
    canvas: Coord,
    tile: Coord,
    max_mistakes: u32,
}

impl GameState {
    /// Fresh game: snake centered and heading right, food somewhere free.
    pub fn new<R: Rng>(config: &GameConfig, rng: &mut R) -> Self {
        let tile = config.tile_size;
        let center = (config.cells() / 2) * tile;
        let snake = Snake::new((center, center), config.initial_length, Direction::Right, tile);

        // A validated config always leaves at least one free tile
        let food = place_food(rng, &snake, config.cells(), tile);
        debug_assert!(food.is_some(), "no free tile for the first food");
        let food = food.unwrap_or((0, 0));

        info!("New game: {} tiles per side, {} mistakes allowed", config.cells(), config.max_mistakes);
        GameState::with_layout(config, snake, food, Direction::Right)
    }

    pub fn with_layout(config: &GameConfig, snake: Snake, food: Coords, direction: Direction) -> Self {
        GameState {
            snake,
            food,
            direction: Some(direction),
            heading: direction,
            score: 0,
            mistakes: 0,
            last_collision: None,
            phase: Phase::Running,
            canvas: config.canvas_size,
            tile: config.tile_size,
            max_mistakes: config.max_mistakes,
        }
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Coords {
        self.food
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn max_mistakes(&self) -> u32 {
        self.max_mistakes
    }

    pub fn last_collision(&self) -> Option<Collision> {
        self.last_collision
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tile(&self) -> Coord {
        self.tile
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    /// Requests a turn. Only turns perpendicular to the last move are taken,
    /// so the snake can never fold back onto its own neck.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.is_over() || !direction.is_perpendicular(self.heading) {
            return false;
        }

        self.direction = Some(direction);
        true
    }

    /// Ends the post-mistake pause. The snake stays halted until steered.
    pub fn resume(&mut self) -> bool {
        if self.phase != Phase::Paused {
            return false;
        }

        self.phase = Phase::Running;
        true
    }

    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> TickOutcome {
        if self.phase != Phase::Running {
            return TickOutcome::Idle;
        }

        let direction = match self.direction {
            Some(dir) => dir,
            None => return TickOutcome::Idle,
        };

        let old_head = self.snake.head();
        let new_head = self.snake.next_head(direction, self.tile);

        if let Some(collision) = self.collision_at(new_head) {
            return self.register_mistake(collision);
        }

        self.heading = direction;
        let ate = new_head == self.food;
        let old_tail = self.snake.advance(new_head, ate);

        if ate {
            self.score += 1;
            debug!("Ate food at {:?}, score {}", new_head, self.score);

            match place_food(rng, &self.snake, self.canvas / self.tile, self.tile) {
                Some(food) => self.food = food,
                None => {
                    info!("Board full with score {}", self.score);
                    self.phase = Phase::GameOver(Ending::BoardFull);
                    return TickOutcome::BoardFull { new_head, old_head };
                }
            }
        }

        TickOutcome::Moved { new_head, old_head, old_tail, ate }
    }

    fn collision_at(&self, pos: Coords) -> Option<Collision> {
        let (x, y) = pos;
        if x < 0 || y < 0 || x >= self.canvas || y >= self.canvas {
            Some(Collision::Wall)
        } else if self.snake.blocks(pos) {
            Some(Collision::SelfBite)
        } else {
            None
        }
    }

    fn register_mistake(&mut self, collision: Collision) -> TickOutcome {
        self.mistakes += 1;
        self.last_collision = Some(collision);

        if self.mistakes >= self.max_mistakes {
            info!("Game over after {} mistakes, score {}", self.mistakes, self.score);
            self.phase = Phase::GameOver(Ending::OutOfMistakes);
            return TickOutcome::GameOver(Ending::OutOfMistakes);
        }

        info!("Mistake {}/{} ({:?})", self.mistakes, self.max_mistakes, collision);
        self.phase = Phase::Paused;
        self.direction = None;
        TickOutcome::Mistake { collision, mistakes: self.mistakes }
    }
}
