use rand::{seq::SliceRandom, Rng};

use crate::snake::Snake;
use crate::{Coord, Coords};

/// Rejected random draws before falling back to scanning the free cells.
const MAX_RANDOM_ATTEMPTS: usize = 64;

/// Picks a random free tile for the next piece of food.
///
/// Draws tiles uniformly and rejects the ones the snake sits on. Once the
/// board is crowded enough that this keeps missing, it chooses among the
/// remaining free tiles directly. Returns `None` when the snake covers the
/// whole grid.
pub fn place_food<R: Rng>(rng: &mut R, snake: &Snake, cells: Coord, tile: Coord) -> Option<Coords> {
    if snake.len() >= (cells * cells) as usize {
        return None;
    }

    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let pos = (rng.gen_range(0..cells) * tile, rng.gen_range(0..cells) * tile);
        if !snake.occupies(pos) {
            return Some(pos);
        }
    }

    let free: Vec<Coords> = (0..cells)
        .flat_map(|y| (0..cells).map(move |x| (x * tile, y * tile)))
        .filter(|pos| !snake.occupies(*pos))
        .collect();
    free.choose(rng).copied()
}
