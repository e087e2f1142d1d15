use std::collections::VecDeque;

use crate::{Coord, Coords};
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    /// Unit vector scaled to one tile.
    pub fn vector(self, step: Coord) -> (Coord, Coord) {
        match self {
            Up => (0, -step),
            Down => (0, step),
            Left => (-step, 0),
            Right => (step, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub fn is_perpendicular(self, other: Direction) -> bool {
        self != other && self != other.opposite()
    }
}

/// Segments are stored head first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<Coords>,
}

impl Snake {
    /// Lays out `size` segments behind `head`, opposite to `direction`.
    pub fn new(head: Coords, size: usize, direction: Direction, step: Coord) -> Self {
        let (dx, dy) = direction.vector(step);

        let body = (0..size as Coord)
            .map(|i| (head.0 - dx * i, head.1 - dy * i))
            .collect();
        Snake { body }
    }

    #[cfg(test)]
    pub fn from_segments(segments: &[Coords]) -> Self {
        assert!(!segments.is_empty(), "a snake needs at least one segment");
        Snake { body: segments.iter().copied().collect() }
    }

    pub fn body(&self) -> &VecDeque<Coords> {
        &self.body
    }

    pub fn head(&self) -> Coords {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn occupies(&self, pos: Coords) -> bool {
        self.body.contains(&pos)
    }

    /// Whether `pos` would bite the snake on its next move. The tail is left
    /// out since it moves away in the same step.
    pub fn blocks(&self, pos: Coords) -> bool {
        self.body.iter().take(self.body.len() - 1).any(|seg| *seg == pos)
    }

    pub fn next_head(&self, direction: Direction, step: Coord) -> Coords {
        let (dx, dy) = direction.vector(step);
        let head = self.head();
        (head.0 + dx, head.1 + dy)
    }

    /// Prepends `new_head` and returns the dropped tail, if any.
    pub fn advance(&mut self, new_head: Coords, grow: bool) -> Option<Coords> {
        self.body.push_front(new_head);

        if grow {
            None
        } else {
            self.body.pop_back()
        }
    }

    pub fn head_char(direction: Direction) -> char {
        match direction {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}
