//! Grid coordinates and cardinal directions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2-D point on the dungeon grid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this point by `(dx, dy)`.
    pub const fn shift(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// One step in `direction`.
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.shift(dx, dy)
    }

    /// Manhattan (taxicab) distance to `other`.
    pub fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The four orthogonal neighbours, in [`Direction::ALL`] order.
    pub fn cardinal_neighbors(self) -> [Self; 4] {
        Direction::ALL.map(|d| self.step(d))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal direction for movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Returns the `(dx, dy)` offset for one step in this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_is_symmetric() {
        let a = Point::new(2, -3);
        let b = Point::new(-1, 4);
        assert_eq!(a.manhattan(b), 10);
        assert_eq!(b.manhattan(a), 10);
        assert_eq!(a.manhattan(a), 0);
    }

    #[test]
    fn step_follows_delta() {
        let p = Point::new(5, 5);
        assert_eq!(p.step(Direction::Up), Point::new(5, 4));
        assert_eq!(p.step(Direction::Down), Point::new(5, 6));
        assert_eq!(p.step(Direction::Left), Point::new(4, 5));
        assert_eq!(p.step(Direction::Right), Point::new(6, 5));
    }

    #[test]
    fn cardinal_neighbors_are_adjacent() {
        let p = Point::new(0, 0);
        for n in p.cardinal_neighbors() {
            assert_eq!(p.manhattan(n), 1);
        }
    }
}
