//! Field of view by symmetric shadowcasting.
//!
//! Each of the four quadrants is scanned row by row outward from the origin.
//! A row is bounded by two slopes kept as exact fractions, so no floating
//! point rounding can make visibility asymmetric: if `a` sees `b` then `b`
//! sees `a`. Rows past the radius are not scanned, which bounds the result to
//! the `[-R, R]` square, and the result is then trimmed to the Manhattan ball
//! of radius `R`.

use std::collections::BTreeSet;

use grotto_ecs::point::Point;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Size of the grid being scanned; valid cells are `0..width` by `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn contains(&self, p: Point) -> bool {
        (0..self.width).contains(&p.x) && (0..self.height).contains(&p.y)
    }
}

// ---------------------------------------------------------------------------
// Slopes and rows
// ---------------------------------------------------------------------------

/// A slope `num / den` with `den > 0`.
#[derive(Debug, Clone, Copy)]
struct Slope {
    num: i64,
    den: i64,
}

impl Slope {
    const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Slope through the near edge of the tile at `(depth, col)`.
    fn of_tile(depth: i64, col: i64) -> Self {
        Self::new(2 * col - 1, 2 * depth)
    }
}

#[derive(Debug, Clone, Copy)]
struct Row {
    depth: i64,
    start: Slope,
    end: Slope,
}

impl Row {
    /// First column: `depth * start` rounded half up.
    fn min_col(&self) -> i64 {
        (2 * self.depth * self.start.num + self.start.den).div_euclid(2 * self.start.den)
    }

    /// Last column: `depth * end` rounded half down.
    fn max_col(&self) -> i64 {
        let num = 2 * self.depth * self.end.num - self.end.den;
        -(-num).div_euclid(2 * self.end.den)
    }

    /// `depth * start <= col <= depth * end`: the tile centre lies inside
    /// the row's sector, which is what keeps the result symmetric.
    fn is_symmetric(&self, col: i64) -> bool {
        col * self.start.den >= self.depth * self.start.num
            && col * self.end.den <= self.depth * self.end.num
    }

    fn next(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Quadrant {
    North,
    South,
    East,
    West,
}

impl Quadrant {
    const ALL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];

    fn transform(self, origin: Point, depth: i64, col: i64) -> Point {
        let (row, col) = (depth as i32, col as i32);
        match self {
            Self::North => origin.shift(col, -row),
            Self::South => origin.shift(col, row),
            Self::East => origin.shift(row, col),
            Self::West => origin.shift(-row, col),
        }
    }
}

// ---------------------------------------------------------------------------
// Fov
// ---------------------------------------------------------------------------

/// The set of cells visible from one origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fov {
    origin: Point,
    radius: i32,
    visible: BTreeSet<Point>,
}

impl Fov {
    /// Compute the cells visible from `origin` within `radius`.
    ///
    /// `passable` tells whether light crosses a cell. Opaque cells bordering
    /// the lit area are themselves visible. Cells outside `bounds` are opaque
    /// and never reported. The origin is always visible.
    pub fn compute<F>(origin: Point, radius: i32, bounds: Bounds, passable: F) -> Self
    where
        F: Fn(Point) -> bool,
    {
        let radius = radius.max(0);
        let mut visible = BTreeSet::new();
        visible.insert(origin);

        let is_clear = |p: Point| bounds.contains(p) && passable(p);

        for quadrant in Quadrant::ALL {
            let mut rows = vec![Row {
                depth: 1,
                start: Slope::new(-1, 1),
                end: Slope::new(1, 1),
            }];

            while let Some(mut row) = rows.pop() {
                if row.depth > i64::from(radius) {
                    continue;
                }
                let mut prev_clear: Option<bool> = None;
                for col in row.min_col()..=row.max_col() {
                    let p = quadrant.transform(origin, row.depth, col);
                    let clear = is_clear(p);

                    if bounds.contains(p) && (!clear || row.is_symmetric(col)) {
                        visible.insert(p);
                    }
                    if prev_clear == Some(false) && clear {
                        row.start = Slope::of_tile(row.depth, col);
                    }
                    if prev_clear == Some(true) && !clear {
                        let mut next = row.next();
                        next.end = Slope::of_tile(row.depth, col);
                        rows.push(next);
                    }
                    prev_clear = Some(clear);
                }
                if prev_clear == Some(true) {
                    rows.push(row.next());
                }
            }
        }

        visible.retain(|p| p.manhattan(origin) <= radius);
        Self {
            origin,
            radius,
            visible,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn visible(&self, p: Point) -> bool {
        self.visible.contains(&p)
    }

    /// Visible cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.visible.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::GameMap;

    fn fov_on(map: &GameMap, origin: Point, radius: i32) -> Fov {
        let bounds = Bounds {
            width: map.width(),
            height: map.height(),
        };
        Fov::compute(origin, radius, bounds, |p| map.is_walkable(p))
    }

    #[test]
    fn open_room_sees_the_manhattan_ball() {
        let map = GameMap::open(21, 21);
        let origin = Point::new(10, 10);
        let fov = fov_on(&map, origin, 3);
        // |dx| + |dy| <= 3 holds 25 cells.
        assert_eq!(fov.len(), 25);
        assert!(fov.visible(Point::new(13, 10)));
        assert!(fov.visible(Point::new(11, 12)));
        assert!(!fov.visible(Point::new(12, 12)));
    }

    #[test]
    fn zero_radius_sees_only_the_origin() {
        let map = GameMap::open(5, 5);
        let fov = fov_on(&map, Point::new(2, 2), 0);
        assert_eq!(fov.iter().collect::<Vec<_>>(), vec![Point::new(2, 2)]);
    }

    #[test]
    fn walls_are_seen_but_block_what_lies_behind() {
        let map = GameMap::from_rows(&[
            "#######", //
            "#.....#",
            "#..#..#",
            "#.....#",
            "#######",
        ])
        .unwrap();
        let fov = fov_on(&map, Point::new(1, 2), 10);
        assert!(fov.visible(Point::new(3, 2)), "the pillar itself is lit");
        assert!(!fov.visible(Point::new(4, 2)), "directly behind the pillar");
        assert!(!fov.visible(Point::new(5, 2)));
        assert!(fov.visible(Point::new(0, 2)), "boundary wall");
    }

    #[test]
    fn nothing_outside_the_grid_is_reported() {
        let map = GameMap::open(3, 3);
        let fov = fov_on(&map, Point::new(0, 0), 5);
        assert!(fov.iter().all(|p| map.in_bounds(p)));
        assert_eq!(fov.len(), 9);
    }

    #[test]
    fn visibility_is_symmetric_between_floor_cells() {
        let map = GameMap::from_rows(&[
            "##########",
            "#...#....#",
            "#.#....#.#",
            "#....##..#",
            "#.#......#",
            "##########",
        ])
        .unwrap();
        let floors: Vec<Point> = map
            .cells()
            .filter(|&(p, _)| map.is_walkable(p))
            .map(|(p, _)| p)
            .collect();
        for &a in &floors {
            let from_a = fov_on(&map, a, 20);
            for &b in &floors {
                if from_a.visible(b) {
                    assert!(fov_on(&map, b, 20).visible(a), "{a} sees {b} but not back");
                }
            }
        }
    }
}
