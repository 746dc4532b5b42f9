//! Terrain grid, exploration memory and cave generation.
//!
//! The [`GameMap`] owns the session's only random source. Everything that
//! needs randomness (generation, spawn tables, the passive heal, wander
//! targets) draws from it, so a fixed seed replays a whole session.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use grotto_ecs::point::Point;

use crate::config::{CaveRule, EngineConfig};
use crate::path::connected_component;
use crate::MapError;

/// Rejection samples per cell before [`GameMap::rand_floor`] gives up.
const RAND_FLOOR_SAMPLES_PER_CELL: usize = 64;

/// Terrain kind of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Floor,
}

fn entropy_rng() -> Pcg64 {
    Pcg64::from_entropy()
}

/// Rectangular wall/floor grid plus the set of cells ever seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMap {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    explored: Vec<bool>,
    #[serde(skip, default = "entropy_rng")]
    rng: Pcg64,
}

impl PartialEq for GameMap {
    /// Terrain and exploration only; the random source is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.cells == other.cells
            && self.explored == other.explored
    }
}

impl GameMap {
    fn filled(width: i32, height: i32, cell: Cell, rng: Pcg64) -> Result<Self, MapError> {
        if width <= 0 || height <= 0 {
            return Err(MapError::InvalidSize { width, height });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            cells: vec![cell; len],
            explored: vec![false; len],
            rng,
        })
    }

    /// An all-floor map with a fixed-seed random source. Dimensions below
    /// one are raised to one.
    pub fn open(width: i32, height: i32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::Floor; len],
            explored: vec![false; len],
            rng: Pcg64::seed_from_u64(0),
        }
    }

    /// Build a map from text art: `#` is wall, any other character is floor.
    /// All rows must have the same length.
    pub fn from_rows(rows: &[&str]) -> Result<Self, MapError> {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as i32;
        let mut map = Self::filled(width, height, Cell::Floor, Pcg64::seed_from_u64(0))?;
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() as i32 != width {
                return Err(MapError::InvalidSize { width, height });
            }
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    map.set(Point::new(x as i32, y as i32), Cell::Wall);
                }
            }
        }
        Ok(map)
    }

    /// Generate a single-component cave.
    ///
    /// Each attempt fills the grid at random, smooths it with the configured
    /// automata rules, keeps only the component around a random floor cell
    /// and accepts it if that component is larger than `min_cave_size`.
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidSize`] for a non-positive size,
    /// [`MapError::GenerationExhausted`] if no attempt produced a large
    /// enough cave.
    pub fn generate(config: &EngineConfig, rng: Pcg64) -> Result<Self, MapError> {
        let mut map = Self::filled(config.map_width, config.map_height, Cell::Wall, rng)?;

        for attempt in 1..=config.max_generation_attempts {
            map.random_fill(config.initial_floor_probability);
            for rule in &config.cave_rules {
                for _ in 0..rule.reps {
                    map.smooth(rule);
                }
            }

            let start = match map.rand_floor() {
                Ok(p) => p,
                Err(_) => {
                    tracing::debug!(attempt, "cave generation attempt left no floor");
                    continue;
                }
            };
            let cave = connected_component(start, |p| map.is_walkable(p));
            for i in 0..map.cells.len() {
                let p = map.point_of(i);
                if map.cells[i] == Cell::Floor && !cave.contains(&p) {
                    map.cells[i] = Cell::Wall;
                }
            }

            if cave.len() > config.min_cave_size {
                tracing::debug!(attempt, tiles = cave.len(), "cave generated");
                return Ok(map);
            }
            tracing::debug!(
                attempt,
                tiles = cave.len(),
                min = config.min_cave_size,
                "cave generation attempt rejected"
            );
        }

        tracing::warn!(
            attempts = config.max_generation_attempts,
            "cave generation exhausted"
        );
        Err(MapError::GenerationExhausted {
            attempts: config.max_generation_attempts,
        })
    }

    // -- cellular automata --------------------------------------------------

    fn random_fill(&mut self, floor_probability: f64) {
        for i in 0..self.cells.len() {
            self.cells[i] = if self.rng.gen_bool(floor_probability) {
                Cell::Floor
            } else {
                Cell::Wall
            };
        }
        self.explored.fill(false);
    }

    /// Walls in the square of `radius` around `p`, `p` included. Cells
    /// outside the grid count as walls.
    fn walls_around(&self, p: Point, radius: i32) -> u32 {
        let mut walls = 0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if !self.is_walkable(p.shift(dx, dy)) {
                    walls += 1;
                }
            }
        }
        walls
    }

    fn smooth(&mut self, rule: &CaveRule) {
        let next: Vec<Cell> = (0..self.cells.len())
            .map(|i| {
                let p = self.point_of(i);
                let near = self.walls_around(p, 1) >= rule.near_walls;
                let far = rule
                    .far_walls_max
                    .is_some_and(|max| self.walls_around(p, 2) <= max);
                if near || far {
                    Cell::Wall
                } else {
                    Cell::Floor
                }
            })
            .collect();
        self.cells = next;
    }

    // -- queries ------------------------------------------------------------

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        (0..self.width).contains(&p.x) && (0..self.height).contains(&p.y)
    }

    fn index_of(&self, p: Point) -> Option<usize> {
        self.in_bounds(p)
            .then(|| p.y as usize * self.width as usize + p.x as usize)
    }

    fn point_of(&self, index: usize) -> Point {
        let w = self.width as usize;
        Point::new((index % w) as i32, (index / w) as i32)
    }

    /// Whether the grid vectors match the declared size. Only a map read back
    /// from untrusted JSON can fail this.
    pub fn is_well_formed(&self) -> bool {
        let len = self.width.max(0) as usize * self.height.max(0) as usize;
        len > 0 && self.cells.len() == len && self.explored.len() == len
    }

    pub fn cell(&self, p: Point) -> Option<Cell> {
        self.index_of(p).map(|i| self.cells[i])
    }

    /// Overwrite one cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, p: Point, cell: Cell) {
        if let Some(i) = self.index_of(p) {
            self.cells[i] = cell;
        }
    }

    /// In bounds and floor.
    pub fn is_walkable(&self, p: Point) -> bool {
        self.cell(p) == Some(Cell::Floor)
    }

    /// Every cell with its coordinate, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (Point, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &c)| (self.point_of(i), c))
    }

    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Floor).count()
    }

    // -- exploration --------------------------------------------------------

    /// Remember `p` as seen. Exploration only ever grows.
    pub fn mark_explored(&mut self, p: Point) {
        if let Some(i) = self.index_of(p) {
            self.explored[i] = true;
        }
    }

    pub fn is_explored(&self, p: Point) -> bool {
        self.index_of(p).is_some_and(|i| self.explored[i])
    }

    /// Every explored cell, row by row.
    pub fn explored(&self) -> impl Iterator<Item = Point> + '_ {
        self.explored
            .iter()
            .enumerate()
            .filter(|(_, seen)| **seen)
            .map(|(i, _)| self.point_of(i))
    }

    // -- randomness ---------------------------------------------------------

    /// A uniformly sampled floor cell.
    ///
    /// # Errors
    ///
    /// [`MapError::NoFloor`] if the sample budget runs out, which in practice
    /// means the map has no floor at all.
    pub fn rand_floor(&mut self) -> Result<Point, MapError> {
        let samples = self.cells.len() * RAND_FLOOR_SAMPLES_PER_CELL;
        for _ in 0..samples {
            let p = Point::new(
                self.rng.gen_range(0..self.width),
                self.rng.gen_range(0..self.height),
            );
            if self.is_walkable(p) {
                return Ok(p);
            }
        }
        Err(MapError::NoFloor { samples })
    }

    /// Replace the random source with a fresh one seeded from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg64::seed_from_u64(seed);
    }

    /// Drop in an externally built random source.
    pub fn set_rng(&mut self, rng: Pcg64) {
        self.rng = rng;
    }

    pub fn rng_mut(&mut self) -> &mut Pcg64 {
        &mut self.rng
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
