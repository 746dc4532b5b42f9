//! Grid path search: A* over a pluggable [`Pather`] and BFS flood fill.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use grotto_ecs::point::Point;
use grotto_ecs::store::EntityStore;

use crate::map::GameMap;

// ---------------------------------------------------------------------------
// Pather
// ---------------------------------------------------------------------------

/// Neighbour, cost and heuristic contract consumed by [`astar_path`].
///
/// `estimation` must never exceed the true remaining cost for the returned
/// path to be optimal.
pub trait Pather {
    /// Cells reachable in one step from `p`.
    fn neighbors(&self, p: Point) -> Vec<Point>;
    /// Cost of the step `from -> to`. Always positive.
    fn cost(&self, from: Point, to: Point) -> u32;
    /// Lower bound on the cost from `from` to `to`.
    fn estimation(&self, from: Point, to: Point) -> u32;
}

// ---------------------------------------------------------------------------
// A*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Node {
    at: Point,
    g_cost: u32,
    f_cost: u32,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behaviour; prefer deeper nodes on ties.
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| self.g_cost.cmp(&other.g_cost))
            .then_with(|| other.at.cmp(&self.at))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct_path(came_from: &HashMap<Point, Point>, end: Point) -> Vec<Point> {
    let mut path = Vec::new();
    let mut current = end;
    while let Some(&prev) = came_from.get(&current) {
        path.push(current);
        current = prev;
    }
    path.reverse();
    path
}

/// Cheapest path from `from` to `to` under `pather`.
///
/// The result excludes `from` and ends at `to`. It is empty when `to` cannot
/// be reached or when `from == to`.
pub fn astar_path<P: Pather + ?Sized>(pather: &P, from: Point, to: Point) -> Vec<Point> {
    if from == to {
        return Vec::new();
    }

    let mut open_set = BinaryHeap::new();
    let mut g_scores: HashMap<Point, u32> = HashMap::new();
    let mut came_from: HashMap<Point, Point> = HashMap::new();
    let mut closed: HashSet<Point> = HashSet::new();

    g_scores.insert(from, 0);
    open_set.push(Node {
        at: from,
        g_cost: 0,
        f_cost: pather.estimation(from, to),
    });

    while let Some(current) = open_set.pop() {
        if current.at == to {
            return reconstruct_path(&came_from, to);
        }
        if !closed.insert(current.at) {
            continue;
        }

        for next in pather.neighbors(current.at) {
            if closed.contains(&next) {
                continue;
            }
            let new_g = current.g_cost.saturating_add(pather.cost(current.at, next));
            if new_g < g_scores.get(&next).copied().unwrap_or(u32::MAX) {
                g_scores.insert(next, new_g);
                came_from.insert(next, current.at);
                open_set.push(Node {
                    at: next,
                    g_cost: new_g,
                    f_cost: new_g.saturating_add(pather.estimation(next, to)),
                });
            }
        }
    }

    Vec::new()
}

/// Total step cost of walking `path` starting at `from`.
pub fn path_cost<P: Pather + ?Sized>(pather: &P, from: Point, path: &[Point]) -> u32 {
    let mut cost = 0;
    let mut at = from;
    for &p in path {
        cost += pather.cost(at, p);
        at = p;
    }
    cost
}

// ---------------------------------------------------------------------------
// Flood fill
// ---------------------------------------------------------------------------

/// Every cell reachable from `start` through cardinal steps onto `passable`
/// cells, `start` included. Empty if `start` itself is not passable.
pub fn connected_component<F>(start: Point, passable: F) -> HashSet<Point>
where
    F: Fn(Point) -> bool,
{
    let mut seen = HashSet::new();
    if !passable(start) {
        return seen;
    }
    let mut queue = VecDeque::from([start]);
    seen.insert(start);
    while let Some(p) = queue.pop_front() {
        for n in p.cardinal_neighbors() {
            if passable(n) && seen.insert(n) {
                queue.push_back(n);
            }
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// AiPather
// ---------------------------------------------------------------------------

/// Pathing rules for enemies: cardinal moves over floor, with cells held by
/// living enemies made expensive rather than impassable so crowds get routed
/// around without deadlocking.
pub struct AiPather<'a> {
    pub map: &'a GameMap,
    pub store: &'a EntityStore,
    pub blocked_step_cost: u32,
}

impl Pather for AiPather<'_> {
    fn neighbors(&self, p: Point) -> Vec<Point> {
        p.cardinal_neighbors()
            .into_iter()
            .filter(|&n| self.map.is_walkable(n))
            .collect()
    }

    fn cost(&self, _from: Point, to: Point) -> u32 {
        if self.store.enemy_at(to).is_some() {
            self.blocked_step_cost
        } else {
            1
        }
    }

    fn estimation(&self, from: Point, to: Point) -> u32 {
        from.manhattan(to).unsigned_abs()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
