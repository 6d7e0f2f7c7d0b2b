//! A* over an 8-connected grid with integer octile costs.
//!
//! Traversability is fixed when the pathfinder is built; g-costs, parents and
//! the closed set live in a scratch buffer owned by a single `find_path` call,
//! so one pathfinder can serve any number of searches, including concurrent
//! ones.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::classify::ValueRange;
use crate::error::Result;
use crate::grid::{Cell, Grid};

pub const ORTHOGONAL_COST: u32 = 10;
pub const DIAGONAL_COST: u32 = 14;

const NEIGHBOURS: [(i32, i32); 8] =
    [(0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1)];

const NO_PARENT: usize = usize::MAX;

/// Cells from start (exclusive) to end (inclusive). Empty when no route exists.
pub type Path = Vec<Cell>;

/// Octile distance for 10/14 step costs. Admissible and consistent.
pub fn octile_distance(a: Cell, b: Cell) -> u32 {
    let dx = a.x.abs_diff(b.x);
    let dy = a.y.abs_diff(b.y);
    DIAGONAL_COST * dx.min(dy) + ORTHOGONAL_COST * dx.abs_diff(dy)
}

/// Cost of one step between adjacent cells.
#[inline]
pub fn step_cost(a: Cell, b: Cell) -> u32 {
    if a.x != b.x && a.y != b.y { DIAGONAL_COST } else { ORTHOGONAL_COST }
}

/// Total step cost of `path` walked from `start`.
pub fn path_cost(start: Cell, path: &[Cell]) -> u32 {
    let mut prev = start;
    let mut total = 0;
    for &cell in path {
        total += step_cost(prev, cell);
        prev = cell;
    }
    total
}

pub struct Pathfinder {
    traversable: Grid<bool>,
}

/// Per-search bookkeeping, indexed row-major.
struct Search {
    g: Vec<u32>,
    parent: Vec<usize>,
    closed: Vec<bool>,
    /// Frontier keyed by (f, h, insertion order). Stale entries are skipped on pop.
    open: BinaryHeap<Reverse<(u32, u32, u32, usize)>>,
    seq: u32,
}

impl Search {
    fn new(len: usize) -> Self {
        Self {
            g: vec![u32::MAX; len],
            parent: vec![NO_PARENT; len],
            closed: vec![false; len],
            open: BinaryHeap::new(),
            seq: 0,
        }
    }

    fn push(&mut self, idx: usize, g: u32, h: u32, parent: usize) {
        self.g[idx] = g;
        self.parent[idx] = parent;
        self.open.push(Reverse((g + h, h, self.seq, idx)));
        self.seq = self.seq.wrapping_add(1);
    }
}

impl Pathfinder {
    /// Cells whose `field` value lies inside `range` are traversable.
    pub fn new(field: &Grid<f32>, range: ValueRange) -> Self {
        Self { traversable: field.map(|&v| range.contains(v)) }
    }

    pub fn from_mask(traversable: Grid<bool>) -> Self {
        Self { traversable }
    }

    pub fn is_traversable(&self, cell: Cell) -> bool {
        self.traversable.get_cell(cell).copied().unwrap_or(false)
    }

    /// Minimum-cost 8-directional path from `start` to `end`.
    ///
    /// The start cell is expanded even when it is not traversable itself; the
    /// end cell must be. Out-of-bounds endpoints are an error, an unreachable
    /// end is an empty path.
    pub fn find_path(&self, start: Cell, end: Cell) -> Result<Path> {
        let grid = &self.traversable;
        let start_idx = grid.checked_index(start)?;
        let end_idx = grid.checked_index(end)?;

        let mut search = Search::new(grid.len());
        search.push(start_idx, 0, octile_distance(start, end), NO_PARENT);

        let mut expanded = 0usize;
        while let Some(Reverse((_, _, _, idx))) = search.open.pop() {
            if search.closed[idx] {
                continue;
            }
            search.closed[idx] = true;
            expanded += 1;

            if idx == end_idx {
                trace!(?start, ?end, expanded, cost = search.g[idx], "path found");
                return Ok(reconstruct(grid, &search.parent, start_idx, end_idx));
            }

            let current = grid.cell_of(idx);
            let g = search.g[idx];
            for (dx, dy) in NEIGHBOURS {
                let next = current.offset(dx, dy);
                let Some(next_idx) = grid.index_of(next) else {
                    continue;
                };
                if !*grid.get(next.x as usize, next.y as usize) || search.closed[next_idx] {
                    continue;
                }
                let tentative = g + step_cost(current, next);
                if tentative < search.g[next_idx] {
                    search.push(next_idx, tentative, octile_distance(next, end), idx);
                }
            }
        }

        trace!(?start, ?end, expanded, "no path");
        Ok(Path::new())
    }
}

fn reconstruct(grid: &Grid<bool>, parent: &[usize], start_idx: usize, end_idx: usize) -> Path {
    let mut path = Path::new();
    let mut idx = end_idx;
    while idx != start_idx && idx != NO_PARENT {
        path.push(grid.cell_of(idx));
        idx = parent[idx];
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn open_grid(w: usize, h: usize) -> Pathfinder {
        Pathfinder::from_mask(Grid::new(w, h, true))
    }

    fn assert_walkable(pf: &Pathfinder, start: Cell, path: &[Cell]) {
        let mut prev = start;
        for &c in path {
            assert!(pf.is_traversable(c), "{c:?} is blocked");
            assert!((c.x - prev.x).abs() <= 1 && (c.y - prev.y).abs() <= 1, "{prev:?} -> {c:?} is not a step");
            assert_ne!(c, prev);
            prev = c;
        }
    }

    /// Plain Dijkstra over the same mask, for cross-checking optimal costs.
    fn reference_cost(mask: &Grid<bool>, start: Cell, end: Cell) -> Option<u32> {
        let mut dist = vec![u32::MAX; mask.len()];
        let mut heap = BinaryHeap::new();
        let s = mask.index_of(start)?;
        dist[s] = 0;
        heap.push(Reverse((0u32, s)));
        while let Some(Reverse((d, idx))) = heap.pop() {
            if d > dist[idx] {
                continue;
            }
            let cur = mask.cell_of(idx);
            if cur == end {
                return Some(d);
            }
            for (dx, dy) in NEIGHBOURS {
                let n = cur.offset(dx, dy);
                if let Some(ni) = mask.index_of(n) {
                    if !*mask.get(n.x as usize, n.y as usize) {
                        continue;
                    }
                    let nd = d + step_cost(cur, n);
                    if nd < dist[ni] {
                        dist[ni] = nd;
                        heap.push(Reverse((nd, ni)));
                    }
                }
            }
        }
        None
    }

    #[test]
    fn octile_matches_step_costs() {
        let o = Cell::new(0, 0);
        assert_eq!(octile_distance(o, Cell::new(4, 0)), 40);
        assert_eq!(octile_distance(o, Cell::new(3, 3)), 42);
        assert_eq!(octile_distance(o, Cell::new(-2, 5)), 2 * 14 + 3 * 10);
        assert_eq!(octile_distance(Cell::new(7, 1), Cell::new(7, 1)), 0);
    }

    #[test]
    fn equal_f_pops_lower_h_first() {
        let mut search = Search::new(4);
        search.push(0, 10, 20, NO_PARENT);
        search.push(1, 20, 10, NO_PARENT);
        search.push(2, 5, 30, NO_PARENT);
        let order: Vec<usize> = std::iter::from_fn(|| search.open.pop().map(|Reverse(e)| e.3)).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn full_ties_keep_insertion_order() {
        let mut search = Search::new(3);
        search.push(2, 14, 14, NO_PARENT);
        search.push(0, 14, 14, NO_PARENT);
        let Some(Reverse((_, _, _, first))) = search.open.pop() else {
            panic!("frontier empty");
        };
        assert_eq!(first, 2);
    }

    #[test]
    fn straight_line_costs_ten_per_step() {
        let pf = open_grid(12, 5);
        let start = Cell::new(0, 0);
        let end = Cell::new(9, 0);
        let path = pf.find_path(start, end).unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path.last(), Some(&end));
        assert!(!path.contains(&start));
        assert_eq!(path_cost(start, &path), 90);
        assert_walkable(&pf, start, &path);
    }

    #[test]
    fn diagonal_costs_fourteen_per_step() {
        let pf = open_grid(10, 10);
        let start = Cell::new(0, 0);
        let path = pf.find_path(start, Cell::new(7, 7)).unwrap();
        assert_eq!(path.len(), 7);
        assert_eq!(path_cost(start, &path), 98);
    }

    #[test]
    fn full_wall_means_no_path() {
        let mut mask = Grid::new(9, 6, true);
        for y in 0..6 {
            mask.set(4, y, false);
        }
        let pf = Pathfinder::from_mask(mask);
        let path = pf.find_path(Cell::new(1, 2), Cell::new(7, 3)).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_squeezes_through_gap() {
        let mut mask = Grid::new(9, 6, true);
        for y in 0..6 {
            if y != 5 {
                mask.set(4, y, false);
            }
        }
        let pf = Pathfinder::from_mask(mask);
        let start = Cell::new(0, 0);
        let end = Cell::new(8, 0);
        let path = pf.find_path(start, end).unwrap();
        assert!(path.contains(&Cell::new(4, 5)));
        assert_walkable(&pf, start, &path);
        assert_eq!(path.last(), Some(&end));
    }

    #[test]
    fn blocked_end_is_unreachable() {
        let mut mask = Grid::new(5, 5, true);
        mask.set(4, 4, false);
        let pf = Pathfinder::from_mask(mask);
        assert!(pf.find_path(Cell::new(0, 0), Cell::new(4, 4)).unwrap().is_empty());
    }

    #[test]
    fn blocked_start_still_expands() {
        let mut mask = Grid::new(5, 5, true);
        mask.set(0, 0, false);
        let pf = Pathfinder::from_mask(mask);
        let path = pf.find_path(Cell::new(0, 0), Cell::new(3, 0)).unwrap();
        assert_eq!(path_cost(Cell::new(0, 0), &path), 30);
    }

    #[test]
    fn same_start_and_end_is_empty() {
        let pf = open_grid(3, 3);
        assert!(pf.find_path(Cell::new(1, 1), Cell::new(1, 1)).unwrap().is_empty());
    }

    #[test]
    fn out_of_bounds_endpoint_is_an_error() {
        let pf = open_grid(4, 4);
        let err = pf.find_path(Cell::new(0, 0), Cell::new(4, 1)).unwrap_err();
        assert!(matches!(err, MapError::OutOfBounds { x: 4, y: 1, .. }));
        assert!(pf.find_path(Cell::new(-1, 0), Cell::new(2, 2)).is_err());
    }

    #[test]
    fn traversability_follows_value_range() {
        let field = Grid::from_vec(3, 1, vec![0.1f32, 0.5, 0.9]).unwrap();
        let pf = Pathfinder::new(&field, ValueRange::new(0.4, 0.9));
        assert!(!pf.is_traversable(Cell::new(0, 0)));
        assert!(pf.is_traversable(Cell::new(1, 0)));
        assert!(pf.is_traversable(Cell::new(2, 0)));
        assert!(!pf.is_traversable(Cell::new(3, 0)));
    }

    #[test]
    fn repeated_searches_do_not_leak_state() {
        let mut mask = Grid::new(15, 15, true);
        for y in 2..13 {
            mask.set(7, y, false);
        }
        let pf = Pathfinder::from_mask(mask.clone());
        let first = pf.find_path(Cell::new(0, 7), Cell::new(14, 7)).unwrap();
        let _ = pf.find_path(Cell::new(14, 0), Cell::new(0, 14)).unwrap();
        let again = pf.find_path(Cell::new(0, 7), Cell::new(14, 7)).unwrap();
        let fresh = Pathfinder::from_mask(mask).find_path(Cell::new(0, 7), Cell::new(14, 7)).unwrap();
        assert_eq!(first, again);
        assert_eq!(again, fresh);
    }

    #[test]
    fn cost_matches_reference_on_random_masks() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        for _ in 0..40 {
            let mask = Grid::from_fn(16, 12, |_, _| rng.gen_bool(0.7));
            let start = Cell::new(rng.gen_range(0..16), rng.gen_range(0..12));
            let end = Cell::new(rng.gen_range(0..16), rng.gen_range(0..12));
            if start == end || !*mask.get(start.x as usize, start.y as usize) {
                continue;
            }
            let pf = Pathfinder::from_mask(mask.clone());
            let path = pf.find_path(start, end).unwrap();
            match reference_cost(&mask, start, end) {
                Some(cost) => {
                    assert_eq!(path_cost(start, &path), cost);
                    assert_walkable(&pf, start, &path);
                }
                None => assert!(path.is_empty()),
            }
        }
    }
}
