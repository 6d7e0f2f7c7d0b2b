//! Building site search and seeded selection under a per-axis exclusion radius.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::classify::{Label, ValueRange};
use crate::grid::{Cell, Grid};

/// Axis-aligned square footprint anchored at its minimum corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub anchor: Cell,
    pub size: u32,
}

impl Building {
    pub fn new(anchor: Cell, size: u32) -> Self {
        Self { anchor, size }
    }

    /// Routing endpoint: anchor plus `size / 2` on both axes.
    pub fn center(&self) -> Cell {
        let half = (self.size / 2) as i32;
        self.anchor.offset(half, half)
    }

    /// Footprint cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let s = self.size as i32;
        (0..s).flat_map(move |dy| (0..s).map(move |dx| self.anchor.offset(dx, dy)))
    }

    /// True when `anchor` is more than `size + 1` away on at least one axis.
    pub fn clears(&self, anchor: Cell) -> bool {
        let gap = self.size as i32 + 1;
        (anchor.x - self.anchor.x).abs() > gap || (anchor.y - self.anchor.y).abs() > gap
    }
}

/// Every anchor whose full `size × size` footprint is in bounds and lies on
/// terrain strictly outside `forest_range`. Row-major order.
pub fn find_building_sites(terrain: &Grid<f32>, size: u32, forest_range: ValueRange) -> Vec<Cell> {
    let s = size as usize;
    if s == 0 || s > terrain.width || s > terrain.height {
        return Vec::new();
    }

    // Anchors past width - s / height - s would leave the grid.
    let mut sites = Vec::new();
    for y0 in 0..=terrain.height - s {
        for x0 in 0..=terrain.width - s {
            let fits = (y0..y0 + s)
                .all(|y| (x0..x0 + s).all(|x| !forest_range.contains(*terrain.get(x, y))));
            if fits {
                sites.push(Cell::new(x0 as i32, y0 as i32));
            }
        }
    }
    sites
}

/// Pick up to `count` buildings from `candidates`.
///
/// Each round draws a uniform index, commits that anchor, and drops every
/// remaining candidate the new building does not clear. Ends early once the
/// candidates run out.
pub fn select_buildings(
    mut candidates: Vec<Cell>,
    size: u32,
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Building> {
    let mut placed = Vec::with_capacity(count);
    while placed.len() < count && !candidates.is_empty() {
        let pick = candidates[rng.gen_range(0..candidates.len())];
        let building = Building::new(pick, size);
        candidates.retain(|&c| building.clears(c));
        placed.push(building);
    }
    placed
}

/// Stamp every footprint cell with [`Label::Building`].
pub fn paint_buildings(labels: &mut Grid<Label>, buildings: &[Building]) {
    for b in buildings {
        for cell in b.cells() {
            if labels.in_bounds(cell) {
                labels.set(cell.x as usize, cell.y as usize, Label::Building);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const FOREST: ValueRange = ValueRange::new(0.55, 0.7);

    #[test]
    fn center_uses_integer_half() {
        assert_eq!(Building::new(Cell::new(4, 6), 3).center(), Cell::new(5, 7));
        assert_eq!(Building::new(Cell::new(4, 6), 2).center(), Cell::new(5, 7));
        assert_eq!(Building::new(Cell::new(4, 6), 1).center(), Cell::new(4, 6));
    }

    #[test]
    fn sites_stay_inside_grid() {
        let t = Grid::new(6, 5, 0.2f32);
        let sites = find_building_sites(&t, 3, FOREST);
        assert_eq!(sites.len(), 4 * 3);
        for s in &sites {
            assert!(s.x + 3 <= 6 && s.y + 3 <= 5);
        }
    }

    #[test]
    fn forest_terrain_blocks_sites() {
        let mut t = Grid::new(5, 5, 0.2f32);
        t.set(2, 2, 0.6);
        let sites = find_building_sites(&t, 2, FOREST);
        for s in &sites {
            let covers = (s.x..s.x + 2).contains(&2) && (s.y..s.y + 2).contains(&2);
            assert!(!covers, "site {s:?} covers the forest cell");
        }
        assert_eq!(sites.len(), 16 - 4);
    }

    #[test]
    fn oversized_building_has_no_sites() {
        let t = Grid::new(3, 3, 0.1f32);
        assert!(find_building_sites(&t, 4, FOREST).is_empty());
    }

    #[test]
    fn selection_respects_exclusion() {
        let t = Grid::new(40, 40, 0.1f32);
        let sites = find_building_sites(&t, 3, FOREST);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let placed = select_buildings(sites, 3, 20, &mut rng);
        assert!(!placed.is_empty());
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(a.clears(b.anchor), "{a:?} and {b:?} overlap");
            }
        }
    }

    #[test]
    fn selection_stops_when_candidates_run_out() {
        let t = Grid::new(4, 4, 0.1f32);
        let sites = find_building_sites(&t, 3, FOREST);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let placed = select_buildings(sites, 3, 5, &mut rng);
        assert_eq!(placed.len(), 1);
    }

    #[test]
    fn selection_is_seed_deterministic() {
        let t = Grid::new(30, 30, 0.1f32);
        let sites = find_building_sites(&t, 2, FOREST);
        let a = select_buildings(sites.clone(), 2, 6, &mut ChaCha8Rng::seed_from_u64(4));
        let b = select_buildings(sites, 2, 6, &mut ChaCha8Rng::seed_from_u64(4));
        assert_eq!(a, b);
    }

    #[test]
    fn paint_marks_whole_footprint() {
        let mut labels = Grid::new(5, 5, Label::Unclassified);
        paint_buildings(&mut labels, &[Building::new(Cell::new(1, 2), 2)]);
        let painted: Vec<Cell> = labels
            .cells()
            .filter(|&c| labels.get_cell(c) == Some(&Label::Building))
            .collect();
        assert_eq!(painted, vec![Cell::new(1, 2), Cell::new(2, 2), Cell::new(1, 3), Cell::new(2, 3)]);
    }
}
