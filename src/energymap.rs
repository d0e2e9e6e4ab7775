// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cumulative energy and seam extraction
//!
//! For each axis, a forward dynamic-programming pass records at each
//! pixel the cheapest total energy of any connected path from the
//! origin edge to that pixel.  Those totals along the far edge are the
//! costs of the candidate seams; sorting them gives the seams in order
//! of preference.  Walking back from the k-th endpoint, while stepping
//! around pixels already claimed by cheaper seams, recovers the k-th
//! seam.
//!
//! Both the forward pass and the walk back use the same three-way
//! choice, `choose`, so a seam always follows the path the totals were
//! built from, until it has to detour around a claimed pixel.

use crate::axis::Axis;
use crate::cq;
use crate::energy::EnergyGrid;
use crate::error::Result;
use crate::indexmap::IndexMap;
use crate::parallel;
use crate::seam::Seam;
use crate::twodmap::TwoDimensionalMap;
use itertools::Itertools;
use tracing::debug;

/// The cost of a predecessor that does not exist.
pub const INFINITE_COST: i64 = i64::MAX;

/// Which of the three predecessors a cell extends: the one at a lower
/// across coordinate, the one straight behind, or the one at a higher
/// across coordinate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Choice {
    Lesser,
    Straight,
    Greater,
}

/// The tie-break.  A challenger must be strictly cheaper to win, so on
/// equal costs straight beats both sides, and the lesser side beats
/// the greater.
pub fn choose(lesser: i64, straight: i64, greater: i64) -> Choice {
    if lesser < straight {
        cq!(greater < lesser, Choice::Greater, Choice::Lesser)
    } else {
        cq!(greater < straight, Choice::Greater, Choice::Straight)
    }
}

/// A candidate seam's far-edge cell and its total cost.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub across: u32,
    pub cost: i64,
}

#[derive(Debug, Default)]
struct Sweep {
    costs: TwoDimensionalMap<i64>,
    endpoints: Vec<Endpoint>,
    fresh: bool,
}

impl Sweep {
    fn compute(axis: Axis, energy: &EnergyGrid) -> Result<Self> {
        let (width, height) = energy.dimensions();
        let along_len = axis.along(width, height);
        let across_len = axis.across(width, height);
        let mut costs = TwoDimensionalMap::try_filled(width, height, 0i64)?;
        if along_len == 0 || across_len == 0 {
            return Ok(Sweep {
                costs,
                endpoints: Vec::new(),
                fresh: true,
            });
        }

        for across in 0..across_len {
            let point = axis.point(across, 0);
            costs[point] = energy[point] as i64;
        }

        for along in 1..along_len {
            for across in 0..across_len {
                let lesser = behind(&costs, axis, across as i64 - 1, along, across_len);
                let straight = behind(&costs, axis, across as i64, along, across_len);
                let greater = behind(&costs, axis, across as i64 + 1, along, across_len);
                let best = match choose(lesser, straight, greater) {
                    Choice::Lesser => lesser,
                    Choice::Straight => straight,
                    Choice::Greater => greater,
                };
                let point = axis.point(across, along);
                costs[point] = (energy[point] as i64).saturating_add(best);
            }
        }

        let endpoints = (0..across_len)
            .map(|across| Endpoint {
                across,
                cost: costs[axis.point(across, along_len - 1)],
            })
            .sorted_by_key(|endpoint| (endpoint.cost, endpoint.across))
            .collect();

        Ok(Sweep {
            costs,
            endpoints,
            fresh: true,
        })
    }
}

// The cost in the previous lane at `across`, or infinity off the edge.
#[inline]
fn behind(costs: &TwoDimensionalMap<i64>, axis: Axis, across: i64, along: u32, across_len: u32) -> i64 {
    if across < 0 || across >= across_len as i64 {
        INFINITE_COST
    } else {
        costs[axis.point(across as u32, along - 1)]
    }
}

/// The first unclaimed cell in `behind` lane, in the order given, with
/// its cumulative cost.
fn open_cell<R>(costs: &TwoDimensionalMap<i64>, index: &IndexMap, axis: Axis, mut candidates: R, behind: u32) -> Option<(u32, i64)>
where
    R: Iterator<Item = u32>,
{
    candidates
        .find(|&across| !index.is_claimed(axis.point(across, behind)))
        .map(|across| (across, costs[axis.point(across, behind)]))
}

/// The vertical and horizontal cumulative maps of one energy grid.
#[derive(Debug, Default)]
pub struct CumulativeEnergyMap {
    vertical: Sweep,
    horizontal: Sweep,
}

impl CumulativeEnergyMap {
    pub fn new() -> Self {
        CumulativeEnergyMap::default()
    }

    fn sweep(&self, axis: Axis) -> &Sweep {
        match axis {
            Axis::Vertical => &self.vertical,
            Axis::Horizontal => &self.horizontal,
        }
    }

    fn sweep_mut(&mut self, axis: Axis) -> &mut Sweep {
        match axis {
            Axis::Vertical => &mut self.vertical,
            Axis::Horizontal => &mut self.horizontal,
        }
    }

    /// True when the map for `axis` was built from the current energy.
    pub fn is_fresh(&self, axis: Axis) -> bool {
        self.sweep(axis).fresh
    }

    pub fn invalidate(&mut self) {
        self.vertical.fresh = false;
        self.horizontal.fresh = false;
    }

    pub fn dimensions(&self, axis: Axis) -> (u32, u32) {
        self.sweep(axis).costs.dimensions()
    }

    pub fn compute_entire_energy_map(&mut self, axis: Axis, energy: &EnergyGrid) -> Result<()> {
        *self.sweep_mut(axis) = Sweep::compute(axis, energy)?;
        debug!(?axis, "computed cumulative energy");
        Ok(())
    }

    /// Both axes at once, on two threads when available.
    pub fn compute_both(&mut self, energy: &EnergyGrid) -> Result<()> {
        let (vertical, horizontal) = parallel::join(
            || Sweep::compute(Axis::Vertical, energy),
            || Sweep::compute(Axis::Horizontal, energy),
        );
        let (vertical, horizontal) = (vertical?, horizontal?);
        self.vertical = vertical;
        self.horizontal = horizontal;
        debug!("computed cumulative energy for both axes");
        Ok(())
    }

    pub fn cost(&self, axis: Axis, x: u32, y: u32) -> i64 {
        self.sweep(axis).costs[(x, y)]
    }

    /// The far-edge cells, cheapest first.  Equal costs keep their
    /// across order.
    pub fn endpoints(&self, axis: Axis) -> &[Endpoint] {
        &self.sweep(axis).endpoints
    }

    pub fn cheapest(&self, axis: Axis) -> Option<Endpoint> {
        self.sweep(axis).endpoints.first().cloned()
    }

    /// Recover the seam of rank `k`, marking its pixels in `index`.
    ///
    /// Seams of rank `0..k` must already be marked in `index`; their
    /// pixels are walked around, never through.  When every
    /// predecessor the tie-break would prefer is taken, the walk takes
    /// whichever open neighbor exists, cost notwithstanding.
    ///
    /// # Panics
    ///
    /// If `k` is not less than the number of endpoints.
    pub fn kth_lowest_energy_seam(&self, axis: Axis, k: u32, index: &mut IndexMap) -> Seam {
        let sweep = self.sweep(axis);
        assert!(
            (k as usize) < sweep.endpoints.len(),
            "seam {} requested from {} candidates",
            k,
            sweep.endpoints.len()
        );
        let (width, height) = sweep.costs.dimensions();
        let along_len = axis.along(width, height);
        let across_len = axis.across(width, height);

        let Endpoint { mut across, cost } = sweep.endpoints[k as usize];
        let mut path = vec![0; along_len as usize];
        path[along_len as usize - 1] = across;
        index.claim(axis.point(across, along_len - 1), k);

        for along in (1..along_len).rev() {
            let previous = along - 1;
            let straight = open_cell(&sweep.costs, index, axis, Some(across).into_iter(), previous);
            let lesser = open_cell(&sweep.costs, index, axis, (0..across).rev(), previous);
            let greater = open_cell(&sweep.costs, index, axis, across + 1..across_len, previous);

            let cost_of = |cell: Option<(u32, i64)>| cell.map_or(INFINITE_COST, |(_, cost)| cost);
            let preferred = match choose(cost_of(lesser), cost_of(straight), cost_of(greater)) {
                Choice::Lesser => lesser,
                Choice::Straight => straight,
                Choice::Greater => greater,
            };
            let (next, _) = match preferred.or(straight).or(lesser).or(greater) {
                Some(cell) => cell,
                None => unreachable!("seam {} found every cell of lane {} taken", k, previous),
            };

            index.claim(axis.point(next, previous), k);
            path[previous as usize] = next;
            across = next;
        }

        Seam::new(axis, cost, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const ENERGY_DATA: [i32; 20] = [
        9, 9, 0, 9, 9,
        9, 1, 9, 8, 9,
        9, 9, 9, 9, 0,
        9, 9, 9, 0, 9,
    ];

    fn grid(width: u32, height: u32, data: &[i32]) -> EnergyGrid {
        EnergyGrid::from_vec(width, height, data.to_vec()).unwrap()
    }

    use crate::seam::Step;

    #[test]
    fn tie_break_prefers_straight_then_lesser() {
        assert_eq!(choose(1, 1, 1), Choice::Straight);
        assert_eq!(choose(1, 2, 1), Choice::Lesser);
        assert_eq!(choose(2, 1, 1), Choice::Straight);
        assert_eq!(choose(1, 1, 0), Choice::Greater);
        assert_eq!(choose(0, 1, 2), Choice::Lesser);
        assert_eq!(choose(INFINITE_COST, 5, INFINITE_COST), Choice::Straight);
    }

    #[test]
    fn cheapest_vertical_seam() {
        let mut map = CumulativeEnergyMap::new();
        map.compute_entire_energy_map(Axis::Vertical, &grid(5, 4, &ENERGY_DATA)).unwrap();
        let mut index = IndexMap::try_new(5, 4).unwrap();
        let seam = map.kth_lowest_energy_seam(Axis::Vertical, 0, &mut index);
        assert_eq!(seam.path().to_vec(), vec![2, 3, 4, 3]);
        assert_eq!(seam.cost(), 8);
        assert_eq!(seam.start(), 2);
        assert_eq!(seam.steps(), vec![Step::Straight, Step::Right, Step::Right, Step::Left]);
        assert_eq!(index.claimed_by(0), seam.points().collect::<Vec<_>>());
    }

    #[test]
    fn cheapest_horizontal_seam() {
        let mut map = CumulativeEnergyMap::new();
        map.compute_entire_energy_map(Axis::Horizontal, &grid(5, 4, &ENERGY_DATA)).unwrap();
        let mut index = IndexMap::try_new(5, 4).unwrap();
        let seam = map.kth_lowest_energy_seam(Axis::Horizontal, 0, &mut index);
        assert_eq!(seam.path().to_vec(), vec![1, 1, 0, 1, 2]);
        assert_eq!(seam.cost(), 18);
    }

    #[test]
    fn endpoints_sort_by_cost_then_position() {
        let mut map = CumulativeEnergyMap::new();
        map.compute_entire_energy_map(Axis::Vertical, &grid(5, 4, &ENERGY_DATA)).unwrap();
        let order: Vec<_> = map.endpoints(Axis::Vertical).iter().map(|e| (e.across, e.cost)).collect();
        assert_eq!(order, vec![(3, 8), (4, 17), (0, 19), (1, 19), (2, 19)]);
    }

    #[test]
    fn costs_never_decrease_along_the_sweep() {
        let data: Vec<i32> = (0..42).map(|i| (i * 7919) % 31).collect();
        let energy = grid(7, 6, &data);
        let mut map = CumulativeEnergyMap::new();
        map.compute_both(&energy).unwrap();
        for &axis in &[Axis::Vertical, Axis::Horizontal] {
            for along in 1..axis.along(7, 6) {
                for across in 0..axis.across(7, 6) {
                    let (x, y) = axis.point(across, along);
                    let lo = across.saturating_sub(1);
                    let hi = (across + 1).min(axis.across(7, 6) - 1);
                    let best = (lo..=hi)
                        .map(|a| {
                            let (px, py) = axis.point(a, along - 1);
                            map.cost(axis, px, py)
                        })
                        .min()
                        .unwrap();
                    assert_eq!(map.cost(axis, x, y), best + energy[(x, y)] as i64);
                    assert!(map.cost(axis, x, y) >= best);
                }
            }
        }
    }

    #[test]
    fn cheap_corridor_is_found() {
        let mut data = vec![100; 25];
        for y in 0..5 {
            data[y * 5 + 2] = 0;
        }
        let mut map = CumulativeEnergyMap::new();
        map.compute_entire_energy_map(Axis::Vertical, &grid(5, 5, &data)).unwrap();
        let mut index = IndexMap::try_new(5, 5).unwrap();
        let seam = map.kth_lowest_energy_seam(Axis::Vertical, 0, &mut index);
        assert_eq!(seam.cost(), 0);
        assert_eq!(seam.start(), 2);
        assert!(seam.steps().iter().all(|&step| step == Step::Straight));
    }

    #[test]
    fn ranked_seams_are_disjoint() {
        let mut map = CumulativeEnergyMap::new();
        map.compute_entire_energy_map(Axis::Vertical, &grid(5, 4, &ENERGY_DATA)).unwrap();
        let mut index = IndexMap::try_new(5, 4).unwrap();
        let seams: Vec<_> = (0..5)
            .map(|k| map.kth_lowest_energy_seam(Axis::Vertical, k, &mut index))
            .collect();
        for (k, seam) in seams.iter().enumerate() {
            let points: Vec<_> = seam.points().collect();
            assert_eq!(points.len(), 4);
            assert_eq!(index.claimed_by(k as u32), points);
        }
        // Five seams through a five-wide image use every pixel once.
        for y in 0..4 {
            for x in 0..5 {
                assert!(index.rank(x, y).is_some());
            }
        }
    }

    #[test]
    fn later_seams_only_jump_over_earlier_ones() {
        let data: Vec<i32> = (0..80).map(|i| (i * 104_729) % 97).collect();
        let energy = grid(10, 8, &data);
        let mut map = CumulativeEnergyMap::new();
        map.compute_entire_energy_map(Axis::Vertical, &energy).unwrap();
        let mut index = IndexMap::try_new(10, 8).unwrap();
        for k in 0..9 {
            let seam = map.kth_lowest_energy_seam(Axis::Vertical, k, &mut index);
            for (along, pair) in seam.path().windows(2).enumerate() {
                let (lo, hi) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
                // Every cell strictly between the two positions, in the
                // earlier lane, belongs to a cheaper seam.
                for across in lo + 1..hi {
                    let rank = index.rank(across, along as u32).unwrap();
                    assert!(rank < k, "seam {} jumped over rank {}", k, rank);
                }
            }
        }
    }

    #[test]
    #[should_panic]
    fn rank_past_the_candidates_panics() {
        let mut map = CumulativeEnergyMap::new();
        map.compute_entire_energy_map(Axis::Vertical, &grid(5, 4, &ENERGY_DATA)).unwrap();
        let mut index = IndexMap::try_new(5, 4).unwrap();
        map.kth_lowest_energy_seam(Axis::Vertical, 5, &mut index);
    }
}
