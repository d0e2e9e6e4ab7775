// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A seam: one pixel per lane, each within reach of the last.
//!
//! The path is stored in the coordinates of the image the seam was
//! found in.  The cheapest seam moves at most one pixel sideways per
//! lane.  Later seams may appear to jump further, but only over pixels
//! that cheaper seams already own; once those are cut away the seam is
//! connected again.

use crate::axis::Axis;
use std::cmp::Ordering;

/// One move of a seam from one lane to the next, in terms of its
/// across coordinate: `Left` is toward zero, `Right` away from it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    Left,
    Straight,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Seam {
    axis: Axis,
    cost: i64,
    path: Vec<u32>,
}

impl Seam {
    /// `path[lane]` is the across coordinate of the seam in that lane.
    pub fn new(axis: Axis, cost: i64, path: Vec<u32>) -> Self {
        Seam { axis, cost, path }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The across coordinate in the first lane.
    pub fn start(&self) -> u32 {
        self.path.first().cloned().unwrap_or(0)
    }

    /// Cumulative energy at the seam's far end.
    pub fn cost(&self) -> i64 {
        self.cost
    }

    pub fn path(&self) -> &[u32] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// The move into each lane.  The first lane has no predecessor and
    /// always reads `Straight`.
    pub fn steps(&self) -> Vec<Step> {
        let first = self.path.first().map(|_| Step::Straight);
        first
            .into_iter()
            .chain(self.path.windows(2).map(|pair| match pair[1].cmp(&pair[0]) {
                Ordering::Less => Step::Left,
                Ordering::Equal => Step::Straight,
                Ordering::Greater => Step::Right,
            }))
            .collect()
    }

    /// The (x, y) of every pixel of the seam, first lane first.
    pub fn points(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let axis = self.axis;
        self.path
            .iter()
            .enumerate()
            .map(move |(along, &across)| axis.point(across, along as u32))
    }
}
