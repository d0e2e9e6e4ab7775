// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Which seam owns which pixel.
//!
//! Seams are found one at a time, cheapest first, and each claims its
//! pixels as it goes so that no later seam can cross it.  The rank
//! recorded here is what the surgeon uses to decide what to cut: every
//! pixel with a rank below the requested limit goes.

use crate::axis::{Action, Axis};
use crate::cq;
use crate::error::Result;
use crate::twodmap::TwoDimensionalMap;
use itertools::iproduct;

/// The rank of a pixel no seam has claimed.
pub const UNASSIGNED: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexMap {
    ranks: TwoDimensionalMap<u32>,
}

impl IndexMap {
    pub fn try_new(width: u32, height: u32) -> Result<Self> {
        Ok(IndexMap {
            ranks: TwoDimensionalMap::try_filled(width, height, UNASSIGNED)?,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.ranks.dimensions()
    }

    pub fn rank(&self, x: u32, y: u32) -> Option<u32> {
        let rank = self.ranks[(x, y)];
        cq!(rank == UNASSIGNED, None, Some(rank))
    }

    /// The raw rank, `UNASSIGNED` included.  Since `UNASSIGNED` is the
    /// largest possible rank, `raw(p) < limit` is exactly "p belongs
    /// to one of the first `limit` seams".
    #[inline]
    pub fn raw(&self, point: (u32, u32)) -> u32 {
        self.ranks[point]
    }

    #[inline]
    pub fn is_claimed(&self, point: (u32, u32)) -> bool {
        self.ranks[point] != UNASSIGNED
    }

    pub(crate) fn claim(&mut self, point: (u32, u32), rank: u32) {
        debug_assert!(!self.is_claimed(point), "{:?} claimed twice", point);
        self.ranks[point] = rank;
    }

    /// Every pixel claimed by the seam of the given rank, in row order.
    pub fn claimed_by(&self, rank: u32) -> Vec<(u32, u32)> {
        let (width, height) = self.ranks.dimensions();
        iproduct!(0..height, 0..width)
            .map(|(y, x)| (x, y))
            .filter(|&point| self.ranks[point] == rank)
            .collect()
    }

    /// The pixels of seams `first..limit`, in the coordinates of the
    /// image as it stands after the first `first` seams have already
    /// been removed (or duplicated, for `Action::Enlarge`).
    pub fn seam_pixels(&self, axis: Axis, first: u32, limit: u32, action: Action) -> Vec<(u32, u32)> {
        let (width, height) = self.ranks.dimensions();
        let shift_by: i64 = cq!(action == Action::Enlarge, 1, -1);
        let mut points = Vec::new();
        for along in 0..axis.along(width, height) {
            let mut shift = 0i64;
            for across in 0..axis.across(width, height) {
                let rank = self.ranks[axis.point(across, along)];
                if rank < first {
                    shift += shift_by;
                } else if rank < limit {
                    points.push(axis.point((across as i64 + shift) as u32, along));
                }
            }
        }
        points
    }
}
