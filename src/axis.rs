// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Which way a seam runs, and the coordinate bookkeeping that lets the
//! rest of the crate write every algorithm once.
//!
//! Each axis gets two names for its coordinates.  "Along" is the
//! direction the seam travels: y for a vertical seam, x for a
//! horizontal one.  "Across" is the direction it wanders in, and the
//! direction the image shrinks or grows when the seam is removed or
//! duplicated.  A "lane" is one along-position: a row for vertical
//! seams, a column for horizontal ones.

/// The orientation of a seam.  A vertical seam runs top to bottom and
/// removing it makes the image narrower.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn turn(self) -> Self {
        match self {
            Axis::Vertical => Axis::Horizontal,
            Axis::Horizontal => Axis::Vertical,
        }
    }

    /// Length of a seam: the number of lanes.
    pub fn along(self, width: u32, height: u32) -> u32 {
        match self {
            Axis::Vertical => height,
            Axis::Horizontal => width,
        }
    }

    /// Length of a lane: the number of candidate seam start points.
    pub fn across(self, width: u32, height: u32) -> u32 {
        match self {
            Axis::Vertical => width,
            Axis::Horizontal => height,
        }
    }

    /// (across, along) to (x, y).
    pub fn point(self, across: u32, along: u32) -> (u32, u32) {
        match self {
            Axis::Vertical => (across, along),
            Axis::Horizontal => (along, across),
        }
    }

    /// (x, y) to (across, along).
    pub fn split(self, x: u32, y: u32) -> (u32, u32) {
        match self {
            Axis::Vertical => (x, y),
            Axis::Horizontal => (y, x),
        }
    }

    /// The dimensions of an image after its across extent changes.
    pub fn resized(self, (width, height): (u32, u32), across: u32) -> (u32, u32) {
        match self {
            Axis::Vertical => (across, height),
            Axis::Horizontal => (width, across),
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Axis::Vertical => 0,
            Axis::Horizontal => 1,
        }
    }
}

/// What the caller asked for.  `Optimal` picks whichever axis has the
/// cheaper seam at the moment of the request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Vertical,
    Horizontal,
    Optimal,
}

impl From<Axis> for Direction {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Vertical => Direction::Vertical,
            Axis::Horizontal => Direction::Horizontal,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Shrink,
    Enlarge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_and_split_invert() {
        for &axis in &[Axis::Vertical, Axis::Horizontal] {
            let (x, y) = axis.point(3, 7);
            assert_eq!(axis.split(x, y), (3, 7));
        }
        assert_eq!(Axis::Horizontal.point(3, 7), (7, 3));
    }

    #[test]
    fn extents_follow_the_axis() {
        assert_eq!(Axis::Vertical.along(10, 4), 4);
        assert_eq!(Axis::Vertical.across(10, 4), 10);
        assert_eq!(Axis::Horizontal.along(10, 4), 10);
        assert_eq!(Axis::Horizontal.across(10, 4), 4);
        assert_eq!(Axis::Horizontal.resized((10, 4), 6), (10, 6));
        assert_eq!(Axis::Vertical.turn(), Axis::Horizontal);
    }
}
