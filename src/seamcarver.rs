// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SeamCarver - resize to a target
//!
//! Drives a `SeamImage` to a requested width and height, a batch of
//! seams at a time.  While both dimensions are too large the carver
//! alternates between them so the content is squeezed evenly; after
//! that each remaining dimension is finished on its own, carving or
//! adding as needed.

use crate::axis::{Axis, Direction};
use crate::error::{CarveError, Result};
use crate::seamimage::SeamImage;
use tracing::debug;

pub struct SeamCarver<'a> {
    image: &'a mut SeamImage,
    batch: u32,
    paint_seams: bool,
}

impl<'a> SeamCarver<'a> {
    pub fn new(image: &'a mut SeamImage, batch: u32) -> Self {
        SeamCarver {
            image,
            batch: batch.max(1),
            paint_seams: false,
        }
    }

    /// Ask for every batch to be highlighted before it is cut.
    pub fn paint_seams(mut self, paint_seams: bool) -> Self {
        self.paint_seams = paint_seams;
        self
    }

    /// Carve or grow the image until it is `newwidth` × `newheight`.
    pub fn resize(&mut self, newwidth: u32, newheight: u32) -> Result<()> {
        if newwidth == 0 || newheight == 0 {
            return Err(CarveError::dimension(newwidth, newheight, "cannot resize to nothing"));
        }
        let target = (newwidth, newheight);
        let mut axis = Axis::Vertical;

        while self.surplus(Axis::Vertical, target) > 0 && self.surplus(Axis::Horizontal, target) > 0 {
            self.step(axis, target)?;
            axis = axis.turn();
        }
        for &axis in &[Axis::Vertical, Axis::Horizontal] {
            while self.surplus(axis, target) != 0 {
                self.step(axis, target)?;
            }
        }
        Ok(())
    }

    // How many pixels the across extent of `axis` is over (positive) or
    // under (negative) the target.
    fn surplus(&self, axis: Axis, (newwidth, newheight): (u32, u32)) -> i64 {
        let (width, height) = self.image.size();
        axis.across(width, height) as i64 - axis.across(newwidth, newheight) as i64
    }

    fn step(&mut self, axis: Axis, target: (u32, u32)) -> Result<()> {
        let surplus = self.surplus(axis, target);
        let count = surplus.unsigned_abs().min(self.batch as u64) as u32;
        let before = self.image.size();
        if surplus > 0 {
            self.image.carve(Direction::from(axis), self.paint_seams, count)?;
        } else {
            self.image.add(Direction::from(axis), self.paint_seams, count)?;
        }
        let (width, height) = self.image.size();
        debug!(?axis, count, width, height, "resize step");
        if (width, height) == before {
            return Err(CarveError::dimension(
                width,
                height,
                format!("stuck resizing toward {}x{}", target.0, target.1),
            ));
        }
        Ok(())
    }
}
