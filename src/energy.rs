// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image
//!
//! The energy grid holds one value per pixel: the filter's edge
//! magnitude, unless the user has painted over the pixel, in which case
//! it holds one of the two extremes.  After seams are carved out of (or
//! added into) the image, the surgeon marks the affected cells with
//! `DIRTY_ENERGY`, and the next local recompute rebuilds the grid at
//! the new size, running the filter only on the cells whose
//! neighborhoods were disturbed.

use crate::axis::Axis;
use crate::error::{CarveError, Result};
use crate::filters::{luma_plane, EnergyFilter, FilterKind, LumaPlane};
use crate::parallel;
use crate::twodmap::TwoDimensionalMap;
use image::{GenericImageView, GrayImage, ImageBuffer, Pixel, Primitive};
use tracing::debug;

pub type EnergyGrid = TwoDimensionalMap<i32>;

/// Painted "keep this" energy, and the upper bound on every cell.
pub const MAX_ENERGY: i32 = 10_000;

/// Painted "remove this" energy, and the lower bound on every cell.
pub const MIN_ENERGY: i32 = -10_000;

/// Written by the surgeon into cells whose pixels were removed or
/// duplicated.  No filter or stroke can produce it.
pub const DIRTY_ENERGY: i32 = -1;

#[inline]
pub fn clamp_energy(value: i32) -> i32 {
    value.max(MIN_ENERGY).min(MAX_ENERGY)
}

#[inline]
pub fn is_painted(value: i32) -> bool {
    value == MAX_ENERGY || value == MIN_ENERGY
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Priority {
    /// Seams steer around these pixels.
    Keep,
    /// Seams are drawn through these pixels.
    Remove,
}

impl Priority {
    pub fn energy(self) -> i32 {
        match self {
            Priority::Keep => MAX_ENERGY,
            Priority::Remove => MIN_ENERGY,
        }
    }
}

/// A set of pixels the user has painted, all with the same priority.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyStroke {
    pub points: Vec<(u32, u32)>,
    pub priority: Priority,
}

impl EnergyStroke {
    pub fn new(points: Vec<(u32, u32)>, priority: Priority) -> Self {
        EnergyStroke { points, priority }
    }

    /// Every pixel of the width × height block at (x, y).
    pub fn rectangle(x: u32, y: u32, width: u32, height: u32, priority: Priority) -> Self {
        let points = (y..y.saturating_add(height))
            .flat_map(|py| (x..x.saturating_add(width)).map(move |px| (px, py)))
            .collect();
        EnergyStroke { points, priority }
    }
}

// Intermediate cell for the local recompute: the value carried over
// from the old grid, and whether the filter has to be rerun here.
#[derive(Debug, Default, Copy, Clone)]
struct Carried {
    energy: i32,
    touched: bool,
}

/// Owns the active filter and the energy grid it produced.
pub struct EnergyFunction {
    filter: Box<dyn EnergyFilter>,
    grid: EnergyGrid,
}

impl EnergyFunction {
    pub fn new(kind: FilterKind) -> Self {
        EnergyFunction {
            filter: kind.filter(),
            grid: EnergyGrid::default(),
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.filter.kind()
    }

    /// Swap the filter.  The grid is left as it is; the caller decides
    /// when to recompute.
    pub fn set_filter(&mut self, kind: FilterKind) {
        self.filter = kind.filter();
    }

    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut EnergyGrid {
        &mut self.grid
    }

    pub fn energy(&self, x: u32, y: u32) -> i32 {
        self.grid[(x, y)]
    }

    /// Recompute every cell of the grid from scratch.  Any painted
    /// overlay is lost; reapply it with `apply_overlay`.
    pub fn compute_energy<I, P, S>(&mut self, image: &I) -> Result<()>
    where
        I: GenericImageView<Pixel = P> + Sync,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        let luma = luma_plane(image)?;
        let (width, height) = luma.dimensions();
        let mut grid = EnergyGrid::try_filled(width, height, 0)?;
        let filter = &*self.filter;
        parallel::for_each_row(grid.as_mut_slice(), width as usize, |y, row| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = clamp_energy(filter.pixel_energy(&luma, x as u32, y as u32));
            }
        });
        debug!(width, height, filter = %self.filter.kind(), "computed full energy");
        self.grid = grid;
        Ok(())
    }

    /// Paint the strokes into the grid.  Points outside the grid are
    /// skipped.  Returns the number of cells painted.
    pub fn apply_overlay(&mut self, strokes: &[EnergyStroke]) -> usize {
        let (width, height) = self.grid.dimensions();
        let mut painted = 0;
        for stroke in strokes {
            let value = stroke.priority.energy();
            for &(x, y) in stroke.points.iter().filter(|&&(x, y)| x < width && y < height) {
                self.grid[(x, y)] = value;
                painted += 1;
            }
        }
        painted
    }

    /// Bring a grid that still has the pre-surgery dimensions, with
    /// dirty cells marking the seams, up to date with `image`.
    pub fn compute_local_energy<I, P, S>(&mut self, image: &I, axis: Axis) -> Result<()>
    where
        I: GenericImageView<Pixel = P> + Sync,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        self.grid = self.localized(image, axis)?;
        Ok(())
    }

    /// The result of `compute_local_energy`, without replacing the
    /// grid.
    ///
    /// Each lane of the old grid is walked in order.  A dirty cell is
    /// dropped when the image shrank, and becomes two cells (the
    /// original pixel and its duplicate) when it grew.  Whole runs of
    /// dirty cells are walked past the same way.  The last cell before
    /// a run and the first cell after it are rerun through the filter,
    /// as are the cells at the same position in the neighboring lanes,
    /// since the 3×3 filters see diagonally.  Painted cells keep their
    /// paint unless their own pixel was dirty.
    pub fn localized<I, P, S>(&self, image: &I, axis: Axis) -> Result<EnergyGrid>
    where
        I: GenericImageView<Pixel = P> + Sync,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        let (old_width, old_height) = self.grid.dimensions();
        let (width, height) = image.dimensions();
        let lanes = axis.along(width, height);
        if axis.along(old_width, old_height) != lanes {
            return Err(CarveError::dimension(
                width,
                height,
                format!(
                    "cannot patch a {}x{} energy grid along {:?}",
                    old_width, old_height, axis
                ),
            ));
        }
        let old_across = axis.across(old_width, old_height);
        let across = axis.across(width, height);
        let grow = across > old_across;

        let mut carried = TwoDimensionalMap::<Carried>::try_filled(across, lanes, Carried::default())?;
        let old = &self.grid;
        parallel::for_each_row(carried.as_mut_slice(), across as usize, |lane, out| {
            let cells = (0..old_across).map(|pos| old[axis.point(pos, lane as u32)]);
            carry_lane(cells, grow, out);
        });

        let luma = luma_plane(image)?;
        let mut grid = EnergyGrid::try_filled(width, height, 0)?;
        let filter = &*self.filter;
        let carried = &carried;
        parallel::for_each_row(grid.as_mut_slice(), width as usize, |y, row| {
            for (x, cell) in row.iter_mut().enumerate() {
                let (pos, lane) = axis.split(x as u32, y as u32);
                let here = carried[(pos, lane)];
                let touched = here.touched
                    || (lane > 0 && carried[(pos, lane - 1)].touched)
                    || (lane + 1 < lanes && carried[(pos, lane + 1)].touched);
                *cell = if here.energy == DIRTY_ENERGY || (touched && !is_painted(here.energy)) {
                    rerun(filter, &luma, x as u32, y as u32)
                } else {
                    here.energy
                };
            }
        });
        debug!(width, height, ?axis, "patched energy locally");
        Ok(grid)
    }
}

fn rerun(filter: &dyn EnergyFilter, luma: &LumaPlane, x: u32, y: u32) -> i32 {
    clamp_energy(filter.pixel_energy(luma, x, y))
}

// Lay one old lane out at its new length.
fn carry_lane<C: Iterator<Item = i32>>(cells: C, grow: bool, out: &mut [Carried]) {
    let dirty = Carried {
        energy: DIRTY_ENERGY,
        touched: true,
    };
    let mut at = 0;
    let mut after_run = false;
    for energy in cells {
        if energy == DIRTY_ENERGY {
            if at > 0 && !after_run {
                out[at - 1].touched = true;
            }
            if grow {
                out[at] = dirty;
                out[at + 1] = dirty;
                at += 2;
            }
            after_run = true;
            continue;
        }
        out[at] = Carried {
            energy,
            touched: after_run,
        };
        after_run = false;
        at += 1;
    }
    assert_eq!(at, out.len(), "dirty cells do not account for the resize");
}

/// Render an energy grid as grayscale.  Painted and dirty cells clamp
/// into the displayable range.
pub fn energy_to_image(grid: &EnergyGrid) -> Result<GrayImage> {
    let (width, height) = grid.dimensions();
    let mut pixels = TwoDimensionalMap::<u8>::try_filled(width, height, 0)?;
    for (out, &energy) in pixels.as_mut_slice().iter_mut().zip(grid.as_slice()) {
        *out = energy.max(0).min(254) as u8;
    }
    ImageBuffer::from_raw(width, height, pixels.into_vec())
        .ok_or_else(|| CarveError::dimension(width, height, "energy image buffer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    // Rows of solid color, so vertical seams never change the energy
    // of what is left behind.
    fn stripes(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| {
            let v = ((y * 37) % 256) as u8;
            Rgb([v, v / 2, 255 - v])
        })
    }

    fn columns(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            let v = ((x * 53) % 256) as u8;
            Rgb([v, 255 - v, v / 3])
        })
    }

    #[test]
    fn energy_stays_in_range() {
        let image = RgbImage::from_fn(9, 7, |x, y| Rgb([(x * 29) as u8, (y * 31) as u8, ((x ^ y) * 13) as u8]));
        for &kind in &[FilterKind::Sobel, FilterKind::Prewitt, FilterKind::Roberts] {
            let mut energy = EnergyFunction::new(kind);
            energy.compute_energy(&image).unwrap();
            assert_eq!(energy.grid().dimensions(), (9, 7));
            assert!(energy.grid().as_slice().iter().all(|&e| e >= 0 && e <= 255));
        }
    }

    #[test]
    fn overlay_paints_and_skips_out_of_bounds() {
        let mut energy = EnergyFunction::new(FilterKind::Sobel);
        energy.compute_energy(&stripes(4, 4)).unwrap();
        let strokes = vec![
            EnergyStroke::new(vec![(0, 0), (10, 10)], Priority::Keep),
            EnergyStroke::rectangle(2, 2, 5, 1, Priority::Remove),
        ];
        assert_eq!(energy.apply_overlay(&strokes), 3);
        assert_eq!(energy.energy(0, 0), MAX_ENERGY);
        assert_eq!(energy.energy(2, 2), MIN_ENERGY);
        assert_eq!(energy.energy(3, 2), MIN_ENERGY);
    }

    #[test]
    fn shrinking_lane_drops_dirty_runs() {
        let mut out = [Carried::default(); 3];
        carry_lane(vec![5, DIRTY_ENERGY, DIRTY_ENERGY, 7, 9].into_iter(), false, &mut out);
        assert_eq!(out[0].energy, 5);
        assert!(out[0].touched);
        assert_eq!(out[1].energy, 7);
        assert!(out[1].touched);
        assert_eq!(out[2].energy, 9);
        assert!(!out[2].touched);
    }

    #[test]
    fn growing_lane_doubles_dirty_cells() {
        let mut out = [Carried::default(); 4];
        carry_lane(vec![5, DIRTY_ENERGY, 7].into_iter(), true, &mut out);
        assert_eq!(out[0].energy, 5);
        assert!(out[0].touched);
        assert_eq!(out[1].energy, DIRTY_ENERGY);
        assert_eq!(out[2].energy, DIRTY_ENERGY);
        assert!(out[3].touched);
    }

    #[test]
    fn local_patch_matches_full_recompute_after_shrink() {
        let before = stripes(8, 6);
        let mut energy = EnergyFunction::new(FilterKind::Sobel);
        energy.compute_energy(&before).unwrap();
        // Knock one pixel out of every row, wandering diagonally.
        for y in 0..6 {
            energy.grid_mut()[(y + 1, y)] = DIRTY_ENERGY;
        }
        let after = stripes(7, 6);
        let patched = energy.localized(&after, Axis::Vertical).unwrap();
        let mut full = EnergyFunction::new(FilterKind::Sobel);
        full.compute_energy(&after).unwrap();
        assert_eq!(&patched, full.grid());
    }

    #[test]
    fn local_patch_matches_full_recompute_after_growth() {
        let before = columns(5, 6);
        let mut energy = EnergyFunction::new(FilterKind::Prewitt);
        energy.compute_energy(&before).unwrap();
        // Horizontal seams: one dirty cell in each column.
        for x in 0..5 {
            energy.grid_mut()[(x, 2)] = DIRTY_ENERGY;
        }
        let after = columns(5, 7);
        energy.compute_local_energy(&after, Axis::Horizontal).unwrap();
        let mut full = EnergyFunction::new(FilterKind::Prewitt);
        full.compute_energy(&after).unwrap();
        assert_eq!(energy.grid(), full.grid());
    }

    #[test]
    fn painted_cells_survive_a_patch() {
        let before = stripes(6, 3);
        let mut energy = EnergyFunction::new(FilterKind::Sobel);
        energy.compute_energy(&before).unwrap();
        energy.apply_overlay(&[EnergyStroke::new(vec![(3, 1)], Priority::Keep)]);
        energy.grid_mut()[(2, 0)] = DIRTY_ENERGY;
        energy.grid_mut()[(2, 1)] = DIRTY_ENERGY;
        energy.grid_mut()[(2, 2)] = DIRTY_ENERGY;
        energy.compute_local_energy(&stripes(5, 3), Axis::Vertical).unwrap();
        assert_eq!(energy.energy(2, 1), MAX_ENERGY);
    }

    #[test]
    fn mismatched_lanes_are_refused() {
        let mut energy = EnergyFunction::new(FilterKind::Sobel);
        energy.compute_energy(&stripes(4, 4)).unwrap();
        assert!(energy.localized(&stripes(4, 5), Axis::Vertical).is_err());
    }

    #[test]
    fn renders_clamped_grayscale() {
        let grid = EnergyGrid::from_vec(3, 1, vec![MIN_ENERGY, 100, MAX_ENERGY]).unwrap();
        let image = energy_to_image(&grid).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0]);
        assert_eq!(image.get_pixel(1, 0).0, [100]);
        assert_eq!(image.get_pixel(2, 0).0, [254]);
    }
}
