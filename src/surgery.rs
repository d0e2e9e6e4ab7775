// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Removing and adding seams
//!
//! The surgeon never edits an image in place.  It reads the base image
//! and the index map and writes a new buffer, one lane per row of
//! output, skipping every pixel whose seam rank is below the limit (to
//! carve) or writing it twice (to add).  A duplicated pixel is followed
//! by the average of itself and its forward neighbor, so added seams
//! blend into their surroundings.
//!
//! Horizontal lanes are columns, so for those the base is read through
//! a `Flipper` and the lanes are written as rows of a transposed
//! buffer, which is then flipped back.

use crate::axis::{Action, Axis};
use crate::energy::{EnergyGrid, DIRTY_ENERGY};
use crate::error::{CarveError, Result};
use crate::flipper::Flipper;
use crate::indexmap::IndexMap;
use crate::parallel;
use image::{GenericImageView, ImageBuffer, Pixel, Primitive};
use num_traits::{NumCast, Zero};

/// A new image without the first `limit` seams of `index`.
pub fn remove_seams<P, S>(
    image: &ImageBuffer<P, Vec<S>>,
    index: &IndexMap,
    axis: Axis,
    limit: u32,
) -> Result<ImageBuffer<P, Vec<S>>>
where
    P: Pixel<Subpixel = S> + Send + Sync + 'static,
    S: Primitive + Send + Sync + 'static,
{
    resize_lanes(image, index, axis, limit, Action::Shrink)
}

/// A new image with the first `limit` seams of `index` doubled.
pub fn add_seams<P, S>(
    image: &ImageBuffer<P, Vec<S>>,
    index: &IndexMap,
    axis: Axis,
    limit: u32,
) -> Result<ImageBuffer<P, Vec<S>>>
where
    P: Pixel<Subpixel = S> + Send + Sync + 'static,
    S: Primitive + Send + Sync + 'static,
{
    resize_lanes(image, index, axis, limit, Action::Enlarge)
}

/// Mark the energy of every pixel of the first `limit` seams as dirty,
/// so the next local recompute knows where the image changed.
pub fn mark_dirty(energy: &mut EnergyGrid, index: &IndexMap, limit: u32) {
    assert_eq!(
        energy.dimensions(),
        index.dimensions(),
        "energy grid and index map disagree"
    );
    let width = energy.width();
    parallel::for_each_row(energy.as_mut_slice(), width as usize, |y, row| {
        for (x, cell) in row.iter_mut().enumerate() {
            if index.raw((x as u32, y as u32)) < limit {
                *cell = DIRTY_ENERGY;
            }
        }
    });
}

fn resize_lanes<P, S>(
    image: &ImageBuffer<P, Vec<S>>,
    index: &IndexMap,
    axis: Axis,
    limit: u32,
    action: Action,
) -> Result<ImageBuffer<P, Vec<S>>>
where
    P: Pixel<Subpixel = S> + Send + Sync + 'static,
    S: Primitive + Send + Sync + 'static,
{
    let (width, height) = image.dimensions();
    if index.dimensions() != (width, height) {
        return Err(CarveError::dimension(width, height, "index map is a different size"));
    }
    let old_across = axis.across(width, height);
    let across = match action {
        Action::Enlarge => old_across
            .checked_add(limit)
            .ok_or_else(|| CarveError::dimension(width, height, "too many seams to add"))?,
        _ if limit < old_across => old_across - limit,
        _ => {
            return Err(CarveError::dimension(
                width,
                height,
                format!("cannot carve {} seams", limit),
            ))
        }
    };

    match axis {
        Axis::Vertical => fill_lanes(image, index, axis, limit, action, across),
        Axis::Horizontal => {
            let lanes = fill_lanes(&Flipper::new(image), index, axis, limit, action, across)?;
            materialize(&Flipper::new(&lanes))
        }
    }
}

// Write each lane of `view` (its rows) into a new buffer `across`
// pixels wide.
fn fill_lanes<I, P, S>(
    view: &I,
    index: &IndexMap,
    axis: Axis,
    limit: u32,
    action: Action,
    across: u32,
) -> Result<ImageBuffer<P, Vec<S>>>
where
    I: GenericImageView<Pixel = P> + Sync,
    P: Pixel<Subpixel = S> + Send + Sync + 'static,
    S: Primitive + Send + Sync + 'static,
{
    let (old_across, lanes) = view.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let mut buffer = allocate::<S>(across, lanes, channels)?;
    parallel::for_each_row(&mut buffer, across as usize * channels, |lane, out| {
        let lane = lane as u32;
        let mut at = 0;
        for pos in 0..old_across {
            let pixel = view.get_pixel(pos, lane);
            let cut = index.raw(axis.point(pos, lane)) < limit;
            if cut && action == Action::Shrink {
                continue;
            }
            put(out, at, channels, &pixel);
            at += 1;
            if cut {
                let duplicate = if pos + 1 < old_across {
                    pixel.map2(&view.get_pixel(pos + 1, lane), average)
                } else {
                    pixel
                };
                put(out, at, channels, &duplicate);
                at += 1;
            }
        }
        assert_eq!(at, across as usize, "lane {} has the wrong number of seam pixels", lane);
    });
    ImageBuffer::from_raw(across, lanes, buffer)
        .ok_or_else(|| CarveError::dimension(across, lanes, "lane buffer"))
}

/// Copy any view into a freshly allocated buffer, row by row.
pub fn materialize<I, P, S>(view: &I) -> Result<ImageBuffer<P, Vec<S>>>
where
    I: GenericImageView<Pixel = P> + Sync,
    P: Pixel<Subpixel = S> + Send + Sync + 'static,
    S: Primitive + Send + Sync + 'static,
{
    let (width, height) = view.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let mut buffer = allocate::<S>(width, height, channels)?;
    parallel::for_each_row(&mut buffer, width as usize * channels, |y, out| {
        for x in 0..width {
            put(out, x as usize, channels, &view.get_pixel(x, y as u32));
        }
    });
    ImageBuffer::from_raw(width, height, buffer)
        .ok_or_else(|| CarveError::dimension(width, height, "image buffer"))
}

fn allocate<S: Primitive>(width: u32, height: u32, channels: usize) -> Result<Vec<S>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(channels))
        .ok_or(CarveError::Allocation { width, height })?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| CarveError::Allocation { width, height })?;
    buffer.resize(len, S::zero());
    Ok(buffer)
}

#[inline]
fn put<P: Pixel>(out: &mut [P::Subpixel], at: usize, channels: usize, pixel: &P) {
    out[at * channels..(at + 1) * channels].copy_from_slice(pixel.channels());
}

// The midpoint of two channel values, rounded toward zero for integer
// channels.
fn average<S: Primitive>(a: S, b: S) -> S {
    let (fa, fb): (f64, f64) = match (NumCast::from(a), NumCast::from(b)) {
        (Some(fa), Some(fb)) => (fa, fb),
        _ => return a,
    };
    NumCast::from((fa + fb) / 2.0).unwrap_or(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gray(values: &[u8], width: u32) -> RgbImage {
        let height = values.len() as u32 / width;
        RgbImage::from_fn(width, height, |x, y| {
            let v = values[(y * width + x) as usize];
            Rgb([v, v, v])
        })
    }

    fn values(image: &RgbImage) -> Vec<u8> {
        image.pixels().map(|p| p.0[0]).collect()
    }

    #[test]
    fn removes_marked_pixels_from_each_row() {
        let image = gray(&[1, 2, 3, 4, 5, 6, 7, 8], 4);
        let mut index = IndexMap::try_new(4, 2).unwrap();
        index.claim((1, 0), 0);
        index.claim((2, 1), 0);
        let carved = remove_seams(&image, &index, Axis::Vertical, 1).unwrap();
        assert_eq!(carved.dimensions(), (3, 2));
        assert_eq!(values(&carved), vec![1, 3, 4, 5, 6, 8]);
    }

    #[test]
    fn removes_marked_pixels_from_each_column() {
        let image = gray(&[1, 2, 3, 4, 5, 6], 2);
        let mut index = IndexMap::try_new(2, 3).unwrap();
        index.claim((0, 1), 0);
        index.claim((1, 0), 0);
        let carved = remove_seams(&image, &index, Axis::Horizontal, 1).unwrap();
        assert_eq!(carved.dimensions(), (2, 2));
        assert_eq!(values(&carved), vec![1, 4, 5, 6]);
    }

    #[test]
    fn limit_selects_the_cheapest_seams() {
        let image = gray(&[1, 2, 3], 3);
        let mut index = IndexMap::try_new(3, 1).unwrap();
        index.claim((0, 0), 1);
        index.claim((2, 0), 0);
        let carved = remove_seams(&image, &index, Axis::Vertical, 1).unwrap();
        assert_eq!(values(&carved), vec![1, 2]);
        let carved = remove_seams(&image, &index, Axis::Vertical, 2).unwrap();
        assert_eq!(values(&carved), vec![2]);
    }

    #[test]
    fn added_pixels_average_their_neighbor() {
        let image = gray(&[10, 21, 30], 3);
        let mut index = IndexMap::try_new(3, 1).unwrap();
        index.claim((0, 0), 0);
        let grown = add_seams(&image, &index, Axis::Vertical, 1).unwrap();
        assert_eq!(values(&grown), vec![10, 15, 21, 30]);
    }

    #[test]
    fn added_pixels_at_the_border_copy() {
        let image = gray(&[10, 20, 30], 1);
        let mut index = IndexMap::try_new(1, 3).unwrap();
        index.claim((0, 2), 0);
        let grown = add_seams(&image, &index, Axis::Horizontal, 1).unwrap();
        assert_eq!(grown.dimensions(), (1, 4));
        assert_eq!(values(&grown), vec![10, 20, 30, 30]);
    }

    #[test]
    fn refuses_to_carve_everything() {
        let image = gray(&[1, 2], 2);
        let mut index = IndexMap::try_new(2, 1).unwrap();
        index.claim((0, 0), 0);
        index.claim((1, 0), 1);
        assert!(remove_seams(&image, &index, Axis::Vertical, 2).is_err());
    }

    #[test]
    fn dirty_marks_follow_the_limit() {
        let mut energy = EnergyGrid::from_vec(3, 1, vec![5, 6, 7]).unwrap();
        let mut index = IndexMap::try_new(3, 1).unwrap();
        index.claim((0, 0), 1);
        index.claim((1, 0), 0);
        mark_dirty(&mut energy, &index, 1);
        assert_eq!(energy.as_slice(), &[5, DIRTY_ENERGY, 7]);
    }
}
