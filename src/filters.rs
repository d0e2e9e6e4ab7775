// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the raw energy of a pixel
//!
//! Every filter here works on the luminance plane of the image, one
//! byte per pixel, and looks only at a small neighborhood around the
//! pixel in question.  Neighbors that would fall off the edge of the
//! image are replaced by the nearest edge pixel, as if the border had
//! been smeared outward.  Every filter reports a magnitude in [0, 255].

use crate::error::{CarveError, Result};
use crate::parallel;
use crate::twodmap::TwoDimensionalMap;
use image::{GenericImageView, Pixel, Primitive};
use num_traits::NumCast;
use std::fmt;
use std::str::FromStr;

/// One luminance byte per pixel.
pub type LumaPlane = TwoDimensionalMap<u8>;

/// The largest value any filter will report.
pub const MAX_FILTER_ENERGY: i32 = 255;

#[inline]
fn lumachannel<P, S>(p: &P) -> u8
where
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    let c = p.to_luma().channels()[0];
    NumCast::from(c).unwrap_or(u8::MAX)
}

/// Convert an image to its luminance plane, one row per task.
pub fn luma_plane<I, P, S>(image: &I) -> Result<LumaPlane>
where
    I: GenericImageView<Pixel = P> + Sync,
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    let (width, height) = image.dimensions();
    let mut plane = LumaPlane::try_filled(width, height, 0)?;
    parallel::for_each_row(plane.as_mut_slice(), width as usize, |y, row| {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = lumachannel(&image.get_pixel(x as u32, y as u32));
        }
    });
    Ok(plane)
}

// The 3×3 neighborhood of (x, y), indexed [row][column], with the
// border replicated outward.
fn neighborhood(luma: &LumaPlane, x: u32, y: u32) -> [[i32; 3]; 3] {
    let mut n = [[0; 3]; 3];
    for (dy, row) in n.iter_mut().enumerate() {
        for (dx, cell) in row.iter_mut().enumerate() {
            *cell = luma.clamped(x as i64 + dx as i64 - 1, y as i64 + dy as i64 - 1) as i32;
        }
    }
    n
}

/// An edge detector.  Implementations must be pure functions of the
/// plane and the coordinate; they are called from many threads at once.
pub trait EnergyFilter: Send + Sync {
    fn kind(&self) -> FilterKind;

    /// The energy at (x, y), in [0, MAX_FILTER_ENERGY].
    fn pixel_energy(&self, luma: &LumaPlane, x: u32, y: u32) -> i32;
}

/// Sobel, Euclidean magnitude: the square root of the summed squares of
/// the two weighted gradients, truncated.
#[derive(Debug, Default, Copy, Clone)]
pub struct Sobel;

impl EnergyFilter for Sobel {
    fn kind(&self) -> FilterKind {
        FilterKind::Sobel
    }

    fn pixel_energy(&self, luma: &LumaPlane, x: u32, y: u32) -> i32 {
        let n = neighborhood(luma, x, y);
        let gx = (n[0][2] + 2 * n[1][2] + n[2][2]) - (n[0][0] + 2 * n[1][0] + n[2][0]);
        let gy = (n[2][0] + 2 * n[2][1] + n[2][2]) - (n[0][0] + 2 * n[0][1] + n[0][2]);
        let magnitude = ((gx * gx + gy * gy) as f64).sqrt() as i32;
        magnitude.min(MAX_FILTER_ENERGY)
    }
}

/// Prewitt, Manhattan magnitude over unweighted gradients.
#[derive(Debug, Default, Copy, Clone)]
pub struct Prewitt;

impl EnergyFilter for Prewitt {
    fn kind(&self) -> FilterKind {
        FilterKind::Prewitt
    }

    fn pixel_energy(&self, luma: &LumaPlane, x: u32, y: u32) -> i32 {
        let n = neighborhood(luma, x, y);
        let gx = (n[0][2] + n[1][2] + n[2][2]) - (n[0][0] + n[1][0] + n[2][0]);
        let gy = (n[2][0] + n[2][1] + n[2][2]) - (n[0][0] + n[0][1] + n[0][2]);
        (gx.abs() + gy.abs()).min(MAX_FILTER_ENERGY)
    }
}

/// Roberts cross: the two diagonal differences of the 2×2 block whose
/// top-left corner is (x, y).
#[derive(Debug, Default, Copy, Clone)]
pub struct Roberts;

impl EnergyFilter for Roberts {
    fn kind(&self) -> FilterKind {
        FilterKind::Roberts
    }

    fn pixel_energy(&self, luma: &LumaPlane, x: u32, y: u32) -> i32 {
        let (x, y) = (x as i64, y as i64);
        let here = luma.clamped(x, y) as i32;
        let right = luma.clamped(x + 1, y) as i32;
        let below = luma.clamped(x, y + 1) as i32;
        let diagonal = luma.clamped(x + 1, y + 1) as i32;
        ((here - diagonal).abs() + (right - below).abs()).min(MAX_FILTER_ENERGY)
    }
}

/// The runtime selector for the filters above.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterKind {
    Sobel,
    Prewitt,
    Roberts,
}

impl FilterKind {
    pub fn filter(self) -> Box<dyn EnergyFilter> {
        match self {
            FilterKind::Sobel => Box::new(Sobel),
            FilterKind::Prewitt => Box::new(Prewitt),
            FilterKind::Roberts => Box::new(Roberts),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Sobel => "sobel",
            FilterKind::Prewitt => "prewitt",
            FilterKind::Roberts => "roberts",
        }
    }
}

impl Default for FilterKind {
    fn default() -> Self {
        FilterKind::Sobel
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = CarveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sobel" => Ok(FilterKind::Sobel),
            "prewitt" => Ok(FilterKind::Prewitt),
            "roberts" => Ok(FilterKind::Roberts),
            _ => Err(CarveError::UnknownFilter(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    // A left-to-right ramp, identical in every row.
    const RAMP: [u8; 9] = [10, 20, 30, 10, 20, 30, 10, 20, 30];

    fn ramp() -> LumaPlane {
        LumaPlane::from_vec(3, 3, RAMP.to_vec()).unwrap()
    }

    #[test]
    fn hand_computed_center() {
        let luma = ramp();
        assert_eq!(Sobel.pixel_energy(&luma, 1, 1), 80);
        assert_eq!(Prewitt.pixel_energy(&luma, 1, 1), 60);
        assert_eq!(Roberts.pixel_energy(&luma, 1, 1), 20);
    }

    #[test]
    fn corner_matches_replicated_padding() {
        let luma = ramp();
        // The ramp with its border smeared out by one pixel on every side.
        let row = [10u8, 10, 20, 30, 30];
        let padded = LumaPlane::from_vec(5, 5, row.iter().cycle().take(25).cloned().collect())
            .unwrap();
        let filters: [&dyn EnergyFilter; 3] = [&Sobel, &Prewitt, &Roberts];
        for filter in filters.iter() {
            assert_eq!(
                filter.pixel_energy(&luma, 0, 0),
                filter.pixel_energy(&padded, 1, 1),
                "{} disagrees at the corner",
                filter.kind()
            );
            assert_eq!(
                filter.pixel_energy(&luma, 2, 2),
                filter.pixel_energy(&padded, 3, 3),
                "{} disagrees at the far corner",
                filter.kind()
            );
        }
        assert_eq!(Sobel.pixel_energy(&luma, 0, 0), 40);
    }

    #[test]
    fn single_pixel_has_no_energy() {
        let luma = LumaPlane::from_vec(1, 1, vec![200]).unwrap();
        assert_eq!(Sobel.pixel_energy(&luma, 0, 0), 0);
        assert_eq!(Prewitt.pixel_energy(&luma, 0, 0), 0);
        assert_eq!(Roberts.pixel_energy(&luma, 0, 0), 0);
    }

    #[test]
    fn sharp_edges_clamp() {
        let luma = LumaPlane::from_vec(3, 3, vec![0, 0, 255, 0, 0, 255, 0, 0, 255]).unwrap();
        assert_eq!(Sobel.pixel_energy(&luma, 1, 1), MAX_FILTER_ENERGY);
        assert_eq!(Prewitt.pixel_energy(&luma, 1, 1), MAX_FILTER_ENERGY);
    }

    #[test]
    fn gray_pixels_keep_their_value() {
        let image = RgbImage::from_fn(4, 2, |x, _| {
            let v = (x * 50) as u8;
            Rgb([v, v, v])
        });
        let luma = luma_plane(&image).unwrap();
        assert_eq!(luma[(0, 0)], 0);
        assert_eq!(luma[(3, 1)], 150);
    }

    #[test]
    fn parses_filter_names() {
        assert_eq!("Prewitt".parse::<FilterKind>().unwrap(), FilterKind::Prewitt);
        assert!("laplace".parse::<FilterKind>().is_err());
        assert_eq!(FilterKind::default().filter().kind(), FilterKind::Sobel);
    }
}
