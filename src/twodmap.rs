// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The addressable two-dimensional field behind every per-pixel map in
//! the crate: luminance, energy, cumulative cost, and seam ranks.

use crate::error::{CarveError, Result};
use std::ops::{Index, IndexMut};

/// A ternary expression.  Redundant, perhaps, but it keeps the edge
/// (literally) cases of the seam logic readable as one-liners.
#[macro_export]
macro_rules! cq {
    ($condition: expr, $_true: expr, $_false: expr) => {
        if $condition {
            $_true
        } else {
            $_false
        }
    };
}

/// A row-major width × height field of plain values.  Reads and writes
/// through `Index` are bounds-checked on both axes; a bad coordinate is
/// a bug and panics rather than aliasing into the next row.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoDimensionalMap<P: Default + Copy> {
    width: u32,
    height: u32,
    data: Vec<P>,
}

impl<P: Default + Copy> Default for TwoDimensionalMap<P> {
    fn default() -> Self {
        TwoDimensionalMap {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }
}

impl<P: Default + Copy> TwoDimensionalMap<P> {
    /// A map filled with the content type's default.
    pub fn new(width: u32, height: u32) -> Self {
        TwoDimensionalMap {
            width,
            height,
            data: vec![P::default(); width as usize * height as usize],
        }
    }

    /// Like `new`, but the allocation is allowed to fail.  Maps are
    /// rebuilt on every refresh and can be large; running out of memory
    /// there should be an error the caller can recover from.
    pub fn try_filled(width: u32, height: u32, value: P) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(CarveError::Allocation { width, height })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| CarveError::Allocation { width, height })?;
        data.resize(len, value);
        Ok(TwoDimensionalMap {
            width,
            height,
            data,
        })
    }

    pub fn from_vec(width: u32, height: u32, data: Vec<P>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(CarveError::BufferSize {
                expected,
                actual: data.len(),
                width,
                height,
            });
        }
        Ok(TwoDimensionalMap {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Checked read; `None` outside the map.
    pub fn get(&self, x: u32, y: u32) -> Option<P> {
        cq!(
            x < self.width && y < self.height,
            Some(self.data[self.get_index(x, y)]),
            None
        )
    }

    /// Replicate-border read: coordinates outside the map are clamped
    /// to the nearest edge cell.  The map must not be empty.
    pub fn clamped(&self, x: i64, y: i64) -> P {
        let cx = cq!(x < 0, 0, cq!(x >= self.width as i64, self.width as i64 - 1, x));
        let cy = cq!(y < 0, 0, cq!(y >= self.height as i64, self.height as i64 - 1, y));
        self.data[self.get_index(cx as u32, cy as u32)]
    }

    pub fn as_slice(&self) -> &[P] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [P] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<P> {
        self.data
    }

    // Absolutely, the number one name of this game is keep the index
    // math in a singular location and never, ever mess with it.  This
    // particular variant is the same one used in image.rs.
    fn get_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    fn checked_index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "({}, {}) is outside a {}x{} map",
            x,
            y,
            self.width,
            self.height
        );
        self.get_index(x, y)
    }
}

impl<P: Default + Copy> Index<(u32, u32)> for TwoDimensionalMap<P> {
    type Output = P;

    fn index(&self, (x, y): (u32, u32)) -> &P {
        let index = self.checked_index(x, y);
        &self.data[index]
    }
}

impl<P: Default + Copy> IndexMut<(u32, u32)> for TwoDimensionalMap<P> {
    fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut P {
        let index = self.checked_index(x, y);
        &mut self.data[index]
    }
}
