// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image dimensional flipper
//!
//! A proxy for anything implementing `GenericImageView` that swaps
//! width for height and every x for y.
//!
//! Horizontal seams run along columns, and columns are scattered all
//! over memory.  Reading the image through a flipper turns each column
//! into a row, so the surgeon can carve horizontal seams with exactly
//! the same row-at-a-time code it uses for vertical ones, writing each
//! output lane as a contiguous chunk on its own thread.  A second
//! flipper over that transposed result puts it back the right way up.

use image::GenericImageView;

pub struct Flipper<'a, I: GenericImageView> {
    pub image: &'a I,
}

impl<'a, I: GenericImageView> Flipper<'a, I> {
    pub fn new(image: &'a I) -> Self {
        Flipper { image }
    }
}

impl<'a, I: GenericImageView> GenericImageView for Flipper<'a, I> {
    type Pixel = I::Pixel;

    fn dimensions(&self) -> (u32, u32) {
        let (x, y) = self.image.dimensions();
        (y, x)
    }

    fn width(&self) -> u32 {
        self.image.height()
    }

    fn height(&self) -> u32 {
        self.image.width()
    }

    fn bounds(&self) -> (u32, u32, u32, u32) {
        let (x, y, width, height) = self.image.bounds();
        (y, x, height, width)
    }

    fn get_pixel(&self, x: u32, y: u32) -> Self::Pixel {
        self.image.get_pixel(y, x)
    }
}
