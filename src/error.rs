// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong while carving.

use failure::Fail;

#[derive(Debug, Fail)]
pub enum CarveError {
    #[fail(display = "invalid dimensions {}x{}: {}", width, height, reason)]
    InvalidDimension {
        width: u32,
        height: u32,
        reason: String,
    },

    #[fail(
        display = "pixel buffer holds {} values, expected {} for a {}x{} image",
        actual, expected, width, height
    )]
    BufferSize {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },

    /// The allocator refused a buffer.  Whatever was being replaced is
    /// still in place.
    #[fail(display = "could not allocate a {}x{} buffer", width, height)]
    Allocation { width: u32, height: u32 },

    #[fail(display = "unknown energy filter {:?}", _0)]
    UnknownFilter(String),
}

impl CarveError {
    pub(crate) fn dimension<S: Into<String>>(width: u32, height: u32, reason: S) -> Self {
        CarveError::InvalidDimension {
            width,
            height,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CarveError>;
