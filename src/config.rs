// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tunables for a carving session.

use crate::filters::FilterKind;

pub const DEFAULT_CACHE_LIMIT: u32 = 50;
pub const DEFAULT_BATCH: u32 = 16;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// The edge detector used for the energy grid.
    pub filter: FilterKind,
    /// The fewest seams found per refresh, however small the request.
    pub cache_limit: u32,
    /// Seams per request when resizing to a target size.
    pub batch: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            filter: FilterKind::Sobel,
            cache_limit: DEFAULT_CACHE_LIMIT,
            batch: DEFAULT_BATCH,
        }
    }
}
