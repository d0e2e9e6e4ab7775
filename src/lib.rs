// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! pamcarve - cached, incremental seam carving
//!
//! Content-aware resizing: the image is shrunk (or grown) by removing
//! (or doubling) the connected one-pixel paths that carry the least
//! edge energy.  Seams are found in ranked batches and cached, so a
//! run of small requests in one direction costs one search, not many.
//!
//! Start with `SeamImage`, or `SeamCarver` to resize to a target.

// #![deny(missing_docs)]

pub mod twodmap;

pub mod axis;
pub mod config;
pub mod energy;
pub mod energymap;
pub mod error;
pub mod events;
pub mod filters;
pub mod flipper;
pub mod indexmap;
pub mod parallel;
pub mod seam;
pub mod seamcache;
pub mod seamcarver;
pub mod seamimage;
pub mod surgery;

pub use axis::{Action, Axis, Direction};
pub use config::Config;
pub use energy::{energy_to_image, EnergyStroke, Priority, MAX_ENERGY, MIN_ENERGY};
pub use error::{CarveError, Result};
pub use events::{event_channel, CarveEvent, CarveObserver, ChannelObserver};
pub use filters::FilterKind;
pub use seam::Seam;
pub use seamcache::CacheStats;
pub use seamcarver::SeamCarver;
pub use seamimage::SeamImage;
