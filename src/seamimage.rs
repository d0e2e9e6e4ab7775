// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SeamImage - the carving session
//!
//! Owns the image and everything derived from it, and runs each carve
//! or add request through the pipeline:
//!
//! 1. Work out which axis an `Optimal` request means.
//! 2. Clamp the count so at least one pixel per lane survives.
//! 3. If the cache cannot serve the request, refresh it: patch the
//!    energy, recompute stale cumulative maps, rank new seams, and take
//!    the current image as the new base.
//! 4. Highlight the seams, if asked.
//! 5. Cut (or double) the seams out of the base into a new image.
//! 6. Mark the energy dirty, swap in the new image, and tell everyone.
//!
//! Every mutating call takes `&mut self`, so two requests can never
//! overlap.

use crate::axis::{Action, Axis, Direction};
use crate::config::Config;
use crate::energy::{energy_to_image, EnergyFunction, EnergyStroke};
use crate::energymap::CumulativeEnergyMap;
use crate::error::{CarveError, Result};
use crate::events::CarveObserver;
use crate::filters::FilterKind;
use crate::seamcache::{CacheStats, SeamCache};
use crate::surgery;
use image::{GrayImage, RgbImage};
use tracing::{debug, info, warn};

// Whether the energy grid describes the current image, or the base
// image with the most recent seams marked dirty.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum EnergyState {
    Fresh,
    Patched(Axis),
}

pub struct SeamImage {
    image: RgbImage,
    base: RgbImage,
    energy: EnergyFunction,
    state: EnergyState,
    maps: CumulativeEnergyMap,
    cache: SeamCache,
    overlay: Vec<EnergyStroke>,
    observers: Vec<Box<dyn CarveObserver>>,
}

impl SeamImage {
    /// Start a session on `image`: full energy, both cumulative maps.
    pub fn new(image: RgbImage, config: &Config) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CarveError::dimension(width, height, "images must be at least 1x1"));
        }
        let mut energy = EnergyFunction::new(config.filter);
        energy.compute_energy(&image)?;
        let mut maps = CumulativeEnergyMap::new();
        maps.compute_both(energy.grid())?;
        info!(width, height, filter = %config.filter, "loaded image");
        Ok(SeamImage {
            base: image.clone(),
            image,
            energy,
            state: EnergyState::Fresh,
            maps,
            cache: SeamCache::new(config.cache_limit),
            overlay: Vec::new(),
            observers: Vec::new(),
        })
    }

    /// Start a session on packed 8-bit RGB pixels, row by row.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>, config: &Config) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(CarveError::BufferSize {
                expected,
                actual: pixels.len(),
                width,
                height,
            });
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| CarveError::dimension(width, height, "pixel buffer"))?;
        SeamImage::new(image, config)
    }

    pub fn subscribe(&mut self, observer: Box<dyn CarveObserver>) {
        self.observers.push(observer);
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn filter(&self) -> FilterKind {
        self.energy.kind()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The energy of the current image as grayscale.  Between refreshes
    /// the grid is still laid out over the base image, so the view is
    /// patched on the fly without disturbing it.
    pub fn energy_map_image(&self) -> Result<GrayImage> {
        match self.state {
            EnergyState::Fresh => energy_to_image(self.energy.grid()),
            EnergyState::Patched(axis) => energy_to_image(&self.energy.localized(&self.image, axis)?),
        }
    }

    /// Replace the painted overlay and recompute the energy under it.
    pub fn set_energy(&mut self, strokes: Vec<EnergyStroke>) -> Result<()> {
        self.overlay = strokes;
        self.recompute_base()
    }

    /// Full energy recompute of the current image, with the overlay
    /// painted back on.  Everything downstream is invalidated.
    pub fn recompute_base(&mut self) -> Result<()> {
        self.energy.compute_energy(&self.image)?;
        let painted = self.energy.apply_overlay(&self.overlay);
        self.state = EnergyState::Fresh;
        self.maps.invalidate();
        self.cache.invalidate();
        debug!(painted, "recomputed base energy");
        Ok(())
    }

    /// Bring the energy up to date and recompute both cumulative maps.
    pub fn recompute_entire_map(&mut self) -> Result<()> {
        self.bring_energy_current()?;
        self.maps.compute_both(self.energy.grid())?;
        Ok(())
    }

    pub fn change_energy_function(&mut self, kind: FilterKind) -> Result<()> {
        self.energy.set_filter(kind);
        info!(filter = %kind, "changed energy function");
        self.recompute_base()
    }

    pub fn set_cache_limit(&mut self, limit: u32) {
        self.cache.set_limit(limit);
    }

    /// Remove `count` seams.
    pub fn carve(&mut self, direction: Direction, paint_seams: bool, count: u32) -> Result<()> {
        self.operate(Action::Shrink, direction, paint_seams, count)
    }

    /// Duplicate `count` seams.
    pub fn add(&mut self, direction: Direction, paint_seams: bool, count: u32) -> Result<()> {
        self.operate(Action::Enlarge, direction, paint_seams, count)
    }

    fn operate(&mut self, action: Action, direction: Direction, paint_seams: bool, count: u32) -> Result<()> {
        let outcome = self.resize(action, direction, paint_seams, count);
        if let Err(err) = &outcome {
            warn!(?action, ?direction, count, "{}", err);
        }
        for observer in self.observers.iter_mut() {
            observer.operation_completed(outcome.as_ref().map(|_| ()));
        }
        outcome
    }

    fn resize(&mut self, action: Action, direction: Direction, paint_seams: bool, count: u32) -> Result<()> {
        let axis = self.resolve(direction, count)?;
        let (width, height) = self.size();
        let across = axis.across(width, height);
        let count = if count >= across {
            warn!(?axis, requested = count, available = across - 1, "too many seams requested");
            across - 1
        } else {
            count
        };
        if count == 0 {
            debug!(?axis, ?action, "nothing to do");
            return Ok(());
        }

        if self.cache.needs_refresh(axis, action, count) {
            self.refresh(&[axis], count)?;
        }
        let first = self.cache.consumed();
        let limit = first + count;
        let ranked = match self.cache.ranked(axis) {
            Some(ranked) => ranked,
            None => unreachable!("a refreshed cache holds seams for {:?}", axis),
        };

        if paint_seams {
            let points = ranked.index().seam_pixels(axis, first, limit, action);
            for observer in self.observers.iter_mut() {
                observer.seam_highlighted(&points);
            }
        }

        let resized = match action {
            Action::Enlarge => surgery::add_seams(&self.base, ranked.index(), axis, limit)?,
            _ => surgery::remove_seams(&self.base, ranked.index(), axis, limit)?,
        };
        surgery::mark_dirty(self.energy.grid_mut(), ranked.index(), limit);

        self.image = resized;
        self.state = EnergyState::Patched(axis);
        self.cache.commit(axis, action, count);
        let (width, height) = self.image.dimensions();
        info!(?axis, ?action, count, width, height, "resized");
        for observer in self.observers.iter_mut() {
            observer.image_changed(&self.image);
        }
        Ok(())
    }

    // For an optimal request, rank seams both ways and pick the axis
    // whose cheapest seam costs less.  Axes one pixel across have
    // nothing to give.
    fn resolve(&mut self, direction: Direction, count: u32) -> Result<Axis> {
        match direction {
            Direction::Vertical => Ok(Axis::Vertical),
            Direction::Horizontal => Ok(Axis::Horizontal),
            Direction::Optimal => {
                self.refresh(&[Axis::Vertical, Axis::Horizontal], count)?;
                let (width, height) = self.size();
                let cost = |axis: Axis| {
                    if axis.across(width, height) > 1 {
                        self.maps.cheapest(axis).map(|endpoint| endpoint.cost)
                    } else {
                        None
                    }
                };
                let axis = match (cost(Axis::Vertical), cost(Axis::Horizontal)) {
                    (Some(vertical), Some(horizontal)) if horizontal < vertical => Axis::Horizontal,
                    (None, Some(_)) => Axis::Horizontal,
                    _ => Axis::Vertical,
                };
                debug!(?axis, "resolved optimal direction");
                Ok(axis)
            }
        }
    }

    // Patch or keep the energy grid so it describes the current image.
    // Anything built on the old grid is stale afterwards.
    fn bring_energy_current(&mut self) -> Result<()> {
        if let EnergyState::Patched(axis) = self.state {
            self.maps.invalidate();
            self.cache.invalidate();
            self.energy.compute_local_energy(&self.image, axis)?;
            self.state = EnergyState::Fresh;
        }
        Ok(())
    }

    fn refresh(&mut self, axes: &[Axis], batch: u32) -> Result<()> {
        self.bring_energy_current()?;
        let stale: Vec<Axis> = axes.iter().cloned().filter(|&axis| !self.maps.is_fresh(axis)).collect();
        match stale.as_slice() {
            [] => {}
            [axis] => self.maps.compute_entire_energy_map(*axis, self.energy.grid())?,
            _ => self.maps.compute_both(self.energy.grid())?,
        }
        self.cache.refresh(&self.maps, axes, batch)?;
        self.base = self.image.clone();
        debug!(?axes, batch, "refreshed seam cache");
        Ok(())
    }
}
