// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The seam cache
//!
//! Finding seams is the expensive part of carving, and most requests
//! come in small batches, one after the other, all in the same
//! direction.  So rather than find a batch of seams, cut them, and
//! start over, the cache finds K seams at once (K is at least the cache
//! limit) and lets successive batches consume them in order.  The image
//! they were found in, the "base", is kept; every batch is cut out of
//! the base afresh, with the limit moved up by the size of the batch.
//!
//! The cache has to be rebuilt when the direction changes, when carving
//! turns into adding or the other way round, when it runs out of seams,
//! and whenever the energy changes underneath it.

use crate::axis::{Action, Axis};
use crate::energymap::CumulativeEnergyMap;
use crate::error::Result;
use crate::indexmap::IndexMap;
use crate::parallel;
use crate::seam::Seam;
use tracing::debug;

/// The seams of one axis, cheapest first, with the map of which pixel
/// each of them owns.
#[derive(Debug, Clone)]
pub struct RankedSeams {
    axis: Axis,
    seams: Vec<Seam>,
    index: IndexMap,
}

impl RankedSeams {
    /// Extract the `count` cheapest seams, one after the other.  Each
    /// has to see the pixels claimed by the ones before it.
    pub fn build(map: &CumulativeEnergyMap, axis: Axis, count: u32) -> Result<Self> {
        let (width, height) = map.dimensions(axis);
        let mut index = IndexMap::try_new(width, height)?;
        let seams = (0..count)
            .map(|k| map.kth_lowest_energy_seam(axis, k, &mut index))
            .collect();
        Ok(RankedSeams { axis, seams, index })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn seams(&self) -> &[Seam] {
        &self.seams
    }

    pub fn index(&self) -> &IndexMap {
        &self.index
    }

    pub fn len(&self) -> u32 {
        self.seams.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.seams.is_empty()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// How many times the seams have been rebuilt.
    pub refreshes: u64,
    /// Seams used since the last rebuild.
    pub consumed: u32,
    /// Seams held for the last axis used, or for the vertical axis
    /// when nothing has been used yet.
    pub cached: u32,
    pub limit: u32,
    pub last_action: Action,
    pub last_axis: Option<Axis>,
}

#[derive(Debug)]
pub struct SeamCache {
    limit: u32,
    slots: [Option<RankedSeams>; 2],
    consumed: u32,
    last_action: Action,
    last_axis: Option<Axis>,
    refreshes: u64,
}

impl SeamCache {
    pub fn new(limit: u32) -> Self {
        SeamCache {
            limit: limit.max(1),
            slots: [None, None],
            consumed: 0,
            last_action: Action::None,
            last_axis: None,
            refreshes: 0,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Change the floor on K.  Drops whatever is cached.
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.max(1);
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.slots = [None, None];
    }

    /// How many seams a refresh for a batch of `batch` will find, in a
    /// lane `across` pixels long.  At least one pixel of every lane must
    /// survive a carve, so never more than `across - 1`.
    pub fn capacity(&self, batch: u32, across: u32) -> u32 {
        batch.max(self.limit).min(across.saturating_sub(1))
    }

    pub fn needs_refresh(&self, axis: Axis, action: Action, count: u32) -> bool {
        let reversed = self.last_action != Action::None && self.last_action != action;
        let turned = self.last_axis.map_or(false, |last| last != axis);
        let short = self.slots[axis.slot()]
            .as_ref()
            .map_or(true, |ranked| self.consumed.saturating_add(count) > ranked.len());
        reversed || turned || short
    }

    /// Rebuild the seams for the given axes from a fresh cumulative map.
    /// Two axes are built side by side.
    pub fn refresh(&mut self, map: &CumulativeEnergyMap, axes: &[Axis], batch: u32) -> Result<()> {
        let count_for = |axis: Axis| {
            let (width, height) = map.dimensions(axis);
            self.capacity(batch, axis.across(width, height))
        };
        let built = match axes {
            [one] => vec![RankedSeams::build(map, *one, count_for(*one))?],
            [first, second] => {
                let (first, second) = (*first, *second);
                let (first_count, second_count) = (count_for(first), count_for(second));
                let (a, b) = parallel::join(
                    || RankedSeams::build(map, first, first_count),
                    || RankedSeams::build(map, second, second_count),
                );
                vec![a?, b?]
            }
            _ => Vec::new(),
        };

        self.invalidate();
        for ranked in built {
            debug!(axis = ?ranked.axis(), seams = ranked.len(), "ranked seams");
            let slot = ranked.axis().slot();
            self.slots[slot] = Some(ranked);
        }
        self.consumed = 0;
        self.last_action = Action::None;
        self.last_axis = None;
        self.refreshes += 1;
        Ok(())
    }

    pub fn ranked(&self, axis: Axis) -> Option<&RankedSeams> {
        self.slots[axis.slot()].as_ref()
    }

    /// The next `count` unused seams for `axis`, if the cache holds
    /// that many.
    pub fn batch(&self, axis: Axis, count: u32) -> Option<&[Seam]> {
        let ranked = self.ranked(axis)?;
        let end = self.consumed.checked_add(count)?;
        ranked.seams().get(self.consumed as usize..end as usize)
    }

    pub fn consumed(&self) -> u32 {
        self.consumed
    }

    /// Record that a batch has been used.
    pub fn commit(&mut self, axis: Axis, action: Action, count: u32) {
        self.consumed += count;
        self.last_action = action;
        self.last_axis = Some(axis);
    }

    pub fn stats(&self) -> CacheStats {
        let axis = self.last_axis.unwrap_or(Axis::Vertical);
        CacheStats {
            refreshes: self.refreshes,
            consumed: self.consumed,
            cached: self.ranked(axis).map_or(0, RankedSeams::len),
            limit: self.limit,
            last_action: self.last_action,
            last_axis: self.last_axis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::EnergyGrid;

    fn map(width: u32, height: u32) -> CumulativeEnergyMap {
        let data: Vec<i32> = (0..width * height).map(|i| ((i * 31) % 17) as i32).collect();
        let energy = EnergyGrid::from_vec(width, height, data).unwrap();
        let mut map = CumulativeEnergyMap::new();
        map.compute_both(&energy).unwrap();
        map
    }

    #[test]
    fn empty_cache_needs_a_refresh() {
        let cache = SeamCache::new(4);
        assert!(cache.needs_refresh(Axis::Vertical, Action::Shrink, 1));
        assert_eq!(cache.stats().refreshes, 0);
    }

    #[test]
    fn capacity_is_bounded_by_the_lane() {
        let cache = SeamCache::new(10);
        assert_eq!(cache.capacity(3, 100), 10);
        assert_eq!(cache.capacity(30, 100), 30);
        assert_eq!(cache.capacity(3, 6), 5);
        assert_eq!(cache.capacity(3, 1), 0);
    }

    #[test]
    fn batches_are_consumed_in_order() {
        let map = map(8, 6);
        let mut cache = SeamCache::new(5);
        cache.refresh(&map, &[Axis::Vertical], 2).unwrap();
        assert!(!cache.needs_refresh(Axis::Vertical, Action::Shrink, 2));
        let first = cache.batch(Axis::Vertical, 2).unwrap().to_vec();
        cache.commit(Axis::Vertical, Action::Shrink, 2);
        let second = cache.batch(Axis::Vertical, 2).unwrap().to_vec();
        assert_eq!(&cache.ranked(Axis::Vertical).unwrap().seams()[2..4], &second[..]);
        assert_ne!(first, second);
        assert!(cache.batch(Axis::Vertical, 4).is_none());
        assert!(cache.needs_refresh(Axis::Vertical, Action::Shrink, 4));
    }

    #[test]
    fn reversing_or_turning_forces_a_refresh() {
        let map = map(8, 6);
        let mut cache = SeamCache::new(5);
        cache.refresh(&map, &[Axis::Vertical, Axis::Horizontal], 1).unwrap();
        cache.commit(Axis::Vertical, Action::Shrink, 1);
        assert!(!cache.needs_refresh(Axis::Vertical, Action::Shrink, 1));
        assert!(cache.needs_refresh(Axis::Vertical, Action::Enlarge, 1));
        assert!(cache.needs_refresh(Axis::Horizontal, Action::Shrink, 1));
        let stats = cache.stats();
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.consumed, 1);
        assert_eq!(stats.cached, 5);
        assert_eq!(stats.last_axis, Some(Axis::Vertical));
    }

    #[test]
    fn new_limit_drops_the_seams() {
        let map = map(8, 6);
        let mut cache = SeamCache::new(5);
        cache.refresh(&map, &[Axis::Horizontal], 1).unwrap();
        assert_eq!(cache.ranked(Axis::Horizontal).unwrap().len(), 5);
        cache.set_limit(2);
        assert!(cache.ranked(Axis::Horizontal).is_none());
        assert!(cache.needs_refresh(Axis::Horizontal, Action::Shrink, 1));
    }
}
