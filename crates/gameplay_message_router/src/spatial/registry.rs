//! Listener storage of the spatial router.
//!
//! Every listener has exactly one canonical entry in the handle index, which
//! also records its [`SpatialInfo`]. Grid cells only hold `(handle id,
//! priority)` slots, so moving a listener touches the cells it leaves or
//! joins and rewrites a single entry.

use super::grid::{cells_in_radius, CellId, CellSet};
use crate::error::RouterError;
use crate::message::MessageTypeKey;
use crate::system::engine::Registry;
use crate::system::listeners::{ListenerEntry, ListenerList, MembershipScope, Prioritized};
use crate::types::{HandleId, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Where a spatial listener listens from, and how far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialInfo {
    pub position: Vec3,
    pub radius: f64,
}

impl MembershipScope for SpatialInfo {
    type Origin = Vec3;

    fn admits(&self, origin: Vec3) -> bool {
        self.position.distance_squared(origin) <= self.radius * self.radius
    }

    fn origin_position(origin: Vec3) -> Option<Vec3> {
        Some(origin)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CellSlot {
    id: HandleId,
    priority: i32,
}

impl Prioritized for CellSlot {
    fn handle_id(&self) -> HandleId {
        self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

pub(crate) struct SpatialRegistry {
    cell_size: f64,
    overlap_warning_threshold: usize,
    /// Largest radius whose bounding box stays within the per-listener cell cap.
    max_radius: f64,
    listeners: HashMap<HandleId, ListenerEntry<SpatialInfo>>,
    cells: HashMap<CellId, ListenerList<CellSlot>>,
}

impl SpatialRegistry {
    pub fn new(cell_size: f64, overlap_warning_threshold: usize, max_cells: usize) -> Self {
        // A radius r spans at most 2r / cell_size + 2 cells per axis.
        let side = (max_cells as f64).sqrt().floor();
        Self {
            cell_size,
            overlap_warning_threshold,
            max_radius: cell_size * (side - 2.0).max(0.0) / 2.0,
            listeners: HashMap::new(),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Shrinks `radius` to the largest one the cell cap allows.
    fn limit_radius(&self, id: HandleId, radius: f64) -> f64 {
        if radius > self.max_radius {
            warn!(
                "⚠️ Listen radius {} of listener {} exceeds the grid limit, clamping to {}",
                radius, id, self.max_radius
            );
            self.max_radius
        } else {
            radius
        }
    }

    fn cells_for(&self, info: &SpatialInfo) -> CellSet {
        cells_in_radius(info.position, info.radius, self.cell_size)
    }

    /// Entries of the cell containing `position`, in dispatch order.
    pub fn snapshot_at(&self, position: Vec3) -> Vec<ListenerEntry<SpatialInfo>> {
        let cell = CellId::containing(position, self.cell_size);
        let Some(list) = self.cells.get(&cell) else {
            return Vec::new();
        };

        list.iter()
            .filter_map(|slot| match self.listeners.get(&slot.id) {
                Some(entry) => Some(entry.clone()),
                None => {
                    warn!("⚠️ {} lists listener {} which has no index entry", cell, slot.id);
                    None
                }
            })
            .collect()
    }

    pub fn spatial_info(&self, id: HandleId) -> Option<SpatialInfo> {
        self.listeners.get(&id).map(|entry| entry.scope)
    }

    /// Cells currently holding the listener, recomputed from its spatial info.
    pub fn cells_of(&self, id: HandleId) -> Option<CellSet> {
        self.listeners.get(&id).map(|entry| self.cells_for(&entry.scope))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_population(&self, cell: CellId) -> usize {
        self.cells.get(&cell).map_or(0, ListenerList::len)
    }

    /// Moves a listener and/or changes its radius.
    ///
    /// The listener leaves cells only the old circle overlapped and joins
    /// cells only the new circle overlaps; cells in both keep their slot. A
    /// missing, negative or non-finite `radius` keeps the current one, and
    /// one above the cell cap is clamped. Returns the old and new spatial info.
    pub fn relocate(
        &mut self,
        id: HandleId,
        position: Vec3,
        radius: Option<f64>,
    ) -> Result<(SpatialInfo, SpatialInfo), RouterError> {
        let (old, priority) = self
            .listeners
            .get(&id)
            .map(|entry| (entry.scope, entry.priority))
            .ok_or(RouterError::UnknownHandle(id))?;

        let new = SpatialInfo {
            position,
            radius: match radius {
                Some(r) if r.is_finite() && r >= 0.0 => self.limit_radius(id, r),
                Some(r) => {
                    warn!(
                        "⚠️ Listen radius {} for listener {} is invalid, keeping {}",
                        r, id, old.radius
                    );
                    old.radius
                }
                None => old.radius,
            },
        };

        let old_cells = self.cells_for(&old);
        let new_cells = self.cells_for(&new);

        for cell in old_cells.iter().filter(|cell| !new_cells.contains(*cell)) {
            self.leave(*cell, id);
        }
        for cell in new_cells.iter().filter(|cell| !old_cells.contains(*cell)) {
            self.join(*cell, CellSlot { id, priority });
        }
        self.warn_on_overlap(id, new_cells.len());

        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.scope = new;
        }

        Ok((old, new))
    }

    fn join(&mut self, cell: CellId, slot: CellSlot) {
        self.cells.entry(cell).or_default().insert(slot);
    }

    fn leave(&mut self, cell: CellId, id: HandleId) {
        let Some(list) = self.cells.get_mut(&cell) else {
            warn!("⚠️ Listener {} should be in {} but the cell does not exist", id, cell);
            return;
        };

        if list.remove(id).is_none() {
            warn!("⚠️ Listener {} should be in {} but is not in its list", id, cell);
        }
        if list.is_empty() {
            self.cells.remove(&cell);
        }
    }

    fn warn_on_overlap(&self, id: HandleId, cells: usize) {
        if cells > self.overlap_warning_threshold {
            warn!(
                "⚠️ Listener {} overlaps {} grid cells (threshold {}); consider a smaller radius",
                id, cells, self.overlap_warning_threshold
            );
        }
    }
}

impl Registry for SpatialRegistry {
    type Scope = SpatialInfo;

    fn insert(&mut self, mut entry: ListenerEntry<SpatialInfo>) {
        entry.scope.radius = self.limit_radius(entry.id, entry.scope.radius);
        let cells = self.cells_for(&entry.scope);
        self.warn_on_overlap(entry.id, cells.len());

        let slot = CellSlot {
            id: entry.id,
            priority: entry.priority,
        };
        for cell in cells {
            self.join(cell, slot);
        }
        self.listeners.insert(entry.id, entry);
    }

    fn remove(&mut self, _type_key: MessageTypeKey, id: HandleId) -> Result<(), RouterError> {
        let entry = self
            .listeners
            .remove(&id)
            .ok_or(RouterError::UnknownHandle(id))?;

        for cell in self.cells_for(&entry.scope) {
            self.leave(cell, id);
        }
        Ok(())
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn clear(&mut self) {
        self.listeners.clear();
        self.cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use crate::system::listeners::typed_callback;
    use crate::tag::ChannelTag;
    use crate::types::MatchRule;

    #[derive(Debug)]
    struct Noise;

    fn entry(id: u64, priority: i32, position: Vec3, radius: f64) -> ListenerEntry<SpatialInfo> {
        ListenerEntry {
            id: HandleId(id),
            callback: typed_callback(|_ctx, _msg: &Noise| {}),
            message_type: MessageType::of::<Noise>().downgrade(),
            channel: ChannelTag::new("Noise"),
            match_rule: MatchRule::ExactMatch,
            priority,
            target: None,
            scope: SpatialInfo { position, radius },
        }
    }

    #[test]
    fn insert_places_listener_in_every_overlapping_cell() {
        let mut registry = SpatialRegistry::new(16.0, 256, 4096);
        registry.insert(entry(1, 50, Vec3::new(12.0, 12.0, 0.0), 5.0));

        assert_eq!(registry.cell_count(), 3);
        for (x, y) in [(0, 0), (1, 0), (0, 1)] {
            assert_eq!(registry.cell_population(CellId::from_coords(x, y)), 1);
        }
    }

    #[test]
    fn snapshot_is_priority_ordered() {
        let mut registry = SpatialRegistry::new(16.0, 256, 4096);
        registry.insert(entry(1, 50, Vec3::new(8.0, 8.0, 0.0), 4.0));
        registry.insert(entry(2, 0, Vec3::new(8.0, 8.0, 0.0), 4.0));
        registry.insert(entry(3, 50, Vec3::new(8.0, 8.0, 0.0), 4.0));

        let ids: Vec<u64> = registry
            .snapshot_at(Vec3::new(1.0, 1.0, 0.0))
            .iter()
            .map(|e| e.id.0)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert!(registry.snapshot_at(Vec3::new(100.0, 100.0, 0.0)).is_empty());
    }

    #[test]
    fn remove_drops_empty_cells() {
        let mut registry = SpatialRegistry::new(16.0, 256, 4096);
        registry.insert(entry(1, 50, Vec3::new(12.0, 12.0, 0.0), 5.0));
        registry.insert(entry(2, 50, Vec3::new(4.0, 4.0, 0.0), 1.0));

        assert!(registry.remove(MessageTypeKey(0), HandleId(1)).is_ok());
        assert_eq!(registry.cell_count(), 1);
        assert_eq!(registry.cell_population(CellId::from_coords(0, 0)), 1);
        assert!(matches!(
            registry.remove(MessageTypeKey(0), HandleId(1)),
            Err(RouterError::UnknownHandle(HandleId(1)))
        ));
    }

    #[test]
    fn relocate_moves_between_cells() {
        let mut registry = SpatialRegistry::new(16.0, 256, 4096);
        registry.insert(entry(1, 50, Vec3::new(8.0, 8.0, 0.0), 2.0));

        let (old, new) = registry
            .relocate(HandleId(1), Vec3::new(40.0, 8.0, 0.0), None)
            .expect("listener exists");
        assert_eq!(old.position, Vec3::new(8.0, 8.0, 0.0));
        assert_eq!(new.radius, 2.0);
        assert_eq!(registry.cell_population(CellId::from_coords(0, 0)), 0);
        assert_eq!(registry.cell_population(CellId::from_coords(2, 0)), 1);
        assert_eq!(registry.cell_count(), 1);

        registry
            .relocate(HandleId(1), Vec3::new(40.0, 8.0, 0.0), Some(-1.0))
            .expect("listener exists");
        assert_eq!(registry.spatial_info(HandleId(1)).map(|i| i.radius), Some(2.0));

        assert!(registry.relocate(HandleId(9), Vec3::zero(), None).is_err());
    }

    #[test]
    fn oversized_radius_is_clamped_to_the_cell_cap() {
        // 100 cells allow a 10x10 bounding box: r = 16 * (10 - 2) / 2
        let mut registry = SpatialRegistry::new(16.0, 256, 100);
        assert_eq!(registry.max_radius(), 64.0);

        registry.insert(entry(1, 50, Vec3::new(8.0, 8.0, 0.0), 1.0e9));
        assert_eq!(registry.spatial_info(HandleId(1)).map(|i| i.radius), Some(64.0));
        assert!(registry.cell_count() <= 100);

        registry
            .relocate(HandleId(1), Vec3::new(8.0, 8.0, 0.0), Some(2.0))
            .expect("listener exists");
        assert_eq!(registry.cell_count(), 1);

        registry
            .relocate(HandleId(1), Vec3::new(8.0, 8.0, 0.0), Some(f64::INFINITY))
            .expect("listener exists");
        assert_eq!(registry.spatial_info(HandleId(1)).map(|i| i.radius), Some(2.0));

        registry
            .relocate(HandleId(1), Vec3::new(8.0, 8.0, 0.0), Some(f64::MAX))
            .expect("listener exists");
        assert_eq!(registry.spatial_info(HandleId(1)).map(|i| i.radius), Some(64.0));
        assert!(registry.cell_count() <= 100);
    }

    #[test]
    fn admits_uses_full_3d_distance() {
        let info = SpatialInfo {
            position: Vec3::new(0.0, 0.0, 0.0),
            radius: 5.0,
        };
        assert!(info.admits(Vec3::new(3.0, 4.0, 0.0)));
        assert!(!info.admits(Vec3::new(3.0, 4.0, 1.0)));
    }
}
