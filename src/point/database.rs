//! `id -> Point` mapping, fixed-capacity at construction (spec.md §4.2).

use std::collections::HashMap;

use crate::error::{Error, PointErr, Result};
use crate::point::{Point, PointId};

/// Bounded map from [`PointId`] to an owned Point. Capacity is fixed at
/// construction (`EngineLimits::max_points`); `insert` past capacity fails
/// with `FAILED_DB_INSERT` rather than silently growing, matching spec.md
/// §3's "no insertion after start" / O(1) lookup contract.
pub struct PointDatabase {
    capacity: usize,
    points: HashMap<PointId, Box<dyn Point>>,
}

impl PointDatabase {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn insert(&mut self, point: Box<dyn Point>) -> Result<()> {
        if self.points.len() >= self.capacity {
            return Err(PointErr::FailedDbInsert.full());
        }
        let id = point.id();
        if self.points.contains_key(&id) {
            return Err(PointErr::FailedDbInsert.full());
        }
        self.points.insert(id, point);
        Ok(())
    }

    pub fn lookup(&self, id: PointId) -> Option<&dyn Point> {
        self.points.get(&id).map(AsRef::as_ref)
    }

    pub fn lookup_mut(&mut self, id: PointId) -> Option<&mut (dyn Point + 'static)> {
        self.points.get_mut(&id).map(AsMut::as_mut)
    }

    /// Iterate every Point in no particular order. Used by HA snapshot
    /// export to find Points belonging to the HA-stateful arena.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Point> {
        self.points.values().map(AsRef::as_ref)
    }

    /// `{"id":N, ...}` envelope around a single Point's own `to_json`.
    pub fn to_json(&self, id: PointId, verbose: bool) -> Result<serde_json::Value> {
        let point = self.lookup(id).ok_or(PointErr::MissingId.full())?;
        Ok(point.to_json(verbose))
    }

    /// Ingest a `{"id":N, ...}` envelope, routing to the addressed Point's
    /// own `from_json`.
    pub fn from_json(&mut self, src: &serde_json::Value) -> Result<()> {
        let id = src
            .get("id")
            .and_then(serde_json::Value::as_u64)
            .ok_or(PointErr::MissingId.full())? as PointId;
        let point = self.lookup_mut(id).ok_or(PointErr::MissingId.full())?;
        point.from_json(src)
    }

    /// Apply every Point's setter (if any), producing initial valid state
    /// (spec.md §4.7 step (e), "apply setters to produce initial valid
    /// state"). Called once during Node construction, before Chassis
    /// threads start.
    pub fn apply_setters(&mut self, setter_links: &[(PointId, PointId)]) -> Result<()> {
        for &(target_id, setter_id) in setter_links {
            // Borrow the setter's current state by id, then apply it to
            // the target -- done via a temporary removal to satisfy the
            // borrow checker without `unsafe`, since both live in the same
            // map. Setters are never mutated afterward (DESIGN.md Open
            // Question #2), so this round-trip is side-effect free on it.
            let setter_box = self
                .points
                .remove(&setter_id)
                .ok_or(PointErr::MissingId.full())?;
            let result = match self.points.get_mut(&target_id) {
                Some(target) => target.update_from_setter(setter_box.as_ref(), crate::point::LockRequest::Noop),
                None => Err(PointErr::MissingId.full()),
            };
            self.points.insert(setter_id, setter_box);
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::HaRole;
    use crate::point::scalar::Uint32Point;

    #[test]
    fn insert_lookup_roundtrip() {
        let mut db = PointDatabase::new(4);
        db.insert(Box::new(Uint32Point::new_valid(0, 7, HaRole::General))).unwrap();
        assert_eq!(db.lookup(0).unwrap().id(), 0);
    }

    #[test]
    fn insert_past_capacity_fails() {
        let mut db = PointDatabase::new(1);
        db.insert(Box::new(Uint32Point::new_valid(0, 1, HaRole::General))).unwrap();
        assert!(db
            .insert(Box::new(Uint32Point::new_valid(1, 2, HaRole::General)))
            .is_err());
    }

    #[test]
    fn duplicate_id_fails() {
        let mut db = PointDatabase::new(4);
        db.insert(Box::new(Uint32Point::new_valid(0, 1, HaRole::General))).unwrap();
        assert!(db
            .insert(Box::new(Uint32Point::new_valid(0, 2, HaRole::General)))
            .is_err());
    }

    #[test]
    fn apply_setters_copies_value_onto_target() {
        let mut db = PointDatabase::new(4);
        db.insert(Box::new(Uint32Point::new_invalid(0, HaRole::General))).unwrap();
        db.insert(Box::new(Uint32Point::new_valid(1, 128, HaRole::General))).unwrap();
        db.apply_setters(&[(0, 1)]).unwrap();
        let target = db.lookup(0).unwrap().as_any().downcast_ref::<Uint32Point>().unwrap();
        assert_eq!(target.read(), Some(128));
    }
}
