//! The Component framework: pure functions from input Points to output
//! Points, executed once per Chassis cycle (spec.md §4.4).

pub mod factory;
pub mod gate;
pub mod digital;
pub mod scaler;
pub mod controller;

use crate::error::{ComponentErr, Error, Result};
use crate::point::database::PointDatabase;
use crate::point::scalar::{BoolPoint, Uint8Point};
use crate::point::PointId;

/// Shared point-access helpers used by every concrete `ComponentLogic`
/// family below -- downcast-and-read/write against the well-known scalar
/// kinds each family operates on.
pub(crate) fn read_bool(db: &PointDatabase, id: PointId) -> Result<Option<bool>> {
    let p = db.lookup(id).ok_or(ComponentErr::UnresolvedInputReference.full())?;
    let p = p
        .as_any()
        .downcast_ref::<BoolPoint>()
        .ok_or(ComponentErr::InputReferenceBadType.full())?;
    Ok(p.read())
}

pub(crate) fn write_bool(db: &mut PointDatabase, id: PointId, value: Option<bool>) -> Result<()> {
    let p = db.lookup_mut(id).ok_or(ComponentErr::UnresolvedOutputReference.full())?;
    let p = p
        .as_any_mut()
        .downcast_mut::<BoolPoint>()
        .ok_or(ComponentErr::OutputReferenceBadType.full())?;
    match value {
        Some(v) => p.write(v, crate::point::LockRequest::Noop),
        None => p.set_invalid(crate::point::LockRequest::Noop),
    }
    Ok(())
}

pub(crate) fn read_u8(db: &PointDatabase, id: PointId) -> Result<Option<u8>> {
    let p = db.lookup(id).ok_or(ComponentErr::UnresolvedInputReference.full())?;
    let p = p
        .as_any()
        .downcast_ref::<Uint8Point>()
        .ok_or(ComponentErr::InputReferenceBadType.full())?;
    Ok(p.read())
}

pub(crate) fn write_u8(db: &mut PointDatabase, id: PointId, value: Option<u8>) -> Result<()> {
    let p = db.lookup_mut(id).ok_or(ComponentErr::UnresolvedOutputReference.full())?;
    let p = p
        .as_any_mut()
        .downcast_mut::<Uint8Point>()
        .ok_or(ComponentErr::OutputReferenceBadType.full())?;
    match value {
        Some(v) => p.write(v, crate::point::LockRequest::Noop),
        None => p.set_invalid(crate::point::LockRequest::Noop),
    }
    Ok(())
}

/// Verify a Point exists and is the expected concrete type, without
/// reading its value -- used by `resolve_references`.
pub(crate) fn verify_bool_ref(db: &PointDatabase, id: PointId) -> Result<()> {
    let p = db.lookup(id).ok_or(ComponentErr::UnresolvedInputReference.full())?;
    if p.as_any().downcast_ref::<BoolPoint>().is_none() {
        return Err(ComponentErr::InputReferenceBadType.full());
    }
    Ok(())
}

pub(crate) fn verify_u8_ref(db: &PointDatabase, id: PointId) -> Result<()> {
    let p = db.lookup(id).ok_or(ComponentErr::UnresolvedInputReference.full())?;
    if p.as_any().downcast_ref::<Uint8Point>().is_none() {
        return Err(ComponentErr::InputReferenceBadType.full());
    }
    Ok(())
}

pub(crate) fn read_f32(db: &PointDatabase, id: PointId) -> Result<Option<f32>> {
    let p = db.lookup(id).ok_or(ComponentErr::UnresolvedInputReference.full())?;
    let p = p
        .as_any()
        .downcast_ref::<crate::point::scalar::Float32Point>()
        .ok_or(ComponentErr::InputReferenceBadType.full())?;
    Ok(p.read())
}

pub(crate) fn write_f32(db: &mut PointDatabase, id: PointId, value: Option<f32>) -> Result<()> {
    let p = db.lookup_mut(id).ok_or(ComponentErr::UnresolvedOutputReference.full())?;
    let p = p
        .as_any_mut()
        .downcast_mut::<crate::point::scalar::Float32Point>()
        .ok_or(ComponentErr::OutputReferenceBadType.full())?;
    match value {
        Some(v) => p.write(v, crate::point::LockRequest::Noop),
        None => p.set_invalid(crate::point::LockRequest::Noop),
    }
    Ok(())
}

pub(crate) fn verify_f32_ref(db: &PointDatabase, id: PointId) -> Result<()> {
    let p = db.lookup(id).ok_or(ComponentErr::UnresolvedInputReference.full())?;
    if p.as_any().downcast_ref::<crate::point::scalar::Float32Point>().is_none() {
        return Err(ComponentErr::InputReferenceBadType.full());
    }
    Ok(())
}

/// One input or output wire. `negate` applies to boolean values;
/// `bit` selects a bit position for demux/mux families (spec.md §3
/// "Component").
#[derive(Debug, Clone, Copy)]
pub struct PointRef {
    pub id: PointId,
    pub negate: bool,
    pub bit: Option<u8>,
}

impl PointRef {
    pub const fn new(id: PointId) -> Self {
        Self { id, negate: false, bit: None }
    }
}

/// The per-family logic a concrete Component kind implements. Wrapped by
/// [`LatchingComponent`], which supplies the common
/// start/stop/latch-on-error bookkeeping every Component needs (spec.md
/// §4.4: "Once a component has returned an error, every subsequent
/// `execute` returns the same error... until `stop()` then `start()`").
pub trait ComponentLogic: Send + Sync {
    fn type_guid(&self) -> &'static str;

    /// Validate that every referenced Point exists in `point_db` and has
    /// the concrete type this Component requires (spec.md §4.4).
    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()>;

    /// One cycle's worth of read-compute-write, with no latch bookkeeping.
    fn execute_once(&mut self, point_db: &mut PointDatabase, now_us: u64) -> Result<()>;

    /// Clear any stateful-arena memory a family keeps between cycles
    /// (e.g. a controller's previous sample). Called on `start()`; a
    /// Component carries no memory across `stop()`/`start()` (spec.md
    /// §4.4 "Controllers"). Most families are stateless and accept the
    /// default no-op.
    fn reset(&mut self) {}
}

/// The object-safe Component contract (spec.md §4.4).
pub trait Component: Send + Sync {
    fn name(&self) -> &str;
    fn type_guid(&self) -> &'static str;
    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()>;
    fn start(&mut self, now_us: u64) -> Result<()>;
    fn stop(&mut self);
    fn is_started(&self) -> bool;
    fn execute(&mut self, point_db: &mut PointDatabase, now_us: u64) -> Result<()>;
}

/// Generic latch/lifecycle wrapper around any [`ComponentLogic`]. Every
/// concrete Component kind (`AndGate`, `ByteDemux`, ...) is this type
/// instantiated over its own logic struct -- the Component-side analogue of
/// `Scalar<T>` covering every scalar Point kind with one generic impl.
pub struct LatchingComponent<L: ComponentLogic> {
    name: String,
    logic: L,
    started: bool,
    start_time_us: u64,
    latched_error: Option<Error>,
}

impl<L: ComponentLogic> LatchingComponent<L> {
    pub fn new(name: String, logic: L) -> Self {
        Self {
            name,
            logic,
            started: false,
            start_time_us: 0,
            latched_error: None,
        }
    }

    pub fn logic(&self) -> &L {
        &self.logic
    }
}

impl<L: ComponentLogic> Component for LatchingComponent<L> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_guid(&self) -> &'static str {
        self.logic.type_guid()
    }

    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        self.logic.resolve_references(point_db)
    }

    fn start(&mut self, now_us: u64) -> Result<()> {
        self.started = true;
        self.start_time_us = now_us;
        self.latched_error = None;
        self.logic.reset();
        Ok(())
    }

    fn stop(&mut self) {
        self.started = false;
        self.latched_error = None;
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn execute(&mut self, point_db: &mut PointDatabase, now_us: u64) -> Result<()> {
        if !self.started {
            return Err(ComponentErr::FailedStart.full());
        }
        if let Some(latched) = self.latched_error {
            return Err(latched);
        }
        match self.logic.execute_once(point_db, now_us) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.latched_error = Some(e);
                log::warn!("component {} latched error {e}", self.name);
                Err(e)
            }
        }
    }
}
