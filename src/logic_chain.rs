//! `LogicChain`: an ordered list of Components executed once per Chassis
//! cycle, plus the auto-points it owns (spec.md §4.5).

use crate::component::Component;
use crate::error::{Error, LogicChainErr, Result};
use crate::point::database::PointDatabase;
use crate::point::PointId;

/// Ordered list of Components plus the auto-points created alongside them
/// (spec.md §4.5: "a LogicChain owns its Components and the auto-points
/// its JSON declares; both are fixed once `resolve_references` succeeds").
pub struct LogicChain {
    name: String,
    components: Vec<Box<dyn Component>>,
    auto_points: Vec<PointId>,
    started: bool,
    last_error: Option<Error>,
}

impl LogicChain {
    pub fn new(name: String, components: Vec<Box<dyn Component>>, auto_points: Vec<PointId>) -> Result<Self> {
        if components.is_empty() {
            return Err(LogicChainErr::NoComponents.full());
        }
        Ok(Self {
            name,
            components,
            auto_points,
            started: false,
            last_error: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn auto_points(&self) -> &[PointId] {
        &self.auto_points
    }

    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// Resolve every Component's referenced Points in declaration order,
    /// returning the first failure (spec.md §4.7 step (d)).
    pub fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        for component in &mut self.components {
            component
                .resolve_references(point_db)
                .map_err(|_| LogicChainErr::FailedPointResolve.full())?;
        }
        Ok(())
    }

    /// Start every Component in order. If one fails partway, the
    /// already-started Components are stopped again before returning the
    /// error, so a failed `start()` leaves the chain fully stopped.
    pub fn start(&mut self, now_us: u64) -> Result<()> {
        for idx in 0..self.components.len() {
            if let Err(e) = self.components[idx].start(now_us) {
                for rollback in &mut self.components[..idx] {
                    rollback.stop();
                }
                return Err(e);
            }
        }
        self.started = true;
        self.last_error = None;
        Ok(())
    }

    pub fn stop(&mut self) {
        for component in &mut self.components {
            component.stop();
        }
        self.started = false;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Execute every Component once, in declaration order. Stops at the
    /// first error and records it; later Components in the same chain do
    /// not run that cycle (spec.md §4.5 "first failing Component halts the
    /// chain for that cycle").
    pub fn execute(&mut self, point_db: &mut PointDatabase, now_us: u64) -> Result<()> {
        for component in &mut self.components {
            if let Err(e) = component.execute(point_db, now_us) {
                self.last_error = Some(e);
                return Err(LogicChainErr::ComponentFailure.full());
            }
        }
        self.last_error = None;
        Ok(())
    }
}
