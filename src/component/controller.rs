//! On/off controller with deadband hysteresis (spec.md §4.4
//! "Controllers"), grounded on
//! `examples/original_source/src/Fxt/Component/Controller/_0test/onofffactory.cpp`.
//! The previous-sample memory this family keeps between cycles mirrors the
//! `prev_error`/`integral` state the teacher's `PidController`
//! (`src/control/pid.rs`) carries between `compute()` calls, reset by the
//! same kind of explicit `reset()` call on restart.

use crate::component::{read_bool, read_f32, verify_bool_ref, verify_f32_ref, write_bool, ComponentLogic, PointRef};
use crate::error::{ComponentErr, Error, Result};
use crate::point::database::PointDatabase;

/// Turns `output` on when `measurement` crosses `setpoint + deadband / 2`
/// and off when it falls below `setpoint - deadband / 2`, holding its
/// prior state in between (classic hysteresis). An explicit `enable`
/// input (optional) forces the output off when false regardless of
/// measurement.
pub struct OnOffController {
    measurement: PointRef,
    enable: Option<PointRef>,
    output: PointRef,
    setpoint: f32,
    deadband: f32,
    prev_output: bool,
}

impl OnOffController {
    pub fn new(measurement: PointRef, enable: Option<PointRef>, output: PointRef, setpoint: f32, deadband: f32) -> Result<Self> {
        if deadband < 0.0 {
            return Err(ComponentErr::MissingRequiredField.full());
        }
        Ok(Self {
            measurement,
            enable,
            output,
            setpoint,
            deadband,
            prev_output: false,
        })
    }
}

impl ComponentLogic for OnOffController {
    fn type_guid(&self) -> &'static str {
        "c0mp0004-0000-0000-0000-000000000001"
    }

    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        verify_f32_ref(point_db, self.measurement.id)?;
        if let Some(enable) = &self.enable {
            verify_bool_ref(point_db, enable.id)?;
        }
        verify_bool_ref(point_db, self.output.id)
    }

    fn reset(&mut self) {
        self.prev_output = false;
    }

    fn execute_once(&mut self, point_db: &mut PointDatabase, _now_us: u64) -> Result<()> {
        let Some(measurement) = read_f32(point_db, self.measurement.id)? else {
            write_bool(point_db, self.output.id, None)?;
            return Ok(());
        };

        let enabled = match &self.enable {
            Some(enable) => read_bool(point_db, enable.id)?,
            None => Some(true),
        };
        let Some(enabled) = enabled else {
            write_bool(point_db, self.output.id, None)?;
            return Ok(());
        };
        if !enabled {
            self.prev_output = false;
            write_bool(point_db, self.output.id, Some(false))?;
            return Ok(());
        }

        let half = self.deadband / 2.0;
        let new_output = if measurement >= self.setpoint + half {
            true
        } else if measurement <= self.setpoint - half {
            false
        } else {
            self.prev_output
        };
        self.prev_output = new_output;
        write_bool(point_db, self.output.id, Some(new_output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::HaRole;
    use crate::point::scalar::{BoolPoint, Float32Point};

    fn build() -> (OnOffController, PointDatabase) {
        let mut db = PointDatabase::new(4);
        db.insert(Box::new(Float32Point::new_valid(0, 20.0, HaRole::General))).unwrap();
        db.insert(Box::new(BoolPoint::new_invalid(1, HaRole::General))).unwrap();
        let mut ctl = OnOffController::new(PointRef::new(0), None, PointRef::new(1), 25.0, 2.0).unwrap();
        ctl.resolve_references(&db).unwrap();
        (ctl, db)
    }

    #[test]
    fn holds_state_inside_deadband() {
        let (mut ctl, mut db) = build();
        ctl.execute_once(&mut db, 0).unwrap();
        assert_eq!(read_bool(&db, 1).unwrap(), Some(false));

        // Cross above the upper deadband edge: turns on.
        db.lookup_mut(0)
            .unwrap()
            .as_any_mut()
            .downcast_mut::<Float32Point>()
            .unwrap()
            .write(26.5, crate::point::LockRequest::Noop);
        ctl.execute_once(&mut db, 1).unwrap();
        assert_eq!(read_bool(&db, 1).unwrap(), Some(true));

        // Still inside the deadband on the way down: holds prior state.
        db.lookup_mut(0)
            .unwrap()
            .as_any_mut()
            .downcast_mut::<Float32Point>()
            .unwrap()
            .write(24.5, crate::point::LockRequest::Noop);
        ctl.execute_once(&mut db, 2).unwrap();
        assert_eq!(read_bool(&db, 1).unwrap(), Some(true));
    }

    #[test]
    fn reset_clears_memory_on_restart() {
        let (mut ctl, mut db) = build();
        ctl.prev_output = true;
        ctl.reset();
        assert!(!ctl.prev_output);
        let _ = &mut db;
    }
}
