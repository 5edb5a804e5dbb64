//! Analog scaler (spec.md §4.4): affine `y = m*x + b`, clamped to the
//! output type's range on overflow rather than left undefined.

use crate::component::{read_f32, verify_f32_ref, write_f32, ComponentLogic, PointRef};
use crate::error::{ComponentErr, Error, Result};
use crate::point::database::PointDatabase;

pub struct AffineScaler {
    input: PointRef,
    output: PointRef,
    m: f32,
    b: f32,
    out_min: f32,
    out_max: f32,
}

impl AffineScaler {
    pub fn new(input: PointRef, output: PointRef, m: f32, b: f32, out_min: f32, out_max: f32) -> Result<Self> {
        if out_min > out_max {
            return Err(ComponentErr::MissingRequiredField.full());
        }
        Ok(Self { input, output, m, b, out_min, out_max })
    }
}

impl ComponentLogic for AffineScaler {
    fn type_guid(&self) -> &'static str {
        "c0mp0003-0000-0000-0000-000000000001"
    }

    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        verify_f32_ref(point_db, self.input.id)?;
        verify_f32_ref(point_db, self.output.id)
    }

    fn execute_once(&mut self, point_db: &mut PointDatabase, _now_us: u64) -> Result<()> {
        let value = read_f32(point_db, self.input.id)?;
        let scaled = value.map(|x| (self.m * x + self.b).clamp(self.out_min, self.out_max));
        write_f32(point_db, self.output.id, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::HaRole;
    use crate::point::scalar::Float32Point;

    #[test]
    fn affine_scales_and_clamps() {
        let mut db = PointDatabase::new(4);
        db.insert(Box::new(Float32Point::new_valid(0, 100.0, HaRole::General))).unwrap();
        db.insert(Box::new(Float32Point::new_invalid(1, HaRole::General))).unwrap();

        let mut scaler = AffineScaler::new(PointRef::new(0), PointRef::new(1), 2.0, 0.0, 0.0, 50.0).unwrap();
        scaler.resolve_references(&db).unwrap();
        scaler.execute_once(&mut db, 0).unwrap();

        assert_eq!(read_f32(&db, 1).unwrap(), Some(50.0));
    }

    #[test]
    fn invalid_input_invalidates_output() {
        let mut db = PointDatabase::new(4);
        db.insert(Box::new(Float32Point::new_invalid(0, HaRole::General))).unwrap();
        db.insert(Box::new(Float32Point::new_valid(1, 1.0, HaRole::General))).unwrap();

        let mut scaler = AffineScaler::new(PointRef::new(0), PointRef::new(1), 1.0, 0.0, -1.0, 1.0).unwrap();
        scaler.resolve_references(&db).unwrap();
        scaler.execute_once(&mut db, 0).unwrap();
        assert_eq!(read_f32(&db, 1).unwrap(), None);
    }
}
