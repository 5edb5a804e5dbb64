//! Boolean gate families (spec.md §4.4): N-ary AND/OR gates and the
//! element-wise Not gate, grounded on
//! `examples/original_source/src/Fxt/Component/Digital/_0test/not16gate.cpp`.

use crate::component::{read_bool, verify_bool_ref, write_bool, ComponentLogic, PointRef};
use crate::error::{ComponentErr, Error, Result};
use crate::point::database::PointDatabase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    And,
    Or,
}

/// N-ary boolean gate (spec.md §4.4): "if *any* input is invalid, all
/// outputs become invalid; otherwise outputs are computed and the
/// optional per-output `negate` is applied."
pub struct BooleanGate {
    kind: GateKind,
    inputs: Vec<PointRef>,
    outputs: Vec<PointRef>,
}

impl BooleanGate {
    pub fn new(kind: GateKind, inputs: Vec<PointRef>, outputs: Vec<PointRef>) -> Result<Self> {
        if inputs.is_empty() {
            return Err(ComponentErr::MissingRequiredField.full());
        }
        Ok(Self { kind, inputs, outputs })
    }
}

impl ComponentLogic for BooleanGate {
    fn type_guid(&self) -> &'static str {
        match self.kind {
            GateKind::And => "c0mp0001-0000-0000-0000-000000000001",
            GateKind::Or => "c0mp0001-0000-0000-0000-000000000002",
        }
    }

    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        for r in self.inputs.iter().chain(self.outputs.iter()) {
            verify_bool_ref(point_db, r.id)?;
        }
        Ok(())
    }

    fn execute_once(&mut self, point_db: &mut PointDatabase, _now_us: u64) -> Result<()> {
        let mut result = match self.kind {
            GateKind::And => true,
            GateKind::Or => false,
        };
        let mut any_invalid = false;
        for r in &self.inputs {
            match read_bool(point_db, r.id)? {
                Some(v) => {
                    let v = v ^ r.negate;
                    result = match self.kind {
                        GateKind::And => result && v,
                        GateKind::Or => result || v,
                    };
                }
                None => {
                    any_invalid = true;
                    break;
                }
            }
        }

        for out in &self.outputs {
            if any_invalid {
                write_bool(point_db, out.id, None)?;
            } else {
                write_bool(point_db, out.id, Some(result ^ out.negate))?;
            }
        }
        Ok(())
    }
}

/// N-wide element-wise NOT gate: each output is the negation of its
/// corresponding input, invalidity propagated per-element rather than
/// gang-invalidating the whole gate.
pub struct NotGate {
    pairs: Vec<(PointRef, PointRef)>,
}

impl NotGate {
    pub fn new(pairs: Vec<(PointRef, PointRef)>) -> Result<Self> {
        if pairs.is_empty() {
            return Err(ComponentErr::MissingRequiredField.full());
        }
        Ok(Self { pairs })
    }
}

impl ComponentLogic for NotGate {
    fn type_guid(&self) -> &'static str {
        "c0mp0001-0000-0000-0000-000000000003"
    }

    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        for (input, output) in &self.pairs {
            verify_bool_ref(point_db, input.id)?;
            verify_bool_ref(point_db, output.id)?;
        }
        Ok(())
    }

    fn execute_once(&mut self, point_db: &mut PointDatabase, _now_us: u64) -> Result<()> {
        for (input, output) in &self.pairs {
            let value = read_bool(point_db, input.id)?;
            let negated = value.map(|v| (!(v ^ input.negate)) ^ output.negate);
            write_bool(point_db, output.id, negated)?;
        }
        Ok(())
    }
}
