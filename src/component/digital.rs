//! Byte-wide digital components: demux (byte -> bits) and mux (bits ->
//! byte), grounded on
//! `examples/original_source/src/Fxt/Component/Digital/Mux8Uint8.h` and
//! `.../Digital/_0test/{bytedemux,mux8uint8factory}.cpp` (spec.md §8
//! scenarios 2 and 3).

use crate::component::{read_bool, read_u8, verify_bool_ref, verify_u8_ref, write_bool, write_u8, ComponentLogic, PointRef};
use crate::error::{ComponentErr, DigitalErr, Error, Result};
use crate::point::database::PointDatabase;

fn validate_bit(bit: Option<u8>) -> Result<u8> {
    let bit = bit.ok_or(ComponentErr::MissingRequiredField.full())?;
    if bit > 7 {
        return Err(DigitalErr::DemuxInvalidBitOffset.full());
    }
    Ok(bit)
}

/// One byte-wide integer input; each output is a specified bit position,
/// optionally negated. Invalid input invalidates every output.
pub struct ByteDemux {
    input: PointRef,
    outputs: Vec<PointRef>,
}

impl ByteDemux {
    pub fn new(input: PointRef, outputs: Vec<PointRef>) -> Result<Self> {
        if outputs.is_empty() {
            return Err(DigitalErr::EmptyInputSet.full());
        }
        for out in &outputs {
            validate_bit(out.bit)?;
        }
        Ok(Self { input, outputs })
    }
}

impl ComponentLogic for ByteDemux {
    fn type_guid(&self) -> &'static str {
        "c0mp0002-0000-0000-0000-000000000001"
    }

    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        verify_u8_ref(point_db, self.input.id)?;
        for out in &self.outputs {
            verify_bool_ref(point_db, out.id)?;
        }
        Ok(())
    }

    fn execute_once(&mut self, point_db: &mut PointDatabase, _now_us: u64) -> Result<()> {
        let value = read_u8(point_db, self.input.id)?;
        for out in &self.outputs {
            let bit = validate_bit(out.bit)?;
            let bool_value = value.map(|v| (((v >> bit) & 1) != 0) ^ out.negate);
            write_bool(point_db, out.id, bool_value)?;
        }
        Ok(())
    }
}

/// Up to 8 bit-indexed boolean inputs assembled into one byte-wide
/// integer output. Any invalid referenced input invalidates the output.
pub struct Mux8Uint8 {
    inputs: Vec<PointRef>,
    output: PointRef,
}

impl Mux8Uint8 {
    pub fn new(inputs: Vec<PointRef>, output: PointRef) -> Result<Self> {
        if inputs.is_empty() {
            return Err(DigitalErr::EmptyInputSet.full());
        }
        for input in &inputs {
            validate_bit(input.bit)?;
        }
        Ok(Self { inputs, output })
    }
}

impl ComponentLogic for Mux8Uint8 {
    fn type_guid(&self) -> &'static str {
        "c0mp0002-0000-0000-0000-000000000002"
    }

    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        for input in &self.inputs {
            verify_bool_ref(point_db, input.id)?;
        }
        verify_u8_ref(point_db, self.output.id)
    }

    fn execute_once(&mut self, point_db: &mut PointDatabase, _now_us: u64) -> Result<()> {
        let mut byte: u8 = 0;
        for input in &self.inputs {
            let bit = validate_bit(input.bit)?;
            match read_bool(point_db, input.id)? {
                Some(v) => {
                    if v ^ input.negate {
                        byte |= 1 << bit;
                    }
                }
                None => {
                    write_u8(point_db, self.output.id, None)?;
                    return Ok(());
                }
            }
        }
        write_u8(point_db, self.output.id, Some(byte))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::HaRole;
    use crate::point::scalar::{BoolPoint, Uint8Point};

    #[test]
    fn scenario_byte_demux() {
        let mut db = PointDatabase::new(16);
        db.insert(Box::new(Uint8Point::new_valid(0, 0x32, HaRole::General))).unwrap();
        for id in 1..=5u32 {
            db.insert(Box::new(BoolPoint::new_invalid(id, HaRole::General))).unwrap();
        }

        let mut demux = ByteDemux::new(
            PointRef::new(0),
            vec![
                PointRef { id: 1, negate: false, bit: Some(1) },
                PointRef { id: 2, negate: true, bit: Some(1) },
                PointRef { id: 3, negate: false, bit: Some(4) },
                PointRef { id: 4, negate: true, bit: Some(4) },
                PointRef { id: 5, negate: true, bit: Some(5) },
            ],
        )
        .unwrap();
        demux.resolve_references(&db).unwrap();
        demux.execute_once(&mut db, 0).unwrap();

        assert_eq!(read_bool(&db, 1).unwrap(), Some(true));
        assert_eq!(read_bool(&db, 2).unwrap(), Some(false));
        assert_eq!(read_bool(&db, 3).unwrap(), Some(true));
        assert_eq!(read_bool(&db, 4).unwrap(), Some(false));
        assert_eq!(read_bool(&db, 5).unwrap(), Some(false));
    }

    #[test]
    fn scenario_mux8uint8() {
        let mut db = PointDatabase::new(16);
        db.insert(Box::new(BoolPoint::new_valid(0, true, HaRole::General))).unwrap(); // bit 4
        db.insert(Box::new(BoolPoint::new_valid(1, true, HaRole::General))).unwrap(); // bit 0, negated
        db.insert(Box::new(BoolPoint::new_valid(2, false, HaRole::General))).unwrap(); // bit 1
        db.insert(Box::new(Uint8Point::new_invalid(3, HaRole::General))).unwrap();

        let mut mux = Mux8Uint8::new(
            vec![
                PointRef { id: 0, negate: false, bit: Some(4) },
                PointRef { id: 1, negate: true, bit: Some(0) },
                PointRef { id: 2, negate: false, bit: Some(1) },
            ],
            PointRef::new(3),
        )
        .unwrap();
        mux.resolve_references(&db).unwrap();
        mux.execute_once(&mut db, 0).unwrap();

        assert_eq!(read_u8(&db, 3).unwrap(), Some(0x10));
    }

    #[test]
    fn invalid_input_invalidates_output() {
        let mut db = PointDatabase::new(16);
        db.insert(Box::new(Uint8Point::new_invalid(0, HaRole::General))).unwrap();
        db.insert(Box::new(BoolPoint::new_valid(1, false, HaRole::General))).unwrap();

        let mut demux = ByteDemux::new(PointRef::new(0), vec![PointRef { id: 1, negate: false, bit: Some(0) }]).unwrap();
        demux.resolve_references(&db).unwrap();
        demux.execute_once(&mut db, 0).unwrap();
        assert_eq!(read_bool(&db, 1).unwrap(), None);
    }
}
