//! `MockDigital8`: an 8-channel software-simulated digital card used for
//! host-side testing without real hardware, grounded directly on
//! `examples/original_source/src/Fxt/Card/Mock/_0test/digital8.cpp`'s JSON
//! shape and test flow (spec.md §8 scenario 5).
//!
//! Each channel pairs one `Uint8` Point (what Components see) with one
//! `Uint8` IO-register Point (the hardware-facing twin). Test code pokes
//! the register directly to simulate a hardware sample arriving, the same
//! way the original test's `setInputBit`/`toggleInputBit`/`clearInputBit`
//! helpers manipulate the register Point rather than real hardware.

use crate::card::{Card, CardState, ChannelMap};
use crate::error::{CardErr, Error, Result};
use crate::point::database::PointDatabase;
use crate::point::scalar::Uint8Point;
use crate::point::LockRequest;

pub const TYPE_GUID: &str = "c4a00000-0000-0000-0000-000000000001";
pub const TYPE_NAME: &str = "Fxt::Card::Mock::Digital8";

pub struct MockDigital8 {
    local_id: u32,
    name: String,
    state: CardState,
    inputs: Vec<ChannelMap>,
    outputs: Vec<ChannelMap>,
}

impl MockDigital8 {
    pub fn new(local_id: u32, name: String, inputs: Vec<ChannelMap>, outputs: Vec<ChannelMap>) -> Result<Self> {
        crate::card::validate_channel_assignments(&inputs.iter().map(|c| c.channel).collect::<Vec<_>>())?;
        crate::card::validate_channel_assignments(&outputs.iter().map(|c| c.channel).collect::<Vec<_>>())?;
        Ok(Self {
            local_id,
            name,
            state: CardState::Created,
            inputs,
            outputs,
        })
    }

    fn read_uint8(point_db: &PointDatabase, id: crate::point::PointId) -> Result<Option<u8>> {
        let p = point_db.lookup(id).ok_or(CardErr::PointMissingId.full())?;
        let p = p
            .as_any()
            .downcast_ref::<Uint8Point>()
            .ok_or(CardErr::PointTypeMismatch.full())?;
        Ok(p.read())
    }

    fn write_uint8(point_db: &mut PointDatabase, id: crate::point::PointId, value: Option<u8>) -> Result<()> {
        let p = point_db.lookup_mut(id).ok_or(CardErr::PointMissingId.full())?;
        let p = p
            .as_any_mut()
            .downcast_mut::<Uint8Point>()
            .ok_or(CardErr::PointTypeMismatch.full())?;
        match value {
            Some(v) => p.write(v, LockRequest::Noop),
            None => p.set_invalid(LockRequest::Noop),
        }
        Ok(())
    }

    /// Test helper: simulate hardware latching `value` into the input
    /// register for `channel`.
    pub fn poke_input_register(&self, point_db: &mut PointDatabase, channel: u8, value: u8) -> Result<()> {
        let ch = self.find_input(channel)?;
        Self::write_uint8(point_db, ch.io_reg_id, Some(value))
    }

    /// Test helper: simulate a hardware read failure ("no data") on the
    /// input register for `channel`.
    pub fn invalidate_input_register(&self, point_db: &mut PointDatabase, channel: u8) -> Result<()> {
        let ch = self.find_input(channel)?;
        Self::write_uint8(point_db, ch.io_reg_id, None)
    }

    /// Test helper: read back what `flush_outputs` last mirrored into the
    /// output register for `channel`.
    pub fn read_output_register(&self, point_db: &PointDatabase, channel: u8) -> Result<Option<u8>> {
        let ch = self.find_output(channel)?;
        Self::read_uint8(point_db, ch.io_reg_id)
    }

    fn find_input(&self, channel: u8) -> Result<&ChannelMap> {
        self.inputs
            .iter()
            .find(|c| c.channel == channel)
            .ok_or(CardErr::CardInvalidId.full())
    }

    fn find_output(&self, channel: u8) -> Result<&ChannelMap> {
        self.outputs
            .iter()
            .find(|c| c.channel == channel)
            .ok_or(CardErr::CardInvalidId.full())
    }
}

impl Card for MockDigital8 {
    fn local_id(&self) -> u32 {
        self.local_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_guid(&self) -> &'static str {
        TYPE_GUID
    }

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn state(&self) -> CardState {
        self.state
    }

    fn start(&mut self, _point_db: &mut PointDatabase) -> Result<()> {
        if self.state == CardState::Started {
            return Err(CardErr::AlreadyStarted.full());
        }
        log::debug!("card {} ({}) starting", self.local_id, self.name);
        self.state = CardState::Started;
        Ok(())
    }

    fn stop(&mut self, _point_db: &mut PointDatabase) -> Result<()> {
        log::debug!("card {} ({}) stopping", self.local_id, self.name);
        self.state = CardState::Stopped;
        Ok(())
    }

    fn scan_inputs(&mut self, point_db: &mut PointDatabase) -> Result<()> {
        for ch in &self.inputs {
            let sampled = Self::read_uint8(point_db, ch.io_reg_id)?;
            Self::write_uint8(point_db, ch.point_id, sampled)?;
        }
        Ok(())
    }

    fn flush_outputs(&mut self, point_db: &mut PointDatabase) -> Result<()> {
        for ch in &self.outputs {
            let value = Self::read_uint8(point_db, ch.point_id)?;
            Self::write_uint8(point_db, ch.io_reg_id, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::HaRole;
    use crate::point::database::PointDatabase;

    fn build_card() -> (MockDigital8, PointDatabase) {
        let mut db = PointDatabase::new(16);
        db.insert(Box::new(Uint8Point::new_valid(1, 128, HaRole::General))).unwrap(); // input point
        db.insert(Box::new(Uint8Point::new_valid(2, 128, HaRole::CardStateful))).unwrap(); // input register
        db.insert(Box::new(Uint8Point::new_invalid(3, HaRole::General))).unwrap(); // output point
        db.insert(Box::new(Uint8Point::new_invalid(4, HaRole::CardStateful))).unwrap(); // output register

        let card = MockDigital8::new(
            0,
            "digital8".to_string(),
            vec![ChannelMap { channel: 1, point_id: 1, io_reg_id: 2 }],
            vec![ChannelMap { channel: 1, point_id: 3, io_reg_id: 4 }],
        )
        .unwrap();
        (card, db)
    }

    #[test]
    fn scenario_card_start_scan_flush() {
        let (mut card, mut db) = build_card();
        card.start(&mut db).unwrap();

        assert_eq!(
            db.lookup(1).unwrap().as_any().downcast_ref::<Uint8Point>().unwrap().read(),
            Some(128)
        );
        assert_eq!(
            db.lookup(2).unwrap().as_any().downcast_ref::<Uint8Point>().unwrap().read(),
            Some(128)
        );

        card.scan_inputs(&mut db).unwrap();
        assert_eq!(
            db.lookup(1).unwrap().as_any().downcast_ref::<Uint8Point>().unwrap().read(),
            Some(128)
        );

        card.invalidate_input_register(&mut db, 1).unwrap();
        card.scan_inputs(&mut db).unwrap();
        assert_eq!(
            db.lookup(1).unwrap().as_any().downcast_ref::<Uint8Point>().unwrap().read(),
            None
        );

        {
            let out = db.lookup_mut(3).unwrap();
            out.as_any_mut().downcast_mut::<Uint8Point>().unwrap().write(32, LockRequest::Noop);
        }
        card.flush_outputs(&mut db).unwrap();
        assert_eq!(card.read_output_register(&db, 1).unwrap(), Some(32));

        {
            let out = db.lookup_mut(3).unwrap();
            out.as_any_mut().downcast_mut::<Uint8Point>().unwrap().set_invalid(LockRequest::Noop);
        }
        card.flush_outputs(&mut db).unwrap();
        assert_eq!(card.read_output_register(&db, 1).unwrap(), None);

        card.stop(&mut db).unwrap();
    }
}
