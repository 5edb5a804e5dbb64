//! `Chassis`: one scheduling thread owning a set of Cards and LogicChains,
//! cycling scan -> execute -> flush -> sleep at a declared rate (spec.md
//! §4.6).

use std::time::Instant;

use crate::card::database::CardDatabase;
use crate::clock::{Clock, TimingSource};
use crate::error::{ChassisErr, Error, Result};
use crate::logic_chain::LogicChain;
use crate::point::database::PointDatabase;

/// A Chassis's last-observed health, surfaced to `Node` without tearing
/// the cycle down -- a Card or LogicChain error is recorded and the
/// Chassis keeps running the remaining steps of that cycle and every
/// cycle after (spec.md §4.6 "a single cycle's failure does not stop the
/// Chassis").
pub struct Chassis {
    name: String,
    cards: CardDatabase,
    logic_chains: Vec<LogicChain>,
    timing: TimingSource,
    started: bool,
    last_error: Option<Error>,
}

impl Chassis {
    pub fn new(name: String, cards: CardDatabase, logic_chains: Vec<LogicChain>, timing: TimingSource) -> Result<Self> {
        if logic_chains.is_empty() {
            return Err(ChassisErr::NoMemoryLogicChainList.full());
        }
        Ok(Self {
            name,
            cards,
            logic_chains,
            timing,
            started: false,
            last_error: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<()> {
        for chain in &mut self.logic_chains {
            chain.resolve_references(point_db)?;
        }
        Ok(())
    }

    /// Start every Card then every LogicChain. Rolls back (stops) anything
    /// already started on a partial failure, mirroring `LogicChain::start`.
    pub fn start(&mut self, point_db: &mut PointDatabase, now_us: u64) -> Result<()> {
        let mut started_cards = 0usize;
        for card in self.cards.iter_mut() {
            if let Err(e) = card.start(point_db) {
                for card in self.cards.iter_mut().take(started_cards) {
                    let _ = card.stop(point_db);
                }
                return Err(e);
            }
            started_cards += 1;
        }

        let mut started_chains = 0usize;
        for chain in &mut self.logic_chains {
            if let Err(e) = chain.start(now_us) {
                for chain in self.logic_chains.iter_mut().take(started_chains) {
                    chain.stop();
                }
                for card in self.cards.iter_mut() {
                    let _ = card.stop(point_db);
                }
                return Err(e);
            }
            started_chains += 1;
        }

        self.started = true;
        self.last_error = None;
        Ok(())
    }

    pub fn stop(&mut self, point_db: &mut PointDatabase) {
        for chain in &mut self.logic_chains {
            chain.stop();
        }
        for card in self.cards.iter_mut() {
            let _ = card.stop(point_db);
        }
        self.started = false;
    }

    /// One scan -> execute -> flush pass. Every step runs even if an
    /// earlier one in the same cycle failed, so a single bad Card or
    /// LogicChain does not starve its siblings of their turn (spec.md
    /// §4.6). The first error observed during the cycle, if any, is
    /// recorded on `self.last_error` and returned.
    pub fn run_cycle(&mut self, point_db: &mut PointDatabase, now_us: u64) -> Result<()> {
        let mut first_error: Option<Error> = None;

        for card in self.cards.iter_mut() {
            if let Err(e) = card.scan_inputs(point_db) {
                first_error.get_or_insert(e);
            }
        }

        for chain in &mut self.logic_chains {
            if let Err(e) = chain.execute(point_db, now_us) {
                first_error.get_or_insert(e);
            }
        }

        for card in self.cards.iter_mut() {
            if let Err(e) = card.flush_outputs(point_db) {
                first_error.get_or_insert(e);
            }
        }

        self.last_error = first_error;
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run cycles back-to-back, sleeping out the remainder of each
    /// period, until `should_continue` returns false. Intended to be the
    /// body of the Chassis's dedicated thread (spec.md §4.6).
    pub fn run_until(&mut self, point_db: &mut PointDatabase, clock: &dyn Clock, mut should_continue: impl FnMut() -> bool) {
        while should_continue() {
            let cycle_start = Instant::now();
            let now_us = clock.now_us();
            if let Err(e) = self.run_cycle(point_db, now_us) {
                log::warn!("chassis {} cycle error {e}", self.name);
            }
            self.timing.sleep_remainder(clock, cycle_start.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::HaRole;
    use crate::card::mock::MockDigital8;
    use crate::card::ChannelMap;
    use crate::clock::ManualClock;
    use crate::component::gate::{BooleanGate, GateKind};
    use crate::component::{Component, LatchingComponent, PointRef};
    use crate::point::scalar::{BoolPoint, Uint8Point};

    fn build_chassis() -> (Chassis, PointDatabase) {
        let mut db = PointDatabase::new(16);
        db.insert(Box::new(Uint8Point::new_valid(0, 0, HaRole::General))).unwrap(); // card input point
        db.insert(Box::new(Uint8Point::new_valid(1, 0, HaRole::CardStateful))).unwrap(); // input io-reg
        db.insert(Box::new(Uint8Point::new_valid(2, 0, HaRole::General))).unwrap(); // card output point
        db.insert(Box::new(Uint8Point::new_valid(3, 0, HaRole::CardStateful))).unwrap(); // output io-reg
        db.insert(Box::new(BoolPoint::new_invalid(4, HaRole::General))).unwrap();
        db.insert(Box::new(BoolPoint::new_valid(5, true, HaRole::General))).unwrap();

        let card = MockDigital8::new(
            0,
            "card0".into(),
            vec![ChannelMap { channel: 1, point_id: 0, io_reg_id: 1 }],
            vec![ChannelMap { channel: 1, point_id: 2, io_reg_id: 3 }],
        )
        .unwrap();
        let mut cards = CardDatabase::new(4);
        cards.insert(Box::new(card)).unwrap();

        let component: Box<dyn Component> = Box::new(LatchingComponent::new(
            "gate1".into(),
            BooleanGate::new(GateKind::And, vec![PointRef::new(5)], vec![PointRef::new(4)]).unwrap(),
        ));
        let chain = LogicChain::new("chain1".into(), vec![component], vec![]).unwrap();

        let chassis = Chassis::new("chassis0".into(), cards, vec![chain], TimingSource::new(10, 1)).unwrap();
        (chassis, db)
    }

    #[test]
    fn cycle_runs_scan_execute_flush_in_order() {
        let (mut chassis, mut db) = build_chassis();
        chassis.resolve_references(&db).unwrap();
        chassis.start(&mut db, 0).unwrap();
        chassis.run_cycle(&mut db, 0).unwrap();
        assert!(chassis.last_error().is_none());
    }

    #[test]
    fn manual_clock_drives_run_until_exact_iterations() {
        let (mut chassis, mut db) = build_chassis();
        chassis.resolve_references(&db).unwrap();
        chassis.start(&mut db, 0).unwrap();
        let clock = ManualClock::new();
        let mut remaining = 3;
        chassis.run_until(&mut db, &clock, || {
            if remaining == 0 {
                false
            } else {
                remaining -= 1;
                true
            }
        });
        assert_eq!(remaining, 0);
    }
}
