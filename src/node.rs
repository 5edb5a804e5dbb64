//! `Node`: the top-level runtime. Owns the arenas, the Point/Card/Component
//! factory registries, the shared `PointDatabase`, and one thread per
//! Chassis (spec.md §4.7).
//!
//! Construction follows the JSON build pipeline verbatim: parse the
//! document, create every Card (and its Points), create every LogicChain
//! (Components plus auto-points), resolve references, apply setters to
//! produce initial valid state, then spin up one thread per Chassis and
//! start everything (spec.md §4.7 (a)-(f)).
//!
//! Process-wide access goes through a single global slot rather than the
//! original's static-constructor singleton (spec.md §9 redesign note):
//! [`Node::initialize`] populates the slot, [`Node::take`] hands ownership
//! to the caller (consuming the slot), and a later `initialize` is free to
//! run again once the taken `Node` has been dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use serde_json::Value;

use crate::arena::{Arena, HaRole};
use crate::card::database::CardDatabase;
use crate::card::factory::CardFactoryDatabase;
use crate::chassis::Chassis;
use crate::clock::{Clock, SystemClock, TimingSource};
use crate::component::factory::ComponentFactoryDatabase;
use crate::component::Component;
use crate::config::EngineLimits;
use crate::error::{CardErr, ChassisErr, ComponentErr, Error, LogicChainErr, NodeErr, Result};
use crate::logic_chain::LogicChain;
use crate::point::database::PointDatabase;
use crate::point::factory::PointFactoryDatabase;
use crate::point::PointId;

/// How long [`Node::stop`] waits for each Chassis thread to notice its
/// stop flag and exit before giving up on it and surfacing
/// `NODE_SHUTDOWN_TIMEOUT`. The thread is left detached, not killed --
/// Rust has no safe thread-kill primitive, matching the bounded-wait,
/// not-forced nature of a graceful shutdown.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

static NODE_SLOT: Mutex<Option<Node>> = Mutex::new(None);

struct RunningChassis {
    stop_flag: Arc<AtomicBool>,
    done_rx: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

pub struct Node {
    limits: EngineLimits,
    general_arena: Arena,
    card_stateful_arena: Arena,
    ha_stateful_arena: Arena,
    point_db: Arc<Mutex<PointDatabase>>,
    chassis: Vec<Arc<Mutex<Chassis>>>,
    periods: Vec<Duration>,
    running: Vec<RunningChassis>,
    started: bool,
}

impl Node {
    /// Build a Node from its JSON document without touching the global
    /// slot. Exposed for tests; production code goes through
    /// [`Node::initialize`] + [`Node::take`].
    pub fn build(json: &Value) -> Result<Node> {
        let node_obj = json.get("fxtNode").ok_or(NodeErr::ParseError.full())?;

        let limits = match node_obj.get("limits") {
            Some(v) => serde_json::from_value(v.clone()).map_err(|_| NodeErr::ParseError.full())?,
            None => EngineLimits::default(),
        };

        let mut general_arena = Arena::new(HaRole::General, limits.general_arena_bytes);
        let mut card_stateful_arena = Arena::new(HaRole::CardStateful, limits.card_stateful_arena_bytes);
        let ha_stateful_arena = Arena::new(HaRole::HaStateful, limits.ha_stateful_arena_bytes);

        let point_factories = PointFactoryDatabase::with_builtin_points();
        let card_factories = CardFactoryDatabase::with_builtin_cards();
        let component_factories = ComponentFactoryDatabase::with_builtin_components();

        let mut point_db = PointDatabase::new(limits.max_points);
        let mut setter_links: Vec<(PointId, PointId)> = Vec::new();

        let chassis_json = node_obj.get("chassis").and_then(Value::as_array).ok_or(NodeErr::NoChassis.full())?;
        if chassis_json.is_empty() {
            return Err(NodeErr::NoChassis.full());
        }
        if chassis_json.len() > limits.max_chassis {
            return Err(NodeErr::TooManyChassis.full());
        }

        let mut chassis = Vec::with_capacity(chassis_json.len());
        let mut periods = Vec::with_capacity(chassis_json.len());

        for chassis_entry in chassis_json {
            let name = chassis_entry.get("name").and_then(Value::as_str).unwrap_or("").to_string();
            let scan_rate_msec = chassis_entry.get("scanRateMsec").and_then(Value::as_u64).unwrap_or(100) as u32;
            let scan_rate_multiplier = chassis_entry.get("scanRateMultiplier").and_then(Value::as_u64).unwrap_or(1) as u16;
            let timing = TimingSource::new(scan_rate_msec, scan_rate_multiplier);

            let mut cards = CardDatabase::new(limits.max_cards_per_chassis);
            let cards_json = chassis_entry.get("cards").and_then(Value::as_array).cloned().unwrap_or_default();
            for card_entry in &cards_json {
                let points = card_entry.get("points");
                let input_channels = points.and_then(|p| p.get("inputs")).and_then(Value::as_array).map_or(0, Vec::len);
                let output_channels = points.and_then(|p| p.get("outputs")).and_then(Value::as_array).map_or(0, Vec::len);
                if input_channels > limits.max_card_input_channels {
                    return Err(CardErr::TooManyInputPoints.full());
                }
                if output_channels > limits.max_card_output_channels {
                    return Err(CardErr::TooManyOutputPoints.full());
                }

                let type_guid = card_entry.get("type").and_then(Value::as_str).ok_or(NodeErr::ParseError.full())?;
                let card = card_factories.create(
                    type_guid,
                    card_entry,
                    &point_factories,
                    &mut point_db,
                    &mut general_arena,
                    &mut card_stateful_arena,
                    &mut setter_links,
                )?;
                cards.insert(card).map_err(|_| NodeErr::FailedCreateChassis.full())?;
            }

            let logic_chains_json = chassis_entry
                .get("logicChains")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if logic_chains_json.len() > limits.max_logic_chains_per_chassis {
                return Err(ChassisErr::TooManyLogicChains.full());
            }
            let mut logic_chains = Vec::with_capacity(logic_chains_json.len());
            for chain_entry in &logic_chains_json {
                let chain_name = chain_entry.get("name").and_then(Value::as_str).unwrap_or("").to_string();

                let mut auto_points = Vec::new();
                if let Some(auto_points_json) = chain_entry.get("autoPoints").and_then(Value::as_array) {
                    if auto_points_json.len() > limits.max_auto_points_per_chain {
                        return Err(LogicChainErr::TooManyAutoPoints.full());
                    }
                    for point_entry in auto_points_json {
                        let type_guid = point_entry.get("type").and_then(Value::as_str).ok_or(NodeErr::ParseError.full())?;
                        let created = point_factories.create(type_guid, point_entry, &mut general_arena, HaRole::General)?;
                        let target_id = created.point.id();
                        point_db.insert(created.point).map_err(|_| NodeErr::FailedCreateChassis.full())?;
                        if let Some(setter) = created.setter {
                            setter_links.push((target_id, setter.id()));
                            point_db.insert(setter).map_err(|_| NodeErr::FailedCreateChassis.full())?;
                        }
                        auto_points.push(target_id);
                    }
                }

                let components_json = chain_entry.get("components").and_then(Value::as_array).cloned().unwrap_or_default();
                if components_json.len() > limits.max_components_per_chain {
                    return Err(LogicChainErr::TooManyComponents.full());
                }
                let mut components: Vec<Box<dyn Component>> = Vec::with_capacity(components_json.len());
                for component_entry in &components_json {
                    let input_refs = component_entry.get("inputs").and_then(Value::as_array).map_or(0, Vec::len);
                    let output_refs = component_entry.get("outputs").and_then(Value::as_array).map_or(0, Vec::len);
                    if input_refs > limits.max_component_inputs {
                        return Err(ComponentErr::TooManyInputRefs.full());
                    }
                    if output_refs > limits.max_component_outputs {
                        return Err(ComponentErr::TooManyOutputRefs.full());
                    }
                    components.push(component_factories.create(component_entry)?);
                }

                logic_chains.push(LogicChain::new(chain_name, components, auto_points)?);
            }

            chassis.push(Arc::new(Mutex::new(Chassis::new(name, cards, logic_chains, timing)?)));
            periods.push(TimingSource::new(scan_rate_msec, scan_rate_multiplier).period());
        }

        point_db.apply_setters(&setter_links)?;

        for one in &chassis {
            one.lock().unwrap().resolve_references(&point_db)?;
        }

        Ok(Node {
            limits,
            general_arena,
            card_stateful_arena,
            ha_stateful_arena,
            point_db: Arc::new(Mutex::new(point_db)),
            chassis,
            periods,
            running: Vec::new(),
            started: false,
        })
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    pub fn point_db(&self) -> &Arc<Mutex<PointDatabase>> {
        &self.point_db
    }

    /// Bytes currently accounted for in the HA-stateful arena -- the
    /// upper bound on how large an HA snapshot blob can get.
    pub fn ha_arena_used_bytes(&self) -> usize {
        self.ha_stateful_arena.used_bytes()
    }

    /// Start every Chassis's thread (spec.md §4.7 step (f)).
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(NodeErr::AlreadyStarted.full());
        }

        {
            let mut point_db = self.point_db.lock().unwrap();
            for one in &self.chassis {
                one.lock().unwrap().start(&mut point_db, 0)?;
            }
        }

        for (chassis, period) in self.chassis.iter().cloned().zip(self.periods.iter().copied()) {
            let point_db = Arc::clone(&self.point_db);
            let stop_flag = Arc::new(AtomicBool::new(false));
            let thread_stop_flag = Arc::clone(&stop_flag);
            let (done_tx, done_rx) = mpsc::channel();

            let handle = std::thread::spawn(move || {
                let clock = SystemClock::new();
                while !thread_stop_flag.load(Ordering::Relaxed) {
                    let cycle_start = std::time::Instant::now();
                    let now_us = clock.now_us();
                    {
                        let mut db = point_db.lock().unwrap();
                        let mut chassis = chassis.lock().unwrap();
                        if let Err(e) = chassis.run_cycle(&mut db, now_us) {
                            log::warn!("chassis cycle error {e}");
                        }
                    }
                    if let Some(remainder) = period.checked_sub(cycle_start.elapsed()) {
                        if !remainder.is_zero() {
                            clock.sleep(remainder);
                        }
                    }
                }
                let _ = done_tx.send(());
            });

            self.running.push(RunningChassis { stop_flag, done_rx, handle });
        }

        self.started = true;
        Ok(())
    }

    /// Signal every Chassis thread to stop after its current cycle, then
    /// join each with a bounded wait (spec.md §4.7, §9's HA snapshot note:
    /// all Chassis must reach `Stopped` before an HA export may proceed).
    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Err(NodeErr::NotStarted.full());
        }

        for running in &self.running {
            running.stop_flag.store(true, Ordering::Relaxed);
        }

        let mut timed_out = false;
        for running in self.running.drain(..) {
            if running.done_rx.recv_timeout(SHUTDOWN_JOIN_TIMEOUT).is_err() {
                timed_out = true;
                log::warn!("chassis thread did not signal completion within shutdown timeout");
                continue;
            }
            let _ = running.handle.join();
        }

        {
            let mut point_db = self.point_db.lock().unwrap();
            for one in &self.chassis {
                one.lock().unwrap().stop(&mut point_db);
            }
        }

        self.started = false;
        if timed_out {
            return Err(NodeErr::ShutdownTimeout.full());
        }
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Export the HA-stateful arena's Points as an opaque JSON blob.
    /// Requires every Chassis to be stopped (spec.md §9 Open Question
    /// resolution: HA snapshot atomicity is guaranteed by requiring the
    /// whole Node be quiesced first, not by a finer-grained lock).
    pub fn ha_export(&self) -> Result<Vec<u8>> {
        crate::ha::export_snapshot(self)
    }

    pub fn ha_import(&mut self, blob: &[u8]) -> Result<()> {
        crate::ha::import_snapshot(self, blob)
    }

    /// Register process-wide state, replacing nothing: fails with
    /// `NODE:ALREADY_STARTED` if a Node is already sitting in the slot
    /// un-taken.
    pub fn initialize(json: &Value) -> Result<()> {
        let node = Node::build(json)?;
        let mut slot = NODE_SLOT.lock().unwrap();
        if slot.is_some() {
            return Err(NodeErr::AlreadyStarted.full());
        }
        *slot = Some(node);
        Ok(())
    }

    /// Take ownership of the process-wide Node, if one has been
    /// initialized and not already taken. The slot is empty afterward,
    /// so a later `initialize` may run again once this value is dropped.
    pub fn take() -> Option<Node> {
        NODE_SLOT.lock().unwrap().take()
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if self.started {
            let _ = self.stop();
        }
    }
}
