//! Card factories and the GUID-keyed factory registry (spec.md §4.7 step
//! (c)), grounded on
//! `examples/original_source/src/Fxt/Card/FactoryCommon_.*`/`FactoryDatabase*`.

use std::collections::HashMap;

use serde_json::Value;

use crate::arena::{Arena, HaRole};
use crate::card::mock::MockDigital8;
use crate::card::{Card, ChannelMap};
use crate::error::{CardErr, Error, Result};
use crate::point::database::PointDatabase;
use crate::point::factory::PointFactoryDatabase;
use crate::point::PointId;

/// One registered Card factory, keyed by `type_guid`.
pub trait CardFactory: Send + Sync {
    fn type_guid(&self) -> &'static str;

    /// Parse a Card JSON object (spec.md §6's `cards[]` element shape),
    /// create every input/output Point and its twin IO-register Point via
    /// `point_factories`, insert them into `point_db`, and return the
    /// constructed Card. Any `(target_id, setter_id)` pairs created along
    /// the way are appended to `setter_links` for the caller to apply via
    /// `PointDatabase::apply_setters` once every Card/Component in the
    /// owning Chassis has been created (spec.md §4.7 step (e)).
    fn create(
        &self,
        json: &Value,
        point_factories: &PointFactoryDatabase,
        point_db: &mut PointDatabase,
        general_arena: &mut Arena,
        card_stateful_arena: &mut Arena,
        setter_links: &mut Vec<(PointId, PointId)>,
    ) -> Result<Box<dyn Card>>;
}

fn parse_channel_list(
    json: &Value,
    key: &str,
    point_factories: &PointFactoryDatabase,
    point_db: &mut PointDatabase,
    general_arena: &mut Arena,
    card_stateful_arena: &mut Arena,
    setter_links: &mut Vec<(PointId, PointId)>,
) -> Result<Vec<ChannelMap>> {
    let arr = json
        .get("points")
        .and_then(|p| p.get(key))
        .and_then(Value::as_array)
        .ok_or(CardErr::MemoryDescriptors.full())?;

    let mut channels = Vec::with_capacity(arr.len());
    for entry in arr {
        let channel = entry
            .get("channel")
            .and_then(Value::as_u64)
            .ok_or(CardErr::BadChannelAssignments.full())? as u8;
        let type_guid = entry
            .get("type")
            .and_then(Value::as_str)
            .ok_or(CardErr::PointMissingId.full())?;

        let created = point_factories.create(type_guid, entry, general_arena, HaRole::General)?;
        let target_id = created.point.id();
        point_db.insert(created.point).map_err(|_| CardErr::PointMissingId.full())?;
        if let Some(setter) = created.setter {
            setter_links.push((target_id, setter.id()));
            point_db.insert(setter).map_err(|_| CardErr::PointMissingId.full())?;
        }
        let point_id = entry.get("id").and_then(Value::as_u64).ok_or(CardErr::PointMissingId.full())? as u32;

        let io_reg_id = entry.get("ioRegId").and_then(Value::as_u64).ok_or(CardErr::PointMissingId.full())? as u32;
        let reg_json = serde_json::json!({ "id": io_reg_id, "val": entry.get("initial").and_then(|i| i.get("val")) });
        let reg_created = point_factories.create(type_guid, &reg_json, card_stateful_arena, HaRole::CardStateful)?;
        point_db.insert(reg_created.point).map_err(|_| CardErr::PointMissingId.full())?;

        channels.push(ChannelMap { channel, point_id, io_reg_id });
    }
    Ok(channels)
}

/// Factory for [`MockDigital8`].
#[derive(Default)]
pub struct MockDigital8Factory;

impl CardFactory for MockDigital8Factory {
    fn type_guid(&self) -> &'static str {
        crate::card::mock::TYPE_GUID
    }

    fn create(
        &self,
        json: &Value,
        point_factories: &PointFactoryDatabase,
        point_db: &mut PointDatabase,
        general_arena: &mut Arena,
        card_stateful_arena: &mut Arena,
        setter_links: &mut Vec<(PointId, PointId)>,
    ) -> Result<Box<dyn Card>> {
        let local_id = json.get("id").and_then(Value::as_u64).ok_or(CardErr::CardMissingId.full())? as u32;
        let name = json.get("name").and_then(Value::as_str).unwrap_or("").to_string();

        let inputs = parse_channel_list(json, "inputs", point_factories, point_db, general_arena, card_stateful_arena, setter_links)?;
        let outputs = parse_channel_list(json, "outputs", point_factories, point_db, general_arena, card_stateful_arena, setter_links)?;

        Ok(Box::new(MockDigital8::new(local_id, name, inputs, outputs)?))
    }
}

/// GUID-keyed registry of Card factories.
#[derive(Default)]
pub struct CardFactoryDatabase {
    factories: HashMap<&'static str, Box<dyn CardFactory>>,
}

impl CardFactoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Box<dyn CardFactory>) {
        self.factories.insert(factory.type_guid(), factory);
    }

    pub fn with_builtin_cards() -> Self {
        let mut db = Self::new();
        db.register(Box::new(MockDigital8Factory));
        db
    }

    pub fn create(
        &self,
        type_guid: &str,
        json: &Value,
        point_factories: &PointFactoryDatabase,
        point_db: &mut PointDatabase,
        general_arena: &mut Arena,
        card_stateful_arena: &mut Arena,
        setter_links: &mut Vec<(PointId, PointId)>,
    ) -> Result<Box<dyn Card>> {
        let factory = self.factories.get(type_guid).ok_or(CardErr::UnknownGuid.full())?;
        factory.create(json, point_factories, point_db, general_arena, card_stateful_arena, setter_links)
    }
}
