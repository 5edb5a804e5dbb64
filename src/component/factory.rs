//! Component factories and the GUID-keyed factory registry (spec.md §4.7
//! step (c)), grounded on
//! `examples/original_source/src/Fxt/Component/FactoryCommon_.*`/`FactoryDatabase*`.

use std::collections::HashMap;

use serde_json::Value;

use crate::component::controller::OnOffController;
use crate::component::digital::{ByteDemux, Mux8Uint8};
use crate::component::gate::{BooleanGate, GateKind, NotGate};
use crate::component::scaler::AffineScaler;
use crate::component::{Component, LatchingComponent, PointRef};
use crate::error::{ComponentErr, Error, Result};

fn parse_refs(json: &Value, key: &str) -> Result<Vec<PointRef>> {
    let arr = json.get(key).and_then(Value::as_array).ok_or(ComponentErr::MissingRequiredField.full())?;
    let mut out = Vec::with_capacity(arr.len());
    for entry in arr {
        let id = entry.get("idRef").and_then(Value::as_u64).ok_or(ComponentErr::BadInputReference.full())? as u32;
        let negate = entry.get("negate").and_then(Value::as_bool).unwrap_or(false);
        let bit = entry.get("bit").and_then(Value::as_u64).map(|b| b as u8);
        out.push(PointRef { id, negate, bit });
    }
    Ok(out)
}

fn component_name(json: &Value) -> String {
    json.get("name").and_then(Value::as_str).unwrap_or("").to_string()
}

/// One registered Component factory, keyed by `type_guid`.
pub trait ComponentFactory: Send + Sync {
    fn type_guid(&self) -> &'static str;

    /// Parse a Component JSON object (spec.md §6's Component JSON shape)
    /// into a boxed, latch-wrapped Component.
    fn create(&self, json: &Value) -> Result<Box<dyn Component>>;
}

macro_rules! simple_factory {
    ($factory_name:ident, $guid:literal, |$json:ident| $body:expr) => {
        #[derive(Default)]
        pub struct $factory_name;

        impl ComponentFactory for $factory_name {
            fn type_guid(&self) -> &'static str {
                $guid
            }

            fn create(&self, $json: &Value) -> Result<Box<dyn Component>> {
                let name = component_name($json);
                let logic = $body?;
                Ok(Box::new(LatchingComponent::new(name, logic)))
            }
        }
    };
}

simple_factory!(AndGateFactory, "c0mp0001-0000-0000-0000-000000000001", |json| {
    BooleanGate::new(GateKind::And, parse_refs(json, "inputs")?, parse_refs(json, "outputs")?)
});

simple_factory!(OrGateFactory, "c0mp0001-0000-0000-0000-000000000002", |json| {
    BooleanGate::new(GateKind::Or, parse_refs(json, "inputs")?, parse_refs(json, "outputs")?)
});

simple_factory!(NotGateFactory, "c0mp0001-0000-0000-0000-000000000003", |json| {
    let inputs = parse_refs(json, "inputs")?;
    let outputs = parse_refs(json, "outputs")?;
    if inputs.len() != outputs.len() {
        Err(ComponentErr::MismatchedInputsOutputs.full())
    } else {
        NotGate::new(inputs.into_iter().zip(outputs).collect())
    }
});

simple_factory!(ByteDemuxFactory, "c0mp0002-0000-0000-0000-000000000001", |json| {
    let inputs = parse_refs(json, "inputs")?;
    let input = *inputs.first().ok_or(ComponentErr::IncorrectNumInputRefs.full())?;
    ByteDemux::new(input, parse_refs(json, "outputs")?)
});

simple_factory!(Mux8Uint8Factory, "c0mp0002-0000-0000-0000-000000000002", |json| {
    let outputs = parse_refs(json, "outputs")?;
    let output = *outputs.first().ok_or(ComponentErr::IncorrectNumOutputRefs.full())?;
    Mux8Uint8::new(parse_refs(json, "inputs")?, output)
});

simple_factory!(AffineScalerFactory, "c0mp0003-0000-0000-0000-000000000001", |json| {
    let inputs = parse_refs(json, "inputs")?;
    let outputs = parse_refs(json, "outputs")?;
    let input = *inputs.first().ok_or(ComponentErr::IncorrectNumInputRefs.full())?;
    let output = *outputs.first().ok_or(ComponentErr::IncorrectNumOutputRefs.full())?;
    let cfg = json.get("config").cloned().unwrap_or(Value::Null);
    let m = cfg.get("m").and_then(Value::as_f64).unwrap_or(1.0) as f32;
    let b = cfg.get("b").and_then(Value::as_f64).unwrap_or(0.0) as f32;
    let out_min = cfg.get("outMin").and_then(Value::as_f64).unwrap_or(f32::MIN as f64) as f32;
    let out_max = cfg.get("outMax").and_then(Value::as_f64).unwrap_or(f32::MAX as f64) as f32;
    AffineScaler::new(input, output, m, b, out_min, out_max)
});

simple_factory!(OnOffControllerFactory, "c0mp0004-0000-0000-0000-000000000001", |json| {
    let inputs = parse_refs(json, "inputs")?;
    let outputs = parse_refs(json, "outputs")?;
    let measurement = *inputs.first().ok_or(ComponentErr::IncorrectNumInputRefs.full())?;
    let enable = inputs.get(1).copied();
    let output = *outputs.first().ok_or(ComponentErr::IncorrectNumOutputRefs.full())?;
    let cfg = json.get("config").cloned().unwrap_or(Value::Null);
    let setpoint = cfg.get("setpoint").and_then(Value::as_f64).unwrap_or(0.0) as f32;
    let deadband = cfg.get("deadband").and_then(Value::as_f64).unwrap_or(0.0) as f32;
    OnOffController::new(measurement, enable, output, setpoint, deadband)
});

/// GUID-keyed registry of Component factories, assembled explicitly at
/// Node construction (spec.md §9 redesign note).
#[derive(Default)]
pub struct ComponentFactoryDatabase {
    factories: HashMap<&'static str, Box<dyn ComponentFactory>>,
}

impl ComponentFactoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Box<dyn ComponentFactory>) {
        self.factories.insert(factory.type_guid(), factory);
    }

    pub fn with_builtin_components() -> Self {
        let mut db = Self::new();
        db.register(Box::new(AndGateFactory));
        db.register(Box::new(OrGateFactory));
        db.register(Box::new(NotGateFactory));
        db.register(Box::new(ByteDemuxFactory));
        db.register(Box::new(Mux8Uint8Factory));
        db.register(Box::new(AffineScalerFactory));
        db.register(Box::new(OnOffControllerFactory));
        db
    }

    pub fn create(&self, json: &Value) -> Result<Box<dyn Component>> {
        let type_guid = json.get("type").and_then(Value::as_str).ok_or(ComponentErr::UnknownGuid.full())?;
        let factory = self.factories.get(type_guid).ok_or(ComponentErr::UnknownGuid.full())?;
        factory.create(json)
    }
}
