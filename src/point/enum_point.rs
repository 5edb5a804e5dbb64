//! `EnumPoint`: symbolic enum Point (spec.md §9's "`Enum<E>`" parametric
//! kind), grounded on the original's `Enum_.h`. The symbol table is shared
//! across every Point of a given enum type via `Arc`, so constructing many
//! instances of the same enum kind does not duplicate the symbol list.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::arena::HaRole;
use crate::error::{Error, PointErr, Result};
use crate::point::{parse_envelope_flags, LockRequest, Point, PointId};

/// The ordered set of symbolic names a concrete enum Point type may hold.
/// `value` is an index into `symbols`.
pub struct EnumSymbols {
    type_guid: &'static str,
    type_name: &'static str,
    pub symbols: Vec<String>,
}

impl EnumSymbols {
    /// Leaks `type_guid`/`type_name` once, at symbol-table construction
    /// time, rather than on every `Point::type_guid()`/`type_name()` call.
    /// A symbol table is shared via `Arc` across every Point of its enum
    /// kind and lives for the process lifetime like everything else drawn
    /// from the general arena, so one leak per distinct enum kind is the
    /// whole cost.
    pub fn new(type_guid: impl Into<String>, type_name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            type_guid: Box::leak(type_guid.into().into_boxed_str()),
            type_name: Box::leak(type_name.into().into_boxed_str()),
            symbols,
        }
    }
}

pub struct EnumPoint {
    id: PointId,
    valid: bool,
    locked: bool,
    value: u32,
    setter: Option<PointId>,
    ha_role: HaRole,
    symbols: Arc<EnumSymbols>,
}

impl EnumPoint {
    pub fn new_invalid(id: PointId, symbols: Arc<EnumSymbols>, ha_role: HaRole) -> Self {
        Self {
            id,
            valid: false,
            locked: false,
            value: 0,
            setter: None,
            ha_role,
            symbols,
        }
    }

    pub fn new_valid(id: PointId, symbols: Arc<EnumSymbols>, initial_index: u32, ha_role: HaRole) -> Result<Self> {
        if initial_index as usize >= symbols.symbols.len() {
            return Err(PointErr::UnknownEnumSymbol.full());
        }
        Ok(Self {
            id,
            valid: true,
            locked: false,
            value: initial_index,
            setter: None,
            ha_role,
            symbols,
        })
    }

    pub fn set_setter(&mut self, setter_id: PointId) {
        self.setter = Some(setter_id);
    }

    /// The current symbolic name, iff valid.
    pub fn read_symbol(&self) -> Option<&str> {
        self.valid
            .then(|| self.symbols.symbols.get(self.value as usize).map(String::as_str))
            .flatten()
    }

    pub fn write_index(&mut self, index: u32, lock_request: LockRequest) -> Result<()> {
        if index as usize >= self.symbols.symbols.len() {
            return Err(PointErr::UnknownEnumSymbol.full());
        }
        if !lock_request.permits(self.locked) {
            return Ok(());
        }
        self.value = index;
        self.valid = true;
        self.locked = lock_request.resulting_lock_state(self.locked);
        Ok(())
    }

    pub fn write_symbol(&mut self, name: &str, lock_request: LockRequest) -> Result<()> {
        let index = self
            .symbols
            .symbols
            .iter()
            .position(|s| s == name)
            .ok_or(PointErr::UnknownEnumSymbol.full())?;
        self.write_index(index as u32, lock_request)
    }
}

impl Point for EnumPoint {
    fn id(&self) -> PointId {
        self.id
    }

    fn type_guid(&self) -> &'static str {
        self.symbols.type_guid
    }

    fn type_name(&self) -> &'static str {
        self.symbols.type_name
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn ha_role(&self) -> HaRole {
        self.ha_role
    }

    fn set_invalid(&mut self, lock_request: LockRequest) {
        if !lock_request.permits(self.locked) {
            return;
        }
        self.value = 0;
        self.valid = false;
        self.locked = lock_request.resulting_lock_state(self.locked);
    }

    fn to_json(&self, verbose: bool) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("id".to_string(), Value::from(self.id));
        obj.insert("valid".to_string(), Value::Bool(self.valid));
        if verbose {
            obj.insert("type".to_string(), Value::String(self.symbols.type_name.to_string()));
            obj.insert("locked".to_string(), Value::Bool(self.locked));
        }
        if let Some(sym) = self.read_symbol() {
            obj.insert("val".to_string(), Value::String(sym.to_string()));
        }
        Value::Object(obj)
    }

    fn from_json(&mut self, src: &Value) -> Result<()> {
        let (explicit_valid, explicit_locked) = parse_envelope_flags(src);

        if explicit_valid == Some(false) {
            let lr = match explicit_locked {
                Some(true) => LockRequest::Lock,
                Some(false) => LockRequest::Unlock,
                None => LockRequest::Noop,
            };
            self.set_invalid(lr);
            return Ok(());
        }

        if let Some(val) = src.get("val").and_then(Value::as_str) {
            let lr = match explicit_locked {
                Some(true) => LockRequest::Lock,
                Some(false) => LockRequest::Unlock,
                None => LockRequest::Noop,
            };
            self.write_symbol(val, lr)?;
            return Ok(());
        }

        if let Some(locked) = explicit_locked {
            let lr = if locked { LockRequest::Lock } else { LockRequest::Unlock };
            if lr.permits(self.locked) {
                self.locked = lr.resulting_lock_state(self.locked);
            }
        }
        Ok(())
    }

    fn update_from_setter(&mut self, setter: &dyn Point, lock_request: LockRequest) -> Result<()> {
        let setter = setter
            .as_any()
            .downcast_ref::<EnumPoint>()
            .ok_or(PointErr::BadSetterValue.full())?;
        if !lock_request.permits(self.locked) {
            return Ok(());
        }
        self.valid = setter.valid;
        self.value = setter.value;
        self.locked = lock_request.resulting_lock_state(self.locked);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Arc<EnumSymbols> {
        Arc::new(EnumSymbols::new(
            "b1e10000-0000-0000-0000-0000000000ee",
            "Fxt::Point::TestEnum",
            vec!["OFF".to_string(), "ON".to_string(), "FAULT".to_string()],
        ))
    }

    #[test]
    fn write_symbol_then_read_back() {
        let mut p = EnumPoint::new_invalid(0, symbols(), HaRole::General);
        p.write_symbol("ON", LockRequest::Noop).unwrap();
        assert_eq!(p.read_symbol(), Some("ON"));
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let mut p = EnumPoint::new_invalid(0, symbols(), HaRole::General);
        assert!(p.write_symbol("BOGUS", LockRequest::Noop).is_err());
    }
}
