//! `StringPoint<N>`: fixed-capacity string Point (spec.md §9's
//! "`String<N>`" parametric kind), grounded on the original's `String.h`.
//! Backed by `heapless::String<N>` so capacity is enforced structurally
//! rather than by a runtime length check against a heap `String`.

use std::any::Any;

use serde_json::Value;

use crate::arena::HaRole;
use crate::error::{Error, PointErr, Result};
use crate::point::{parse_envelope_flags, LockRequest, Point, PointId};

pub struct StringPoint<const N: usize> {
    id: PointId,
    valid: bool,
    locked: bool,
    value: heapless::String<N>,
    setter: Option<PointId>,
    ha_role: HaRole,
    type_name: &'static str,
    type_guid: &'static str,
}

impl<const N: usize> StringPoint<N> {
    pub fn new_invalid(id: PointId, ha_role: HaRole) -> Self {
        Self {
            id,
            valid: false,
            locked: false,
            value: heapless::String::new(),
            setter: None,
            ha_role,
            type_name: Box::leak(format!("Fxt::Point::String[{N}]").into_boxed_str()),
            type_guid: Box::leak(format!("b1e10000-0000-0000-0000-{N:012x}").into_boxed_str()),
        }
    }

    pub fn set_setter(&mut self, setter_id: PointId) {
        self.setter = Some(setter_id);
    }

    pub fn read(&self) -> Option<&str> {
        self.valid.then_some(self.value.as_str())
    }

    pub fn write(&mut self, src: &str, lock_request: LockRequest) -> Result<()> {
        if src.len() > N {
            return Err(PointErr::ArrayWriteTooLong.full());
        }
        if !lock_request.permits(self.locked) {
            return Ok(());
        }
        self.value = heapless::String::try_from(src).map_err(|()| PointErr::InvalidSyntax.full())?;
        self.valid = true;
        self.locked = lock_request.resulting_lock_state(self.locked);
        Ok(())
    }
}

impl<const N: usize> Point for StringPoint<N> {
    fn id(&self) -> PointId {
        self.id
    }

    fn type_guid(&self) -> &'static str {
        self.type_guid
    }

    fn type_name(&self) -> &'static str {
        self.type_name
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
        self.value.clear();
        self.valid = false;
        self.locked = lock_request.resulting_lock_state(self.locked);
    }

    fn to_json(&self, verbose: bool) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("id".to_string(), Value::from(self.id));
        obj.insert("valid".to_string(), Value::Bool(self.valid));
        if verbose {
            obj.insert("type".to_string(), Value::String(self.type_name.to_string()));
            obj.insert("locked".to_string(), Value::Bool(self.locked));
        }
        if self.valid {
            obj.insert("val".to_string(), Value::String(self.value.to_string()));
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
            self.write(val, lr)?;
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
            .downcast_ref::<StringPoint<N>>()
            .ok_or(PointErr::BadSetterValue.full())?;
        if !lock_request.permits(self.locked) {
            return Ok(());
        }
        self.valid = setter.valid;
        self.value = setter.value.clone();
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

    #[test]
    fn write_within_capacity_ok() {
        let mut p: StringPoint<8> = StringPoint::new_invalid(0, HaRole::General);
        p.write("hello", LockRequest::Noop).unwrap();
        assert_eq!(p.read(), Some("hello"));
    }

    #[test]
    fn write_over_capacity_errors() {
        let mut p: StringPoint<4> = StringPoint::new_invalid(0, HaRole::General);
        assert!(p.write("toolong", LockRequest::Noop).is_err());
    }
}
