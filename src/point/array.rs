//! `ArrayPoint<T, N>`: fixed-capacity array Point (spec.md §9's
//! "`Array<T>`" parametric kind), grounded on the original's `Array_.h`
//! template. Capacity `N` is a compile-time const generic -- the Rust
//! equivalent of the original's fixed-size C array member.

use std::any::Any;

use serde_json::Value;

use crate::arena::HaRole;
use crate::error::{Error, PointErr, Result};
use crate::point::scalar::ScalarCodec;
use crate::point::{parse_envelope_flags, LockRequest, Point, PointId};

pub struct ArrayPoint<T: ScalarCodec, const N: usize> {
    id: PointId,
    valid: bool,
    locked: bool,
    elems: [T; N],
    setter: Option<PointId>,
    ha_role: HaRole,
    type_name: &'static str,
    type_guid: &'static str,
}

impl<T: ScalarCodec, const N: usize> ArrayPoint<T, N> {
    pub fn new_invalid(id: PointId, ha_role: HaRole) -> Self {
        Self {
            id,
            valid: false,
            locked: false,
            elems: [T::default(); N],
            setter: None,
            ha_role,
            type_name: Box::leak(format!("{}[{N}]", T::TYPE_NAME).into_boxed_str()),
            type_guid: Box::leak(format!("{}-{N:04x}", T::TYPE_GUID).into_boxed_str()),
        }
    }

    pub fn set_setter(&mut self, setter_id: PointId) {
        self.setter = Some(setter_id);
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn read(&self) -> Option<[T; N]> {
        self.valid.then_some(self.elems)
    }

    /// Writes `elems` starting at `start`. `start + elems.len() > N` is an
    /// error. A successful partial write on a previously-invalid array
    /// makes the whole array valid, leaving untouched trailing elements at
    /// their zero default -- the explicit policy recorded as an Open
    /// Question resolution in DESIGN.md (spec.md §9).
    pub fn write_partial(&mut self, start: usize, elems: &[T], lock_request: LockRequest) -> Result<()> {
        if start + elems.len() > N {
            return Err(PointErr::ArrayWriteTooLong.full());
        }
        if !lock_request.permits(self.locked) {
            return Ok(());
        }
        self.elems[start..start + elems.len()].copy_from_slice(elems);
        self.valid = true;
        self.locked = lock_request.resulting_lock_state(self.locked);
        Ok(())
    }
}

impl<T: ScalarCodec, const N: usize> Point for ArrayPoint<T, N> {
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
        self.elems = [T::default(); N];
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
            let elems: Vec<Value> = self.elems.iter().map(|e| e.to_json_value()).collect();
            let mut val = serde_json::Map::new();
            val.insert("start".to_string(), Value::from(0));
            val.insert("elems".to_string(), Value::Array(elems));
            obj.insert("val".to_string(), Value::Object(val));
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

        if let Some(val) = src.get("val") {
            let start = val
                .get("start")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0) as usize;
            let elems_json = val
                .get("elems")
                .and_then(serde_json::Value::as_array)
                .ok_or(PointErr::InvalidSyntax.full())?;
            let mut decoded = Vec::with_capacity(elems_json.len());
            for e in elems_json {
                decoded.push(T::from_json_value(e).ok_or(PointErr::InvalidSyntax.full())?);
            }
            let lr = match explicit_locked {
                Some(true) => LockRequest::Lock,
                Some(false) => LockRequest::Unlock,
                None => LockRequest::Noop,
            };
            self.write_partial(start, &decoded, lr)?;
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
            .downcast_ref::<ArrayPoint<T, N>>()
            .ok_or(PointErr::BadSetterValue.full())?;
        if !lock_request.permits(self.locked) {
            return Ok(());
        }
        self.valid = setter.valid;
        self.elems = setter.elems;
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
    fn partial_write_exactly_at_capacity_ok() {
        let mut p: ArrayPoint<u8, 4> = ArrayPoint::new_invalid(0, HaRole::General);
        p.write_partial(2, &[9, 9], LockRequest::Noop).unwrap();
        assert!(p.is_valid());
        assert_eq!(p.read().unwrap(), [0, 0, 9, 9]);
    }

    #[test]
    fn partial_write_past_capacity_errors() {
        let mut p: ArrayPoint<u8, 4> = ArrayPoint::new_invalid(0, HaRole::General);
        assert!(p.write_partial(3, &[1, 2], LockRequest::Noop).is_err());
    }

    #[test]
    fn invalid_array_becomes_valid_with_untouched_zeroes() {
        let mut p: ArrayPoint<u8, 4> = ArrayPoint::new_invalid(0, HaRole::General);
        assert!(!p.is_valid());
        p.write_partial(0, &[5], LockRequest::Noop).unwrap();
        assert!(p.is_valid());
        assert_eq!(p.read().unwrap(), [5, 0, 0, 0]);
    }
}
