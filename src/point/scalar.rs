//! `Scalar<T>`: the parametric Point kind covering bool, every integer
//! width, and every float width (spec.md §9's "small set of parametric
//! Point kinds"), grounded on the original's `Basic_<ELEMTYPE>` /
//! `BasicInteger_<ELEMTYPE>` / `BasicReal_<ELEMTYPE>` template family
//! (`examples/original_source/src/Fxt/Point/Basic_.h`).

use std::any::Any;

use serde_json::Value;

use crate::arena::HaRole;
use crate::error::{Error, PointErr, Result};
use crate::point::{parse_envelope_flags, LockRequest, Point, PointId};

/// What a concrete scalar element type needs to behave as a `Scalar<T>`
/// payload: a JSON encoding/decoding pair plus its GUID/type-name pair.
///
/// Integer kinds encode as a hex string (`"0x2A"`) and decode hex or
/// decimal (`Basic_.h`'s `toJSON_`/`fromJSON_` for `BasicInteger_`); float
/// kinds encode/decode as a JSON number (`BasicReal_`'s `toJSON_`/`fromJSON_`).
pub trait ScalarCodec: Copy + Default + PartialEq + Send + Sync + 'static {
    const TYPE_GUID: &'static str;
    const TYPE_NAME: &'static str;

    fn to_json_value(self) -> Value;
    fn from_json_value(v: &Value) -> Option<Self>;
}

macro_rules! impl_integer_codec {
    ($ty:ty, $guid:literal, $name:literal) => {
        impl ScalarCodec for $ty {
            const TYPE_GUID: &'static str = $guid;
            const TYPE_NAME: &'static str = $name;

            fn to_json_value(self) -> Value {
                Value::String(format!("0x{:X}", self))
            }

            fn from_json_value(v: &Value) -> Option<Self> {
                match v {
                    Value::String(s) => {
                        let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
                        <$ty>::from_str_radix(s, 16).ok()
                    }
                    Value::Number(n) => {
                        // Accept plain decimal JSON numbers too.
                        if let Some(u) = n.as_u64() {
                            <$ty>::try_from(u).ok()
                        } else {
                            n.as_i64().and_then(|i| <$ty>::try_from(i).ok())
                        }
                    }
                    _ => None,
                }
            }
        }
    };
}

impl_integer_codec!(u8, "b1e10000-0000-0000-0000-000000000001", "Fxt::Point::Uint8");
impl_integer_codec!(u16, "b1e10000-0000-0000-0000-000000000002", "Fxt::Point::Uint16");
impl_integer_codec!(u32, "b1e10000-0000-0000-0000-000000000003", "Fxt::Point::Uint32");
impl_integer_codec!(u64, "b1e10000-0000-0000-0000-000000000004", "Fxt::Point::Uint64");
impl_integer_codec!(i8, "b1e10000-0000-0000-0000-000000000005", "Fxt::Point::Int8");
impl_integer_codec!(i16, "b1e10000-0000-0000-0000-000000000006", "Fxt::Point::Int16");
impl_integer_codec!(i32, "b1e10000-0000-0000-0000-000000000007", "Fxt::Point::Int32");
impl_integer_codec!(i64, "b1e10000-0000-0000-0000-000000000008", "Fxt::Point::Int64");

macro_rules! impl_float_codec {
    ($ty:ty, $guid:literal, $name:literal) => {
        impl ScalarCodec for $ty {
            const TYPE_GUID: &'static str = $guid;
            const TYPE_NAME: &'static str = $name;

            fn to_json_value(self) -> Value {
                serde_json::Number::from_f64(f64::from(self))
                    .map_or(Value::Null, Value::Number)
            }

            fn from_json_value(v: &Value) -> Option<Self> {
                v.as_f64().map(|f| f as $ty)
            }
        }
    };
}

impl_float_codec!(f32, "b1e10000-0000-0000-0000-000000000009", "Fxt::Point::Float32");
impl_float_codec!(f64, "b1e10000-0000-0000-0000-00000000000a", "Fxt::Point::Float64");

impl ScalarCodec for bool {
    const TYPE_GUID: &'static str = "b1e10000-0000-0000-0000-00000000000b";
    const TYPE_NAME: &'static str = "Fxt::Point::Bool";

    fn to_json_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_json_value(v: &Value) -> Option<Self> {
        v.as_bool()
    }
}

/// A scalar Point: one bool/int/float value, a validity flag, and a lock
/// flag, plus an optional sibling setter Point applied on start.
pub struct Scalar<T: ScalarCodec> {
    id: PointId,
    valid: bool,
    locked: bool,
    value: T,
    setter: Option<PointId>,
    ha_role: HaRole,
}

pub type BoolPoint = Scalar<bool>;
pub type Uint8Point = Scalar<u8>;
pub type Uint16Point = Scalar<u16>;
pub type Uint32Point = Scalar<u32>;
pub type Uint64Point = Scalar<u64>;
pub type Int8Point = Scalar<i8>;
pub type Int16Point = Scalar<i16>;
pub type Int32Point = Scalar<i32>;
pub type Int64Point = Scalar<i64>;
pub type Float32Point = Scalar<f32>;
pub type Float64Point = Scalar<f64>;

impl<T: ScalarCodec> Scalar<T> {
    /// Construct an invalid Point (no initial value).
    pub fn new_invalid(id: PointId, ha_role: HaRole) -> Self {
        Self {
            id,
            valid: false,
            locked: false,
            value: T::default(),
            setter: None,
            ha_role,
        }
    }

    /// Construct a Point that starts out valid with `initial`.
    pub fn new_valid(id: PointId, initial: T, ha_role: HaRole) -> Self {
        Self {
            id,
            valid: true,
            locked: false,
            value: initial,
            setter: None,
            ha_role,
        }
    }

    pub fn set_setter(&mut self, setter_id: PointId) {
        self.setter = Some(setter_id);
    }

    pub const fn setter(&self) -> Option<PointId> {
        self.setter
    }

    /// Copies the payload out iff valid; returns validity (spec.md §4.1
    /// `read(dst) -> valid`).
    pub fn read(&self) -> Option<T> {
        self.valid.then_some(self.value)
    }

    /// Writes `src` and updates lock per `lock_request`; silently no-ops
    /// if currently locked and `lock_request` is not `Unlock`.
    pub fn write(&mut self, src: T, lock_request: LockRequest) {
        if !lock_request.permits(self.locked) {
            return;
        }
        self.value = src;
        self.valid = true;
        self.locked = lock_request.resulting_lock_state(self.locked);
    }
}

impl<T: ScalarCodec> Point for Scalar<T> {
    fn id(&self) -> PointId {
        self.id
    }

    fn type_guid(&self) -> &'static str {
        T::TYPE_GUID
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
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
        self.value = T::default();
        self.valid = false;
        self.locked = lock_request.resulting_lock_state(self.locked);
    }

    fn to_json(&self, verbose: bool) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("id".to_string(), Value::from(self.id));
        obj.insert("valid".to_string(), Value::Bool(self.valid));
        if verbose {
            obj.insert("type".to_string(), Value::String(self.type_name().to_string()));
            obj.insert("locked".to_string(), Value::Bool(self.locked));
        }
        if self.valid {
            obj.insert("val".to_string(), self.value.to_json_value());
        }
        Value::Object(obj)
    }

    fn from_json(&mut self, src: &Value) -> Result<()> {
        let (explicit_valid, explicit_locked) = parse_envelope_flags(src);

        if explicit_valid == Some(false) {
            let lr = lock_request_from_explicit(explicit_locked, self.locked);
            self.set_invalid(lr);
            return Ok(());
        }

        if let Some(val) = src.get("val") {
            let decoded = T::from_json_value(val).ok_or(PointErr::InvalidSyntax.full())?;
            let lr = lock_request_from_explicit(explicit_locked, self.locked);
            self.write(decoded, lr);
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
            .downcast_ref::<Scalar<T>>()
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

/// `from_json`'s envelope may carry an explicit `locked` flag alongside a
/// value write; translate that into the [`LockRequest`] that governs the
/// write itself, falling back to `Noop` when `locked` is absent.
fn lock_request_from_explicit(explicit_locked: Option<bool>, currently_locked: bool) -> LockRequest {
    match explicit_locked {
        Some(true) => LockRequest::Lock,
        Some(false) => LockRequest::Unlock,
        None => {
            let _ = currently_locked;
            LockRequest::Noop
        }
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_invalid_clears_value_and_read_reports_invalid() {
        let mut p = Uint32Point::new_valid(0, 7, HaRole::General);
        p.set_invalid(LockRequest::Noop);
        assert_eq!(p.read(), None);
        assert!(!p.to_json(false).as_object().unwrap().contains_key("val"));
    }

    #[test]
    fn lock_then_write_ignored_then_unlock_write_succeeds() {
        let mut p = Uint32Point::new_invalid(0, HaRole::General);
        p.write(5, LockRequest::Lock);
        assert_eq!(p.read(), Some(5));
        assert!(p.is_locked());

        p.write(6, LockRequest::Noop);
        assert_eq!(p.read(), Some(5), "write while locked must be ignored");

        p.write(9, LockRequest::Unlock);
        assert_eq!(p.read(), Some(9));
        assert!(!p.is_locked());
    }

    #[test]
    fn round_trip_to_json_from_json_integer_hex() {
        let mut p = Uint32Point::new_invalid(0, HaRole::General);
        p.write(0xB, LockRequest::Lock);
        let j = p.to_json(true);
        assert_eq!(j["val"], Value::String("0xB".to_string()));
        assert_eq!(j["locked"], Value::Bool(true));

        // Scenario 4 from spec.md §8: write while locked is a no-op.
        let mut p2 = Uint32Point::new_invalid(0, HaRole::General);
        p2.write(0xB, LockRequest::Lock);
        p2.from_json(&json!({"id": 0, "val": "0xBB"})).unwrap();
        assert_eq!(p2.read(), Some(0xB));

        p2.from_json(&json!({"id": 0, "val": "0xBB", "locked": false}))
            .unwrap();
        assert_eq!(p2.read(), Some(0xBB));
        assert!(!p2.is_locked());
    }

    #[test]
    fn accepts_both_hex_and_decimal_on_ingest() {
        let mut p = Uint32Point::new_invalid(0, HaRole::General);
        p.from_json(&json!({"id": 0, "val": 42})).unwrap();
        assert_eq!(p.read(), Some(42));
        p.from_json(&json!({"id": 0, "val": "0x2A"})).unwrap();
        assert_eq!(p.read(), Some(0x2A));
    }

    #[test]
    fn update_from_setter_requires_same_concrete_type() {
        let mut target = Uint32Point::new_invalid(0, HaRole::General);
        let setter = Uint32Point::new_valid(1, 128, HaRole::General);
        target.update_from_setter(&setter, LockRequest::Noop).unwrap();
        assert_eq!(target.read(), Some(128));

        let wrong_type = BoolPoint::new_valid(2, true, HaRole::General);
        let mut target2 = Uint32Point::new_invalid(3, HaRole::General);
        assert!(target2.update_from_setter(&wrong_type, LockRequest::Noop).is_err());
    }
}
