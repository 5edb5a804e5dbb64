//! Point factories and the GUID-keyed factory registry (spec.md §4.2),
//! grounded on `examples/original_source/src/Fxt/Point/FactoryApi.h` /
//! `FactoryDatabase*`. Per spec.md §9's redesign note, registration happens
//! explicitly when a [`PointFactoryDatabase`] is assembled (at Node
//! construction) rather than via static-constructor side effects.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::arena::{Arena, HaRole};
use crate::error::{Error, PointErr, Result};
use crate::point::array::ArrayPoint;
use crate::point::enum_point::{EnumPoint, EnumSymbols};
use crate::point::scalar::{Scalar, ScalarCodec};
use crate::point::string_point::StringPoint;
use crate::point::{LockRequest, Point, PointId};

/// A Point produced by a factory: the Point itself, and an optional
/// sibling setter Point parsed from the `initial` sub-object (spec.md
/// §4.2).
pub struct CreatedPoint {
    pub point: Box<dyn Point>,
    pub setter: Option<Box<dyn Point>>,
}

/// One registered Point factory, keyed by `type_guid`.
pub trait PointFactory: Send + Sync {
    fn type_guid(&self) -> &'static str;

    /// Parse `id` (required), an optional `val` for the initial value, and
    /// an optional `initial` sub-object describing a sibling setter Point.
    /// Bumps `arena` for the Point's stateful payload. Failure modes:
    /// `MISSING_ID`, `MISSING_TYPE_CFG`, `BAD_SETTER_VALUE`, `MEMORY_POINT`.
    fn create(&self, json: &Value, arena: &mut Arena, ha_role: HaRole) -> Result<CreatedPoint>;
}

fn required_id(json: &Value) -> Result<PointId> {
    json.get("id")
        .and_then(Value::as_u64)
        .map(|v| v as PointId)
        .ok_or(PointErr::MissingId.full())
}

/// Factory for [`Scalar<T>`] Points (covers bool and every int/float width).
pub struct ScalarFactory<T: ScalarCodec> {
    _marker: std::marker::PhantomData<T>,
}

impl<T: ScalarCodec> Default for ScalarFactory<T> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: ScalarCodec> PointFactory for ScalarFactory<T> {
    fn type_guid(&self) -> &'static str {
        T::TYPE_GUID
    }

    fn create(&self, json: &Value, arena: &mut Arena, ha_role: HaRole) -> Result<CreatedPoint> {
        let id = required_id(json)?;
        arena.bump(std::mem::size_of::<Scalar<T>>()).map_err(|_| PointErr::MemoryPoint.full())?;

        let point: Box<dyn Point> = match json.get("val") {
            Some(v) => {
                let decoded = T::from_json_value(v).ok_or(PointErr::MissingTypeCfg.full())?;
                Box::new(Scalar::<T>::new_valid(id, decoded, ha_role))
            }
            None => Box::new(Scalar::<T>::new_invalid(id, ha_role)),
        };

        let setter = match json.get("initial") {
            Some(initial) => {
                let setter_id = required_id(initial)?;
                arena.bump(std::mem::size_of::<Scalar<T>>()).map_err(|_| PointErr::MemoryPoint.full())?;
                let value = initial
                    .get("val")
                    .and_then(|v| T::from_json_value(v))
                    .ok_or(PointErr::BadSetterValue.full())?;
                Some(Box::new(Scalar::<T>::new_valid(setter_id, value, HaRole::General)) as Box<dyn Point>)
            }
            None => None,
        };

        Ok(CreatedPoint { point, setter })
    }
}

/// Factory for [`ArrayPoint<T, N>`]. `N` is fixed at compile time, so one
/// factory instance is registered per concrete `(T, N)` the Node document is
/// allowed to reference; the registration GUID matches what the resulting
/// Point itself reports from `type_guid()` (same `{scalar guid}-{N:04x}`
/// scheme `ArrayPoint::new_invalid` already computes).
pub struct ArrayFactory<T: ScalarCodec, const N: usize> {
    type_guid: &'static str,
    _marker: std::marker::PhantomData<T>,
}

impl<T: ScalarCodec, const N: usize> ArrayFactory<T, N> {
    pub fn new() -> Self {
        Self {
            type_guid: Box::leak(format!("{}-{N:04x}", T::TYPE_GUID).into_boxed_str()),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: ScalarCodec, const N: usize> PointFactory for ArrayFactory<T, N> {
    fn type_guid(&self) -> &'static str {
        self.type_guid
    }

    fn create(&self, json: &Value, arena: &mut Arena, ha_role: HaRole) -> Result<CreatedPoint> {
        let id = required_id(json)?;
        arena.bump(std::mem::size_of::<ArrayPoint<T, N>>()).map_err(|_| PointErr::MemoryPoint.full())?;

        let mut point = ArrayPoint::<T, N>::new_invalid(id, ha_role);
        if json.get("val").is_some() {
            point.from_json(json)?;
        }

        let setter = match json.get("initial") {
            Some(initial) => {
                let setter_id = required_id(initial)?;
                arena.bump(std::mem::size_of::<ArrayPoint<T, N>>()).map_err(|_| PointErr::MemoryPoint.full())?;
                let mut setter = ArrayPoint::<T, N>::new_invalid(setter_id, HaRole::General);
                setter.from_json(initial).map_err(|_| PointErr::BadSetterValue.full())?;
                if !setter.is_valid() {
                    return Err(PointErr::BadSetterValue.full());
                }
                Some(Box::new(setter) as Box<dyn Point>)
            }
            None => None,
        };

        Ok(CreatedPoint { point: Box::new(point), setter })
    }
}

/// Factory for [`StringPoint<N>`], mirroring [`ArrayFactory`]'s per-capacity
/// registration scheme.
pub struct StringFactory<const N: usize> {
    type_guid: &'static str,
}

impl<const N: usize> StringFactory<N> {
    pub fn new() -> Self {
        Self {
            type_guid: Box::leak(format!("b1e10000-0000-0000-0000-{N:012x}").into_boxed_str()),
        }
    }
}

impl<const N: usize> PointFactory for StringFactory<N> {
    fn type_guid(&self) -> &'static str {
        self.type_guid
    }

    fn create(&self, json: &Value, arena: &mut Arena, ha_role: HaRole) -> Result<CreatedPoint> {
        let id = required_id(json)?;
        arena.bump(std::mem::size_of::<StringPoint<N>>()).map_err(|_| PointErr::MemoryPoint.full())?;

        let mut point = StringPoint::<N>::new_invalid(id, ha_role);
        if json.get("val").is_some() {
            point.from_json(json)?;
        }

        let setter = match json.get("initial") {
            Some(initial) => {
                let setter_id = required_id(initial)?;
                arena.bump(std::mem::size_of::<StringPoint<N>>()).map_err(|_| PointErr::MemoryPoint.full())?;
                let mut setter = StringPoint::<N>::new_invalid(setter_id, HaRole::General);
                setter.from_json(initial).map_err(|_| PointErr::BadSetterValue.full())?;
                if !setter.is_valid() {
                    return Err(PointErr::BadSetterValue.full());
                }
                Some(Box::new(setter) as Box<dyn Point>)
            }
            None => None,
        };

        Ok(CreatedPoint { point: Box::new(point), setter })
    }
}

/// Factory for [`EnumPoint`]. Unlike `Scalar<T>`/`Array<T,N>`/`String<N>`,
/// an enum's symbol set is not a Rust compile-time parameter -- it is
/// defined per instance by the Node document itself (a `"symbols"` array
/// alongside the usual `id`/`val`/`initial` fields), so one factory is
/// registered under a single reserved GUID rather than one per kind.
pub struct EnumFactory;

impl EnumFactory {
    pub const TYPE_GUID: &'static str = "b1e10000-0000-0000-0000-00000000000e";
}

impl Default for EnumFactory {
    fn default() -> Self {
        Self
    }
}

fn parse_enum_symbols(json: &Value) -> Result<Arc<EnumSymbols>> {
    let symbols_json = json.get("symbols").and_then(Value::as_array).ok_or(PointErr::MissingTypeCfg.full())?;
    let mut symbols = Vec::with_capacity(symbols_json.len());
    for entry in symbols_json {
        let name = entry.as_str().ok_or(PointErr::MissingTypeCfg.full())?;
        symbols.push(name.to_string());
    }
    let type_name = json.get("typeName").and_then(Value::as_str).unwrap_or("Fxt::Point::Enum");
    Ok(Arc::new(EnumSymbols::new(EnumFactory::TYPE_GUID, type_name, symbols)))
}

impl PointFactory for EnumFactory {
    fn type_guid(&self) -> &'static str {
        Self::TYPE_GUID
    }

    fn create(&self, json: &Value, arena: &mut Arena, ha_role: HaRole) -> Result<CreatedPoint> {
        let id = required_id(json)?;
        let symbols = parse_enum_symbols(json)?;
        arena.bump(std::mem::size_of::<EnumPoint>()).map_err(|_| PointErr::MemoryPoint.full())?;

        let mut point = EnumPoint::new_invalid(id, Arc::clone(&symbols), ha_role);
        if let Some(val) = json.get("val").and_then(Value::as_str) {
            point.write_symbol(val, LockRequest::Noop)?;
        }

        let setter = match json.get("initial") {
            Some(initial) => {
                let setter_id = required_id(initial)?;
                arena.bump(std::mem::size_of::<EnumPoint>()).map_err(|_| PointErr::MemoryPoint.full())?;
                let val = initial.get("val").and_then(Value::as_str).ok_or(PointErr::BadSetterValue.full())?;
                let mut setter = EnumPoint::new_invalid(setter_id, Arc::clone(&symbols), HaRole::General);
                setter.write_symbol(val, LockRequest::Noop).map_err(|_| PointErr::BadSetterValue.full())?;
                Some(Box::new(setter) as Box<dyn Point>)
            }
            None => None,
        };

        Ok(CreatedPoint { point: Box::new(point), setter })
    }
}

/// GUID-keyed registry of Point factories, assembled explicitly at Node
/// construction (no static-init registration, per spec.md §9).
#[derive(Default)]
pub struct PointFactoryDatabase {
    factories: HashMap<&'static str, Box<dyn PointFactory>>,
}

impl PointFactoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Box<dyn PointFactory>) {
        self.factories.insert(factory.type_guid(), factory);
    }

    /// Registers factories for every built-in Point kind: the 11 `Scalar<T>`
    /// instantiations, a curated set of `Array<T,N>`/`String<N>` capacities,
    /// and the one generic `Enum` factory.
    pub fn with_builtin_points() -> Self {
        let mut db = Self::new();
        db.register(Box::new(ScalarFactory::<bool>::default()));
        db.register(Box::new(ScalarFactory::<u8>::default()));
        db.register(Box::new(ScalarFactory::<u16>::default()));
        db.register(Box::new(ScalarFactory::<u32>::default()));
        db.register(Box::new(ScalarFactory::<u64>::default()));
        db.register(Box::new(ScalarFactory::<i8>::default()));
        db.register(Box::new(ScalarFactory::<i16>::default()));
        db.register(Box::new(ScalarFactory::<i32>::default()));
        db.register(Box::new(ScalarFactory::<i64>::default()));
        db.register(Box::new(ScalarFactory::<f32>::default()));
        db.register(Box::new(ScalarFactory::<f64>::default()));

        db.register(Box::new(ArrayFactory::<u8, 4>::new()));
        db.register(Box::new(ArrayFactory::<u8, 8>::new()));
        db.register(Box::new(ArrayFactory::<u8, 16>::new()));
        db.register(Box::new(ArrayFactory::<u8, 32>::new()));
        db.register(Box::new(ArrayFactory::<u16, 4>::new()));
        db.register(Box::new(ArrayFactory::<u16, 8>::new()));
        db.register(Box::new(ArrayFactory::<u16, 16>::new()));
        db.register(Box::new(ArrayFactory::<u32, 4>::new()));
        db.register(Box::new(ArrayFactory::<u32, 8>::new()));
        db.register(Box::new(ArrayFactory::<f32, 4>::new()));
        db.register(Box::new(ArrayFactory::<f32, 8>::new()));

        db.register(Box::new(StringFactory::<8>::new()));
        db.register(Box::new(StringFactory::<16>::new()));
        db.register(Box::new(StringFactory::<32>::new()));
        db.register(Box::new(StringFactory::<64>::new()));

        db.register(Box::new(EnumFactory));
        db
    }

    pub fn create(&self, type_guid: &str, json: &Value, arena: &mut Arena, ha_role: HaRole) -> Result<CreatedPoint> {
        let factory = self.factories.get(type_guid).ok_or(PointErr::UnknownGuid.full())?;
        factory.create(json, arena, ha_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creates_point_and_setter_from_json() {
        let db = PointFactoryDatabase::with_builtin_points();
        let mut arena = Arena::new(HaRole::General, 4096);
        let created = db
            .create(
                <u32 as ScalarCodec>::TYPE_GUID,
                &json!({"id": 1, "initial": {"id": 2, "val": 128}}),
                &mut arena,
                HaRole::General,
            )
            .unwrap();
        assert_eq!(created.point.id(), 1);
        assert!(!created.point.is_valid());
        let setter = created.setter.unwrap();
        assert_eq!(setter.id(), 2);
        assert!(setter.is_valid());
    }

    #[test]
    fn unknown_guid_errors() {
        let db = PointFactoryDatabase::with_builtin_points();
        let mut arena = Arena::new(HaRole::General, 4096);
        assert!(db.create("not-a-guid", &json!({"id": 1}), &mut arena, HaRole::General).is_err());
    }

    #[test]
    fn creates_array_point_from_json() {
        let db = PointFactoryDatabase::with_builtin_points();
        let mut arena = Arena::new(HaRole::General, 4096);
        let type_guid = ArrayFactory::<u8, 8>::new().type_guid().to_string();
        let created = db
            .create(
                &type_guid,
                &json!({"id": 1, "val": {"start": 0, "elems": [1, 2, 3]}}),
                &mut arena,
                HaRole::General,
            )
            .unwrap();
        let arr = created.point.as_any().downcast_ref::<ArrayPoint<u8, 8>>().unwrap();
        assert_eq!(arr.read().unwrap(), [1, 2, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn creates_string_point_from_json() {
        let db = PointFactoryDatabase::with_builtin_points();
        let mut arena = Arena::new(HaRole::General, 4096);
        let type_guid = StringFactory::<16>::new().type_guid().to_string();
        let created = db.create(&type_guid, &json!({"id": 1, "val": "hello"}), &mut arena, HaRole::General).unwrap();
        let s = created.point.as_any().downcast_ref::<StringPoint<16>>().unwrap();
        assert_eq!(s.read(), Some("hello"));
    }

    #[test]
    fn creates_enum_point_from_json_with_setter() {
        let db = PointFactoryDatabase::with_builtin_points();
        let mut arena = Arena::new(HaRole::General, 4096);
        let created = db
            .create(
                EnumFactory::TYPE_GUID,
                &json!({
                    "id": 1,
                    "symbols": ["OFF", "ON"],
                    "val": "ON",
                    "initial": {"id": 2, "val": "OFF"}
                }),
                &mut arena,
                HaRole::General,
            )
            .unwrap();
        let e = created.point.as_any().downcast_ref::<EnumPoint>().unwrap();
        assert_eq!(e.read_symbol(), Some("ON"));
        let setter = created.setter.unwrap();
        let setter = setter.as_any().downcast_ref::<EnumPoint>().unwrap();
        assert_eq!(setter.read_symbol(), Some("OFF"));
    }

    #[test]
    fn enum_factory_rejects_missing_symbols() {
        let db = PointFactoryDatabase::with_builtin_points();
        let mut arena = Arena::new(HaRole::General, 4096);
        assert!(db.create(EnumFactory::TYPE_GUID, &json!({"id": 1}), &mut arena, HaRole::General).is_err());
    }
}
