//! The Point model: typed, identity-addressed, validity/lock-aware signal
//! cells (spec.md §3, §4.1).
//!
//! `Deep inheritance of Point types collapses to a small set of parametric
//! Point kinds` (spec.md §9): [`scalar::Scalar<T>`] covers every bool/
//! integer/float kind, [`array::ArrayPoint<T, N>`] the fixed-capacity
//! arrays, [`enum_point::EnumPoint`] the symbolic enums, and
//! [`string_point::StringPoint<N>`] fixed-capacity strings. Each implements
//! the single object-safe [`Point`] trait below, so a [`database::PointDatabase`]
//! can hold `Box<dyn Point>` regardless of concrete kind -- the Rust
//! equivalent of the original's virtual base class, without the hierarchy.

pub mod array;
pub mod database;
pub mod enum_point;
pub mod factory;
pub mod scalar;
pub mod string_point;

use std::any::Any;

use crate::arena::HaRole;
use crate::error::Result;

/// Stable Point identifier. `INVALID_ID` (all-ones) denotes "unset".
pub type PointId = u32;

/// Sentinel for "no Point" / "unset reference".
pub const INVALID_ID: PointId = PointId::MAX;

/// Governs whether a write/invalidate proceeds against a Point's current
/// lock state, and what the lock state becomes afterward (spec.md §4.1
/// "Lock-request rules").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRequest {
    /// Lock unchanged; mutation proceeds only if currently unlocked.
    Noop,
    /// Mutation proceeds only if currently unlocked; on success, locks.
    Lock,
    /// Mutation always proceeds; on completion, unlocks.
    Unlock,
}

impl LockRequest {
    /// Whether a mutation may proceed given the Point's current lock state.
    pub const fn permits(self, currently_locked: bool) -> bool {
        match self {
            Self::Noop | Self::Lock => !currently_locked,
            Self::Unlock => true,
        }
    }

    /// The lock state to apply after a permitted mutation completes.
    pub const fn resulting_lock_state(self, currently_locked: bool) -> bool {
        match self {
            Self::Noop => currently_locked,
            Self::Lock => true,
            Self::Unlock => false,
        }
    }
}

/// The common contract every concrete Point kind implements (spec.md §4.1).
///
/// Object-safe so a [`database::PointDatabase`] can store `Box<dyn Point>`
/// uniformly. Concrete kinds additionally expose typed `read`/`write`
/// inherent methods (see [`scalar::Scalar`]) that Components use once they
/// have downcast via [`Point::as_any`] -- the same "same concrete type"
/// downcast the original performs when copying a setter's value onto its
/// sibling Point.
pub trait Point: Any + Send + Sync {
    fn id(&self) -> PointId;

    /// 8-4-4-4-12 GUID string identifying the concrete Point type. Never
    /// changes after construction (spec.md §3 invariant (c)).
    fn type_guid(&self) -> &'static str;

    /// Human-readable type label (e.g. `"Fxt::Point::Uint32"`).
    fn type_name(&self) -> &'static str;

    fn is_valid(&self) -> bool;

    fn is_locked(&self) -> bool;

    /// Which arena this Point's stateful memory belongs to.
    fn ha_role(&self) -> HaRole;

    /// Force `valid = false` and clear the payload to a deterministic
    /// zero, subject to the lock-request rules.
    fn set_invalid(&mut self, lock_request: LockRequest);

    /// `{"id":N,"valid":B,"type":"...","locked":B,"val":...}`. `val` is
    /// omitted when invalid; `type`/`locked` are omitted unless `verbose`.
    fn to_json(&self, verbose: bool) -> serde_json::Value;

    /// Accepts a partial update object. `val` alone updates value and
    /// leaves lock/valid alone (unless `valid:false` is explicitly
    /// present); `locked:true|false` sets lock state without requiring a
    /// value.
    fn from_json(&mut self, src: &serde_json::Value) -> Result<()>;

    /// Copy `(valid, value)` from `setter` onto `self`, subject to
    /// `lock_request`. `setter` must be the same concrete type; callers
    /// are expected to have matched `type_guid` first, but implementations
    /// double-check via `as_any` before committing.
    fn update_from_setter(&mut self, setter: &dyn Point, lock_request: LockRequest) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared helper: extract `id`/`valid`/`locked` envelope fields common to
/// every concrete kind's `from_json`. Returns `(explicit_valid, explicit_locked)`.
pub(crate) fn parse_envelope_flags(src: &serde_json::Value) -> (Option<bool>, Option<bool>) {
    let explicit_valid = src.get("valid").and_then(serde_json::Value::as_bool);
    let explicit_locked = src.get("locked").and_then(serde_json::Value::as_bool);
    (explicit_valid, explicit_locked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_request_noop_blocks_when_locked() {
        assert!(!LockRequest::Noop.permits(true));
        assert!(LockRequest::Noop.permits(false));
        assert!(LockRequest::Noop.resulting_lock_state(true));
        assert!(!LockRequest::Noop.resulting_lock_state(false));
    }

    #[test]
    fn lock_request_lock_sets_locked_on_success() {
        assert!(LockRequest::Lock.permits(false));
        assert!(!LockRequest::Lock.permits(true));
        assert!(LockRequest::Lock.resulting_lock_state(false));
    }

    #[test]
    fn lock_request_unlock_always_permits_and_unlocks() {
        assert!(LockRequest::Unlock.permits(true));
        assert!(LockRequest::Unlock.permits(false));
        assert!(!LockRequest::Unlock.resulting_lock_state(true));
    }
}
