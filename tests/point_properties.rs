//! Property tests for the quantified Point invariants.

use foxtail::arena::HaRole;
use foxtail::point::scalar::Uint32Point;
use foxtail::point::{LockRequest, Point};
use proptest::prelude::*;

proptest! {
    #[test]
    fn set_invalid_always_reads_back_invalid(initial in any::<u32>()) {
        let mut p = Uint32Point::new_valid(0, initial, HaRole::General);
        p.set_invalid(LockRequest::Noop);
        prop_assert_eq!(p.read(), None);
        prop_assert!(!p.to_json(false).as_object().unwrap().contains_key("val"));
    }

    #[test]
    fn lock_then_write_is_ignored_then_unlock_write_lands(a in any::<u32>(), b in any::<u32>(), c in any::<u32>()) {
        let mut p = Uint32Point::new_invalid(0, HaRole::General);
        p.write(a, LockRequest::Lock);
        p.write(b, LockRequest::Noop);
        prop_assert_eq!(p.read(), Some(a));
        p.write(c, LockRequest::Unlock);
        prop_assert_eq!(p.read(), Some(c));
        prop_assert!(!p.is_locked());
    }

    #[test]
    fn to_json_from_json_round_trips_value_and_lock_state(
        value in any::<u32>(),
        lock in any::<bool>(),
    ) {
        let mut p = Uint32Point::new_invalid(0, HaRole::General);
        let lr = if lock { LockRequest::Lock } else { LockRequest::Noop };
        p.write(value, lr);

        let json = p.to_json(true);
        let mut round_tripped = Uint32Point::new_invalid(0, HaRole::General);
        round_tripped.from_json(&json).unwrap();

        prop_assert_eq!(round_tripped.read(), p.read());
        prop_assert_eq!(round_tripped.is_locked(), p.is_locked());
        prop_assert_eq!(round_tripped.is_valid(), p.is_valid());
    }

    #[test]
    fn array_point_partial_write_boundary(
        start in 0usize..8,
        len in 0usize..8,
    ) {
        use foxtail::point::array::ArrayPoint;
        let mut arr: ArrayPoint<u8, 4> = ArrayPoint::new_invalid(0, HaRole::General);
        let values = vec![1u8; len];
        let result = arr.write_partial(start, &values, LockRequest::Noop);
        if start + len > 4 {
            prop_assert!(result.is_err());
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
