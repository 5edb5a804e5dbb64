//! The Card framework: hardware-to-Point shuttling (spec.md §4.3).
//!
//! Concrete hardware drivers (RP2040 GPIO/ADC/I2C/PWM) are out of scope;
//! this module ships the `Card` trait contract plus [`mock::MockDigital8`],
//! grounded directly on
//! `examples/original_source/src/Fxt/Card/Mock/_0test/digital8.cpp`.

pub mod database;
pub mod factory;
pub mod mock;

use crate::error::Result;
use crate::point::database::PointDatabase;

/// `{Created -> Started <-> Stopped -> Destroyed}` (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Created,
    Started,
    Stopped,
}

/// One channel's point wiring: the Point a Component/user sees, and its
/// twin IO-register Point that mirrors the hardware-facing value.
#[derive(Debug, Clone, Copy)]
pub struct ChannelMap {
    pub channel: u8,
    pub point_id: crate::point::PointId,
    pub io_reg_id: crate::point::PointId,
}

/// Validate that `channels` is a permutation of `1..=channels.len()`
/// (spec.md §4.3 "Channel-assignment rule").
pub fn validate_channel_assignments(channels: &[u8]) -> Result<()> {
    use crate::error::CardErr;
    let n = channels.len();
    let mut seen = vec![false; n + 1];
    for &ch in channels {
        let idx = ch as usize;
        if idx == 0 || idx > n || seen[idx] {
            return Err(CardErr::BadChannelAssignments.full());
        }
        seen[idx] = true;
    }
    Ok(())
}

pub trait Card: Send + Sync {
    fn local_id(&self) -> u32;
    fn name(&self) -> &str;
    fn type_guid(&self) -> &'static str;
    fn type_name(&self) -> &'static str;
    fn state(&self) -> CardState;

    fn start(&mut self, point_db: &mut PointDatabase) -> Result<()>;
    fn stop(&mut self, point_db: &mut PointDatabase) -> Result<()>;

    /// For each input channel: copy the sampled hardware-facing value (as
    /// currently held by the twin IO-register Point) into the input
    /// Point; invalid register ⇒ invalid input Point.
    fn scan_inputs(&mut self, point_db: &mut PointDatabase) -> Result<()>;

    /// For each output channel: if the output Point is valid, mirror it
    /// into the register Point; if invalid, drive the register to its
    /// safe state and mark it invalid too.
    fn flush_outputs(&mut self, point_db: &mut PointDatabase) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_of_one_to_n_is_valid() {
        assert!(validate_channel_assignments(&[1, 2, 3]).is_ok());
    }

    #[test]
    fn duplicate_channel_is_rejected() {
        assert!(validate_channel_assignments(&[1, 1]).is_err());
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        assert!(validate_channel_assignments(&[1, 3]).is_err());
    }
}
