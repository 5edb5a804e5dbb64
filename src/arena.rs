//! Bump-arena bookkeeping.
//!
//! The original engine allocates every runtime object's storage from one of
//! three raw-pointer bump arenas partitioned by lifetime/HA role, and resets
//! them wholesale rather than freeing individual objects (spec.md §3/§5,
//! §9's redesign note: "pointer graphs... model as indices into
//! arena-backed vectors rather than raw owning pointers").
//!
//! A literal byte-bump allocator handing out raw pointers would require
//! `unsafe` transmutes on every access with no compensating safety benefit
//! in Rust, where `Box`/`Vec` already give single-owner, bulk-droppable
//! storage. This module keeps the arena *model* -- a named, capacity-bounded,
//! append-only, reset-wholesale allocation ledger per [`HaRole`] -- while
//! actual object storage is ordinary heap allocation. The byte budget in
//! [`crate::config::EngineLimits`] is enforced here so a Node still fails
//! construction the way the original would when a fixed arena is exhausted,
//! and [`Arena::reset`] is the one place bulk "free everything" happens,
//! matching the original's "no per-object free" invariant.

use crate::error::{Error, NodeErr};

/// Which bump arena a Point's stateful memory is drawn from (spec.md
/// §3(e)/§5 EXPANSION in SPEC_FULL.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HaRole {
    /// Metadata, factory bookkeeping, auto-points, setters: never HA-critical.
    General,
    /// Card IO-register payloads.
    CardStateful,
    /// Point payloads that must survive an HA switchover.
    HaStateful,
}

/// A named, byte-budgeted allocation ledger. Tracks cumulative bytes
/// "allocated" in insertion order; never gives back memory except via
/// [`Arena::reset`].
#[derive(Debug)]
pub struct Arena {
    role: HaRole,
    budget_bytes: usize,
    used_bytes: usize,
    allocation_count: usize,
}

impl Arena {
    pub const fn new(role: HaRole, budget_bytes: usize) -> Self {
        Self {
            role,
            budget_bytes,
            used_bytes: 0,
            allocation_count: 0,
        }
    }

    pub const fn role(&self) -> HaRole {
        self.role
    }

    pub const fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub const fn remaining_bytes(&self) -> usize {
        self.budget_bytes.saturating_sub(self.used_bytes)
    }

    pub const fn allocation_count(&self) -> usize {
        self.allocation_count
    }

    /// Record a `size_bytes` allocation. Returns `NODE:FAILED_CREATE_CHASSIS`
    /// style out-of-memory error when the arena's budget would be exceeded;
    /// callers that allocate many small pieces for one logical object
    /// (e.g. a Point plus its setter) call this once per piece so the
    /// budget reflects real usage.
    pub fn bump(&mut self, size_bytes: usize) -> Result<(), Error> {
        let new_used = self.used_bytes + size_bytes;
        if new_used > self.budget_bytes {
            return Err(NodeErr::FailedCreateChassis.full());
        }
        self.used_bytes = new_used;
        self.allocation_count += 1;
        Ok(())
    }

    /// Reset the ledger wholesale. Called on Node destruction or HA
    /// switchover; never called to free a single object.
    pub fn reset(&mut self) {
        self.used_bytes = 0;
        self.allocation_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_tracks_usage_and_rejects_overflow() {
        let mut arena = Arena::new(HaRole::General, 16);
        arena.bump(10).unwrap();
        assert_eq!(arena.used_bytes(), 10);
        assert_eq!(arena.remaining_bytes(), 6);
        assert!(arena.bump(10).is_err());
        assert_eq!(arena.used_bytes(), 10, "failed bump must not partially apply");
    }

    #[test]
    fn reset_clears_ledger() {
        let mut arena = Arena::new(HaRole::HaStateful, 16);
        arena.bump(8).unwrap();
        arena.reset();
        assert_eq!(arena.used_bytes(), 0);
        assert_eq!(arena.allocation_count(), 0);
    }
}
