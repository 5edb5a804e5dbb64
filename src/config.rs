//! Engine capacity limits.
//!
//! All compile-time-sized collections (arenas, fixed-capacity vectors of
//! Cards/Components/Chassis) are bounded by values collected here rather
//! than scattered as magic numbers through the engine. Values can be
//! overridden per-Node for embedded targets with tighter budgets than the
//! desktop-host defaults.

use serde::{Deserialize, Serialize};

/// Capacity limits for a single Node and everything it owns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineLimits {
    // --- Node-level ---
    /// Maximum number of Chassis per Node.
    pub max_chassis: usize,
    /// Maximum number of Points tracked in the PointDatabase.
    pub max_points: usize,

    // --- Chassis-level ---
    /// Maximum number of Cards per Chassis.
    pub max_cards_per_chassis: usize,
    /// Maximum number of LogicChains per Chassis.
    pub max_logic_chains_per_chassis: usize,

    // --- LogicChain-level ---
    /// Maximum number of Components per LogicChain.
    pub max_components_per_chain: usize,
    /// Maximum number of auto-points owned by one LogicChain.
    pub max_auto_points_per_chain: usize,

    // --- Component-level ---
    /// Maximum input references a single Component may declare.
    pub max_component_inputs: usize,
    /// Maximum output references a single Component may declare.
    pub max_component_outputs: usize,

    // --- Card-level ---
    /// Maximum input channels per Card.
    pub max_card_input_channels: usize,
    /// Maximum output channels per Card.
    pub max_card_output_channels: usize,

    // --- Arena byte budgets ---
    /// Byte budget for the general arena (metadata, factory bookkeeping).
    pub general_arena_bytes: usize,
    /// Byte budget for the card-stateful arena (IO-register payloads).
    pub card_stateful_arena_bytes: usize,
    /// Byte budget for the HA-stateful arena (HA-snapshotted payloads).
    pub ha_stateful_arena_bytes: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_chassis: 8,
            max_points: 4096,

            max_cards_per_chassis: 16,
            max_logic_chains_per_chassis: 8,

            max_components_per_chain: 64,
            max_auto_points_per_chain: 32,

            max_component_inputs: 16,
            max_component_outputs: 16,

            max_card_input_channels: 32,
            max_card_output_channels: 32,

            general_arena_bytes: 256 * 1024,
            card_stateful_arena_bytes: 64 * 1024,
            ha_stateful_arena_bytes: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_nonzero() {
        let limits = EngineLimits::default();
        assert!(limits.max_chassis > 0);
        assert!(limits.general_arena_bytes > 0);
    }
}
