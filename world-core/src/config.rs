use serde::{Deserialize, Serialize};

/// Tunables the world substrate needs at construction time. Everything
/// else (packet framing, persistence, static data) is configured by the
/// collaborator that owns it, not by this crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Maximum party member count (spec.md §3, `Party` invariant).
    pub party_max_members: usize,

    /// Minimum level required to add or hold a subclass (spec.md §4.6).
    pub subclass_level_gate: i32,

    /// How long a P2P trade request stays open before `is_request_expired`
    /// starts returning true (spec.md §4.6, §5).
    pub trade_request_expiry_secs: u64,

    /// How long attack stance persists after the last recorded attack
    /// before it fades and no longer blocks logout (spec.md §4.6, §5).
    pub attack_stance_fade_secs: u64,

    /// Side length, in world units, of one visibility region cell
    /// (spec.md §4.10).
    pub region_size: i32,

    /// Default `maxAge` beyond which `VisibilityCache::is_stale` reports
    /// true if the caller does not supply its own threshold.
    pub visibility_stale_after_ms: u64,

    /// Inventory slot count per page, carried over from the teacher's
    /// `INVENTORY_PAGE_SIZE` layout; used only to size warehouse pages
    /// since spec.md leaves player inventory capacity to a collaborator.
    pub warehouse_page_size: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            party_max_members: 9,
            subclass_level_gate: 75,
            trade_request_expiry_secs: 10,
            attack_stance_fade_secs: 15,
            region_size: 64,
            visibility_stale_after_ms: 250,
            warehouse_page_size: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_literals() {
        let config = WorldConfig::default();
        assert_eq!(config.party_max_members, 9);
        assert_eq!(config.subclass_level_gate, 75);
        assert_eq!(config.trade_request_expiry_secs, 10);
        assert_eq!(config.attack_stance_fade_secs, 15);
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let config: WorldConfig = serde_json::from_str(r#"{"party_max_members": 5}"#).unwrap();
        assert_eq!(config.party_max_members, 5);
        assert_eq!(config.subclass_level_gate, 75);
    }
}
