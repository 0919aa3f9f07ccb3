use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::{config::WorldConfig, error::PartyError, object::ObjectId};

/// `GetXPBonus(memberCount)` lookup table, indexed by member count minus
/// one (spec.md §4.7, §8 literal scenario 1). A party beyond 9 members
/// keeps the 9-member bonus.
const XP_BONUS_TABLE: [f32; 9] = [1.00, 1.10, 1.20, 1.30, 1.40, 1.50, 2.00, 2.10, 2.20];

pub fn xp_bonus_for_member_count(member_count: usize) -> f32 {
    if member_count == 0 {
        return XP_BONUS_TABLE[0];
    }
    let index = (member_count - 1).min(XP_BONUS_TABLE.len() - 1);
    XP_BONUS_TABLE[index]
}

struct PartyState {
    leader: ObjectId,
    members: Vec<ObjectId>,
}

/// A single party's roster and leadership (spec.md §4.7). Membership and
/// leader are guarded by one lock; `party_max_members` is read from
/// `WorldConfig` at construction.
pub struct Party {
    pub id: u32,
    max_members: usize,
    state: RwLock<PartyState>,
}

impl Party {
    pub fn new(id: u32, leader: ObjectId, config: &WorldConfig) -> Self {
        Self {
            id,
            max_members: config.party_max_members,
            state: RwLock::new(PartyState {
                leader,
                members: vec![leader],
            }),
        }
    }

    pub fn leader(&self) -> ObjectId {
        self.state.read().leader
    }

    pub fn members(&self) -> Vec<ObjectId> {
        self.state.read().members.clone()
    }

    pub fn member_count(&self) -> usize {
        self.state.read().members.len()
    }

    pub fn xp_bonus(&self) -> f32 {
        xp_bonus_for_member_count(self.member_count())
    }

    pub fn is_member(&self, id: ObjectId) -> bool {
        self.state.read().members.contains(&id)
    }

    pub fn add_member(&self, id: ObjectId) -> Result<(), PartyError> {
        let mut state = self.state.write();
        if state.members.contains(&id) {
            return Err(PartyError::AlreadyMember(id));
        }
        if state.members.len() >= self.max_members {
            return Err(PartyError::PartyFull);
        }
        state.members.push(id);
        Ok(())
    }

    /// Removes `id` preserving the remaining members' order, promoting the
    /// new head of the list to leader if `id` was the leader and members
    /// remain. Returns whether the party should now be disbanded (fewer
    /// than two members left) — spec.md §4.7's `RemoveMember`.
    pub fn remove_member(&self, id: ObjectId) -> Result<bool, PartyError> {
        let mut state = self.state.write();
        let position = state.members.iter().position(|member| *member == id);
        match position {
            Some(index) => {
                state.members.remove(index);
                if state.leader == id {
                    if let Some(next) = state.members.first().copied() {
                        state.leader = next;
                    }
                }
                Ok(state.members.len() < 2)
            }
            None => Err(PartyError::NotMember(id)),
        }
    }

    /// Swaps `id` to the front of the member list and makes it leader
    /// (spec.md §4.7's `SetLeader`).
    pub fn set_leader(&self, id: ObjectId) -> Result<(), PartyError> {
        let mut state = self.state.write();
        let position = state.members.iter().position(|member| *member == id);
        match position {
            Some(index) => {
                state.members.swap(0, index);
                state.leader = id;
                Ok(())
            }
            None => Err(PartyError::NotMember(id)),
        }
    }

    /// Members within `range_squared` world units of `origin`, given each
    /// member's current location (spec.md §4.7's `MembersInRange`). The
    /// caller supplies a location lookup since `Party` does not hold
    /// references to the entities themselves.
    pub fn members_in_range(
        &self,
        origin_x: i32,
        origin_y: i32,
        range_squared: i64,
        location_of: impl Fn(ObjectId) -> Option<(i32, i32)>,
    ) -> Vec<ObjectId> {
        self.members()
            .into_iter()
            .filter(|id| {
                location_of(*id)
                    .map(|(x, y)| {
                        let dx = (x - origin_x) as i64;
                        let dy = (y - origin_y) as i64;
                        dx * dx + dy * dy <= range_squared
                    })
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Registry of every live party, keyed by party id, plus a reverse index
/// from member to party for O(1) "am I in a party" lookups (spec.md §4.7).
pub struct PartyManager {
    next_id: AtomicU32,
    parties: DashMap<u32, Party>,
    member_to_party: DashMap<ObjectId, u32>,
    config: WorldConfig,
}

impl PartyManager {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            next_id: AtomicU32::new(1),
            parties: DashMap::new(),
            member_to_party: DashMap::new(),
            config,
        }
    }

    pub fn create_party(&self, leader: ObjectId) -> Result<u32, PartyError> {
        if self.member_to_party.contains_key(&leader) {
            return Err(PartyError::AlreadyMember(leader));
        }
        let id = self.next_id.fetch_add(1, Ordering::AcqRel);
        self.parties.insert(id, Party::new(id, leader, &self.config));
        self.member_to_party.insert(leader, id);
        Ok(id)
    }

    pub fn party_of(&self, member: ObjectId) -> Option<u32> {
        self.member_to_party.get(&member).map(|entry| *entry)
    }

    pub fn add_member(&self, party_id: u32, member: ObjectId) -> Result<(), PartyError> {
        if self.member_to_party.contains_key(&member) {
            return Err(PartyError::AlreadyMember(member));
        }
        let party = self.parties.get(&party_id).ok_or(PartyError::PartyNotFound(party_id))?;
        party.add_member(member)?;
        self.member_to_party.insert(member, party_id);
        Ok(())
    }

    /// Removes `member` from its party. If the party drops below two
    /// members it is disbanded: every remaining member's reverse-index
    /// entry is cleared along with the party itself (spec.md §4.7's
    /// `RemoveMember`/`DisbandParty`; notification remains the caller's
    /// responsibility).
    pub fn remove_member(&self, member: ObjectId) -> Result<(), PartyError> {
        let party_id = self
            .member_to_party
            .remove(&member)
            .map(|(_, id)| id)
            .ok_or(PartyError::NotMember(member))?;
        if let Some(party) = self.parties.get(&party_id) {
            let should_disband = party.remove_member(member)?;
            if should_disband {
                let remaining = party.members();
                drop(party);
                self.parties.remove(&party_id);
                for remaining_member in remaining {
                    self.member_to_party.remove(&remaining_member);
                }
            }
        }
        Ok(())
    }

    pub fn snapshot_members(&self, party_id: u32) -> HashMap<u32, Vec<ObjectId>> {
        let mut snapshot = HashMap::new();
        if let Some(party) = self.parties.get(&party_id) {
            snapshot.insert(party_id, party.members());
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_xp_bonus_matches_member_count_table() {
        assert_eq!(xp_bonus_for_member_count(1), 1.00);
        assert_eq!(xp_bonus_for_member_count(2), 1.10);
        assert_eq!(xp_bonus_for_member_count(9), 2.20);
        assert_eq!(xp_bonus_for_member_count(20), 2.20);
    }

    #[test]
    fn add_member_enforces_party_cap() {
        let config = WorldConfig::default();
        let party = Party::new(1, ObjectId(1), &config);
        for i in 2..=9 {
            party.add_member(ObjectId(i)).unwrap();
        }
        assert_eq!(party.add_member(ObjectId(100)), Err(PartyError::PartyFull));
    }

    #[test]
    fn leader_reassigned_when_leader_leaves() {
        let config = WorldConfig::default();
        let party = Party::new(1, ObjectId(1), &config);
        party.add_member(ObjectId(2)).unwrap();
        party.remove_member(ObjectId(1)).unwrap();
        assert_eq!(party.leader(), ObjectId(2));
    }

    #[test]
    fn manager_disbands_party_once_below_two_members() {
        let manager = PartyManager::new(WorldConfig::default());
        let party_id = manager.create_party(ObjectId(1)).unwrap();
        manager.add_member(party_id, ObjectId(2)).unwrap();
        manager.add_member(party_id, ObjectId(3)).unwrap();
        assert_eq!(manager.party_of(ObjectId(2)), Some(party_id));

        manager.remove_member(ObjectId(1)).unwrap();
        assert_eq!(manager.party_of(ObjectId(2)), Some(party_id));

        manager.remove_member(ObjectId(2)).unwrap();
        assert_eq!(manager.party_of(ObjectId(2)), None);
        assert_eq!(manager.party_of(ObjectId(3)), None);
    }
}
