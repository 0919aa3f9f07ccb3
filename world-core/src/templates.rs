use std::fmt;

use serde::{Deserialize, Serialize};

/// Crystal grade, exact string form pinned by spec.md §6.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i32)]
pub enum CrystalGrade {
    None = 0,
    D = 1,
    C = 2,
    B = 3,
    A = 4,
    S = 5,
}

impl fmt::Display for CrystalGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CrystalGrade::None => "NONE",
            CrystalGrade::D => "D",
            CrystalGrade::C => "C",
            CrystalGrade::B => "B",
            CrystalGrade::A => "A",
            CrystalGrade::S => "S",
        };
        f.write_str(s)
    }
}

/// Client type-1 codes (spec.md §6).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType1 {
    WeaponOrAccessory = 0,
    ShieldOrArmor = 1,
    EtcQuestAdena = 4,
}

/// Client type-2 codes (spec.md §6).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType2 {
    Weapon = 0,
    ShieldOrArmor = 1,
    Accessory = 2,
    Quest = 3,
    Money = 4,
    Other = 5,
}

/// Immutable item descriptor shared by every instance of an item with this
/// template id (spec.md §3). `Id::from(57)` is the canonical adena
/// template (spec.md §6); see `crate::inventory::ADENA_TEMPLATE_ID`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub template_id: u32,
    pub name: String,
    pub crystal_grade: CrystalGrade,
    pub client_type_1: ClientType1,
    pub client_type_2: ClientType2,
    pub is_stackable: bool,
    pub is_tradeable: bool,
    pub is_quest_item: bool,
    /// Weapon/armor physical attack or defence bonus; zero for non-equipment.
    pub p_atk: i32,
    pub p_def: i32,
    pub m_atk: i32,
    pub m_def: i32,
    /// Weapon attack range, used in place of the class template's base
    /// range when a weapon is equipped (spec.md §4.6).
    pub attack_range: Option<i32>,
    /// Body part bitmask this item occupies when equipped (spec.md §6).
    pub body_part_mask: u32,
}

/// Immutable class/NPC ability-score template, shared by every instance
/// of that class or NPC kind (spec.md §3, §4.6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassTemplate {
    pub class_id: u32,
    pub base_p_atk: i32,
    pub base_p_def: i32,
    pub base_m_atk: i32,
    pub base_m_def: i32,
    pub base_p_atk_speed: i32,
    pub base_m_atk_speed: i32,
    pub base_attack_range: i32,
    pub base_evasion: i32,
    pub base_accuracy: i32,
    pub base_critical: i32,
}

/// Immutable NPC template shared by every spawn of that NPC kind
/// (spec.md §3, §4.3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NpcTemplate {
    pub npc_id: u32,
    pub name: String,
    pub level: i32,
    pub max_hp: i32,
    pub max_mp: i32,
    pub p_atk: i32,
    pub p_def: i32,
    pub m_atk: i32,
    pub m_def: i32,
    pub attack_range: i32,
    /// Aggro range; a positive value means the NPC spawns aggressive
    /// (spec.md §3, `Npc`/`Monster` invariant).
    pub aggro_range: i32,
}

/// `StatBonusProvider.GetStatBonus(name)` from spec.md §6: a
/// multiplicative modifier sourced from active effects. The effect
/// catalog itself is out of scope (spec.md §1); this is only the seam the
/// core's stat derivation formulas read through.
pub trait StatBonusProvider {
    fn get_stat_bonus(&self, name: &str) -> f32;
}

/// `GetTemplate(classId)` from spec.md §6.
pub trait ClassTemplateProvider {
    fn get_template(&self, class_id: u32) -> Option<ClassTemplate>;
}

/// `STRBonus/CONBonus/DEXBonus/INTBonus/MENBonus/WITBonus` keyed by
/// attribute value (spec.md §6).
pub trait AttributeBonusTables {
    fn str_bonus(&self, value: i32) -> f32;
    fn con_bonus(&self, value: i32) -> f32;
    fn dex_bonus(&self, value: i32) -> f32;
    fn int_bonus(&self, value: i32) -> f32;
    fn men_bonus(&self, value: i32) -> f32;
    fn wit_bonus(&self, value: i32) -> f32;
}

/// Per-attribute henna delta and class-allow predicate (spec.md §6).
pub struct HennaDef {
    pub dye_id: u32,
    pub str_delta: i32,
    pub con_delta: i32,
    pub dex_delta: i32,
    pub int_delta: i32,
    pub men_delta: i32,
    pub wit_delta: i32,
}

pub trait HennaDefProvider {
    fn get_henna_def(&self, dye_id: u32) -> Option<HennaDef>;
    fn is_allowed_for_class(&self, dye_id: u32, class_id: u32) -> bool;
}

/// `IsValidSubClass(classId, baseClassId, raceId, existingIds)` from
/// spec.md §6.
pub trait SubclassValidator {
    fn is_valid_subclass(&self, class_id: u32, base_class_id: u32, race_id: u32, existing_ids: &[u32]) -> bool;
}

/// `GetExpForLevel(level)` from spec.md §6.
pub trait ExpTable {
    fn exp_for_level(&self, level: i32) -> i64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crystal_grade_string_form_is_exact() {
        assert_eq!(CrystalGrade::None.to_string(), "NONE");
        assert_eq!(CrystalGrade::D.to_string(), "D");
        assert_eq!(CrystalGrade::C.to_string(), "C");
        assert_eq!(CrystalGrade::B.to_string(), "B");
        assert_eq!(CrystalGrade::A.to_string(), "A");
        assert_eq!(CrystalGrade::S.to_string(), "S");
    }
}
