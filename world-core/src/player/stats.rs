use crate::{item::EquipmentSlot, templates::ClassTemplate};

/// Raw ability scores plus the henna bonus layered on top of them
/// (spec.md §4.6). `effect_bonus` is the seam for the future effect
/// manager; it is read on every derivation but owned entirely by the
/// collaborator.
#[derive(Copy, Clone, Debug, Default)]
pub struct Attributes {
    pub str_base: i32,
    pub con_base: i32,
    pub dex_base: i32,
    pub int_base: i32,
    pub men_base: i32,
    pub wit_base: i32,
}

/// Per-attribute henna bonus, each independently capped at +5 via the
/// monotone update rule in spec.md §4.6.
#[derive(Copy, Clone, Debug, Default)]
pub struct HennaBonus {
    pub str_bonus: i32,
    pub con_bonus: i32,
    pub dex_bonus: i32,
    pub int_bonus: i32,
    pub men_bonus: i32,
    pub wit_bonus: i32,
}

/// `min(c+b, 5) if c+b > 5 else c+b` (spec.md §4.6).
pub fn apply_henna_delta(current: i32, delta: i32) -> i32 {
    let sum = current + delta;
    if sum > 5 {
        sum.min(5)
    } else {
        sum
    }
}

/// Fully derived, read-on-demand combat statistics (spec.md §4.6). Every
/// field is a pure function of the inputs passed to `derive`; nothing here
/// is cached, matching the "recomputed on read" rule.
#[derive(Copy, Clone, Debug, Default)]
pub struct DerivedStats {
    pub level_mod: f32,
    pub base_p_atk: f32,
    pub p_atk: f32,
    pub p_def: f32,
    pub p_atk_speed: f32,
    pub m_atk: f32,
    pub m_atk_speed: f32,
    pub m_def: f32,
    pub evasion: f32,
    pub accuracy: f32,
    pub critical: f32,
    pub attack_range: i32,
    pub attack_delay_millis: f32,
    pub max_load: f32,
    pub inventory_limit: u32,
}

/// Nude + weapon attack bonus, with the weapon's own `pAtk` contribution
/// when one is supplied.
#[derive(Copy, Clone, Debug, Default)]
pub struct EquippedWeapon {
    pub p_atk: i32,
    pub attack_range: i32,
}

/// Total defence contributed by occupied armor slots (spec.md §4.6: chest,
/// legs, head, feet, gloves, underwear, cloak).
#[derive(Copy, Clone, Debug, Default)]
pub struct ArmorContribution {
    pub total_p_def: i32,
    pub total_slot_base_def: i32,
}

pub const ARMOR_CONTRIBUTING_SLOTS: [EquipmentSlot; 7] = [
    EquipmentSlot::Chest,
    EquipmentSlot::Legs,
    EquipmentSlot::Head,
    EquipmentSlot::Feet,
    EquipmentSlot::Gloves,
    EquipmentSlot::Underwear,
    EquipmentSlot::Cloak,
];

/// Race id reserved for Dwarves, which get a larger `inventoryLimit`
/// (spec.md §4.6).
pub const DWARF_RACE_ID: u32 = 4;

/// `levelMod = (level + 89) / 100` (spec.md §4.6). Computed in floating
/// point since every downstream formula multiplies by it.
pub fn level_mod(level: i32) -> f32 {
    (level as f32 + 89.0) / 100.0
}

pub trait AttributeBonus {
    fn str_bonus(&self, value: i32) -> f32;
    fn con_bonus(&self, value: i32) -> f32;
    fn dex_bonus(&self, value: i32) -> f32;
    fn int_bonus(&self, value: i32) -> f32;
    fn men_bonus(&self, value: i32) -> f32;
    fn wit_bonus(&self, value: i32) -> f32;
}

/// Recomputes the full stat block (spec.md §4.6). `weapon` is `None` when
/// bare-handed; `armor` is the caller's pre-summed contribution across the
/// seven contributing paperdoll slots.
pub fn derive(
    level: i32,
    attributes: Attributes,
    henna: HennaBonus,
    class_template: &ClassTemplate,
    attribute_bonus: &dyn AttributeBonus,
    race_id: u32,
    weapon: Option<EquippedWeapon>,
    armor: ArmorContribution,
) -> DerivedStats {
    let level_mod = level_mod(level);
    let str_total = attributes.str_base + henna.str_bonus;
    let dex_total = attributes.dex_base + henna.dex_bonus;
    let con_total = attributes.con_base + henna.con_bonus;
    let int_total = attributes.int_base + henna.int_bonus;
    let men_total = attributes.men_base + henna.men_bonus;
    let wit_total = attributes.wit_base + henna.wit_bonus;

    let str_bonus = attribute_bonus.str_bonus(str_total);
    let dex_bonus = attribute_bonus.dex_bonus(dex_total);
    let con_bonus = attribute_bonus.con_bonus(con_total);
    let int_bonus = attribute_bonus.int_bonus(int_total);
    let men_bonus = attribute_bonus.men_bonus(men_total);
    let wit_bonus = attribute_bonus.wit_bonus(wit_total);

    let base_p_atk = class_template.base_p_atk as f32 * str_bonus * level_mod;
    let weapon_p_atk = weapon.map(|w| w.p_atk).unwrap_or(0) as f32;
    let p_atk = (class_template.base_p_atk as f32 + weapon_p_atk) * str_bonus * level_mod;

    let p_def = (class_template.base_p_def as f32 - armor.total_slot_base_def as f32
        + armor.total_p_def as f32)
        * level_mod;

    let p_atk_speed = class_template.base_p_atk_speed as f32 * dex_bonus;
    let m_atk_speed = class_template.base_m_atk_speed as f32 * wit_bonus;
    let m_atk = class_template.base_m_atk as f32 * int_bonus * level_mod;
    let m_def = class_template.base_m_def as f32 * men_bonus * level_mod;
    let evasion = class_template.base_evasion as f32 * dex_bonus * level_mod;
    let accuracy = class_template.base_accuracy as f32 * dex_bonus * level_mod;
    let critical = class_template.base_critical as f32 * dex_bonus;

    let attack_range = weapon
        .map(|w| w.attack_range)
        .unwrap_or(class_template.base_attack_range);
    let attack_delay_millis = 500_000.0 / p_atk_speed.max(1.0);

    let max_load = 69_000.0 * con_bonus;
    let inventory_limit = if race_id == DWARF_RACE_ID { 100 } else { 80 };

    DerivedStats {
        level_mod,
        base_p_atk,
        p_atk,
        p_def,
        p_atk_speed,
        m_atk,
        m_atk_speed,
        m_def,
        evasion,
        accuracy,
        critical,
        attack_range,
        attack_delay_millis,
        max_load,
        inventory_limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatBonus;
    impl AttributeBonus for FlatBonus {
        fn str_bonus(&self, _value: i32) -> f32 {
            1.0
        }
        fn con_bonus(&self, _value: i32) -> f32 {
            1.0
        }
        fn dex_bonus(&self, _value: i32) -> f32 {
            1.0
        }
        fn int_bonus(&self, _value: i32) -> f32 {
            1.0
        }
        fn men_bonus(&self, _value: i32) -> f32 {
            1.0
        }
        fn wit_bonus(&self, _value: i32) -> f32 {
            1.0
        }
    }

    fn sample_template() -> ClassTemplate {
        ClassTemplate {
            class_id: 1,
            base_p_atk: 10,
            base_p_def: 20,
            base_m_atk: 5,
            base_m_def: 5,
            base_p_atk_speed: 300,
            base_m_atk_speed: 300,
            base_attack_range: 40,
            base_evasion: 10,
            base_accuracy: 10,
            base_critical: 4,
        }
    }

    #[test]
    fn level_mod_matches_formula() {
        assert_eq!(level_mod(11), 1.0);
        assert_eq!(level_mod(1), 0.9);
    }

    #[test]
    fn henna_bonus_is_monotone_and_capped_at_five() {
        let mut current = 0;
        current = apply_henna_delta(current, 3);
        assert_eq!(current, 3);
        current = apply_henna_delta(current, 4);
        assert_eq!(current, 5);
    }

    #[test]
    fn weapon_p_atk_is_additive_before_str_and_level_scaling() {
        let template = sample_template();
        let attrs = Attributes::default();
        let henna = HennaBonus::default();
        let bare = derive(11, attrs, henna, &template, &FlatBonus, 1, None, ArmorContribution::default());
        let armed = derive(
            11,
            attrs,
            henna,
            &template,
            &FlatBonus,
            1,
            Some(EquippedWeapon { p_atk: 40, attack_range: 400 }),
            ArmorContribution::default(),
        );
        assert_eq!(bare.p_atk, 10.0);
        assert_eq!(armed.p_atk, 50.0);
        assert_eq!(armed.attack_range, 400);
    }

    #[test]
    fn dwarf_race_gets_larger_inventory_limit() {
        let template = sample_template();
        let stats = derive(
            11,
            Attributes::default(),
            HennaBonus::default(),
            &template,
            &FlatBonus,
            DWARF_RACE_ID,
            None,
            ArmorContribution::default(),
        );
        assert_eq!(stats.inventory_limit, 100);
    }

    #[test]
    fn attack_delay_follows_atk_speed() {
        let template = sample_template();
        let stats = derive(11, Attributes::default(), HennaBonus::default(), &template, &FlatBonus, 1, None, ArmorContribution::default());
        assert_eq!(stats.attack_delay_millis, 500_000.0 / 300.0);
    }
}
