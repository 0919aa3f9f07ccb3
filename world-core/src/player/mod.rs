pub mod stats;
pub mod subclass;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::{
    character::Character,
    error::{PlayerError, SubclassError},
    item::EquipmentSlot,
    object::{ObjectId, WorldObject, WorldObjectData},
    spatial::Location,
    store::PrivateStore,
    templates::{ClassTemplate, ExpTable, HennaDefProvider, SubclassValidator},
    trade::{P2PTradeList, TradeRequest},
    visibility::PlayerVisibilityCache,
};

use stats::{apply_henna_delta, Attributes, HennaBonus};
use subclass::SubclassManager;

/// Attack stance fades this many seconds after the last recorded attack
/// unless renewed (spec.md §4.6).
pub const ATTACK_STANCE_FADE_SECS: i64 = 15;

/// Default name/title colors, BGR-packed (spec.md §4.6/§6).
pub const DEFAULT_NAME_COLOR: u32 = 0xFFFFFF;
pub const DEFAULT_TITLE_COLOR: u32 = 0xFFFF77;

/// Every field the spec lists as "guarded by the Player's read/write lock
/// with getter/setter symmetry" (spec.md §4.6), collected under one lock
/// distinct from the embedded `Character`'s (`playerMu` in spec.md §5).
struct PlayerFields {
    party_id: Option<u32>,
    clan_invite: Option<ObjectId>,
    duel_request: Option<ObjectId>,
    engage_request: Option<ObjectId>,
    private_store: Option<Arc<PrivateStore>>,
    active_trade: Option<Arc<P2PTradeList>>,
    pending_trade_request: Option<TradeRequest>,
    enchant_scroll_active: bool,
    married_to: Option<ObjectId>,
    cursed_weapon_id: Option<u32>,
    karma: i32,
    pk_count: i32,
    pvp_flag: bool,
    friends: HashSet<ObjectId>,
    blocked: HashSet<ObjectId>,
    message_refusal: bool,
    auto_soulshot: HashSet<u32>,
    macros: HashMap<u8, String>,
    shortcuts: HashMap<u8, String>,
    dwarven_recipes: HashSet<u32>,
    common_recipes: HashSet<u32>,
    item_cooldowns: HashMap<u32, i64>,
    olympiad: bool,
    title: String,
    sex_female: bool,
    hair_style: u8,
    hair_color: u8,
    face: u8,
    name_color: u32,
    title_color: u32,
    running: bool,
    sitting: bool,
    noble: bool,
    hero: bool,
    fishing_spot: Option<(i32, i32, i32)>,
    pledge_class: i32,
    pledge_type: i32,
    recommendations_have: i32,
    recommendations_left: i32,
    abnormal_effects: u64,
    team_id: u8,
    mounted: bool,
}

impl Default for PlayerFields {
    fn default() -> Self {
        Self {
            party_id: None,
            clan_invite: None,
            duel_request: None,
            engage_request: None,
            private_store: None,
            active_trade: None,
            pending_trade_request: None,
            enchant_scroll_active: false,
            married_to: None,
            cursed_weapon_id: None,
            karma: 0,
            pk_count: 0,
            pvp_flag: false,
            friends: HashSet::new(),
            blocked: HashSet::new(),
            message_refusal: false,
            auto_soulshot: HashSet::new(),
            macros: HashMap::new(),
            shortcuts: HashMap::new(),
            dwarven_recipes: HashSet::new(),
            common_recipes: HashSet::new(),
            item_cooldowns: HashMap::new(),
            olympiad: false,
            title: String::new(),
            sex_female: false,
            hair_style: 0,
            hair_color: 0,
            face: 0,
            name_color: DEFAULT_NAME_COLOR,
            title_color: DEFAULT_TITLE_COLOR,
            running: true,
            sitting: false,
            noble: false,
            hero: false,
            fishing_spot: None,
            pledge_class: 0,
            pledge_type: 0,
            recommendations_have: 0,
            recommendations_left: 0,
            abnormal_effects: 0,
            team_id: 0,
            mounted: false,
        }
    }
}

/// A player character (spec.md §4.6). Embeds `Character` for HP/MP/CP and
/// CC/zone state; everything else lives either on its own lock-free
/// atomic (hot, frequently-read scalars) or behind `fields` (`playerMu`).
pub struct Player {
    pub character: Character,
    pub race_id: u32,
    attributes: RwLock<Attributes>,
    henna: RwLock<HennaBonus>,
    xp: AtomicI64,
    sp: AtomicI64,
    last_attack_time_secs: AtomicI64,
    active_class_index: AtomicU8,
    active_class_id: AtomicU32,
    subclass: SubclassManager,
    fields: RwLock<PlayerFields>,
    pub visibility: PlayerVisibilityCache,
}

impl Player {
    pub fn new(
        id: ObjectId,
        name: String,
        location: Location,
        level: i32,
        max_hp: i32,
        max_mp: i32,
        max_cp: i32,
        base_class_id: u32,
        race_id: u32,
        attributes: Attributes,
        starting_xp: i64,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Player>| {
            let world_object = WorldObject::new(id, name, location, WorldObjectData::Player(weak.clone()));
            Self {
                character: Character::new(world_object, level, max_hp, max_mp, max_cp),
                race_id,
                attributes: RwLock::new(attributes),
                henna: RwLock::new(HennaBonus::default()),
                xp: AtomicI64::new(starting_xp),
                sp: AtomicI64::new(0),
                last_attack_time_secs: AtomicI64::new(i64::MIN / 2),
                active_class_index: AtomicU8::new(0),
                active_class_id: AtomicU32::new(base_class_id),
                subclass: SubclassManager::new(base_class_id, level, starting_xp),
                fields: RwLock::new(PlayerFields::default()),
                visibility: PlayerVisibilityCache::new(),
            }
        })
    }

    pub fn active_class_id(&self) -> u32 {
        self.active_class_id.load(Ordering::Acquire)
    }

    pub fn active_class_index(&self) -> u8 {
        self.active_class_index.load(Ordering::Acquire)
    }

    pub fn xp(&self) -> i64 {
        self.xp.load(Ordering::Acquire)
    }

    pub fn add_xp(&self, amount: i64) {
        self.xp.fetch_add(amount, Ordering::AcqRel);
    }

    pub fn sp(&self) -> i64 {
        self.sp.load(Ordering::Acquire)
    }

    pub fn add_sp(&self, amount: i64) {
        self.sp.fetch_add(amount, Ordering::AcqRel);
    }

    pub fn attributes(&self) -> Attributes {
        *self.attributes.read()
    }

    pub fn henna_bonus(&self) -> HennaBonus {
        *self.henna.read()
    }

    /// Applies a henna's per-attribute deltas via the monotone +5-capped
    /// rule (spec.md §4.6).
    pub fn apply_henna(&self, dye_id: u32, provider: &dyn HennaDefProvider) -> bool {
        let Some(def) = provider.get_henna_def(dye_id) else {
            return false;
        };
        if !provider.is_allowed_for_class(dye_id, self.active_class_id()) {
            return false;
        }
        let mut henna = self.henna.write();
        henna.str_bonus = apply_henna_delta(henna.str_bonus, def.str_delta);
        henna.con_bonus = apply_henna_delta(henna.con_bonus, def.con_delta);
        henna.dex_bonus = apply_henna_delta(henna.dex_bonus, def.dex_delta);
        henna.int_bonus = apply_henna_delta(henna.int_bonus, def.int_delta);
        henna.men_bonus = apply_henna_delta(henna.men_bonus, def.men_delta);
        henna.wit_bonus = apply_henna_delta(henna.wit_bonus, def.wit_delta);
        true
    }

    pub fn mark_attack_stance(&self, now_secs: i64) {
        self.last_attack_time_secs.store(now_secs, Ordering::Release);
    }

    fn in_attack_stance(&self, now_secs: i64) -> bool {
        now_secs - self.last_attack_time_secs.load(Ordering::Acquire) < ATTACK_STANCE_FADE_SECS
    }

    /// True only when no subclass operation holds the subclass lock, no
    /// attack stance within the fade window, and no active enchant scroll
    /// (spec.md §4.6).
    pub fn can_logout(&self, now_secs: i64) -> bool {
        if self.subclass.is_busy() {
            return false;
        }
        if self.in_attack_stance(now_secs) {
            return false;
        }
        !self.fields.read().enchant_scroll_active
    }

    pub fn add_subclass(
        &self,
        class_id: u32,
        index: u8,
        base_class_id: u32,
        validator: &dyn SubclassValidator,
        exp_table: &dyn ExpTable,
    ) -> Result<(), SubclassError> {
        self.subclass
            .add_subclass(class_id, index, base_class_id, self.race_id, self.character.level(), validator, exp_table)
    }

    /// Saves the outgoing class's progress, switches `classId`/level to
    /// `new_index`'s slot, and re-arms xp/sp for subsequent reads
    /// (spec.md §4.6's `SetActiveClass`).
    pub fn set_active_class(&self, new_index: u8) -> Result<(), PlayerError> {
        if new_index as usize > subclass::MAX_SUBCLASSES {
            return Err(PlayerError::InvalidClassIndex(new_index));
        }
        let loaded = self
            .subclass
            .set_active_class(new_index, self.character.level(), self.xp(), self.sp())
            .map_err(PlayerError::from)?;
        self.active_class_index.store(new_index, Ordering::Release);
        self.active_class_id.store(loaded.class_id, Ordering::Release);
        self.character.set_level(loaded.level);
        self.xp.store(loaded.xp, Ordering::Release);
        self.sp.store(loaded.sp, Ordering::Release);
        Ok(())
    }

    pub fn derive_stats(
        &self,
        class_template: &ClassTemplate,
        attribute_bonus: &dyn stats::AttributeBonus,
        weapon: Option<stats::EquippedWeapon>,
        armor: stats::ArmorContribution,
    ) -> stats::DerivedStats {
        stats::derive(
            self.character.level(),
            self.attributes(),
            self.henna_bonus(),
            class_template,
            attribute_bonus,
            self.race_id,
            weapon,
            armor,
        )
    }

    pub fn equipment_slot_contributes_to_p_def(slot: EquipmentSlot) -> bool {
        stats::ARMOR_CONTRIBUTING_SLOTS.contains(&slot)
    }

    // -- Party --
    pub fn party_id(&self) -> Option<u32> {
        self.fields.read().party_id
    }
    pub fn set_party_id(&self, id: Option<u32>) {
        self.fields.write().party_id = id;
    }

    // -- Clan / duel / engage --
    pub fn clan_invite(&self) -> Option<ObjectId> {
        self.fields.read().clan_invite
    }
    pub fn set_clan_invite(&self, from: Option<ObjectId>) {
        self.fields.write().clan_invite = from;
    }
    pub fn duel_request(&self) -> Option<ObjectId> {
        self.fields.read().duel_request
    }
    pub fn set_duel_request(&self, from: Option<ObjectId>) {
        self.fields.write().duel_request = from;
    }
    pub fn engage_request(&self) -> Option<ObjectId> {
        self.fields.read().engage_request
    }
    pub fn set_engage_request(&self, from: Option<ObjectId>) {
        self.fields.write().engage_request = from;
    }

    // -- Private store --
    pub fn private_store(&self) -> Option<Arc<PrivateStore>> {
        self.fields.read().private_store.clone()
    }
    pub fn open_private_store(&self, store: Arc<PrivateStore>) {
        self.fields.write().private_store = Some(store);
    }
    pub fn close_private_store(&self) {
        self.fields.write().private_store = None;
    }

    // -- P2P trade --
    /// `OnTransactionRequest(partner)`: arms a 10-second expiry window
    /// (spec.md §4.6).
    pub fn on_transaction_request(&self, partner: ObjectId, now_secs: i64, expiry_secs: i64) {
        self.fields.write().pending_trade_request = Some(TradeRequest::new(self.character.world_object.id(), partner, now_secs, expiry_secs));
    }
    pub fn is_request_expired(&self, now_secs: i64) -> bool {
        self.fields
            .read()
            .pending_trade_request
            .as_ref()
            .map(|request| request.is_expired(now_secs))
            .unwrap_or(true)
    }
    pub fn active_trade(&self) -> Option<Arc<P2PTradeList>> {
        self.fields.read().active_trade.clone()
    }
    pub fn begin_trade(&self, trade: Arc<P2PTradeList>) {
        let mut fields = self.fields.write();
        fields.active_trade = Some(trade);
        fields.pending_trade_request = None;
    }
    /// Clears both the pending request and any in-progress trade
    /// (spec.md §4.6's `CancelActiveTrade`).
    pub fn cancel_active_trade(&self) {
        let mut fields = self.fields.write();
        fields.active_trade = None;
        fields.pending_trade_request = None;
    }

    // -- Enchant scroll / marriage / cursed weapon / karma / pvp --
    pub fn enchant_scroll_active(&self) -> bool {
        self.fields.read().enchant_scroll_active
    }
    pub fn set_enchant_scroll_active(&self, active: bool) {
        self.fields.write().enchant_scroll_active = active;
    }
    pub fn married_to(&self) -> Option<ObjectId> {
        self.fields.read().married_to
    }
    pub fn set_married_to(&self, spouse: Option<ObjectId>) {
        self.fields.write().married_to = spouse;
    }
    pub fn cursed_weapon_id(&self) -> Option<u32> {
        self.fields.read().cursed_weapon_id
    }
    pub fn set_cursed_weapon_id(&self, id: Option<u32>) {
        self.fields.write().cursed_weapon_id = id;
    }
    pub fn karma(&self) -> i32 {
        self.fields.read().karma
    }
    pub fn set_karma(&self, karma: i32) {
        self.fields.write().karma = karma;
    }
    pub fn pk_count(&self) -> i32 {
        self.fields.read().pk_count
    }
    pub fn increment_pk_count(&self) {
        self.fields.write().pk_count += 1;
    }
    pub fn pvp_flag(&self) -> bool {
        self.fields.read().pvp_flag
    }
    pub fn set_pvp_flag(&self, flag: bool) {
        self.fields.write().pvp_flag = flag;
    }

    // -- Friends / block / message refusal --
    pub fn is_friend(&self, id: ObjectId) -> bool {
        self.fields.read().friends.contains(&id)
    }
    pub fn add_friend(&self, id: ObjectId) {
        self.fields.write().friends.insert(id);
    }
    pub fn remove_friend(&self, id: ObjectId) {
        self.fields.write().friends.remove(&id);
    }
    pub fn is_blocked(&self, id: ObjectId) -> bool {
        self.fields.read().blocked.contains(&id)
    }
    pub fn block(&self, id: ObjectId) {
        self.fields.write().blocked.insert(id);
    }
    pub fn unblock(&self, id: ObjectId) {
        self.fields.write().blocked.remove(&id);
    }
    pub fn message_refusal(&self) -> bool {
        self.fields.read().message_refusal
    }
    pub fn set_message_refusal(&self, refuse: bool) {
        self.fields.write().message_refusal = refuse;
    }

    // -- Auto soulshot / macros / shortcuts / recipes / cooldowns --
    pub fn auto_soulshot_enabled(&self, template_id: u32) -> bool {
        self.fields.read().auto_soulshot.contains(&template_id)
    }
    pub fn set_auto_soulshot(&self, template_id: u32, enabled: bool) {
        let mut fields = self.fields.write();
        if enabled {
            fields.auto_soulshot.insert(template_id);
        } else {
            fields.auto_soulshot.remove(&template_id);
        }
    }
    pub fn macro_at(&self, slot: u8) -> Option<String> {
        self.fields.read().macros.get(&slot).cloned()
    }
    pub fn set_macro(&self, slot: u8, definition: String) {
        self.fields.write().macros.insert(slot, definition);
    }
    pub fn shortcut_at(&self, slot: u8) -> Option<String> {
        self.fields.read().shortcuts.get(&slot).cloned()
    }
    pub fn set_shortcut(&self, slot: u8, definition: String) {
        self.fields.write().shortcuts.insert(slot, definition);
    }
    pub fn knows_dwarven_recipe(&self, recipe_id: u32) -> bool {
        self.fields.read().dwarven_recipes.contains(&recipe_id)
    }
    pub fn learn_dwarven_recipe(&self, recipe_id: u32) {
        self.fields.write().dwarven_recipes.insert(recipe_id);
    }
    pub fn knows_common_recipe(&self, recipe_id: u32) -> bool {
        self.fields.read().common_recipes.contains(&recipe_id)
    }
    pub fn learn_common_recipe(&self, recipe_id: u32) {
        self.fields.write().common_recipes.insert(recipe_id);
    }
    pub fn item_cooldown_until(&self, template_id: u32) -> Option<i64> {
        self.fields.read().item_cooldowns.get(&template_id).copied()
    }
    pub fn set_item_cooldown(&self, template_id: u32, until_millis: i64) {
        self.fields.write().item_cooldowns.insert(template_id, until_millis);
    }
    pub fn is_item_on_cooldown(&self, template_id: u32, now_millis: i64) -> bool {
        self.item_cooldown_until(template_id).map(|until| now_millis < until).unwrap_or(false)
    }

    // -- Olympiad / noble / hero / fishing / pledge / recommendations --
    pub fn olympiad_participant(&self) -> bool {
        self.fields.read().olympiad
    }
    pub fn set_olympiad_participant(&self, active: bool) {
        self.fields.write().olympiad = active;
    }
    pub fn is_noble(&self) -> bool {
        self.fields.read().noble
    }
    pub fn set_noble(&self, noble: bool) {
        self.fields.write().noble = noble;
    }
    pub fn is_hero(&self) -> bool {
        self.fields.read().hero
    }
    pub fn set_hero(&self, hero: bool) {
        self.fields.write().hero = hero;
    }
    pub fn fishing_spot(&self) -> Option<(i32, i32, i32)> {
        self.fields.read().fishing_spot
    }
    pub fn set_fishing_spot(&self, spot: Option<(i32, i32, i32)>) {
        self.fields.write().fishing_spot = spot;
    }
    pub fn pledge_class(&self) -> i32 {
        self.fields.read().pledge_class
    }
    pub fn set_pledge_class(&self, pledge_class: i32) {
        self.fields.write().pledge_class = pledge_class;
    }
    pub fn pledge_type(&self) -> i32 {
        self.fields.read().pledge_type
    }
    pub fn set_pledge_type(&self, pledge_type: i32) {
        self.fields.write().pledge_type = pledge_type;
    }
    pub fn recommendations_have(&self) -> i32 {
        self.fields.read().recommendations_have
    }
    pub fn recommendations_left(&self) -> i32 {
        self.fields.read().recommendations_left
    }
    pub fn set_recommendations(&self, have: i32, left: i32) {
        let mut fields = self.fields.write();
        fields.recommendations_have = have;
        fields.recommendations_left = left;
    }

    // -- Appearance --
    pub fn title(&self) -> String {
        self.fields.read().title.clone()
    }
    pub fn set_title(&self, title: String) {
        self.fields.write().title = title;
    }
    pub fn is_female(&self) -> bool {
        self.fields.read().sex_female
    }
    pub fn set_female(&self, female: bool) {
        self.fields.write().sex_female = female;
    }
    pub fn appearance(&self) -> (u8, u8, u8) {
        let fields = self.fields.read();
        (fields.hair_style, fields.hair_color, fields.face)
    }
    pub fn set_appearance(&self, hair_style: u8, hair_color: u8, face: u8) {
        let mut fields = self.fields.write();
        fields.hair_style = hair_style;
        fields.hair_color = hair_color;
        fields.face = face;
    }
    pub fn name_color(&self) -> u32 {
        self.fields.read().name_color
    }
    pub fn set_name_color(&self, color: u32) {
        self.fields.write().name_color = color;
    }
    pub fn title_color(&self) -> u32 {
        self.fields.read().title_color
    }
    pub fn set_title_color(&self, color: u32) {
        self.fields.write().title_color = color;
    }

    // -- Movement / mount / team / abnormal effects --
    pub fn is_running(&self) -> bool {
        self.fields.read().running
    }
    pub fn set_running(&self, running: bool) {
        self.fields.write().running = running;
    }
    pub fn is_sitting(&self) -> bool {
        self.fields.read().sitting
    }
    pub fn set_sitting(&self, sitting: bool) {
        self.fields.write().sitting = sitting;
    }
    pub fn is_mounted(&self) -> bool {
        self.fields.read().mounted
    }
    pub fn set_mounted(&self, mounted: bool) {
        self.fields.write().mounted = mounted;
    }
    pub fn team_id(&self) -> u8 {
        self.fields.read().team_id
    }
    pub fn set_team_id(&self, team_id: u8) {
        self.fields.write().team_id = team_id;
    }
    pub fn abnormal_effects(&self) -> u64 {
        self.fields.read().abnormal_effects
    }
    pub fn set_abnormal_effect(&self, bit: u32, active: bool) {
        let mut fields = self.fields.write();
        if active {
            fields.abnormal_effects |= 1 << bit;
        } else {
            fields.abnormal_effects &= !(1 << bit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_player() -> Arc<Player> {
        Player::new(
            ObjectId(1),
            "Hero".into(),
            Location::default(),
            40,
            1000,
            500,
            200,
            1,
            1,
            Attributes::default(),
            100_000,
        )
    }

    #[test]
    fn attack_stance_blocks_logout_until_it_fades() {
        let player = make_player();
        player.mark_attack_stance(1_000);
        assert!(!player.can_logout(1_005));
        assert!(player.can_logout(1_020));
    }

    #[test]
    fn enchant_scroll_blocks_logout() {
        let player = make_player();
        player.set_enchant_scroll_active(true);
        assert!(!player.can_logout(100_000));
        player.set_enchant_scroll_active(false);
        assert!(player.can_logout(100_000));
    }

    #[test]
    fn henna_application_is_capped_at_five() {
        struct Def;
        impl HennaDefProvider for Def {
            fn get_henna_def(&self, _dye_id: u32) -> Option<crate::templates::HennaDef> {
                Some(crate::templates::HennaDef {
                    dye_id: 1,
                    str_delta: 4,
                    con_delta: 0,
                    dex_delta: 0,
                    int_delta: 0,
                    men_delta: 0,
                    wit_delta: 0,
                })
            }
            fn is_allowed_for_class(&self, _dye_id: u32, _class_id: u32) -> bool {
                true
            }
        }
        let player = make_player();
        assert!(player.apply_henna(1, &Def));
        assert!(player.apply_henna(1, &Def));
        assert_eq!(player.henna_bonus().str_bonus, 5);
    }

    #[test]
    fn transaction_request_expires() {
        let player = make_player();
        player.on_transaction_request(ObjectId(2), 1_000, 10);
        assert!(!player.is_request_expired(1_005));
        assert!(player.is_request_expired(1_020));
    }

    #[test]
    fn name_and_title_colors_default_per_spec() {
        let player = make_player();
        assert_eq!(player.name_color(), DEFAULT_NAME_COLOR);
        assert_eq!(player.title_color(), DEFAULT_TITLE_COLOR);
    }
}
