// Draft state: the local mirror of every authoritative table.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use lodraft_core::protocol::{
    self, AbilityFlags, Attribute, DraftArray, DraftArrayMessage, HeroRecord, PayloadError,
    PlayerId, RandomBuild, RandomBuildsMessage, RosterInfo, SlotIndex, Table, TableUpdate, Team,
    EMPTY_ABILITY, MAX_SLOT_WIDGETS,
};
use tracing::{debug, trace, warn};

use crate::options::OptionValues;
use crate::roster::Roster;

/// One player's picks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSelection {
    pub hero: Option<String>,
    pub attribute: Option<Attribute>,
    pub loadout: BTreeMap<SlotIndex, String>,
    pub ready: bool,
}

/// Bans and the taken sets derived from every loadout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BanState {
    pub banned_heroes: BTreeSet<String>,
    pub banned_abilities: BTreeSet<String>,
    pub taken_abilities: BTreeSet<String>,
    /// Abilities taken by the local player's team.
    pub taken_team_abilities: BTreeSet<String>,
    pub current_hero_bans: i64,
    pub current_ability_bans: i64,
}

/// Builds dealt to the local player in all-random mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RandomBuildState {
    pub offers: Vec<RandomBuild>,
    pub selected_hero_slot: u32,
    pub selected_build_slot: u32,
}

/// What an applied update changed, so the caller can recompute dependents.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    HeroDataChanged { hero: String },
    FlagsChanged { ability: String },
    HeroSelected { player_id: PlayerId },
    AttributeSelected { player_id: PlayerId },
    SkillsSelected { player_id: PlayerId },
    Banned {
        hero: Option<String>,
        ability: Option<String>,
        own_counts: bool,
    },
    ReadyChanged,
    RandomBuildsOffered,
    RandomBuildSelected,
    DraftArrayApplied,
    OptionChanged { key: String, value: f64 },
    /// Valid but irrelevant to this client (other draft group, another
    /// player's random builds, a table the store does not own).
    Ignored,
}

/// Notification pushed to a materialized player view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewNotice {
    Hero { player_id: PlayerId, hero: String },
    Attribute { player_id: PlayerId, attribute: Attribute },
    Build {
        player_id: PlayerId,
        loadout: BTreeMap<SlotIndex, String>,
    },
    Ready { player_id: PlayerId, ready: bool },
    SlotCount { player_id: PlayerId, count: u8 },
}

/// Read-only projection of one player for a roster panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub team: Option<Team>,
    pub hero: Option<String>,
    pub attribute: Option<Attribute>,
    /// Every visible slot, padded with the empty placeholder.
    pub slots: Vec<(SlotIndex, String)>,
    pub ready: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DraftStateStore {
    options: OptionValues,
    roster: Roster,
    players: BTreeMap<PlayerId, PlayerSelection>,
    bans: BanState,
    taken_heroes: BTreeSet<String>,
    ready: BTreeMap<PlayerId, bool>,
    random_builds: RandomBuildState,
    draft: Option<DraftArray>,
    /// Draft arrays that arrived before the local draft group was known.
    pending_drafts: BTreeMap<usize, DraftArray>,
    heroes: BTreeMap<String, HeroRecord>,
    ability_owner: HashMap<String, String>,
    flags: BTreeMap<String, AbilityFlags>,
    flag_index: BTreeMap<String, BTreeSet<String>>,
    views: BTreeSet<PlayerId>,
    notices: VecDeque<ViewNotice>,
}

impl DraftStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Mutation entry points
    // -----------------------------------------------------------------------

    /// Apply one authoritative update. Malformed payloads leave the store
    /// untouched.
    pub fn apply(&mut self, update: &TableUpdate) -> Result<StoreEvent, PayloadError> {
        trace!("Applying {} [{}]", update.table, update.key);
        let key = update.key.as_str();
        let value = &update.value;
        match update.table {
            Table::Heroes => self.on_hero_data(key, HeroRecord::parse(key, value)?),
            Table::Flags => self.on_flags(key, AbilityFlags::parse(key, value)?),
            Table::SelectedHeroes => {
                let msg = protocol::decode_selected_hero(key, value)?;
                Ok(self.on_selected_hero(msg.player_id, msg.hero_name))
            }
            Table::SelectedAttr => {
                let msg = protocol::decode_selected_attr(key, value)?;
                Ok(self.on_selected_attr(msg.player_id, msg.new_attr))
            }
            Table::SelectedSkills => {
                let msg = protocol::decode_selected_skills(key, value)?;
                Ok(self.on_selected_skills(msg.player_id, msg.skills))
            }
            Table::Banned => Ok(self.on_banned(protocol::decode_ban_notice(key, value)?)),
            Table::Ready => Ok(self.on_ready(protocol::parse_ready_state(key, value)?)),
            Table::RandomBuilds => Ok(self.on_random_builds(RandomBuildsMessage::parse(key, value)?)),
            Table::DraftArray => Ok(self.on_draft_array(DraftArrayMessage::parse(key, value)?)),
            Table::Options => {
                let v = protocol::parse_option_value(key, value)?;
                self.options.set(key, v);
                Ok(StoreEvent::OptionChanged {
                    key: key.to_string(),
                    value: v,
                })
            }
            Table::PhasePregame => Ok(StoreEvent::Ignored),
        }
    }

    /// Replace the roster. Team-scoped sets and a deferred draft array are
    /// re-resolved against it.
    pub fn set_roster(&mut self, info: RosterInfo) {
        self.roster.update(info);
        self.recompute_taken();
        if let Some(group) = self.roster.draft_group() {
            if let Some(draft) = self.pending_drafts.remove(&group) {
                debug!("Applying deferred draft array for group {group}");
                self.draft = Some(draft);
            }
            self.pending_drafts.clear();
        }
    }

    fn on_hero_data(&mut self, hero: &str, record: HeroRecord) -> Result<StoreEvent, PayloadError> {
        for ability in record.abilities().into_values() {
            self.ability_owner.insert(ability, hero.to_string());
        }
        self.heroes.insert(hero.to_string(), record);
        Ok(StoreEvent::HeroDataChanged {
            hero: hero.to_string(),
        })
    }

    fn on_flags(&mut self, ability: &str, flags: AbilityFlags) -> Result<StoreEvent, PayloadError> {
        if let Some(old) = self.flags.get(ability) {
            for name in old.names() {
                if let Some(set) = self.flag_index.get_mut(name) {
                    set.remove(ability);
                }
            }
        }
        for name in flags.names() {
            self.flag_index
                .entry(name.to_string())
                .or_default()
                .insert(ability.to_string());
        }
        self.flag_index.retain(|_, set| !set.is_empty());
        self.flags.insert(ability.to_string(), flags);
        Ok(StoreEvent::FlagsChanged {
            ability: ability.to_string(),
        })
    }

    fn on_selected_hero(&mut self, player_id: PlayerId, hero: String) -> StoreEvent {
        self.players.entry(player_id).or_default().hero = Some(hero.clone());
        self.recompute_taken_heroes();
        self.notify(ViewNotice::Hero { player_id, hero });
        StoreEvent::HeroSelected { player_id }
    }

    fn on_selected_attr(&mut self, player_id: PlayerId, attribute: Attribute) -> StoreEvent {
        self.players.entry(player_id).or_default().attribute = Some(attribute);
        self.notify(ViewNotice::Attribute {
            player_id,
            attribute,
        });
        StoreEvent::AttributeSelected { player_id }
    }

    /// Full replace of the player's loadout, then a full rebuild of the
    /// taken sets.
    fn on_selected_skills(
        &mut self,
        player_id: PlayerId,
        skills: BTreeMap<SlotIndex, String>,
    ) -> StoreEvent {
        self.players.entry(player_id).or_default().loadout = skills.clone();
        self.notify(ViewNotice::Build {
            player_id,
            loadout: skills,
        });
        self.recompute_taken();
        StoreEvent::SkillsSelected { player_id }
    }

    fn on_banned(&mut self, notice: protocol::BanNotice) -> StoreEvent {
        if let Some(hero) = &notice.hero_name {
            self.bans.banned_heroes.insert(hero.clone());
        }
        if let Some(ability) = &notice.ability_name {
            self.bans.banned_abilities.insert(ability.clone());
        }
        let own_counts = notice
            .player_id
            .is_some_and(|id| self.roster.is_local(id));
        if own_counts {
            // A count missing from the notice keeps its previous value.
            if let Some(n) = notice.current_hero_bans {
                self.bans.current_hero_bans = i64::from(n);
            }
            if let Some(n) = notice.current_ability_bans {
                self.bans.current_ability_bans = i64::from(n);
            }
            debug!(
                "Own ban counts now {} hero / {} ability",
                self.bans.current_hero_bans, self.bans.current_ability_bans
            );
        }
        StoreEvent::Banned {
            hero: notice.hero_name,
            ability: notice.ability_name,
            own_counts,
        }
    }

    fn on_ready(&mut self, state: BTreeMap<PlayerId, bool>) -> StoreEvent {
        for (player_id, selection) in self.players.iter_mut() {
            selection.ready = state.get(player_id).copied().unwrap_or(false);
        }
        // Players dropped from the map are no longer ready.
        let dropped: Vec<PlayerId> = self
            .ready
            .keys()
            .filter(|id| !state.contains_key(*id) && self.views.contains(*id))
            .copied()
            .collect();
        for player_id in dropped {
            self.notices.push_back(ViewNotice::Ready {
                player_id,
                ready: false,
            });
        }
        for (player_id, ready) in &state {
            self.players.entry(*player_id).or_default().ready = *ready;
            if self.views.contains(player_id) {
                self.notices.push_back(ViewNotice::Ready {
                    player_id: *player_id,
                    ready: *ready,
                });
            }
        }
        self.ready = state;
        StoreEvent::ReadyChanged
    }

    fn on_random_builds(&mut self, msg: RandomBuildsMessage) -> StoreEvent {
        match msg {
            RandomBuildsMessage::Offer { player_id, builds } => {
                if !self.roster.is_local(player_id) {
                    return StoreEvent::Ignored;
                }
                debug!("Received {} random builds", builds.len());
                self.random_builds.offers = builds;
                StoreEvent::RandomBuildsOffered
            }
            RandomBuildsMessage::Selection {
                player_id,
                hero_slot,
                build_slot,
            } => {
                if !self.roster.is_local(player_id) {
                    return StoreEvent::Ignored;
                }
                self.random_builds.selected_hero_slot = hero_slot;
                self.random_builds.selected_build_slot = build_slot;
                StoreEvent::RandomBuildSelected
            }
        }
    }

    fn on_draft_array(&mut self, msg: DraftArrayMessage) -> StoreEvent {
        match self.roster.draft_group() {
            Some(group) if group == msg.draft_id => {
                debug!(
                    "Draft array for group {group}: {} heroes, {} abilities",
                    msg.draft_array.hero_draft.len(),
                    msg.draft_array.ability_draft.len()
                );
                self.draft = Some(msg.draft_array);
                StoreEvent::DraftArrayApplied
            }
            Some(group) => {
                trace!("Draft array for group {} is not ours ({group})", msg.draft_id);
                StoreEvent::Ignored
            }
            None => {
                warn!("Draft array {} arrived before the roster; deferring", msg.draft_id);
                self.pending_drafts.insert(msg.draft_id, msg.draft_array);
                StoreEvent::Ignored
            }
        }
    }

    fn recompute_taken_heroes(&mut self) {
        self.taken_heroes = self
            .players
            .values()
            .filter_map(|p| p.hero.clone())
            .collect();
    }

    /// Rebuild both taken sets from every player's current loadout.
    fn recompute_taken(&mut self) {
        let mut taken = BTreeSet::new();
        let mut team = BTreeSet::new();
        for (player_id, selection) in &self.players {
            let same_team = self.roster.is_local(*player_id) || self.roster.is_teammate(*player_id);
            for ability in selection.loadout.values() {
                taken.insert(ability.clone());
                if same_team {
                    team.insert(ability.clone());
                }
            }
        }
        self.bans.taken_abilities = taken;
        self.bans.taken_team_abilities = team;
    }

    // -----------------------------------------------------------------------
    // Player views
    // -----------------------------------------------------------------------

    /// Start pushing notifications for `player_id`.
    pub fn materialize_view(&mut self, player_id: PlayerId) {
        self.views.insert(player_id);
    }

    pub fn release_view(&mut self, player_id: PlayerId) {
        self.views.remove(&player_id);
    }

    /// Tell every materialized view about a new slot count.
    pub fn push_slot_count(&mut self, count: u8) {
        let ids: Vec<PlayerId> = self.views.iter().copied().collect();
        for player_id in ids {
            self.notices
                .push_back(ViewNotice::SlotCount { player_id, count });
        }
    }

    pub fn drain_notices(&mut self) -> Vec<ViewNotice> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, notice: ViewNotice) {
        let player_id = match &notice {
            ViewNotice::Hero { player_id, .. }
            | ViewNotice::Attribute { player_id, .. }
            | ViewNotice::Build { player_id, .. }
            | ViewNotice::Ready { player_id, .. }
            | ViewNotice::SlotCount { player_id, .. } => *player_id,
        };
        if self.views.contains(&player_id) {
            self.notices.push_back(notice);
        }
    }

    pub fn player_view(&self, player_id: PlayerId) -> PlayerView {
        let selection = self.players.get(&player_id);
        PlayerView {
            player_id,
            team: self.roster.team_of(player_id),
            hero: selection.and_then(|s| s.hero.clone()),
            attribute: selection.and_then(|s| s.attribute),
            slots: self.padded_loadout(player_id),
            ready: self.ready.get(&player_id).copied().unwrap_or(false),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn options(&self) -> &OptionValues {
        &self.options
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn selection(&self, player_id: PlayerId) -> Option<&PlayerSelection> {
        self.players.get(&player_id)
    }

    pub fn local_selection(&self) -> Option<&PlayerSelection> {
        self.roster
            .local_player()
            .and_then(|id| self.players.get(&id))
    }

    pub fn loadout(&self, player_id: PlayerId) -> BTreeMap<SlotIndex, String> {
        self.players
            .get(&player_id)
            .map(|p| p.loadout.clone())
            .unwrap_or_default()
    }

    /// The local player's loadout as shown: slots `1..=maxSlots` (six until
    /// the option is known) with empty slots holding the placeholder.
    pub fn padded_loadout(&self, player_id: PlayerId) -> Vec<(SlotIndex, String)> {
        let max = self
            .options
            .get_int(crate::options::keys::MAX_SLOTS)
            .map_or(MAX_SLOT_WIDGETS, |n| n.clamp(0, i64::from(MAX_SLOT_WIDGETS)) as SlotIndex);
        let loadout = self.players.get(&player_id).map(|p| &p.loadout);
        (1..=max)
            .map(|slot| {
                let ability = loadout
                    .and_then(|l| l.get(&slot))
                    .cloned()
                    .unwrap_or_else(|| EMPTY_ABILITY.to_string());
                (slot, ability)
            })
            .collect()
    }

    pub fn bans(&self) -> &BanState {
        &self.bans
    }

    pub fn taken_heroes(&self) -> &BTreeSet<String> {
        &self.taken_heroes
    }

    pub fn ready_state(&self) -> &BTreeMap<PlayerId, bool> {
        &self.ready
    }

    pub fn random_builds(&self) -> &RandomBuildState {
        &self.random_builds
    }

    pub fn draft(&self) -> Option<&DraftArray> {
        self.draft.as_ref()
    }

    pub fn hero(&self, hero: &str) -> Option<&HeroRecord> {
        self.heroes.get(hero)
    }

    pub fn heroes(&self) -> &BTreeMap<String, HeroRecord> {
        &self.heroes
    }

    pub fn owner_of(&self, ability: &str) -> Option<&str> {
        self.ability_owner.get(ability).map(String::as_str)
    }

    pub fn flags_of(&self, ability: &str) -> Option<&AbilityFlags> {
        self.flags.get(ability)
    }

    /// Every ability with flag data, by id.
    pub fn abilities(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    pub fn is_ultimate(&self, ability: &str) -> bool {
        self.flags.get(ability).is_some_and(AbilityFlags::is_ultimate)
    }

    pub fn category_of(&self, ability: &str) -> Option<&str> {
        self.flags.get(ability).and_then(AbilityFlags::category)
    }

    /// Abilities carrying `flag`.
    pub fn abilities_with_flag(&self, flag: &str) -> Option<&BTreeSet<String>> {
        self.flag_index.get(flag)
    }

    /// Flags offered by the category drop-down: every flag but `category`.
    pub fn flag_list(&self) -> Vec<&str> {
        self.flag_index
            .keys()
            .map(String::as_str)
            .filter(|f| *f != "category")
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodraft_core::protocol::PlayerInfo;
    use serde_json::json;

    fn up(table: Table, key: &str, value: serde_json::Value) -> TableUpdate {
        TableUpdate::new(table, key, value)
    }

    fn store_with_roster(local: PlayerId) -> DraftStateStore {
        let mut store = DraftStateStore::new();
        store.set_roster(RosterInfo {
            local_player: local,
            players: vec![
                PlayerInfo { player_id: 0, team: Team::Radiant, host: true },
                PlayerInfo { player_id: 1, team: Team::Dire, host: false },
                PlayerInfo { player_id: 2, team: Team::Radiant, host: false },
            ],
        });
        store
    }

    fn skills(store: &mut DraftStateStore, player: PlayerId, loadout: serde_json::Value) {
        store
            .apply(&up(
                Table::SelectedSkills,
                &player.to_string(),
                json!({"playerID": player, "skills": loadout}),
            ))
            .unwrap();
    }

    #[test]
    fn loadout_is_fully_replaced() {
        let mut store = store_with_roster(0);
        skills(&mut store, 0, json!({"1": "a", "2": "b", "3": "c"}));
        skills(&mut store, 0, json!({"1": "x", "2": "y"}));

        let expected: BTreeMap<SlotIndex, String> =
            [(1, "x".to_string()), (2, "y".to_string())].into();
        assert_eq!(store.loadout(0), expected);
        assert!(!store.bans().taken_abilities.contains("c"));
    }

    #[test]
    fn taken_sets_are_rebuilt_per_team() {
        let mut store = store_with_roster(0);
        skills(&mut store, 1, json!({"1": "enemy_ab"}));
        skills(&mut store, 2, json!({"1": "ally_ab"}));
        skills(&mut store, 0, json!({"1": "my_ab"}));

        let bans = store.bans();
        assert_eq!(bans.taken_abilities.len(), 3);
        assert!(bans.taken_team_abilities.contains("ally_ab"));
        assert!(bans.taken_team_abilities.contains("my_ab"));
        assert!(!bans.taken_team_abilities.contains("enemy_ab"));
    }

    #[test]
    fn bans_are_monotonic_and_counts_only_for_local_player() {
        let mut store = store_with_roster(0);
        store
            .apply(&up(Table::Banned, "1", json!({"abilityName": "fireball", "playerID": 1, "currentAbilityBans": 4})))
            .unwrap();
        assert_eq!(store.bans().current_ability_bans, 0);

        let event = store
            .apply(&up(Table::Banned, "2", json!({"heroName": "npc_a", "playerID": 0, "currentHeroBans": 1, "currentAbilityBans": 2})))
            .unwrap();
        assert!(matches!(event, StoreEvent::Banned { own_counts: true, .. }));
        assert_eq!(store.bans().current_hero_bans, 1);
        assert_eq!(store.bans().current_ability_bans, 2);
        assert!(store.bans().banned_abilities.contains("fireball"));
        assert!(store.bans().banned_heroes.contains("npc_a"));
    }

    #[test]
    fn ban_notice_with_one_count_keeps_the_other() {
        let mut store = store_with_roster(0);
        store
            .apply(&up(Table::Banned, "1", json!({"heroName": "npc_a", "playerID": 0, "currentHeroBans": 1, "currentAbilityBans": 2})))
            .unwrap();
        store
            .apply(&up(Table::Banned, "2", json!({"abilityName": "fireball", "playerID": 0, "currentAbilityBans": 3})))
            .unwrap();
        assert_eq!(store.bans().current_hero_bans, 1);
        assert_eq!(store.bans().current_ability_bans, 3);

        store
            .apply(&up(Table::Banned, "3", json!({"heroName": "npc_b", "playerID": 0, "currentHeroBans": 2})))
            .unwrap();
        assert_eq!(store.bans().current_hero_bans, 2);
        assert_eq!(store.bans().current_ability_bans, 3);
    }

    #[test]
    fn players_with_unknown_team_never_share_team_picks() {
        let mut store = store_with_roster(0);
        skills(&mut store, 9, json!({"1": "stray_ab"}));
        assert!(store.bans().taken_abilities.contains("stray_ab"));
        assert!(!store.bans().taken_team_abilities.contains("stray_ab"));

        // Local player missing from the roster: two unknown teams still do not match.
        let mut store = DraftStateStore::new();
        store.set_roster(RosterInfo {
            local_player: 5,
            players: vec![PlayerInfo { player_id: 0, team: Team::Radiant, host: true }],
        });
        skills(&mut store, 9, json!({"1": "stray_ab"}));
        skills(&mut store, 5, json!({"1": "my_ab"}));
        let team = &store.bans().taken_team_abilities;
        assert!(team.contains("my_ab"));
        assert!(!team.contains("stray_ab"));
    }

    #[test]
    fn hero_records_index_ability_owners() {
        let mut store = DraftStateStore::new();
        store
            .apply(&up(
                Table::Heroes,
                "npc_dota_hero_pugna",
                json!({"AttributePrimary": "DOTA_ATTRIBUTE_INTELLECT", "Ability1": "pugna_nether_blast"}),
            ))
            .unwrap();
        assert_eq!(store.owner_of("pugna_nether_blast"), Some("npc_dota_hero_pugna"));
        assert_eq!(store.owner_of("unknown"), None);
    }

    #[test]
    fn flag_index_tracks_replacements() {
        let mut store = DraftStateStore::new();
        store
            .apply(&up(Table::Flags, "ab", json!({"category": "main", "stun": 1})))
            .unwrap();
        assert!(store.abilities_with_flag("stun").unwrap().contains("ab"));
        assert_eq!(store.flag_list(), vec!["stun"]);

        store
            .apply(&up(Table::Flags, "ab", json!({"category": "main", "isUlt": 1})))
            .unwrap();
        assert!(store.abilities_with_flag("stun").is_none());
        assert!(store.is_ultimate("ab"));
    }

    #[test]
    fn taken_heroes_follow_selections() {
        let mut store = store_with_roster(0);
        store
            .apply(&up(Table::SelectedHeroes, "1", json!({"playerID": 1, "heroName": "npc_a"})))
            .unwrap();
        store
            .apply(&up(Table::SelectedHeroes, "1", json!({"playerID": 1, "heroName": "npc_b"})))
            .unwrap();
        assert!(store.taken_heroes().contains("npc_b"));
        assert!(!store.taken_heroes().contains("npc_a"));
    }

    #[test]
    fn ready_state_replaces_map_and_notifies_views() {
        let mut store = store_with_roster(0);
        store.materialize_view(1);
        store
            .apply(&up(Table::Ready, "ready", json!({"0": 1, "1": 0})))
            .unwrap();
        store.apply(&up(Table::Ready, "ready", json!({"1": 1}))).unwrap();

        assert_eq!(store.ready_state().len(), 1);
        assert!(!store.selection(0).unwrap().ready);
        assert!(store.player_view(1).ready);
        let notices = store.drain_notices();
        assert_eq!(
            notices,
            vec![
                ViewNotice::Ready { player_id: 1, ready: false },
                ViewNotice::Ready { player_id: 1, ready: true },
            ]
        );
    }

    #[test]
    fn dropped_ready_player_view_is_told_not_ready() {
        let mut store = store_with_roster(0);
        store.materialize_view(0);
        store.materialize_view(2);
        store
            .apply(&up(Table::Ready, "ready", json!({"0": 1, "2": 1})))
            .unwrap();
        store.drain_notices();

        store.apply(&up(Table::Ready, "ready", json!({"2": 1}))).unwrap();
        assert!(!store.player_view(0).ready);
        assert_eq!(
            store.drain_notices(),
            vec![
                ViewNotice::Ready { player_id: 0, ready: false },
                ViewNotice::Ready { player_id: 2, ready: true },
            ]
        );
    }

    #[test]
    fn unmaterialized_views_get_nothing() {
        let mut store = store_with_roster(0);
        store
            .apply(&up(Table::SelectedAttr, "2", json!({"playerID": 2, "newAttr": "agi"})))
            .unwrap();
        assert!(store.drain_notices().is_empty());
        assert_eq!(store.selection(2).unwrap().attribute, Some(Attribute::Agi));
    }

    #[test]
    fn random_build_selection_keeps_offers() {
        let mut store = store_with_roster(0);
        store
            .apply(&up(
                Table::RandomBuilds,
                "0",
                json!({"playerID": 0, "builds": {"0": {"heroName": "npc_a", "build": {"1": "x"}}}}),
            ))
            .unwrap();
        let event = store
            .apply(&up(Table::RandomBuilds, "0", json!({"playerID": 0, "selected": 1, "hero": 0, "build": 0})))
            .unwrap();
        assert_eq!(event, StoreEvent::RandomBuildSelected);
        assert_eq!(store.random_builds().offers.len(), 1);

        let other = store
            .apply(&up(Table::RandomBuilds, "1", json!({"playerID": 1, "builds": {}})))
            .unwrap();
        assert_eq!(other, StoreEvent::Ignored);
        assert_eq!(store.random_builds().offers.len(), 1);
    }

    #[test]
    fn draft_arrays_for_other_groups_are_discarded() {
        // Player 2 has one radiant teammate ahead of them: group 1.
        let mut store = store_with_roster(2);
        let ignored = store
            .apply(&up(Table::DraftArray, "0", json!({"draftID": 0, "draftArray": {"heroDraft": {"npc_a": 1}}})))
            .unwrap();
        assert_eq!(ignored, StoreEvent::Ignored);
        assert!(store.draft().is_none());

        store
            .apply(&up(Table::DraftArray, "1", json!({"draftID": 1, "draftArray": {"heroDraft": {"npc_b": 1}}})))
            .unwrap();
        assert!(store.draft().unwrap().hero_draft.contains("npc_b"));
    }

    #[test]
    fn draft_array_before_roster_is_deferred() {
        let mut store = DraftStateStore::new();
        store
            .apply(&up(Table::DraftArray, "0", json!({"draftID": 0, "draftArray": {"heroDraft": ["npc_a"]}})))
            .unwrap();
        assert!(store.draft().is_none());

        store.set_roster(RosterInfo {
            local_player: 0,
            players: vec![PlayerInfo { player_id: 0, team: Team::Dire, host: false }],
        });
        assert!(store.draft().unwrap().hero_draft.contains("npc_a"));
    }

    #[test]
    fn malformed_payload_leaves_state_untouched() {
        let mut store = store_with_roster(0);
        let result = store.apply(&up(Table::SelectedSkills, "0", json!({"skills": "nope"})));
        assert!(result.is_err());
        assert!(store.selection(0).is_none());
    }

    #[test]
    fn padded_loadout_uses_placeholder_and_slot_option() {
        let mut store = store_with_roster(0);
        store
            .apply(&up(Table::Options, "lodOptionCommonMaxSlots", json!({"v": 4})))
            .unwrap();
        skills(&mut store, 0, json!({"2": "b"}));
        let slots = store.padded_loadout(0);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].1, EMPTY_ABILITY);
        assert_eq!(slots[1].1, "b");
    }
}
