// Visibility and classification of heroes and abilities.
//
// Every predicate only ever narrows `should_show`; none re-enables it.

use std::collections::BTreeSet;

use lodraft_core::protocol::{AttackClass, Attribute};
use tracing::trace;

use crate::options::{Gating, UniqueSkills};
use crate::store::DraftStateStore;

/// Ability category tabs the skill list starts with.
pub const DEFAULT_TABS: [&str; 4] = ["main", "neutral", "wraith", "OP"];

/// Display text lookup for hero and ability ids.
pub trait Localize {
    fn localize(&self, id: &str) -> String;
}

/// Shows raw ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawIds;

impl Localize for RawIds {
    fn localize(&self, id: &str) -> String {
        id.to_string()
    }
}

impl<F: Fn(&str) -> String> Localize for F {
    fn localize(&self, id: &str) -> String {
        self(id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbilityFilterInfo {
    pub should_show: bool,
    pub disallowed: bool,
    pub banned: bool,
    pub taken: bool,
    pub cant_draft: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeroFilterInfo {
    pub should_show: bool,
    pub taken_hero: bool,
}

/// Hero-list class buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeroClassButton {
    Melee,
    Ranged,
    Clear,
}

/// Heroes grouped by primary attribute, each group sorted by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeroList {
    pub strength: Vec<String>,
    pub agility: Vec<String>,
    pub intellect: Vec<String>,
}

impl HeroList {
    pub fn build(store: &DraftStateStore) -> Self {
        let mut list = HeroList::default();
        // BTreeMap iteration is already sorted by id.
        for (id, record) in store.heroes() {
            match record.primary_attribute() {
                Some(Attribute::Str) => list.strength.push(id.clone()),
                Some(Attribute::Agi) => list.agility.push(id.clone()),
                Some(Attribute::Int) => list.intellect.push(id.clone()),
                None => {}
            }
        }
        list
    }

    pub fn len(&self) -> usize {
        self.strength.len() + self.agility.len() + self.intellect.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strength
            .iter()
            .chain(&self.agility)
            .chain(&self.intellect)
            .map(String::as_str)
    }
}

/// Local filter toggles plus the evaluation of every filter predicate.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    show_banned: bool,
    show_disallowed: bool,
    show_taken: bool,
    show_non_draft: bool,
    active_tabs: BTreeSet<String>,
    search_category: Option<String>,
    search_text: String,
    hero_search_text: String,
    hero_class: Option<AttackClass>,
}

impl Default for FilterEngine {
    fn default() -> Self {
        FilterEngine {
            show_banned: false,
            show_disallowed: false,
            show_taken: true,
            show_non_draft: false,
            active_tabs: DEFAULT_TABS.iter().map(|t| t.to_string()).collect(),
            search_category: None,
            search_text: String::new(),
            hero_search_text: String::new(),
            hero_class: None,
        }
    }
}

fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Every token must appear in the id or the display text.
fn matches_search(tokens: &[&str], id: &str, display: &str) -> bool {
    tokens
        .iter()
        .all(|t| id.contains(t) || display.contains(t))
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // -- toggles -------------------------------------------------------------

    pub fn toggle_show_banned(&mut self) -> bool {
        self.show_banned = !self.show_banned;
        self.show_banned
    }

    pub fn toggle_show_disallowed(&mut self) -> bool {
        self.show_disallowed = !self.show_disallowed;
        self.show_disallowed
    }

    pub fn toggle_show_taken(&mut self) -> bool {
        self.show_taken = !self.show_taken;
        self.show_taken
    }

    pub fn toggle_show_non_draft(&mut self) -> bool {
        self.show_non_draft = !self.show_non_draft;
        self.show_non_draft
    }

    pub fn set_show_taken(&mut self, show: bool) {
        self.show_taken = show;
    }

    pub fn show_banned(&self) -> bool {
        self.show_banned
    }

    pub fn show_disallowed(&self) -> bool {
        self.show_disallowed
    }

    pub fn show_taken(&self) -> bool {
        self.show_taken
    }

    pub fn show_non_draft(&self) -> bool {
        self.show_non_draft
    }

    /// A plain click selects `tab` alone; a modified click toggles it.
    pub fn click_tab(&mut self, tab: &str, modified: bool) {
        if modified {
            if !self.active_tabs.remove(tab) {
                self.active_tabs.insert(tab.to_string());
            }
        } else {
            self.active_tabs.clear();
            self.active_tabs.insert(tab.to_string());
        }
        trace!("Active tabs: {:?}", self.active_tabs);
    }

    pub fn active_tabs(&self) -> &BTreeSet<String> {
        &self.active_tabs
    }

    /// Restrict to abilities carrying `flag`; `None` lifts the restriction.
    pub fn set_search_category(&mut self, flag: Option<String>) {
        self.search_category = flag.filter(|f| !f.is_empty());
    }

    pub fn search_category(&self) -> Option<&str> {
        self.search_category.as_deref()
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.search_text = text.to_lowercase();
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_hero_search_text(&mut self, text: &str) {
        self.hero_search_text = text.to_lowercase();
    }

    pub fn hero_search_text(&self) -> &str {
        &self.hero_search_text
    }

    /// Pressing the active class again, or `Clear`, removes the filter.
    pub fn press_hero_class(&mut self, button: HeroClassButton) {
        let pressed = match button {
            HeroClassButton::Melee => AttackClass::Melee,
            HeroClassButton::Ranged => AttackClass::Ranged,
            HeroClassButton::Clear => {
                self.hero_class = None;
                return;
            }
        };
        self.hero_class = if self.hero_class == Some(pressed) {
            None
        } else {
            Some(pressed)
        };
    }

    pub fn hero_class(&self) -> Option<AttackClass> {
        self.hero_class
    }

    // -- abilities ----------------------------------------------------------

    /// Full classification of an ability for the skill list.
    pub fn ability_info(
        &self,
        store: &DraftStateStore,
        gating: &Gating,
        loc: &dyn Localize,
        ability: &str,
    ) -> AbilityFilterInfo {
        self.classify(store, gating, Some(loc), ability)
    }

    /// Classification without the free-text search, as used for the hero
    /// preview and recommended builds.
    pub fn ability_status(
        &self,
        store: &DraftStateStore,
        gating: &Gating,
        ability: &str,
    ) -> AbilityFilterInfo {
        self.classify(store, gating, None, ability)
    }

    fn classify(
        &self,
        store: &DraftStateStore,
        gating: &Gating,
        search: Option<&dyn Localize>,
        ability: &str,
    ) -> AbilityFilterInfo {
        let mut info = AbilityFilterInfo {
            should_show: true,
            ..Default::default()
        };
        let category = store.category_of(ability);
        let bans = store.bans();

        if !category.is_some_and(|c| gating.allowed_categories.contains(c)) {
            info.disallowed = true;
            if !self.show_disallowed {
                info.should_show = false;
            }
        }

        if bans.banned_abilities.contains(ability) {
            info.banned = true;
            if !self.show_banned {
                info.should_show = false;
            }
        }

        if bans.taken_abilities.contains(ability) {
            let taken = match gating.unique_skills {
                UniqueSkills::Off => false,
                UniqueSkills::Team => bans.taken_team_abilities.contains(ability),
                UniqueSkills::Global => true,
            };
            if taken {
                info.taken = true;
                if !self.show_taken {
                    info.should_show = false;
                }
            }
        }

        if info.should_show && !category.is_some_and(|c| self.active_tabs.contains(c)) {
            info.should_show = false;
        }

        if info.should_show {
            if let Some(flag) = &self.search_category {
                if !store.flags_of(ability).is_some_and(|f| f.has(flag)) {
                    info.should_show = false;
                }
            }
        }

        if let Some(loc) = search {
            let parts = tokens(&self.search_text);
            if info.should_show && !parts.is_empty() {
                let display = loc.localize(ability).to_lowercase();
                if !matches_search(&parts, ability, &display) {
                    info.should_show = false;
                }
            }
        }

        if let Some(draft) = store.draft() {
            let draftable = store
                .owner_of(ability)
                .is_some_and(|owner| draft.hero_draft.contains(owner));
            if !draftable {
                info.cant_draft = true;
                if !self.show_non_draft {
                    info.should_show = false;
                }
            }
        }

        info
    }

    /// Abilities currently shown in the skill list: grouped by owning hero,
    /// regular abilities before ultimates, then by id.
    pub fn visible_abilities(
        &self,
        store: &DraftStateStore,
        gating: &Gating,
        loc: &dyn Localize,
    ) -> Vec<String> {
        let mut shown: Vec<&str> = store
            .abilities()
            .filter(|ab| self.ability_info(store, gating, loc, ab).should_show)
            .collect();
        shown.sort_by(|a, b| {
            (store.owner_of(a), store.is_ultimate(a), *a).cmp(&(
                store.owner_of(b),
                store.is_ultimate(b),
                *b,
            ))
        });
        shown.into_iter().map(str::to_string).collect()
    }

    // -- heroes -------------------------------------------------------------

    /// Draft-array and ban gating of a hero. Taken status is reported, never
    /// used to hide.
    pub fn hero_info(&self, store: &DraftStateStore, hero: &str) -> HeroFilterInfo {
        let mut should_show = true;
        if let Some(draft) = store.draft() {
            if !draft.hero_draft.contains(hero) {
                should_show = false;
            }
        }
        if should_show && store.bans().banned_heroes.contains(hero) {
            should_show = false;
        }
        HeroFilterInfo {
            should_show,
            taken_hero: store.taken_heroes().contains(hero),
        }
    }

    /// [`hero_info`](Self::hero_info) narrowed by the class buttons and the
    /// hero search box.
    pub fn hero_listing_info(
        &self,
        store: &DraftStateStore,
        loc: &dyn Localize,
        hero: &str,
    ) -> HeroFilterInfo {
        let mut info = self.hero_info(store, hero);

        if info.should_show {
            if let (Some(wanted), Some(actual)) = (
                self.hero_class,
                store.hero(hero).and_then(|h| h.attack_class()),
            ) {
                if wanted != actual {
                    info.should_show = false;
                }
            }
        }

        let parts = tokens(&self.hero_search_text);
        if info.should_show && !parts.is_empty() {
            let display = loc.localize(hero).to_lowercase();
            if !matches_search(&parts, hero, &display) {
                info.should_show = false;
            }
        }

        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{keys, OptionValues};
    use lodraft_core::protocol::{PlayerInfo, RosterInfo, Table, TableUpdate, Team};
    use serde_json::json;

    fn gating(unique: f64) -> Gating {
        let mut values = OptionValues::new();
        for key in [keys::HERO_ABILITIES, keys::NEUTRAL_ABILITIES, keys::WRAITH_NIGHT] {
            values.set(key, 1.0);
        }
        values.set(keys::UNIQUE_SKILLS, unique);
        Gating::derive(&values, Some(Team::Radiant))
    }

    fn store() -> DraftStateStore {
        let mut store = DraftStateStore::new();
        store.set_roster(RosterInfo {
            local_player: 0,
            players: vec![
                PlayerInfo { player_id: 0, team: Team::Radiant, host: true },
                PlayerInfo { player_id: 1, team: Team::Dire, host: false },
            ],
        });
        let updates = [
            TableUpdate::new(
                Table::Heroes,
                "npc_dota_hero_lina",
                json!({"AttributePrimary": "DOTA_ATTRIBUTE_INTELLECT", "AttackCapabilities": "DOTA_UNIT_CAP_RANGED_ATTACK",
                       "Ability1": "lina_dragon_slave", "Ability4": "lina_laguna_blade"}),
            ),
            TableUpdate::new(
                Table::Heroes,
                "npc_dota_hero_axe",
                json!({"AttributePrimary": "DOTA_ATTRIBUTE_STRENGTH", "AttackCapabilities": "DOTA_UNIT_CAP_MELEE_ATTACK",
                       "Ability1": "axe_berserkers_call"}),
            ),
            TableUpdate::new(Table::Flags, "lina_dragon_slave", json!({"category": "main", "nuke": 1})),
            TableUpdate::new(Table::Flags, "lina_laguna_blade", json!({"category": "main", "isUlt": 1, "nuke": 1})),
            TableUpdate::new(Table::Flags, "axe_berserkers_call", json!({"category": "main"})),
            TableUpdate::new(Table::Flags, "op_thing", json!({"category": "OP"})),
        ];
        for u in &updates {
            store.apply(u).unwrap();
        }
        store
    }

    #[test]
    fn disallowed_category_hides_unless_shown() {
        let store = store();
        let mut filter = FilterEngine::new();
        let info = filter.ability_status(&store, &gating(0.0), "op_thing");
        assert!(info.disallowed);
        assert!(!info.should_show);

        filter.toggle_show_disallowed();
        assert!(filter.ability_status(&store, &gating(0.0), "op_thing").should_show);
    }

    #[test]
    fn unknown_ability_is_hidden() {
        let info = FilterEngine::new().ability_status(&store(), &gating(0.0), "no_such_ability");
        assert!(info.disallowed);
        assert!(!info.should_show);
    }

    #[test]
    fn taken_depends_on_unique_mode() {
        let mut store = store();
        store
            .apply(&TableUpdate::new(
                Table::SelectedSkills,
                "1",
                json!({"playerID": 1, "skills": {"1": "lina_dragon_slave"}}),
            ))
            .unwrap();
        let mut filter = FilterEngine::new();
        filter.set_show_taken(false);

        let off = filter.ability_status(&store, &gating(0.0), "lina_dragon_slave");
        assert!(!off.taken && off.should_show);

        // Taken by the enemy team only.
        let team = filter.ability_status(&store, &gating(1.0), "lina_dragon_slave");
        assert!(!team.taken && team.should_show);

        let global = filter.ability_status(&store, &gating(2.0), "lina_dragon_slave");
        assert!(global.taken && !global.should_show);
    }

    #[test]
    fn plain_tab_click_is_exclusive_and_modified_click_toggles() {
        let mut filter = FilterEngine::new();
        filter.click_tab("neutral", false);
        assert_eq!(filter.active_tabs().len(), 1);
        filter.click_tab("main", true);
        assert_eq!(filter.active_tabs().len(), 2);
        filter.click_tab("neutral", true);
        assert!(filter.active_tabs().contains("main"));
        assert!(!filter.active_tabs().contains("neutral"));

        let store = store();
        filter.click_tab("wraith", false);
        assert!(!filter.ability_status(&store, &gating(0.0), "axe_berserkers_call").should_show);
    }

    #[test]
    fn search_requires_every_token() {
        let store = store();
        let mut filter = FilterEngine::new();
        let g = gating(0.0);
        filter.set_search_text("LINA dragon");
        assert!(filter.ability_info(&store, &g, &RawIds, "lina_dragon_slave").should_show);
        assert!(!filter.ability_info(&store, &g, &RawIds, "lina_laguna_blade").should_show);

        // A token may match the display text instead of the id.
        filter.set_search_text("fiery");
        let loc = |id: &str| if id == "lina_dragon_slave" { "Fiery Wave".to_string() } else { id.to_string() };
        assert!(filter.ability_info(&store, &g, &loc, "lina_dragon_slave").should_show);
        assert!(!filter.ability_info(&store, &g, &loc, "axe_berserkers_call").should_show);
    }

    #[test]
    fn search_category_requires_flag() {
        let store = store();
        let mut filter = FilterEngine::new();
        filter.set_search_category(Some("nuke".into()));
        assert!(filter.ability_status(&store, &gating(0.0), "lina_laguna_blade").should_show);
        assert!(!filter.ability_status(&store, &gating(0.0), "axe_berserkers_call").should_show);
    }

    #[test]
    fn draft_array_marks_non_draftable() {
        let mut store = store();
        store
            .apply(&TableUpdate::new(
                Table::DraftArray,
                "0",
                json!({"draftID": 0, "draftArray": {"heroDraft": {"npc_dota_hero_lina": 1}, "abilityDraft": {}}}),
            ))
            .unwrap();
        let filter = FilterEngine::new();
        let axe = filter.ability_status(&store, &gating(0.0), "axe_berserkers_call");
        assert!(axe.cant_draft && !axe.should_show);
        assert!(filter.ability_status(&store, &gating(0.0), "lina_dragon_slave").should_show);

        assert!(!filter.hero_info(&store, "npc_dota_hero_axe").should_show);
        assert!(filter.hero_info(&store, "npc_dota_hero_lina").should_show);
    }

    #[test]
    fn visible_abilities_put_ultimates_last_per_hero() {
        let store = store();
        let order = FilterEngine::new().visible_abilities(&store, &gating(0.0), &RawIds);
        assert_eq!(
            order,
            vec!["axe_berserkers_call", "lina_dragon_slave", "lina_laguna_blade"]
        );
    }

    #[test]
    fn hero_class_button_toggles() {
        let store = store();
        let mut filter = FilterEngine::new();
        filter.press_hero_class(HeroClassButton::Melee);
        assert!(filter.hero_listing_info(&store, &RawIds, "npc_dota_hero_axe").should_show);
        assert!(!filter.hero_listing_info(&store, &RawIds, "npc_dota_hero_lina").should_show);

        filter.press_hero_class(HeroClassButton::Melee);
        assert_eq!(filter.hero_class(), None);
        filter.press_hero_class(HeroClassButton::Ranged);
        filter.press_hero_class(HeroClassButton::Clear);
        assert_eq!(filter.hero_class(), None);
    }

    #[test]
    fn banned_hero_hidden_but_taken_only_reported() {
        let mut store = store();
        store
            .apply(&TableUpdate::new(Table::Banned, "b", json!({"heroName": "npc_dota_hero_axe"})))
            .unwrap();
        store
            .apply(&TableUpdate::new(
                Table::SelectedHeroes,
                "1",
                json!({"playerID": 1, "heroName": "npc_dota_hero_lina"}),
            ))
            .unwrap();
        let filter = FilterEngine::new();
        assert!(!filter.hero_info(&store, "npc_dota_hero_axe").should_show);
        let lina = filter.hero_info(&store, "npc_dota_hero_lina");
        assert!(lina.should_show && lina.taken_hero);
    }

    #[test]
    fn hero_list_groups_by_attribute() {
        let list = HeroList::build(&store());
        assert_eq!(list.strength, vec!["npc_dota_hero_axe"]);
        assert_eq!(list.intellect, vec!["npc_dota_hero_lina"]);
        assert!(list.agility.is_empty());
        assert_eq!(list.len(), 2);
    }
}
