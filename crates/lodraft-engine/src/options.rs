// Match options: the declarative schema, widget bindings, the authoritative
// value map, and the rules derived from it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lodraft_core::protocol::{OutboundRequest, Team};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Option keys the engine reacts to.
pub mod keys {
    pub const GAMEMODE: &str = "lodOptionGamemode";
    pub const COMMON_GAMEMODE: &str = "lodOptionCommonGamemode";
    pub const MAX_SLOTS: &str = "lodOptionCommonMaxSlots";
    pub const MAX_SKILLS: &str = "lodOptionCommonMaxSkills";
    pub const MAX_ULTS: &str = "lodOptionCommonMaxUlts";
    pub const MAX_ABILITY_BANS: &str = "lodOptionBanningMaxBans";
    pub const MAX_HERO_BANS: &str = "lodOptionBanningMaxHeroBans";
    pub const HERO_ABILITIES: &str = "lodOptionAdvancedHeroAbilities";
    pub const NEUTRAL_ABILITIES: &str = "lodOptionAdvancedNeutralAbilities";
    pub const WRAITH_NIGHT: &str = "lodOptionAdvancedNeutralWraithNight";
    pub const OP_ABILITIES: &str = "lodOptionAdvancedOPAbilities";
    pub const UNIQUE_SKILLS: &str = "lodOptionAdvancedUniqueSkills";
    pub const UNIQUE_HEROES: &str = "lodOptionAdvancedUniqueHeroes";
    pub const HIDE_PICKS: &str = "lodOptionAdvancedHidePicks";
}

/// Ability categories and the option enabling each.
pub const CATEGORY_OPTIONS: [(&str, &str); 4] = [
    ("main", keys::HERO_ABILITIES),
    ("neutral", keys::NEUTRAL_ABILITIES),
    ("wraith", keys::WRAITH_NIGHT),
    ("OP", keys::OP_ABILITIES),
];

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("option `{name}` is already registered")]
    DuplicateField { name: String },

    #[error("option `{name}` has an empty value domain")]
    EmptyDomain { name: String },

    #[error("unknown option category `{category}`")]
    UnknownCategory { category: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// Single choice from a drop-down list.
    Choice,
    /// Boolean toggle over `[No, Yes]`.
    Toggle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionChoice {
    pub label: String,
    pub value: f64,
}

impl OptionChoice {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        OptionChoice {
            label: label.into(),
            value,
        }
    }
}

/// One configurable option. Immutable once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDefinition {
    pub name: String,
    pub description: String,
    pub about: String,
    pub widget: WidgetKind,
    pub domain: Vec<OptionChoice>,
    /// Mirrors a value chosen by the preset gamemode.
    pub preset: bool,
}

impl OptionDefinition {
    /// A drop-down option; its default is the last domain entry.
    pub fn choice(name: &str, description: &str, about: &str, domain: &[(&str, f64)]) -> Self {
        OptionDefinition {
            name: name.to_string(),
            description: description.to_string(),
            about: about.to_string(),
            widget: WidgetKind::Choice,
            domain: domain
                .iter()
                .map(|(label, value)| OptionChoice::new(*label, *value))
                .collect(),
            preset: false,
        }
    }

    /// A yes/no option, defaulting to "no".
    pub fn toggle(name: &str, description: &str, about: &str) -> Self {
        OptionDefinition {
            name: name.to_string(),
            description: description.to_string(),
            about: about.to_string(),
            widget: WidgetKind::Toggle,
            domain: vec![
                OptionChoice::new("lodOptionNo", 0.0),
                OptionChoice::new("lodOptionYes", 1.0),
            ],
            preset: false,
        }
    }

    pub fn preset(mut self) -> Self {
        self.preset = true;
        self
    }

    pub fn default_index(&self) -> usize {
        match self.widget {
            WidgetKind::Choice => self.domain.len().saturating_sub(1),
            WidgetKind::Toggle => 0,
        }
    }

    pub fn index_of(&self, value: f64) -> Option<usize> {
        self.domain.iter().position(|c| c.value == value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionCategory {
    pub name: String,
    /// Shown when the options menu first opens.
    pub default_shown: bool,
    /// Only visible while custom settings are allowed.
    pub custom: bool,
    pub fields: Vec<String>,
}

/// Registry of every option, grouped by category, with the two-way binding
/// state of each option's widget.
#[derive(Debug, Clone, Default)]
pub struct OptionsRegistry {
    categories: Vec<OptionCategory>,
    definitions: HashMap<String, OptionDefinition>,
    /// Selected domain index per option.
    bindings: HashMap<String, usize>,
}

impl OptionsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full built-in option schema.
    pub fn builtin() -> Self {
        let mut registry = OptionsRegistry::new();
        for (category, default_shown, custom, fields) in builtin_schema() {
            registry.add_category(category, default_shown, custom);
            for field in fields {
                if let Err(e) = registry.register(category, field) {
                    warn!("Skipping built-in option: {e}");
                }
            }
        }
        registry
    }

    pub fn add_category(&mut self, name: &str, default_shown: bool, custom: bool) {
        if self.categories.iter().any(|c| c.name == name) {
            return;
        }
        self.categories.push(OptionCategory {
            name: name.to_string(),
            default_shown,
            custom,
            fields: Vec::new(),
        });
    }

    /// Register `definition` under `category` and bind it to its default entry.
    pub fn register(
        &mut self,
        category: &str,
        definition: OptionDefinition,
    ) -> Result<(), OptionsError> {
        if definition.domain.is_empty() {
            return Err(OptionsError::EmptyDomain {
                name: definition.name,
            });
        }
        if self.definitions.contains_key(&definition.name) {
            return Err(OptionsError::DuplicateField {
                name: definition.name,
            });
        }
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.name == category)
            .ok_or_else(|| OptionsError::UnknownCategory {
                category: category.to_string(),
            })?;

        cat.fields.push(definition.name.clone());
        self.bindings
            .insert(definition.name.clone(), definition.default_index());
        self.definitions.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn categories(&self) -> &[OptionCategory] {
        &self.categories
    }

    pub fn definition(&self, name: &str) -> Option<&OptionDefinition> {
        self.definitions.get(name)
    }

    /// Definitions of one category, in registration order.
    pub fn fields(&self, category: &str) -> Vec<&OptionDefinition> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| {
                c.fields
                    .iter()
                    .filter_map(|name| self.definitions.get(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn selected_index(&self, name: &str) -> Option<usize> {
        self.bindings.get(name).copied()
    }

    pub fn selected_value(&self, name: &str) -> Option<f64> {
        let def = self.definitions.get(name)?;
        let idx = self.bindings.get(name)?;
        def.domain.get(*idx).map(|c| c.value)
    }

    /// Local widget change: select domain entry `index` and return the value
    /// that should be requested from the server.
    pub fn choose(&mut self, name: &str, index: usize) -> Option<f64> {
        let value = self.definitions.get(name)?.domain.get(index)?.value;
        self.bindings.insert(name.to_string(), index);
        Some(value)
    }

    /// Authoritative change: re-select the entry holding `value`. Values
    /// outside the domain leave the binding untouched.
    pub fn sync_binding(&mut self, name: &str, value: f64) -> bool {
        let Some(idx) = self.definitions.get(name).and_then(|d| d.index_of(value)) else {
            return false;
        };
        self.bindings.insert(name.to_string(), idx);
        true
    }

    /// Narrow the preset gamemode to the single mode a map is built for.
    /// Returns false for maps that allow every mode.
    pub fn restrict_to_map(&mut self, map_name: &str) -> bool {
        let only = match map_name {
            "all_pick" => OptionChoice::new("lodOptionBalancedAllPick", 1.0),
            "mirror_draft" => OptionChoice::new("lodOptionBalancedMirrorDraft", 3.0),
            "all_random" => OptionChoice::new("lodOptionBalancedAllRandom", 4.0),
            _ => return false,
        };
        let Some(def) = self.definitions.get_mut(keys::GAMEMODE) else {
            return false;
        };
        info!("Map `{map_name}` restricts gamemode to {}", only.value);
        def.domain = vec![only];
        self.bindings.insert(keys::GAMEMODE.to_string(), 0);
        true
    }
}

type SchemaCategory = (&'static str, bool, bool, Vec<OptionDefinition>);

fn builtin_schema() -> Vec<SchemaCategory> {
    use OptionDefinition as D;

    let mirror_heroes: &[(&str, f64)] = &[
        ("lodOptionMirrorHeroes10", 10.0),
        ("lodOptionMirrorHeroes20", 20.0),
        ("lodOptionMirrorHeroes30", 30.0),
        ("lodOptionMirrorHeroes40", 40.0),
        ("lodOptionMirrorHeroes50", 50.0),
    ];
    let zero_to_six = |prefix: &str| -> Vec<(String, f64)> {
        (0..=6).map(|n| (format!("{prefix}{n}"), n as f64)).collect()
    };
    let owned = |name: &str, des: &str, about: &str, domain: Vec<(String, f64)>| {
        let borrowed: Vec<(&str, f64)> = domain.iter().map(|(l, v)| (l.as_str(), *v)).collect();
        D::choice(name, des, about, &borrowed)
    };
    let levels = |values: &[u32]| -> Vec<(String, f64)> {
        values
            .iter()
            .map(|l| (format!("lodOptionLevel{l}"), *l as f64))
            .collect()
    };

    let mut ults: Vec<(String, f64)> = (1..=6)
        .map(|n| (format!("lodOptionBalancedUlts{n}"), n as f64))
        .collect();
    ults.push(("lodOptionBalancedUlts0".to_string(), 0.0));

    vec![
        (
            "presets",
            true,
            false,
            vec![
                D::choice(
                    keys::GAMEMODE,
                    "lodOptionsPresetGamemode",
                    "lodOptionAboutPresetGamemode",
                    &[
                        ("lodOptionBalancedAllPick", 1.0),
                        ("lodOptionBalancedMirrorDraft", 3.0),
                        ("lodOptionBalancedAllRandom", 4.0),
                        ("lodOptionBalancedCustom", -1.0),
                    ],
                ),
                D::choice(
                    "lodOptionBanning",
                    "lodOptionsPresetBanning",
                    "lodOptionAboutPresetBanning",
                    &[
                        ("lodOptionBalancedBan", 1.0),
                        ("lodOptionManualBan", 2.0),
                        ("lodOptionNoBans", 3.0),
                    ],
                )
                .preset(),
                D::choice(
                    "lodOptionSlots",
                    "lodOptionsPresetSlots",
                    "lodOptionAboutPresetSlots",
                    &[
                        ("lodOptionBalancedSlots4", 4.0),
                        ("lodOptionBalancedSlots5", 5.0),
                        ("lodOptionBalancedSlots6", 6.0),
                    ],
                )
                .preset(),
                owned(
                    "lodOptionUlts",
                    "lodOptionsPresetUlts",
                    "lodOptionAboutPresetUlts",
                    ults,
                )
                .preset(),
                D::choice(
                    "lodOptionMirrorHeroes",
                    "lodOptionsPresetMirrorHeroes",
                    "lodOptionAboutPresetMirrorHeroes",
                    mirror_heroes,
                )
                .preset(),
            ],
        ),
        (
            "common_selection",
            false,
            true,
            vec![
                D::choice(
                    keys::COMMON_GAMEMODE,
                    "lodOptionDesCommonGamemode",
                    "lodOptionAboutCommonGamemode",
                    &[
                        ("lodOptionAllPick", 1.0),
                        ("lodOptionMirrorDraft", 3.0),
                        ("lodOptionAllRandom", 4.0),
                    ],
                ),
                D::choice(
                    keys::MAX_SLOTS,
                    "lodOptionDesCommonMaxSlots",
                    "lodOptionAboutCommonMaxSlots",
                    &[
                        ("lodOptionCommonSlots4", 4.0),
                        ("lodOptionCommonSlots5", 5.0),
                        ("lodOptionCommonSlots6", 6.0),
                    ],
                ),
                owned(
                    keys::MAX_SKILLS,
                    "lodOptionDesCommonMaxSkills",
                    "lodOptionAboutCommonMaxSkills",
                    zero_to_six("lodOptionCommonSkills"),
                ),
                owned(
                    keys::MAX_ULTS,
                    "lodOptionDesCommonMaxUlts",
                    "lodOptionAboutCommonMaxUlts",
                    zero_to_six("lodOptionCommonUlts"),
                ),
                D::choice(
                    "lodOptionCommonMirrorHeroes",
                    "lodOptionsCommonMirrorHeroes",
                    "lodOptionAboutCommonMirrorHeroes",
                    mirror_heroes,
                )
                .preset(),
            ],
        ),
        (
            "banning",
            false,
            true,
            vec![
                D::choice(
                    keys::MAX_ABILITY_BANS,
                    "lodOptionDesBanningMaxBans",
                    "lodOptionAboutBanningMaxBans",
                    &[
                        ("lodOptionBanningMaxBans0", 0.0),
                        ("lodOptionBanningMaxBans1", 1.0),
                        ("lodOptionBanningMaxBans2", 2.0),
                        ("lodOptionBanningMaxBans3", 3.0),
                        ("lodOptionBanningMaxBans5", 5.0),
                        ("lodOptionBanningMaxBans10", 10.0),
                        ("lodOptionBanningMaxBans25", 25.0),
                    ],
                ),
                D::choice(
                    keys::MAX_HERO_BANS,
                    "lodOptionDesBanningMaxHeroBans",
                    "lodOptionAboutBanningMaxHeroBans",
                    &[
                        ("lodOptionBanningMaxHeroBans0", 0.0),
                        ("lodOptionBanningMaxBans1", 1.0),
                        ("lodOptionBanningMaxBans2", 2.0),
                        ("lodOptionBanningMaxBans3", 3.0),
                    ],
                ),
                D::toggle(
                    "lodOptionBanningBlockTrollCombos",
                    "lodOptionDesBanningBlockTrollCombos",
                    "lodOptionAboutBanningBlockTrollCombos",
                ),
                D::toggle(
                    "lodOptionBanningUseBanList",
                    "lodOptionDesBanningUseBanList",
                    "lodOptionAboutBanningUseBanList",
                ),
                D::toggle(
                    keys::OP_ABILITIES,
                    "lodOptionDesAdvancedOPAbilities",
                    "lodOptionAboutAdvancedOPAbilities",
                ),
                D::toggle(
                    "lodOptionBanningBanInvis",
                    "lodOptionDesBanningBanInvis",
                    "lodOptionAboutBanningBanInvis",
                ),
            ],
        ),
        (
            "game_speed",
            false,
            true,
            vec![
                owned(
                    "lodOptionGameSpeedStartingLevel",
                    "lodOptionDesGameSpeedStartingLevel",
                    "lodOptionAboutGameSpeedStartingLevel",
                    levels(&[1, 6, 11, 16, 25, 50, 75, 100]),
                ),
                owned(
                    "lodOptionGameSpeedMaxLevel",
                    "lodOptionDesGameSpeedMaxLevel",
                    "lodOptionAboutGameSpeedMaxLevel",
                    levels(&[6, 11, 16, 25, 50, 75, 100]),
                ),
                owned(
                    "lodOptionGameSpeedStartingGold",
                    "lodOptionDesGameSpeedStartingGold",
                    "lodOptionAboutGameSpeedStartingGold",
                    [0u32, 250, 500, 1000, 2500, 5000, 10000, 25000, 50000, 100000]
                        .iter()
                        .map(|g| (format!("lodOptionGameSpeedStartingGold{g}"), *g as f64))
                        .collect(),
                ),
                D::choice(
                    "lodOptionGameSpeedRespawnTime",
                    "lodOptionDesGameSpeedRespawnTime",
                    "lodOptionAboutGameSpeedRespawnTime",
                    &[
                        ("lodOptionGameSpeedRespawnTimeDefault", 0.0),
                        ("lodOptionGameSpeedRespawnTimeHalf", 0.5),
                        ("lodOptionGameSpeedRespawnTimeTenth", 0.1),
                        ("lodOptionGameSpeedRespawnTimeSecond", -1.0),
                        ("lodOptionGameSpeedRespawnTime10Second", -10.0),
                        ("lodOptionGameSpeedRespawnTime20Second", -20.0),
                        ("lodOptionGameSpeedRespawnTime30Second", -30.0),
                        ("lodOptionGameSpeedRespawnTime60Second", -60.0),
                    ],
                ),
                owned(
                    "lodOptionGameSpeedTowersPerLane",
                    "lodOptionDesGameSpeedTowersPerLane",
                    "lodOptionAboutGameSpeedTowersPerLane",
                    (3..=10)
                        .map(|n| (format!("lodOptionTower{n}"), n as f64))
                        .collect(),
                ),
                D::toggle(
                    "lodOptionGameSpeedUpgradedUlts",
                    "lodOptionDesGameSpeedUpgradedUlts",
                    "lodOptionAboutGameSpeedUpgradedUlts",
                ),
                D::toggle(
                    "lodOptionCrazyEasymode",
                    "lodOptionDesCrazyEasymode",
                    "lodOptionAboutCrazyEasymode",
                ),
            ],
        ),
        (
            "advanced_selection",
            false,
            true,
            vec![
                D::toggle(
                    keys::HERO_ABILITIES,
                    "lodOptionDesAdvancedHeroAbilities",
                    "lodOptionAboutAdvancedHeroAbilities",
                ),
                D::toggle(
                    keys::NEUTRAL_ABILITIES,
                    "lodOptionDesAdvancedNeutralAbilities",
                    "lodOptionAboutAdvancedNeutralAbilities",
                ),
                D::toggle(
                    keys::WRAITH_NIGHT,
                    "lodOptionDesAdvancedWraithNight",
                    "lodOptionAboutAdvancedWraithNight",
                ),
                D::toggle(
                    keys::HIDE_PICKS,
                    "lodOptionDesAdvancedHidePicks",
                    "lodOptionAboutAdvancedHidePicks",
                ),
                D::choice(
                    keys::UNIQUE_SKILLS,
                    "lodOptionDesAdvancedUniqueSkills",
                    "lodOptionAboutAdvancedUniqueSkills",
                    &[
                        ("lodUniqueSkillsOff", 0.0),
                        ("lodUniqueSkillsTeam", 1.0),
                        ("lodUniqueSkillsGlobal", 2.0),
                    ],
                ),
                D::toggle(
                    keys::UNIQUE_HEROES,
                    "lodOptionDesAdvancedUniqueHeroes",
                    "lodOptionAboutAdvancedUniqueHeroes",
                ),
                D::toggle(
                    "lodOptionAdvancedSelectPrimaryAttr",
                    "lodOptionDesAdvancedSelectPrimaryAttr",
                    "lodOptionAboutAdvancedSelectPrimaryAttr",
                ),
            ],
        ),
        (
            "crazyness",
            false,
            true,
            [
                "NoCamping",
                "UniversalShop",
                "AllVision",
                "Multicast",
                "WTF",
            ]
            .iter()
            .map(|n| {
                D::toggle(
                    &format!("lodOptionCrazy{n}"),
                    &format!("lodOptionDesCrazy{n}"),
                    &format!("lodOptionAboutCrazy{n}"),
                )
            })
            .collect(),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Values and requests
// ---------------------------------------------------------------------------

/// Authoritative option values, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionValues(BTreeMap<String, f64>);

impl OptionValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Integer view of a value; option domains are whole numbers except
    /// respawn time.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).map(|v| v.round() as i64)
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Memo of the last value sent or received per option, suppressing
/// duplicate `optionSet` requests.
#[derive(Debug, Clone, Default)]
pub struct OptionRequests {
    last: HashMap<String, f64>,
}

impl OptionRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an authoritative value so re-requesting it is a no-op.
    pub fn observe(&mut self, key: &str, value: f64) {
        self.last.insert(key.to_string(), value);
    }

    /// Build the request for `key = value`, or nothing when the local player
    /// is not host or the value was already sent.
    pub fn request(&mut self, key: &str, value: f64, is_host: bool) -> Option<OutboundRequest> {
        if !is_host {
            debug!("Ignoring option change for `{key}`: not host");
            return None;
        }
        if self.last.get(key) == Some(&value) {
            debug!("Option `{key}` already at {value}, not resending");
            return None;
        }
        self.last.insert(key.to_string(), value);
        Some(OutboundRequest::OptionSet {
            k: key.to_string(),
            v: value,
        })
    }
}

// ---------------------------------------------------------------------------
// Derived rules
// ---------------------------------------------------------------------------

/// Recomputation triggered by an option change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recompute {
    CustomSettings,
    Gamemode,
    AllowedCategories,
    SlotLayout,
    BanLimits,
    UniqueSkills,
    UniqueHeroes,
    HidePicks,
}

impl Recompute {
    /// Every rule that depends on `key`, in evaluation order.
    pub fn for_key(key: &str) -> Vec<Recompute> {
        match key {
            keys::GAMEMODE => vec![Recompute::CustomSettings],
            keys::COMMON_GAMEMODE => vec![Recompute::Gamemode],
            keys::HERO_ABILITIES
            | keys::NEUTRAL_ABILITIES
            | keys::WRAITH_NIGHT
            | keys::OP_ABILITIES => vec![Recompute::AllowedCategories],
            keys::MAX_SLOTS | keys::MAX_SKILLS | keys::MAX_ULTS => vec![Recompute::SlotLayout],
            keys::MAX_ABILITY_BANS | keys::MAX_HERO_BANS => vec![Recompute::BanLimits],
            keys::UNIQUE_SKILLS => vec![Recompute::UniqueSkills],
            keys::UNIQUE_HEROES => vec![Recompute::UniqueHeroes],
            keys::HIDE_PICKS => vec![Recompute::HidePicks],
            _ => Vec::new(),
        }
    }
}

/// Scope of the "taken" classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniqueSkills {
    #[default]
    Off,
    Team,
    Global,
}

impl UniqueSkills {
    pub fn from_value(value: Option<i64>) -> Self {
        match value {
            Some(1) => UniqueSkills::Team,
            Some(2) => UniqueSkills::Global,
            _ => UniqueSkills::Off,
        }
    }
}

/// Pure functions of the option map.
pub mod rules {
    use super::*;

    pub fn allow_custom_settings(values: &OptionValues) -> bool {
        values.get_int(keys::GAMEMODE) == Some(-1)
    }

    pub fn show_mirror_draft_options(values: &OptionValues) -> bool {
        values.get_int(keys::COMMON_GAMEMODE) == Some(3)
    }

    /// All-random mode: heroes are dealt, not picked.
    pub fn all_random_mode(values: &OptionValues) -> bool {
        values.get_int(keys::COMMON_GAMEMODE) == Some(4)
    }

    /// `None` until both ban maxima are known.
    pub fn no_banning_phase(values: &OptionValues) -> Option<bool> {
        let abilities = values.get_int(keys::MAX_ABILITY_BANS)?;
        let heroes = values.get_int(keys::MAX_HERO_BANS)?;
        Some(abilities == 0 && heroes == 0)
    }

    pub fn unique_skills(values: &OptionValues) -> UniqueSkills {
        UniqueSkills::from_value(values.get_int(keys::UNIQUE_SKILLS))
    }

    pub fn unique_heroes_mode(values: &OptionValues) -> bool {
        values.get_int(keys::UNIQUE_HEROES) == Some(1)
    }

    /// Categories whose enabling option is set to 1.
    pub fn allowed_categories(values: &OptionValues) -> BTreeSet<String> {
        CATEGORY_OPTIONS
            .iter()
            .filter(|(_, key)| values.get_int(key) == Some(1))
            .map(|(cat, _)| cat.to_string())
            .collect()
    }

    /// The team whose picks are hidden from `local_team`, if any.
    pub fn hidden_team(values: &OptionValues, local_team: Option<Team>) -> Option<Team> {
        if values.get_int(keys::HIDE_PICKS) != Some(1) {
            return None;
        }
        local_team.and_then(|t| t.opponent())
    }

    /// Visible slot count, once slots, skills and ults are all known.
    pub fn slot_count(values: &OptionValues) -> Option<u8> {
        let slots = values.get_int(keys::MAX_SLOTS)?;
        values.get_int(keys::MAX_SKILLS)?;
        values.get_int(keys::MAX_ULTS)?;
        Some(slots.clamp(0, i64::from(u8::MAX)) as u8)
    }
}

/// Snapshot of every derived flag, recomputed in full from the option map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gating {
    pub allow_custom_settings: bool,
    pub show_mirror_draft_options: bool,
    pub no_hero_selection: bool,
    pub all_random_mode: bool,
    pub no_banning_phase: Option<bool>,
    pub unique_skills: UniqueSkills,
    pub unique_heroes_mode: bool,
    pub allowed_categories: BTreeSet<String>,
    pub hidden_team: Option<Team>,
    pub slot_count: Option<u8>,
}

impl Gating {
    pub fn derive(values: &OptionValues, local_team: Option<Team>) -> Self {
        let all_random = rules::all_random_mode(values);
        Gating {
            allow_custom_settings: rules::allow_custom_settings(values),
            show_mirror_draft_options: rules::show_mirror_draft_options(values),
            no_hero_selection: all_random,
            all_random_mode: all_random,
            no_banning_phase: rules::no_banning_phase(values),
            unique_skills: rules::unique_skills(values),
            unique_heroes_mode: rules::unique_heroes_mode(values),
            allowed_categories: rules::allowed_categories(values),
            hidden_team: rules::hidden_team(values, local_team),
            slot_count: rules::slot_count(values),
        }
    }

    /// Whether slot widget `slot` is shown. Everything stays shown until the
    /// slot layout is known.
    pub fn slot_visible(&self, slot: u8) -> bool {
        self.slot_count.map_or(true, |n| slot <= n)
    }
}
