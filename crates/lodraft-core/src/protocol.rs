// Wire protocol: inbound table payloads, outbound requests, and bridge frames.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Numeric player identifier assigned by the game.
pub type PlayerId = u32;

/// Ability slot index within a loadout (1-based).
pub type SlotIndex = u8;

/// Ability placeholder shown in empty loadout slots.
pub const EMPTY_ABILITY: &str = "life_stealer_empty_1";

/// Number of `AbilityN` entries scanned on every hero record.
pub const MAX_HERO_ABILITIES: u8 = 16;

/// Number of loadout slot widgets that exist regardless of the slot option.
pub const MAX_SLOT_WIDGETS: SlotIndex = 6;

/// Number of players sharing one restricted pool in mirror-draft mode.
pub const DRAFT_GROUP_SIZE: usize = 5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed payload in table `{table}` (key `{key}`): {source}")]
    Json {
        table: Table,
        key: String,
        source: serde_json::Error,
    },

    #[error("unknown key `{key}` in table `{table}`")]
    UnknownKey { table: Table, key: String },

    #[error("unknown table name `{0}`")]
    UnknownTable(String),
}

fn decode<T: for<'de> Deserialize<'de>>(
    table: Table,
    key: &str,
    value: &Value,
) -> Result<T, PayloadError> {
    T::deserialize(value).map_err(|source| PayloadError::Json {
        table,
        key: key.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Every authoritative key-value table the engine mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    PhasePregame,
    Options,
    Heroes,
    Flags,
    SelectedHeroes,
    SelectedAttr,
    SelectedSkills,
    Banned,
    Ready,
    RandomBuilds,
    DraftArray,
}

impl Table {
    /// Subscription order used when attaching to a channel.
    pub const ALL: [Table; 11] = [
        Table::PhasePregame,
        Table::Options,
        Table::Heroes,
        Table::Flags,
        Table::SelectedHeroes,
        Table::SelectedAttr,
        Table::SelectedSkills,
        Table::Banned,
        Table::Ready,
        Table::RandomBuilds,
        Table::DraftArray,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::PhasePregame => "phase_pregame",
            Table::Options => "options",
            Table::Heroes => "heroes",
            Table::Flags => "flags",
            Table::SelectedHeroes => "selected_heroes",
            Table::SelectedAttr => "selected_attr",
            Table::SelectedSkills => "selected_skills",
            Table::Banned => "banned",
            Table::Ready => "ready",
            Table::RandomBuilds => "random_builds",
            Table::DraftArray => "draft_array",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PayloadError::UnknownTable(s.to_string()))
    }
}

/// One authoritative change to one key of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableUpdate {
    pub table: Table,
    pub key: String,
    pub value: Value,
}

impl TableUpdate {
    pub fn new(table: Table, key: impl Into<String>, value: Value) -> Self {
        TableUpdate {
            table,
            key: key.into(),
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

/// A hero's primary attribute as chosen by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Str,
    Agi,
    Int,
}

impl Attribute {
    /// Parse the engine-side attribute constant used in hero records.
    pub fn from_hero_constant(s: &str) -> Option<Self> {
        match s {
            "DOTA_ATTRIBUTE_STRENGTH" => Some(Attribute::Str),
            "DOTA_ATTRIBUTE_AGILITY" => Some(Attribute::Agi),
            "DOTA_ATTRIBUTE_INTELLECT" => Some(Attribute::Int),
            _ => None,
        }
    }
}

/// Melee / ranged classification from a hero record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackClass {
    Melee,
    Ranged,
}

impl AttackClass {
    pub fn from_hero_constant(s: &str) -> Option<Self> {
        match s {
            "DOTA_UNIT_CAP_MELEE_ATTACK" => Some(AttackClass::Melee),
            "DOTA_UNIT_CAP_RANGED_ATTACK" => Some(AttackClass::Ranged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Radiant,
    Dire,
    Unassigned,
}

impl Team {
    /// The team whose picks are hidden from a member of `self`.
    pub fn opponent(&self) -> Option<Team> {
        match self {
            Team::Radiant => Some(Team::Dire),
            Team::Dire => Some(Team::Radiant),
            Team::Unassigned => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Wrapped<T> {
    v: T,
}

/// One keyed entry of the `phase_pregame` table.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseEntry {
    Phase(u8),
    EndOfTimer(f64),
    ActiveTab(String),
    /// `None` when the server sends the `-1` "not frozen" marker.
    FreezeTimer(Option<i64>),
}

impl PhaseEntry {
    pub fn parse(key: &str, value: &Value) -> Result<Self, PayloadError> {
        let table = Table::PhasePregame;
        match key {
            "phase" => Ok(PhaseEntry::Phase(decode::<Wrapped<u8>>(table, key, value)?.v)),
            "endOfTimer" => Ok(PhaseEntry::EndOfTimer(
                decode::<Wrapped<f64>>(table, key, value)?.v,
            )),
            "activeTab" => Ok(PhaseEntry::ActiveTab(
                decode::<Wrapped<String>>(table, key, value)?.v,
            )),
            "freezeTimer" => {
                let raw = decode::<Wrapped<f64>>(table, key, value)?.v;
                let frozen = (raw >= 0.0).then(|| raw.round() as i64);
                Ok(PhaseEntry::FreezeTimer(frozen))
            }
            _ => Err(PayloadError::UnknownKey {
                table,
                key: key.to_string(),
            }),
        }
    }
}

/// Parse an `options` table value (`{v: number}`).
pub fn parse_option_value(key: &str, value: &Value) -> Result<f64, PayloadError> {
    Ok(decode::<Wrapped<f64>>(Table::Options, key, value)?.v)
}

/// A static hero record from the `heroes` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HeroRecord {
    #[serde(rename = "AttributePrimary", default)]
    pub attribute_primary: Option<String>,
    #[serde(rename = "AttackCapabilities", default)]
    pub attack_capabilities: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl HeroRecord {
    pub fn parse(key: &str, value: &Value) -> Result<Self, PayloadError> {
        decode(Table::Heroes, key, value)
    }

    /// Abilities listed in `Ability1..=Ability16`, keyed by their index.
    pub fn abilities(&self) -> BTreeMap<u8, String> {
        (1..=MAX_HERO_ABILITIES)
            .filter_map(|i| {
                let name = self.extra.get(&format!("Ability{i}"))?.as_str()?;
                (!name.is_empty()).then(|| (i, name.to_string()))
            })
            .collect()
    }

    pub fn primary_attribute(&self) -> Option<Attribute> {
        self.attribute_primary
            .as_deref()
            .and_then(Attribute::from_hero_constant)
    }

    pub fn attack_class(&self) -> Option<AttackClass> {
        self.attack_capabilities
            .as_deref()
            .and_then(AttackClass::from_hero_constant)
    }
}

/// Named flags attached to one ability by the `flags` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityFlags(pub BTreeMap<String, Value>);

impl AbilityFlags {
    pub fn parse(key: &str, value: &Value) -> Result<Self, PayloadError> {
        decode(Table::Flags, key, value)
    }

    pub fn category(&self) -> Option<&str> {
        self.0.get("category").and_then(Value::as_str)
    }

    /// Ultimates carry an `isUlt` flag; its value is irrelevant.
    pub fn is_ultimate(&self) -> bool {
        self.0.get("isUlt").is_some_and(|v| !v.is_null())
    }

    /// Whether `flag` is present with a truthy value.
    pub fn has(&self, flag: &str) -> bool {
        match self.0.get(flag) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectedHero {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "heroName")]
    pub hero_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectedAttr {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "newAttr")]
    pub new_attr: Attribute,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectedSkills {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(default)]
    pub skills: BTreeMap<SlotIndex, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BanNotice {
    #[serde(rename = "heroName", default)]
    pub hero_name: Option<String>,
    #[serde(rename = "abilityName", default)]
    pub ability_name: Option<String>,
    #[serde(rename = "playerID", default)]
    pub player_id: Option<PlayerId>,
    #[serde(rename = "currentHeroBans", default)]
    pub current_hero_bans: Option<u32>,
    #[serde(rename = "currentAbilityBans", default)]
    pub current_ability_bans: Option<u32>,
}

/// Full ready-state map: player id -> 0 | 1.
pub fn parse_ready_state(key: &str, value: &Value) -> Result<BTreeMap<PlayerId, bool>, PayloadError> {
    let raw: BTreeMap<PlayerId, u8> = decode(Table::Ready, key, value)?;
    Ok(raw.into_iter().map(|(id, flag)| (id, flag != 0)).collect())
}

/// One build offered to a player in all-random mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomBuild {
    pub build_id: u32,
    pub hero_id: String,
    pub loadout: BTreeMap<SlotIndex, String>,
}

/// The two unrelated message shapes multiplexed on `random_builds`.
#[derive(Debug, Clone, PartialEq)]
pub enum RandomBuildsMessage {
    Offer {
        player_id: PlayerId,
        builds: Vec<RandomBuild>,
    },
    Selection {
        player_id: PlayerId,
        hero_slot: u32,
        build_slot: u32,
    },
}

#[derive(Debug, Deserialize)]
struct RawRandomBuild {
    #[serde(rename = "heroName")]
    hero_name: String,
    #[serde(default)]
    build: BTreeMap<SlotIndex, String>,
}

#[derive(Debug, Deserialize)]
struct RawRandomBuilds {
    #[serde(rename = "playerID")]
    player_id: PlayerId,
    #[serde(default)]
    builds: BTreeMap<u32, RawRandomBuild>,
    #[serde(default)]
    selected: Option<Value>,
    #[serde(default)]
    hero: Option<u32>,
    #[serde(default)]
    build: Option<u32>,
}

impl RandomBuildsMessage {
    /// The `selected` field is the discriminant between the two shapes.
    pub fn parse(key: &str, value: &Value) -> Result<Self, PayloadError> {
        let raw: RawRandomBuilds = decode(Table::RandomBuilds, key, value)?;
        match raw.selected {
            Some(_) => Ok(RandomBuildsMessage::Selection {
                player_id: raw.player_id,
                hero_slot: raw.hero.unwrap_or(0),
                build_slot: raw.build.unwrap_or(0),
            }),
            None => Ok(RandomBuildsMessage::Offer {
                player_id: raw.player_id,
                builds: raw
                    .builds
                    .into_iter()
                    .map(|(build_id, b)| RandomBuild {
                        build_id,
                        hero_id: b.hero_name,
                        loadout: b.build,
                    })
                    .collect(),
            }),
        }
    }
}

/// Allowed pools for one draft group.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DraftArray {
    #[serde(rename = "heroDraft", default, deserialize_with = "id_set")]
    pub hero_draft: BTreeSet<String>,
    #[serde(rename = "abilityDraft", default, deserialize_with = "id_set")]
    pub ability_draft: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DraftArrayMessage {
    #[serde(rename = "draftID")]
    pub draft_id: usize,
    #[serde(rename = "draftArray")]
    pub draft_array: DraftArray,
}

impl DraftArrayMessage {
    pub fn parse(key: &str, value: &Value) -> Result<Self, PayloadError> {
        decode(Table::DraftArray, key, value)
    }
}

/// Id sets arrive either as `{id: 1, ...}` objects or plain arrays.
fn id_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter(|(_, v)| !matches!(v, Value::Null | Value::Bool(false)))
            .map(|(k, _)| k)
            .collect()),
        Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                other => Err(de::Error::custom(format!("expected id string, got {other}"))),
            })
            .collect(),
        Value::Null => Ok(BTreeSet::new()),
        other => Err(de::Error::custom(format!("expected id set, got {other}"))),
    }
}

pub fn decode_selected_hero(key: &str, value: &Value) -> Result<SelectedHero, PayloadError> {
    decode(Table::SelectedHeroes, key, value)
}

pub fn decode_selected_attr(key: &str, value: &Value) -> Result<SelectedAttr, PayloadError> {
    decode(Table::SelectedAttr, key, value)
}

pub fn decode_selected_skills(key: &str, value: &Value) -> Result<SelectedSkills, PayloadError> {
    decode(Table::SelectedSkills, key, value)
}

pub fn decode_ban_notice(key: &str, value: &Value) -> Result<BanNotice, PayloadError> {
    decode(Table::Banned, key, value)
}

// ---------------------------------------------------------------------------
// Outbound requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BanTarget {
    Hero {
        #[serde(rename = "heroName")]
        hero_name: String,
    },
    Ability {
        #[serde(rename = "abilityName")]
        ability_name: String,
    },
}

/// Fire-and-forget mutation requests sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum OutboundRequest {
    OptionSet {
        k: String,
        v: f64,
    },
    ChooseHero {
        #[serde(rename = "heroName")]
        hero_name: String,
    },
    Ban(BanTarget),
    ChooseAttr {
        #[serde(rename = "newAttr")]
        new_attr: Attribute,
    },
    ChooseAbility {
        slot: SlotIndex,
        #[serde(rename = "abilityName")]
        ability_name: String,
    },
    SwapSlots {
        slot1: SlotIndex,
        slot2: SlotIndex,
    },
    Ready,
    OptionsMenuViewed {
        v: String,
    },
    OptionsLocked,
}

impl OutboundRequest {
    /// Build a swap request. The pair is normalized so `(a, b)` and `(b, a)`
    /// are the same request.
    pub fn swap_slots(a: SlotIndex, b: SlotIndex) -> Self {
        OutboundRequest::SwapSlots {
            slot1: a.min(b),
            slot2: a.max(b),
        }
    }

    pub fn ban_hero(hero_name: impl Into<String>) -> Self {
        OutboundRequest::Ban(BanTarget::Hero {
            hero_name: hero_name.into(),
        })
    }

    pub fn ban_ability(ability_name: impl Into<String>) -> Self {
        OutboundRequest::Ban(BanTarget::Ability {
            ability_name: ability_name.into(),
        })
    }

    /// Requests the client only sends while holding host privilege.
    pub fn requires_host(&self) -> bool {
        matches!(
            self,
            OutboundRequest::OptionSet { .. }
                | OutboundRequest::OptionsMenuViewed { .. }
                | OutboundRequest::OptionsLocked
        )
    }
}

// ---------------------------------------------------------------------------
// Bridge frames
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub team: Team,
    #[serde(default)]
    pub host: bool,
}

/// Who is in the match and which player this client is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterInfo {
    pub local_player: PlayerId,
    pub players: Vec<PlayerInfo>,
}

/// Text frames sent by the game-client bridge over the feed socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedFrame {
    Table {
        table: Table,
        key: String,
        value: Value,
    },
    Clock {
        now: f64,
    },
    Roster(RosterInfo),
    Map {
        name: String,
    },
}
