// Catalogue of recommended builds and their classification against the
// current draft state.

use lodraft_core::protocol::Attribute;

use crate::filter::{AbilityFilterInfo, FilterEngine, HeroFilterInfo};
use crate::options::Gating;
use crate::store::DraftStateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendedBuild {
    pub title: &'static str,
    pub hero: &'static str,
    pub attribute: Attribute,
    pub abilities: [&'static str; 6],
}

pub static RECOMMENDED_BUILDS: [RecommendedBuild; 10] = [
    RecommendedBuild {
        title: "Hunter in the night",
        hero: "npc_dota_hero_night_stalker",
        attribute: Attribute::Str,
        abilities: [
            "magnataur_empower",
            "antimage_blink",
            "lycan_shapeshift",
            "luna_lunar_blessing",
            "night_stalker_hunter_in_the_night",
            "night_stalker_darkness",
        ],
    },
    RecommendedBuild {
        title: "Generic Tank",
        hero: "npc_dota_hero_centaur",
        attribute: Attribute::Str,
        abilities: [
            "huskar_berserkers_blood",
            "dragon_knight_dragon_blood",
            "spectre_dispersion",
            "viper_corrosive_skin",
            "shredder_reactive_armor",
            "alchemist_chemical_rage",
        ],
    },
    RecommendedBuild {
        title: "Infest Support",
        hero: "npc_dota_hero_night_stalker",
        attribute: Attribute::Str,
        abilities: [
            "pudge_rot",
            "witch_doctor_voodoo_restoration",
            "magnataur_empower",
            "alpha_wolf_command_aura",
            "omniknight_degen_aura",
            "life_stealer_infest",
        ],
    },
    RecommendedBuild {
        title: "Global Caster",
        hero: "npc_dota_hero_pugna",
        attribute: Attribute::Int,
        abilities: [
            "treant_living_armor",
            "holdout_arcane_aura",
            "ancient_apparition_ice_blast",
            "silencer_glaives_of_wisdom",
            "bloodseeker_thirst",
            "zuus_thundergods_wrath",
        ],
    },
    RecommendedBuild {
        title: "Magic Be Dashed!",
        hero: "npc_dota_hero_mirana",
        attribute: Attribute::Agi,
        abilities: [
            "medusa_split_shot",
            "sniper_take_aim",
            "spectre_desolate",
            "meepo_geostrike",
            "necronomicon_warrior_mana_burn_lod",
            "phantom_lancer_juxtapose",
        ],
    },
    RecommendedBuild {
        title: "All your attributes are belong to me",
        hero: "npc_dota_hero_windrunner",
        attribute: Attribute::Int,
        abilities: [
            "obsidian_destroyer_arcane_orb",
            "obsidian_destroyer_essence_aura",
            "slark_essence_shift",
            "pudge_flesh_heap",
            "silencer_glaives_of_wisdom",
            "windrunner_focusfire",
        ],
    },
    RecommendedBuild {
        title: "Rapture",
        hero: "npc_dota_hero_pugna",
        attribute: Attribute::Int,
        abilities: [
            "pudge_meat_hook",
            "lone_druid_savage_roar",
            "vengefulspirit_nether_swap",
            "earth_spirit_boulder_smash",
            "magnataur_skewer",
            "bloodseeker_rupture",
        ],
    },
    RecommendedBuild {
        title: "Global Stunner",
        hero: "npc_dota_hero_pugna",
        attribute: Attribute::Int,
        abilities: [
            "sven_storm_bolt",
            "vengefulspirit_magic_missile",
            "antimage_blink",
            "furion_teleportation",
            "holdout_arcane_aura",
            "magnataur_reverse_polarity",
        ],
    },
    RecommendedBuild {
        title: "Bring the team fight",
        hero: "npc_dota_hero_silencer",
        attribute: Attribute::Int,
        abilities: [
            "enigma_midnight_pulse",
            "necrolyte_heartstopper_aura",
            "warlock_rain_of_chaos",
            "magnataur_empower",
            "skeleton_king_vampiric_aura",
            "enigma_black_hole",
        ],
    },
    RecommendedBuild {
        title: "The Duelist",
        hero: "npc_dota_hero_juggernaut",
        attribute: Attribute::Agi,
        abilities: [
            "phantom_assassin_phantom_strike",
            "slardar_bash",
            "windrunner_focusfire",
            "slark_essence_shift",
            "troll_warlord_fervor",
            "legion_commander_duel",
        ],
    },
];

/// A recommended build with every part classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedBuild {
    pub build: &'static RecommendedBuild,
    pub hero: HeroFilterInfo,
    pub abilities: Vec<(&'static str, AbilityFilterInfo)>,
}

impl ClassifiedBuild {
    /// Whether the hero and all six abilities can currently be picked.
    pub fn fully_available(&self) -> bool {
        self.hero.should_show
            && !self.hero.taken_hero
            && self
                .abilities
                .iter()
                .all(|(_, info)| !(info.disallowed || info.banned || info.taken || info.cant_draft))
    }
}

pub fn classify_builds(
    filter: &FilterEngine,
    store: &DraftStateStore,
    gating: &Gating,
) -> Vec<ClassifiedBuild> {
    RECOMMENDED_BUILDS
        .iter()
        .map(|build| ClassifiedBuild {
            build,
            hero: filter.hero_info(store, build.hero),
            abilities: build
                .abilities
                .iter()
                .map(|ab| (*ab, filter.ability_status(store, gating, ab)))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{keys, OptionValues};
    use lodraft_core::protocol::{Table, TableUpdate};
    use serde_json::json;

    #[test]
    fn catalogue_titles_are_unique() {
        let mut titles: Vec<_> = RECOMMENDED_BUILDS.iter().map(|b| b.title).collect();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), RECOMMENDED_BUILDS.len());
    }

    #[test]
    fn banned_ability_makes_build_unavailable() {
        let mut store = DraftStateStore::new();
        let mut values = OptionValues::new();
        values.set(keys::HERO_ABILITIES, 1.0);
        let gating = Gating::derive(&values, None);

        for ab in RECOMMENDED_BUILDS[1].abilities {
            store
                .apply(&TableUpdate::new(Table::Flags, ab, json!({"category": "main"})))
                .unwrap();
        }
        let filter = FilterEngine::new();
        let builds = classify_builds(&filter, &store, &gating);
        assert_eq!(builds.len(), 10);
        assert!(builds[1].fully_available());

        store
            .apply(&TableUpdate::new(
                Table::Banned,
                "x",
                json!({"abilityName": "spectre_dispersion"}),
            ))
            .unwrap();
        let builds = classify_builds(&filter, &store, &gating);
        assert!(!builds[1].fully_available());
        assert!(builds[1].abilities[2].1.banned);
    }
}
