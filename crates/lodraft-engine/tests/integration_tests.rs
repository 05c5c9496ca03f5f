// Integration tests for the drafting engine.
//
// These drive the engine through its public API the way the binary does:
// table updates flow in through the sync channel, user intent goes in through
// engine actions, and requests come out of the outbox.

use lodraft_core::config::TimingConfig;
use lodraft_core::protocol::{
    OutboundRequest, PlayerId, PlayerInfo, RosterInfo, Table, TableUpdate, Team,
};
use lodraft_core::sync::{MemoryTables, TableSyncChannel};
use lodraft_engine::filter::FilterEngine;
use lodraft_engine::options::{keys, Gating};
use lodraft_engine::phase::{Feedback, Phase};
use lodraft_engine::selection::{DragPayload, DropTarget};
use lodraft_engine::DraftEngine;

use serde_json::{json, Value};

// ===========================================================================
// Test helpers
// ===========================================================================

fn up(table: Table, key: &str, value: Value) -> TableUpdate {
    TableUpdate::new(table, key, value)
}

fn roster(local: PlayerId) -> RosterInfo {
    RosterInfo {
        local_player: local,
        players: vec![
            PlayerInfo { player_id: 0, team: Team::Radiant, host: true },
            PlayerInfo { player_id: 1, team: Team::Dire, host: false },
            PlayerInfo { player_id: 2, team: Team::Radiant, host: false },
        ],
    }
}

fn engine_for(local: PlayerId) -> DraftEngine {
    let mut engine = DraftEngine::new(TimingConfig::default(), 0.0);
    engine.set_roster(roster(local));
    engine
}

fn set_option(engine: &mut DraftEngine, key: &str, value: f64) {
    engine.apply(&up(Table::Options, key, json!({ "v": value })));
}

fn enable_main_abilities(engine: &mut DraftEngine) {
    set_option(engine, keys::HERO_ABILITIES, 1.0);
}

fn pick(engine: &mut DraftEngine, player: PlayerId, skills: Value) {
    engine.apply(&up(
        Table::SelectedSkills,
        &player.to_string(),
        json!({ "playerID": player, "skills": skills }),
    ));
}

// ===========================================================================
// Filter
// ===========================================================================

#[test]
fn fireball_taken_by_three_players_is_hidden_for_everyone() {
    for local in 0..3 {
        let mut engine = engine_for(local);
        enable_main_abilities(&mut engine);
        set_option(&mut engine, keys::UNIQUE_SKILLS, 2.0);
        engine.apply(&up(Table::Flags, "fireball", json!({ "category": "main" })));
        engine.update_filter(|f| f.set_show_taken(false));

        for player in 0..3 {
            pick(&mut engine, player, json!({ "1": "fireball" }));
        }

        let info = engine.ability_info("fireball");
        assert!(info.taken, "player {local} should see fireball as taken");
        assert!(!info.should_show, "player {local} should not see fireball");
        assert!(!engine.visible_abilities().contains(&"fireball".to_string()));
    }
}

#[test]
fn should_show_implies_no_predicate_demanded_hiding() {
    let mut engine = engine_for(0);
    set_option(&mut engine, keys::HERO_ABILITIES, 1.0);
    set_option(&mut engine, keys::NEUTRAL_ABILITIES, 1.0);
    set_option(&mut engine, keys::UNIQUE_SKILLS, 1.0);

    let abilities = [
        ("a_main", json!({ "category": "main" })),
        ("b_neutral", json!({ "category": "neutral", "stun": 1 })),
        ("c_op", json!({ "category": "OP" })),
        ("d_wraith", json!({ "category": "wraith" })),
        ("e_banned", json!({ "category": "main" })),
        ("f_taken", json!({ "category": "main", "isUlt": 1 })),
    ];
    for (id, flags) in &abilities {
        engine.apply(&up(Table::Flags, id, flags.clone()));
    }
    engine.apply(&up(Table::Banned, "0", json!({ "abilityName": "e_banned" })));
    pick(&mut engine, 2, json!({ "1": "f_taken" }));

    let toggles: [fn(&mut FilterEngine); 4] = [
        |_| {},
        |f| f.set_show_taken(false),
        |f| f.set_search_category(Some("stun".into())),
        |f| f.click_tab("neutral", false),
    ];
    for toggle in toggles {
        engine.update_filter(toggle);
        let filter = engine.filter();
        for (id, _) in &abilities {
            let info = engine.ability_info(id);
            if info.should_show {
                assert!(!info.disallowed || filter.show_disallowed(), "{id}");
                assert!(!info.banned || filter.show_banned(), "{id}");
                assert!(!info.taken || filter.show_taken(), "{id}");
                assert!(!info.cant_draft || filter.show_non_draft(), "{id}");
            }
        }
    }
}

#[test]
fn team_unique_mode_only_counts_own_team() {
    let mut engine = engine_for(0);
    enable_main_abilities(&mut engine);
    set_option(&mut engine, keys::UNIQUE_SKILLS, 1.0);
    engine.apply(&up(Table::Flags, "ally_pick", json!({ "category": "main" })));
    engine.apply(&up(Table::Flags, "enemy_pick", json!({ "category": "main" })));
    engine.update_filter(|f| f.set_show_taken(false));

    pick(&mut engine, 2, json!({ "1": "ally_pick" }));
    pick(&mut engine, 1, json!({ "1": "enemy_pick" }));

    assert!(!engine.ability_info("ally_pick").should_show);
    assert!(engine.ability_info("enemy_pick").should_show);
}

#[test]
fn draft_array_for_own_group_restricts_abilities() {
    let mut engine = engine_for(2);
    enable_main_abilities(&mut engine);
    engine.apply(&up(
        Table::Heroes,
        "npc_dota_hero_axe",
        json!({ "AttributePrimary": "DOTA_ATTRIBUTE_STRENGTH", "Ability1": "axe_culling_blade" }),
    ));
    engine.apply(&up(Table::Flags, "axe_culling_blade", json!({ "category": "main" })));
    assert!(engine.ability_info("axe_culling_blade").should_show);

    // Group 0 belongs to player 0; player 2 is in group 1.
    engine.apply(&up(
        Table::DraftArray,
        "0",
        json!({ "draftID": 0, "draftArray": { "heroDraft": {}, "abilityDraft": {} } }),
    ));
    assert!(engine.ability_info("axe_culling_blade").should_show);

    engine.apply(&up(
        Table::DraftArray,
        "1",
        json!({ "draftID": 1, "draftArray": { "heroDraft": { "npc_dota_hero_lina": 1 }, "abilityDraft": {} } }),
    ));
    let info = engine.ability_info("axe_culling_blade");
    assert!(info.cant_draft);
    assert!(!info.should_show);
    assert!(!engine.hero_info("npc_dota_hero_axe").should_show);
}

// ===========================================================================
// Ban budget
// ===========================================================================

#[test]
fn exhausted_ability_bans_leave_singular_hero_clause() {
    let mut engine = engine_for(0);
    set_option(&mut engine, keys::MAX_ABILITY_BANS, 3.0);
    set_option(&mut engine, keys::MAX_HERO_BANS, 1.0);
    engine.apply(&up(
        Table::Banned,
        "3",
        json!({ "abilityName": "x", "playerID": 0, "currentHeroBans": 0, "currentAbilityBans": 3 }),
    ));
    assert_eq!(engine.ban_text(), "You can ban up to 1 hero.");
}

#[test]
fn other_players_ban_counts_do_not_touch_budget() {
    let mut engine = engine_for(0);
    set_option(&mut engine, keys::MAX_ABILITY_BANS, 3.0);
    set_option(&mut engine, keys::MAX_HERO_BANS, 2.0);
    engine.apply(&up(
        Table::Banned,
        "1",
        json!({ "heroName": "npc_a", "playerID": 1, "currentHeroBans": 2, "currentAbilityBans": 3 }),
    ));
    assert_eq!(engine.ban_text(), "You can ban up to 2 heroes and 3 abilities.");
    assert!(engine.store().bans().banned_heroes.contains("npc_a"));
}

#[test]
fn no_limits_means_no_more_bans() {
    let engine = engine_for(0);
    assert_eq!(engine.ban_text(), "No more bans.");
}

// ===========================================================================
// Phases
// ===========================================================================

#[test]
fn selected_phase_never_passes_authoritative_phase() {
    let mut engine = engine_for(0);
    engine.apply(&up(Table::PhasePregame, "phase", json!({ "v": 3 })));
    for n in 4..=8 {
        engine.select_phase(n);
        assert_eq!(engine.phase().selected(), Phase::Banning);
    }
    assert!(engine
        .drain_feedback()
        .iter()
        .all(|cue| *cue == Feedback::Rejected));

    engine.select_phase(2);
    assert_eq!(engine.phase().selected(), Phase::OptionSelection);
    engine.apply(&up(Table::PhasePregame, "phase", json!({ "v": 4 })));
    assert_eq!(engine.phase().selected(), Phase::Selection);
}

#[test]
fn frozen_timer_shows_freeze_value() {
    let mut engine = engine_for(0);
    engine.apply(&up(Table::PhasePregame, "phase", json!({ "v": 4 })));
    engine.apply(&up(Table::PhasePregame, "endOfTimer", json!({ "v": 500.0 })));
    engine.apply(&up(Table::PhasePregame, "freezeTimer", json!({ "v": 42 })));
    engine.tick(0.15);
    assert_eq!(engine.timer().unwrap().text, "(0:42)");

    engine.apply(&up(Table::PhasePregame, "freezeTimer", json!({ "v": -1 })));
    engine.tick(0.25);
    let timer = engine.timer().unwrap();
    assert_eq!(timer.text, "(8:20)");
    assert!(timer.pulse.is_some());
}

// ===========================================================================
// Selection
// ===========================================================================

#[test]
fn swap_requests_are_symmetric() {
    let mut engine = engine_for(0);
    engine.activate_slot(1);
    engine.activate_slot(4);
    engine.activate_slot(4);
    engine.activate_slot(1);
    let sent = engine.drain_outbox();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(sent[0], OutboundRequest::SwapSlots { slot1: 1, slot2: 4 });
}

#[test]
fn requests_never_change_local_loadout() {
    let mut engine = engine_for(0);
    engine.activate_ability("blink");
    engine.activate_slot(2);
    assert_eq!(engine.drain_outbox().len(), 1);
    assert!(engine.store().loadout(0).is_empty());

    pick(&mut engine, 0, json!({ "2": "blink" }));
    assert_eq!(engine.store().loadout(0).get(&2).map(String::as_str), Some("blink"));

    // Re-assigning what the slot already holds sends nothing.
    engine.activate_ability("blink");
    engine.activate_slot(2);
    assert!(engine.drain_outbox().is_empty());
}

#[test]
fn loadout_update_replaces_previous_loadout() {
    let mut engine = engine_for(1);
    pick(&mut engine, 1, json!({ "1": "a", "2": "b", "3": "c" }));
    pick(&mut engine, 1, json!({ "1": "x", "2": "y" }));
    let loadout = engine.store().loadout(1);
    assert_eq!(loadout.len(), 2);
    assert_eq!(loadout.get(&1).map(String::as_str), Some("x"));
    assert_eq!(loadout.get(&2).map(String::as_str), Some("y"));
}

#[test]
fn dragging_a_hero_to_the_ban_area_bans_it() {
    let mut engine = engine_for(0);
    engine.drag_start(DragPayload::Hero("npc_dota_hero_pudge".into()));
    assert!(engine.drag_enter(DropTarget::BanArea));
    engine.drag_end();
    assert_eq!(
        engine.drain_outbox(),
        vec![OutboundRequest::ban_hero("npc_dota_hero_pudge")]
    );
}

// ===========================================================================
// Options
// ===========================================================================

#[test]
fn option_set_twice_sends_once() {
    let mut engine = engine_for(0);
    engine.set_option(keys::MAX_SKILLS, 4.0);
    engine.set_option(keys::MAX_SKILLS, 4.0);
    assert_eq!(
        engine.drain_outbox(),
        vec![OutboundRequest::OptionSet { k: keys::MAX_SKILLS.to_string(), v: 4.0 }]
    );
}

#[test]
fn non_host_cannot_send_host_requests() {
    let mut engine = engine_for(1);
    engine.set_option(keys::MAX_SKILLS, 4.0);
    engine.view_options_category("banning");
    engine.lock_options();
    assert!(engine.drain_outbox().is_empty());
}

#[test]
fn slot_count_reaches_materialized_views_only() {
    let mut engine = engine_for(0);
    engine.materialize_view(1);
    set_option(&mut engine, keys::MAX_SLOTS, 5.0);
    set_option(&mut engine, keys::MAX_SKILLS, 4.0);
    assert!(engine.drain_notices().is_empty());

    set_option(&mut engine, keys::MAX_ULTS, 1.0);
    let notices = engine.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(!engine.gating().slot_visible(6));
}

#[test]
fn gating_follows_option_map() {
    let mut engine = engine_for(0);
    set_option(&mut engine, keys::COMMON_GAMEMODE, 4.0);
    set_option(&mut engine, keys::HIDE_PICKS, 1.0);
    let gating: &Gating = engine.gating();
    assert!(gating.all_random_mode);
    assert_eq!(gating.hidden_team, Some(Team::Dire));
}

// ===========================================================================
// Channel
// ===========================================================================

#[test]
fn snapshot_and_live_updates_flow_through_channel() {
    let (mut channel, mut rx) = TableSyncChannel::new(MemoryTables::new());
    channel.publish(up(Table::Options, keys::HERO_ABILITIES, json!({ "v": 1 })));
    channel.publish(up(Table::Flags, "fireball", json!({ "category": "main" })));

    let mut engine = engine_for(0);
    engine.attach(&mut channel).unwrap();
    assert_eq!(engine.pump(&mut rx), 2);
    assert!(engine.ability_info("fireball").should_show);

    channel.publish(up(Table::Banned, "0", json!({ "abilityName": "fireball" })));
    assert_eq!(engine.pump(&mut rx), 1);
    assert!(engine.ability_info("fireball").banned);
}
