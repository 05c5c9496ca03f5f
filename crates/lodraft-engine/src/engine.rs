// The drafting engine.
//
// Owns the state store and every controller, routes authoritative updates to
// them, runs the cooperative scheduler, and collects everything that leaves
// the engine: outbound requests, feedback cues, and view notices.

use std::collections::{BTreeMap, VecDeque};

use lodraft_core::config::TimingConfig;
use lodraft_core::protocol::{
    Attribute, OutboundRequest, PhaseEntry, PlayerId, RosterInfo, SlotIndex, Table, TableUpdate,
    MAX_SLOT_WIDGETS,
};
use lodraft_core::schedule::{GameTime, Generation, Scheduler, TaskHandle};
use lodraft_core::sync::{SyncError, TableSource, TableSyncChannel};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::bans::{BanBudget, BanMessage};
use crate::builds::{classify_builds, ClassifiedBuild};
use crate::filter::{AbilityFilterInfo, FilterEngine, HeroFilterInfo, HeroList, Localize, RawIds};
use crate::options::{keys, Gating, OptionRequests, OptionsRegistry, Recompute};
use crate::phase::{Feedback, Phase, PhaseTimerController, TimerDisplay};
use crate::selection::{
    DragPayload, DropTarget, SelectionController, SlotHighlight, SlotLimits,
};
use crate::store::{DraftStateStore, StoreEvent, ViewNotice};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Work the engine schedules on itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    DisplayTick,
    SearchPoll,
    DragSettle(u64),
    HeroListRebuild(u64),
    PulseOff(u64),
}

/// Which search input holds focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBox {
    Skills,
    Heroes,
}

#[derive(Debug)]
struct SearchFocus {
    target: SearchBox,
    poll: TaskHandle,
    /// Text the input currently holds, as last reported by the host.
    input: String,
    /// Text last applied to the filter.
    applied: String,
}

/// A helper hero's abilities and their classification.
#[derive(Debug, Clone, PartialEq)]
pub struct HeroPreview {
    pub hero: String,
    pub abilities: Vec<(String, AbilityFilterInfo)>,
}

// ---------------------------------------------------------------------------
// DraftEngine
// ---------------------------------------------------------------------------

pub struct DraftEngine {
    timing: TimingConfig,
    store: DraftStateStore,
    registry: OptionsRegistry,
    option_requests: OptionRequests,
    gating: Gating,
    filter: FilterEngine,
    selection: SelectionController,
    phase: PhaseTimerController,
    scheduler: Scheduler<Task>,
    localizer: Box<dyn Localize>,

    hero_list: HeroList,
    hero_list_generation: Generation,
    search: Option<SearchFocus>,
    preview: Option<HeroPreview>,
    builder_tab: String,
    viewed_options_tab: Option<String>,

    visible_abilities: Vec<String>,
    builds: Vec<ClassifiedBuild>,
    ban_message: BanMessage,
    timer: Option<TimerDisplay>,

    outbox: VecDeque<OutboundRequest>,
    feedback: VecDeque<Feedback>,
}

impl DraftEngine {
    /// Create an engine whose clock starts at `now`. The display tick is
    /// armed immediately and runs for the engine's lifetime.
    pub fn new(timing: TimingConfig, now: GameTime) -> Self {
        let mut scheduler = Scheduler::new(now);
        scheduler.schedule_every(timing.tick_secs, Task::DisplayTick);

        let mut engine = DraftEngine {
            phase: PhaseTimerController::new(timing.pulse_secs, timing.pulse_interval_secs),
            timing,
            store: DraftStateStore::new(),
            registry: OptionsRegistry::builtin(),
            option_requests: OptionRequests::new(),
            gating: Gating::default(),
            filter: FilterEngine::new(),
            selection: SelectionController::new(),
            scheduler,
            localizer: Box::new(RawIds),
            hero_list: HeroList::default(),
            hero_list_generation: Generation::new(),
            search: None,
            preview: None,
            builder_tab: "pickingPhaseMainTab".to_string(),
            viewed_options_tab: None,
            visible_abilities: Vec::new(),
            builds: Vec::new(),
            ban_message: BanMessage::NoMoreBans,
            timer: None,
            outbox: VecDeque::new(),
            feedback: VecDeque::new(),
        };
        engine.recompute_gating();
        engine.refilter();
        engine
    }

    /// Replace the display-text lookup used by search.
    pub fn with_localizer(mut self, localizer: impl Localize + 'static) -> Self {
        self.localizer = Box::new(localizer);
        self
    }

    /// Subscribe to every table. Any unavailable table aborts the session.
    pub fn attach<S: TableSource>(&self, channel: &mut TableSyncChannel<S>) -> Result<usize, SyncError> {
        let mut replayed = 0;
        for table in Table::ALL {
            replayed += channel.subscribe(table)?;
        }
        info!("Attached to {} tables ({replayed} entries replayed)", Table::ALL.len());
        Ok(replayed)
    }

    /// Apply every update currently queued on the channel, in order.
    pub fn pump(&mut self, rx: &mut mpsc::UnboundedReceiver<TableUpdate>) -> usize {
        let mut applied = 0;
        while let Ok(update) = rx.try_recv() {
            self.apply(&update);
            applied += 1;
        }
        applied
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Route one authoritative update and run every dependent recomputation
    /// before returning.
    pub fn apply(&mut self, update: &TableUpdate) {
        if update.table == Table::PhasePregame {
            match PhaseEntry::parse(&update.key, &update.value) {
                Ok(entry) => self.on_phase_entry(entry),
                Err(e) => warn!("Dropping phase update: {e}"),
            }
            return;
        }
        match self.store.apply(update) {
            Ok(event) => self.on_store_event(event),
            Err(e) => warn!("Dropping malformed update: {e}"),
        }
    }

    fn on_phase_entry(&mut self, entry: PhaseEntry) {
        match entry {
            PhaseEntry::Phase(n) => match Phase::from_u8(n) {
                Some(phase) => {
                    self.phase.set_authoritative(phase);
                    // Re-evaluate enemy pick hiding.
                    self.recompute_gating();
                }
                None => warn!("Unknown phase {n}"),
            },
            PhaseEntry::EndOfTimer(end) => self.phase.set_end_of_timer(end),
            PhaseEntry::FreezeTimer(freeze) => self.phase.set_freeze(freeze),
            PhaseEntry::ActiveTab(tab) => {
                debug!("Host is viewing options tab `{tab}`");
                self.viewed_options_tab = Some(tab);
            }
        }
    }

    fn on_store_event(&mut self, event: StoreEvent) {
        trace!("Store event {event:?}");
        match event {
            StoreEvent::HeroDataChanged { .. } => {
                let stamp = self.hero_list_generation.bump();
                self.scheduler
                    .schedule_once(self.timing.rebuild_delay_secs, Task::HeroListRebuild(stamp));
            }
            StoreEvent::FlagsChanged { .. }
            | StoreEvent::HeroSelected { .. }
            | StoreEvent::SkillsSelected { .. }
            | StoreEvent::DraftArrayApplied => self.refilter(),
            StoreEvent::Banned { ability, own_counts, .. } => {
                if ability.is_some() && ability.as_deref() == self.selection.pending_ability() {
                    self.selection.clear();
                }
                if own_counts {
                    self.recompute_ban_message();
                }
                self.refilter();
            }
            StoreEvent::OptionChanged { key, value } => self.on_option_changed(&key, value),
            StoreEvent::AttributeSelected { .. }
            | StoreEvent::ReadyChanged
            | StoreEvent::RandomBuildsOffered
            | StoreEvent::RandomBuildSelected
            | StoreEvent::Ignored => {}
        }
    }

    fn on_option_changed(&mut self, key: &str, value: f64) {
        self.registry.sync_binding(key, value);
        self.option_requests.observe(key, value);
        for rule in Recompute::for_key(key) {
            self.recompute(rule);
        }
    }

    fn recompute(&mut self, rule: Recompute) {
        self.recompute_gating();
        match rule {
            Recompute::CustomSettings => {
                debug!("Custom settings allowed: {}", self.gating.allow_custom_settings)
            }
            Recompute::Gamemode => debug!(
                "Mirror draft options: {}, all random: {}",
                self.gating.show_mirror_draft_options, self.gating.all_random_mode
            ),
            Recompute::SlotLayout => {
                if let Some(count) = self.gating.slot_count {
                    self.store.push_slot_count(count);
                }
            }
            Recompute::BanLimits => self.recompute_ban_message(),
            Recompute::AllowedCategories | Recompute::UniqueSkills => self.refilter(),
            Recompute::UniqueHeroes | Recompute::HidePicks => {}
        }
    }

    /// Replace the roster and re-derive everything scoped to the local team.
    pub fn set_roster(&mut self, info: RosterInfo) {
        info!(
            "Roster: local player {}, {} players",
            info.local_player,
            info.players.len()
        );
        self.store.set_roster(info);
        self.recompute_gating();
        self.recompute_ban_message();
        self.refilter();
    }

    pub fn set_map(&mut self, name: &str) {
        if !self.registry.restrict_to_map(name) {
            debug!("Map `{name}` allows every gamemode");
        }
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Advance the clock and run every task that fell due.
    pub fn tick(&mut self, now: GameTime) {
        for task in self.scheduler.advance_to(now) {
            match task {
                Task::DisplayTick => self.refresh_timer(),
                Task::SearchPoll => self.poll_search(),
                Task::DragSettle(stamp) => {
                    self.selection.settle_drag(stamp);
                }
                Task::HeroListRebuild(stamp) => {
                    if self.hero_list_generation.is_current(stamp) {
                        self.hero_list = HeroList::build(&self.store);
                        debug!("Hero list rebuilt ({} heroes)", self.hero_list.len());
                        self.refilter();
                    }
                }
                Task::PulseOff(stamp) => {
                    self.phase.end_pulse(stamp);
                }
            }
        }
    }

    fn refresh_timer(&mut self) {
        let now = self.scheduler.now();
        self.timer = self.phase.refresh(now);
        if let Some(pulse) = self.timer.as_ref().and_then(|t| t.pulse) {
            self.scheduler
                .schedule_once(pulse.duration, Task::PulseOff(pulse.stamp));
        }
    }

    pub fn now(&self) -> GameTime {
        self.scheduler.now()
    }

    // -----------------------------------------------------------------------
    // Search inputs
    // -----------------------------------------------------------------------

    /// Start polling a search input. Focusing another input replaces the
    /// current poll.
    pub fn focus_search(&mut self, target: SearchBox) {
        self.blur_search();
        let poll = self
            .scheduler
            .schedule_every(self.timing.search_poll_secs, Task::SearchPoll);
        let applied = match target {
            SearchBox::Skills => self.filter.search_text().to_string(),
            SearchBox::Heroes => self.filter.hero_search_text().to_string(),
        };
        self.search = Some(SearchFocus {
            target,
            poll,
            input: applied.clone(),
            applied,
        });
    }

    pub fn blur_search(&mut self) {
        if let Some(focus) = self.search.take() {
            self.scheduler.cancel(focus.poll);
        }
    }

    /// Report the focused input's current text. It takes effect on the next
    /// poll.
    pub fn set_search_input(&mut self, text: &str) {
        match &mut self.search {
            Some(focus) => focus.input = text.to_string(),
            None => debug!("Search text reported with no input focused"),
        }
    }

    fn poll_search(&mut self) {
        let Some(focus) = &mut self.search else {
            return;
        };
        if focus.input == focus.applied {
            return;
        }
        focus.applied = focus.input.clone();
        match focus.target {
            SearchBox::Skills => self.filter.set_search_text(&focus.applied),
            SearchBox::Heroes => self.filter.set_hero_search_text(&focus.applied),
        }
        self.refilter();
    }

    // -----------------------------------------------------------------------
    // Local filter state
    // -----------------------------------------------------------------------

    /// Change filter toggles, tabs or search, then re-run the filter pass.
    pub fn update_filter(&mut self, change: impl FnOnce(&mut FilterEngine)) {
        change(&mut self.filter);
        self.refilter();
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    fn recompute_gating(&mut self) {
        self.gating = Gating::derive(self.store.options(), self.store.roster().local_team());
    }

    fn recompute_ban_message(&mut self) {
        let options = self.store.options();
        let bans = self.store.bans();
        let budget = BanBudget {
            max_hero_bans: options.get_int(keys::MAX_HERO_BANS).unwrap_or(0),
            max_ability_bans: options.get_int(keys::MAX_ABILITY_BANS).unwrap_or(0),
            current_hero_bans: bans.current_hero_bans,
            current_ability_bans: bans.current_ability_bans,
        };
        self.ban_message = budget.message();
        debug!("Ban budget: {}", self.ban_message);
    }

    /// Full filter pass over every ability, the recommended builds, and the
    /// open hero preview.
    fn refilter(&mut self) {
        self.visible_abilities =
            self.filter
                .visible_abilities(&self.store, &self.gating, self.localizer.as_ref());
        self.builds = classify_builds(&self.filter, &self.store, &self.gating);
        if let Some(hero) = self.preview.as_ref().map(|p| p.hero.clone()) {
            self.preview = Some(self.build_preview(hero));
        }
        trace!("{} abilities visible", self.visible_abilities.len());
    }

    // -----------------------------------------------------------------------
    // Host actions
    // -----------------------------------------------------------------------

    fn send(&mut self, request: OutboundRequest) {
        if request.requires_host() && !self.store.roster().is_host() {
            debug!("Not sending {request:?}: local player is not host");
            return;
        }
        info!("Sending {request:?}");
        self.outbox.push_back(request);
    }

    /// Request `key = value`. Duplicates of the last sent or received value
    /// and requests from non-hosts are dropped.
    pub fn set_option(&mut self, key: &str, value: f64) {
        let is_host = self.store.roster().is_host();
        if let Some(request) = self.option_requests.request(key, value, is_host) {
            self.send(request);
        }
    }

    /// Pick a domain entry through the option's binding.
    pub fn choose_option(&mut self, name: &str, index: usize) {
        if !self.store.roster().is_host() {
            debug!("Ignoring option choice for `{name}`: not host");
            return;
        }
        match self.registry.choose(name, index) {
            Some(value) => self.set_option(name, value),
            None => warn!("No entry {index} for option `{name}`"),
        }
    }

    pub fn view_options_category(&mut self, category: &str) {
        self.send(OutboundRequest::OptionsMenuViewed {
            v: category.to_string(),
        });
    }

    pub fn lock_options(&mut self) {
        self.send(OutboundRequest::OptionsLocked);
    }

    pub fn registry(&self) -> &OptionsRegistry {
        &self.registry
    }

    pub fn viewed_options_tab(&self) -> Option<&str> {
        self.viewed_options_tab.as_deref()
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    fn local_loadout(&self) -> BTreeMap<SlotIndex, String> {
        self.store
            .roster()
            .local_player()
            .map(|id| self.store.loadout(id))
            .unwrap_or_default()
    }

    fn visible_slots(&self) -> Vec<SlotIndex> {
        (1..=MAX_SLOT_WIDGETS)
            .filter(|s| self.gating.slot_visible(*s))
            .collect()
    }

    pub fn choose_hero(&mut self, hero: &str) {
        self.selection.clear();
        self.send(OutboundRequest::ChooseHero {
            hero_name: hero.to_string(),
        });
    }

    pub fn ban_hero(&mut self, hero: &str) {
        self.send(OutboundRequest::ban_hero(hero));
    }

    pub fn ban_ability(&mut self, ability: &str) {
        self.selection.clear();
        if ability.is_empty() {
            return;
        }
        self.send(OutboundRequest::ban_ability(ability));
    }

    pub fn choose_attr(&mut self, attribute: Attribute) {
        self.send(OutboundRequest::ChooseAttr {
            new_attr: attribute,
        });
    }

    pub fn ready(&mut self) {
        self.send(OutboundRequest::Ready);
    }

    pub fn activate_ability(&mut self, ability: &str) {
        let loadout = self.local_loadout();
        if let Some(request) = self.selection.activate_ability(ability, &loadout) {
            self.send(request);
        }
    }

    /// Click on a loadout slot. Hidden or out-of-range slots are rejected.
    pub fn activate_slot(&mut self, slot: SlotIndex) {
        if !self.visible_slots().contains(&slot) {
            debug!("Rejected click on slot {slot}");
            self.feedback.push_back(Feedback::Rejected);
            return;
        }
        let loadout = self.local_loadout();
        if let Some(request) = self.selection.activate_slot(slot, &loadout) {
            self.send(request);
        }
    }

    pub fn drag_start(&mut self, payload: DragPayload) {
        self.selection.drag_start(payload);
    }

    pub fn drag_enter(&mut self, target: DropTarget) -> bool {
        self.selection.drag_enter(target)
    }

    pub fn drag_leave(&mut self, target: DropTarget) {
        if let Some(stamp) = self.selection.drag_leave(target) {
            self.scheduler
                .schedule_once(self.timing.drag_settle_secs, Task::DragSettle(stamp));
        }
    }

    pub fn drag_end(&mut self) {
        let loadout = self.local_loadout();
        if let Some(request) = self.selection.drag_end(&loadout) {
            self.send(request);
        }
    }

    /// Switch the builder panel tab; any pending selection is dropped.
    pub fn show_builder_tab(&mut self, tab: &str) {
        self.selection.clear();
        self.builder_tab = tab.to_string();
    }

    pub fn builder_tab(&self) -> &str {
        &self.builder_tab
    }

    /// Show a hero's abilities in the preview panel.
    pub fn preview_hero(&mut self, hero: &str, keep_selection: bool) {
        if !keep_selection {
            self.selection.clear();
        }
        self.preview = Some(self.build_preview(hero.to_string()));
    }

    fn build_preview(&self, hero: String) -> HeroPreview {
        let abilities = self
            .store
            .hero(&hero)
            .map(|record| {
                record
                    .abilities()
                    .into_values()
                    .filter(|ab| self.store.flags_of(ab).is_some())
                    .map(|ab| {
                        let info = self.filter.ability_status(&self.store, &self.gating, &ab);
                        (ab, info)
                    })
                    .collect()
            })
            .unwrap_or_default();
        HeroPreview { hero, abilities }
    }

    /// Browse to a past phase locally.
    pub fn select_phase(&mut self, phase: u8) {
        let cue = self.phase.select_phase_number(phase);
        self.feedback.push_back(cue);
    }

    // -----------------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------------

    pub fn drain_outbox(&mut self) -> Vec<OutboundRequest> {
        self.outbox.drain(..).collect()
    }

    pub fn drain_feedback(&mut self) -> Vec<Feedback> {
        self.feedback.drain(..).collect()
    }

    pub fn drain_notices(&mut self) -> Vec<ViewNotice> {
        self.store.drain_notices()
    }

    pub fn store(&self) -> &DraftStateStore {
        &self.store
    }

    /// Start pushing notices for a player's panel.
    pub fn materialize_view(&mut self, player_id: PlayerId) {
        self.store.materialize_view(player_id);
    }

    pub fn gating(&self) -> &Gating {
        &self.gating
    }

    pub fn phase(&self) -> &PhaseTimerController {
        &self.phase
    }

    pub fn timer(&self) -> Option<&TimerDisplay> {
        self.timer.as_ref()
    }

    pub fn ban_message(&self) -> BanMessage {
        self.ban_message
    }

    pub fn ban_text(&self) -> String {
        self.ban_message.to_string()
    }

    pub fn visible_abilities(&self) -> &[String] {
        &self.visible_abilities
    }

    pub fn ability_info(&self, ability: &str) -> AbilityFilterInfo {
        self.filter
            .ability_info(&self.store, &self.gating, self.localizer.as_ref(), ability)
    }

    pub fn hero_info(&self, hero: &str) -> HeroFilterInfo {
        self.filter
            .hero_listing_info(&self.store, self.localizer.as_ref(), hero)
    }

    pub fn hero_list(&self) -> &HeroList {
        &self.hero_list
    }

    pub fn builds(&self) -> &[ClassifiedBuild] {
        &self.builds
    }

    pub fn preview(&self) -> Option<&HeroPreview> {
        self.preview.as_ref()
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn slot_highlights(&self) -> Vec<(SlotIndex, SlotHighlight)> {
        let options = self.store.options();
        let limits = SlotLimits {
            max_skills: options.get_int(keys::MAX_SKILLS),
            max_ults: options.get_int(keys::MAX_ULTS),
        };
        self.selection.slot_highlights(
            &self.visible_slots(),
            &self.local_loadout(),
            limits,
            |ab| self.store.is_ultimate(ab),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodraft_core::protocol::{PlayerInfo, Team};
    use lodraft_core::sync::MemoryTables;
    use serde_json::json;

    fn engine(host: bool) -> DraftEngine {
        let mut engine = DraftEngine::new(TimingConfig::default(), 0.0);
        engine.set_roster(RosterInfo {
            local_player: 0,
            players: vec![
                PlayerInfo { player_id: 0, team: Team::Radiant, host },
                PlayerInfo { player_id: 1, team: Team::Dire, host: !host },
            ],
        });
        engine
    }

    fn up(table: Table, key: &str, value: serde_json::Value) -> TableUpdate {
        TableUpdate::new(table, key, value)
    }

    #[test]
    fn attach_replays_snapshot_then_pumps_updates() {
        let (mut channel, mut rx) = TableSyncChannel::new(MemoryTables::new());
        channel.publish(up(Table::Options, "lodOptionBanningMaxBans", json!({"v": 2})));
        let mut engine = engine(true);
        assert_eq!(engine.attach(&mut channel).unwrap(), 1);
        assert_eq!(engine.pump(&mut rx), 1);
        assert_eq!(engine.store().options().get(keys::MAX_ABILITY_BANS), Some(2.0));
    }

    #[test]
    fn attach_fails_when_tables_are_offline() {
        let (mut channel, _rx) = TableSyncChannel::new(MemoryTables::offline());
        let err = engine(true).attach(&mut channel).unwrap_err();
        assert!(matches!(err, SyncError::ChannelUnavailable { .. }));
    }

    #[test]
    fn option_set_is_sent_once_and_only_by_host() {
        let mut host = engine(true);
        host.set_option(keys::MAX_SLOTS, 5.0);
        host.set_option(keys::MAX_SLOTS, 5.0);
        assert_eq!(host.drain_outbox().len(), 1);

        let mut guest = engine(false);
        guest.set_option(keys::MAX_SLOTS, 5.0);
        guest.lock_options();
        assert!(guest.drain_outbox().is_empty());
    }

    #[test]
    fn authoritative_option_value_is_not_requested_again() {
        let mut host = engine(true);
        host.apply(&up(Table::Options, keys::MAX_SLOTS, json!({"v": 4})));
        host.set_option(keys::MAX_SLOTS, 4.0);
        assert!(host.drain_outbox().is_empty());
        assert_eq!(host.registry().selected_value(keys::MAX_SLOTS), Some(4.0));
    }

    #[test]
    fn ban_text_follows_limits_and_own_counts() {
        let mut e = engine(true);
        e.apply(&up(Table::Options, keys::MAX_HERO_BANS, json!({"v": 1})));
        e.apply(&up(Table::Options, keys::MAX_ABILITY_BANS, json!({"v": 3})));
        assert_eq!(e.ban_text(), "You can ban up to 1 hero and 3 abilities.");

        e.apply(&up(
            Table::Banned,
            "0",
            json!({"abilityName": "x", "playerID": 0, "currentHeroBans": 0, "currentAbilityBans": 3}),
        ));
        assert_eq!(e.ban_text(), "You can ban up to 1 hero.");
    }

    #[test]
    fn phase_push_and_local_browsing() {
        let mut e = engine(true);
        e.apply(&up(Table::PhasePregame, "phase", json!({"v": 4})));
        e.select_phase(5);
        e.select_phase(3);
        assert_eq!(e.drain_feedback(), vec![Feedback::Rejected, Feedback::Click]);
        assert_eq!(e.phase().selected(), Phase::Banning);

        e.apply(&up(Table::PhasePregame, "phase", json!({"v": 7})));
        assert_eq!(e.phase().selected(), Phase::Review);
    }

    #[test]
    fn display_tick_refreshes_timer_and_ends_pulse() {
        let mut e = engine(true);
        e.apply(&up(Table::PhasePregame, "phase", json!({"v": 3})));
        e.apply(&up(Table::PhasePregame, "endOfTimer", json!({"v": 65.0})));
        e.tick(0.1);
        let timer = e.timer().unwrap();
        assert_eq!(timer.text, "(1:05)");
        assert!(e.phase().warning_visible());

        e.tick(3.5);
        assert!(!e.phase().warning_visible());
    }

    #[test]
    fn search_applies_only_on_poll_while_focused() {
        let mut e = engine(true);
        e.focus_search(SearchBox::Skills);
        e.set_search_input("Blink");
        assert_eq!(e.filter().search_text(), "");
        e.tick(0.3);
        assert_eq!(e.filter().search_text(), "blink");

        e.blur_search();
        e.set_search_input("other");
        e.tick(1.0);
        assert_eq!(e.filter().search_text(), "blink");
    }

    #[test]
    fn hero_list_rebuild_is_debounced() {
        let mut e = engine(true);
        e.apply(&up(
            Table::Heroes,
            "npc_dota_hero_axe",
            json!({"AttributePrimary": "DOTA_ATTRIBUTE_STRENGTH"}),
        ));
        assert!(e.hero_list().is_empty());
        e.apply(&up(
            Table::Heroes,
            "npc_dota_hero_lina",
            json!({"AttributePrimary": "DOTA_ATTRIBUTE_INTELLECT"}),
        ));
        e.tick(0.5);
        assert_eq!(e.hero_list().len(), 2);
    }

    #[test]
    fn hidden_slot_click_is_rejected() {
        let mut e = engine(true);
        for (key, v) in [(keys::MAX_SLOTS, 4), (keys::MAX_SKILLS, 3), (keys::MAX_ULTS, 1)] {
            e.apply(&up(Table::Options, key, json!({"v": v})));
        }
        e.activate_slot(5);
        assert_eq!(e.drain_feedback(), vec![Feedback::Rejected]);
        e.activate_slot(4);
        assert!(e.drain_feedback().is_empty());
        assert_eq!(e.slot_highlights().len(), 4);
    }

    #[test]
    fn banning_pending_ability_clears_selection() {
        let mut e = engine(true);
        e.activate_ability("fireball");
        e.apply(&up(Table::Banned, "1", json!({"abilityName": "fireball", "playerID": 1})));
        assert!(e.selection().pending_ability().is_none());
    }

    #[test]
    fn drag_leave_settles_after_delay() {
        let mut e = engine(true);
        e.drag_start(DragPayload::Ability("blink".into()));
        assert!(e.drag_enter(DropTarget::Slot(1)));
        e.drag_leave(DropTarget::Slot(1));
        assert_eq!(e.selection().drag_target(), Some(DropTarget::Slot(1)));
        e.tick(0.2);
        assert_eq!(e.selection().drag_target(), None);
        e.drag_end();
        assert!(e.drain_outbox().is_empty());
    }

    #[test]
    fn preview_lists_flagged_abilities() {
        let mut e = engine(true);
        e.apply(&up(
            Table::Heroes,
            "npc_dota_hero_lina",
            json!({"Ability1": "lina_dragon_slave", "Ability2": "lina_light_strike_array"}),
        ));
        e.apply(&up(Table::Flags, "lina_dragon_slave", json!({"category": "main"})));
        e.activate_ability("lina_dragon_slave");
        e.preview_hero("npc_dota_hero_lina", false);

        let preview = e.preview().unwrap();
        assert_eq!(preview.abilities.len(), 1);
        assert!(e.selection().pending_ability().is_none());
    }
}
