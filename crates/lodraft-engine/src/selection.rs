// Pending ability/slot selection, drag gestures, and the requests they turn
// into. Nothing here touches the loadout: it only changes when the server
// echoes the request back.

use std::collections::BTreeMap;

use lodraft_core::protocol::{OutboundRequest, SlotIndex};
use lodraft_core::schedule::Generation;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Idle,
    SkillPending(String),
    SlotPending(SlotIndex),
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    Ability(String),
    Hero(String),
    Slot(SlotIndex),
}

/// Where a drag can land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Slot(SlotIndex),
    BanArea,
    HeroArea,
}

impl DragPayload {
    fn accepts(&self, target: DropTarget) -> bool {
        matches!(
            (self, target),
            (DragPayload::Ability(_), DropTarget::Slot(_))
                | (DragPayload::Ability(_), DropTarget::BanArea)
                | (DragPayload::Slot(_), DropTarget::Slot(_))
                | (DragPayload::Hero(_), DropTarget::BanArea)
                | (DragPayload::Hero(_), DropTarget::HeroArea)
        )
    }
}

/// Highlight state of one loadout slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotHighlight {
    None,
    Selected,
    DropTarget,
}

/// How many regular and ultimate abilities a loadout may hold. `None` until
/// the option arrives, in which case only replacements are offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotLimits {
    pub max_skills: Option<i64>,
    pub max_ults: Option<i64>,
}

#[derive(Debug, Clone, Default)]
struct Drag {
    payload: Option<DragPayload>,
    target: Option<DropTarget>,
    generation: Generation,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
    drag: Drag,
}

/// `chooseAbility` unless the slot already holds the ability or the id is
/// empty.
fn choose_ability(
    slot: SlotIndex,
    ability: &str,
    loadout: &BTreeMap<SlotIndex, String>,
) -> Option<OutboundRequest> {
    if ability.is_empty() {
        return None;
    }
    if loadout.get(&slot).is_some_and(|held| held == ability) {
        trace!("Slot {slot} already holds {ability}");
        return None;
    }
    Some(OutboundRequest::ChooseAbility {
        slot,
        ability_name: ability.to_string(),
    })
}

fn swap(a: SlotIndex, b: SlotIndex) -> Option<OutboundRequest> {
    (a != b).then(|| OutboundRequest::swap_slots(a, b))
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn pending_ability(&self) -> Option<&str> {
        match &self.state {
            SelectionState::SkillPending(ab) => Some(ab),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        if self.state != SelectionState::Idle {
            trace!("Clearing pending selection {:?}", self.state);
        }
        self.state = SelectionState::Idle;
    }

    /// Click on an ability in the list or preview.
    pub fn activate_ability(
        &mut self,
        ability: &str,
        loadout: &BTreeMap<SlotIndex, String>,
    ) -> Option<OutboundRequest> {
        if ability.is_empty() {
            self.clear();
            return None;
        }
        match std::mem::take(&mut self.state) {
            SelectionState::SkillPending(current) if current == ability => None,
            SelectionState::SlotPending(slot) => choose_ability(slot, ability, loadout),
            _ => {
                self.state = SelectionState::SkillPending(ability.to_string());
                None
            }
        }
    }

    /// Click on one of the local player's slots.
    pub fn activate_slot(
        &mut self,
        slot: SlotIndex,
        loadout: &BTreeMap<SlotIndex, String>,
    ) -> Option<OutboundRequest> {
        match std::mem::take(&mut self.state) {
            SelectionState::Idle => {
                self.state = SelectionState::SlotPending(slot);
                None
            }
            SelectionState::SkillPending(ability) => choose_ability(slot, &ability, loadout),
            SelectionState::SlotPending(pending) => swap(pending, slot),
        }
    }

    // -----------------------------------------------------------------------
    // Drag gestures
    // -----------------------------------------------------------------------

    pub fn drag_start(&mut self, payload: DragPayload) {
        debug!("Drag started with {payload:?}");
        self.drag.payload = Some(payload);
        self.drag.target = None;
        self.drag.generation.bump();
    }

    /// Returns whether the target accepts the current payload.
    pub fn drag_enter(&mut self, target: DropTarget) -> bool {
        let accepted = self
            .drag
            .payload
            .as_ref()
            .is_some_and(|p| p.accepts(target));
        if accepted {
            self.drag.target = Some(target);
            self.drag.generation.bump();
        }
        accepted
    }

    /// Leaving a target does not clear it right away; the caller schedules
    /// [`settle_drag`](Self::settle_drag) with the returned stamp.
    pub fn drag_leave(&mut self, target: DropTarget) -> Option<u64> {
        if self.drag.target != Some(target) {
            return None;
        }
        Some(self.drag.generation.bump())
    }

    /// Deferred half of a leave. Acts only if nothing entered or left since.
    pub fn settle_drag(&mut self, stamp: u64) -> bool {
        if !self.drag.generation.is_current(stamp) {
            return false;
        }
        self.drag.target = None;
        true
    }

    pub fn drag_target(&self) -> Option<DropTarget> {
        self.drag.target
    }

    /// Resolve the gesture against the current target. Every drag end clears
    /// the pending selection.
    pub fn drag_end(&mut self, loadout: &BTreeMap<SlotIndex, String>) -> Option<OutboundRequest> {
        let payload = self.drag.payload.take();
        let target = self.drag.target.take();
        self.drag.generation.bump();
        self.clear();

        let request = match (payload?, target?) {
            (DragPayload::Ability(ab), DropTarget::Slot(slot)) => choose_ability(slot, &ab, loadout),
            (DragPayload::Slot(from), DropTarget::Slot(to)) => swap(from, to),
            (DragPayload::Ability(ab), DropTarget::BanArea) if !ab.is_empty() => {
                Some(OutboundRequest::ban_ability(ab))
            }
            (DragPayload::Hero(hero), DropTarget::BanArea) => Some(OutboundRequest::ban_hero(hero)),
            (DragPayload::Hero(hero), DropTarget::HeroArea) => {
                Some(OutboundRequest::ChooseHero { hero_name: hero })
            }
            _ => None,
        };
        debug!("Drag resolved to {request:?}");
        request
    }

    // -----------------------------------------------------------------------
    // Highlighting
    // -----------------------------------------------------------------------

    /// Highlight of every visible slot for the current selection.
    pub fn slot_highlights(
        &self,
        visible: &[SlotIndex],
        loadout: &BTreeMap<SlotIndex, String>,
        limits: SlotLimits,
        is_ultimate: impl Fn(&str) -> bool,
    ) -> Vec<(SlotIndex, SlotHighlight)> {
        match &self.state {
            SelectionState::Idle => visible.iter().map(|&s| (s, SlotHighlight::None)).collect(),
            SelectionState::SlotPending(pending) => visible
                .iter()
                .map(|&s| {
                    let h = if s == *pending {
                        SlotHighlight::Selected
                    } else {
                        SlotHighlight::DropTarget
                    };
                    (s, h)
                })
                .collect(),
            SelectionState::SkillPending(ability) => {
                let ult = is_ultimate(ability);
                let same_kind = loadout.values().filter(|ab| is_ultimate(ab) == ult).count();
                let limit = if ult { limits.max_ults } else { limits.max_skills };
                let room = limit.is_some_and(|max| (same_kind as i64) < max);
                let already_has = loadout.values().any(|ab| ab == ability);

                visible
                    .iter()
                    .map(|&s| {
                        let held = loadout.get(&s);
                        let target = if already_has {
                            held.is_some_and(|ab| ab == ability)
                        } else {
                            room || held.is_some_and(|ab| is_ultimate(ab) == ult)
                        };
                        let h = if target {
                            SlotHighlight::DropTarget
                        } else {
                            SlotHighlight::None
                        };
                        (s, h)
                    })
                    .collect()
            }
        }
    }
}
