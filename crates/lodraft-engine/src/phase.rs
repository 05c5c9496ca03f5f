// Phase tracking, locally browsable review phase, and countdown display.

use std::fmt;

use lodraft_core::schedule::{GameTime, Generation};
use tracing::{debug, warn};

/// Match phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Loading = 1,
    OptionSelection = 2,
    Banning = 3,
    Selection = 4,
    Drafting = 5,
    RandomSelection = 6,
    Review = 7,
    InGame = 8,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::Loading,
        Phase::OptionSelection,
        Phase::Banning,
        Phase::Selection,
        Phase::Drafting,
        Phase::RandomSelection,
        Phase::Review,
        Phase::InGame,
    ];

    pub fn from_u8(n: u8) -> Option<Self> {
        Phase::ALL.iter().copied().find(|p| p.as_u8() == n)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Phases that show a countdown.
    pub fn has_countdown(self) -> bool {
        matches!(
            self,
            Phase::OptionSelection
                | Phase::Banning
                | Phase::Selection
                | Phase::RandomSelection
                | Phase::Review
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Loading => "loading",
            Phase::OptionSelection => "option_selection",
            Phase::Banning => "banning",
            Phase::Selection => "selection",
            Phase::Drafting => "drafting",
            Phase::RandomSelection => "random_selection",
            Phase::Review => "review",
            Phase::InGame => "in_game",
        };
        f.write_str(name)
    }
}

/// Audible cue for a local action; the only signal a rejected action gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Click,
    Rejected,
}

/// `M:SS` with whole minutes; negative times show as `0:00`.
pub fn format_time(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One refresh of the countdown.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerDisplay {
    pub time_left: i64,
    /// Text in the phase header, e.g. `(1:05)`.
    pub text: String,
    /// Warning label text; empty while frozen.
    pub warning: String,
    /// A warning pulse starting now: how long it lasts and the stamp that
    /// ends it.
    pub pulse: Option<Pulse>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub duration: GameTime,
    pub stamp: u64,
}

#[derive(Debug, Clone)]
pub struct PhaseTimerController {
    authoritative: Phase,
    selected: Phase,
    end_of_timer: Option<GameTime>,
    freeze: Option<i64>,
    /// Time left at which the next pulse is due; `None` forces one.
    last_shown: Option<i64>,
    pulse_secs: f64,
    pulse_interval_secs: i64,
    pulse_generation: Generation,
    warning_visible: bool,
}

impl PhaseTimerController {
    pub fn new(pulse_secs: f64, pulse_interval_secs: f64) -> Self {
        PhaseTimerController {
            authoritative: Phase::Loading,
            selected: Phase::Loading,
            end_of_timer: None,
            freeze: None,
            last_shown: None,
            pulse_secs,
            pulse_interval_secs: (pulse_interval_secs.round() as i64).max(1),
            pulse_generation: Generation::new(),
            warning_visible: false,
        }
    }

    pub fn authoritative(&self) -> Phase {
        self.authoritative
    }

    pub fn selected(&self) -> Phase {
        self.selected
    }

    pub fn freeze(&self) -> Option<i64> {
        self.freeze
    }

    pub fn warning_visible(&self) -> bool {
        self.warning_visible
    }

    /// Authoritative phase push. The selected phase always follows it.
    pub fn set_authoritative(&mut self, phase: Phase) {
        debug!("Phase {} -> {phase}", self.authoritative);
        self.authoritative = phase;
        self.selected = phase;
    }

    /// Browse to `phase` locally. Phases past the authoritative one are
    /// rejected without a state change.
    pub fn select_phase(&mut self, phase: Phase) -> Feedback {
        if phase > self.authoritative {
            debug!(
                "Rejected browsing to {phase}: match is only at {}",
                self.authoritative
            );
            return Feedback::Rejected;
        }
        self.selected = phase;
        Feedback::Click
    }

    /// Raw phase number variant of [`select_phase`](Self::select_phase).
    pub fn select_phase_number(&mut self, n: u8) -> Feedback {
        match Phase::from_u8(n) {
            Some(phase) => self.select_phase(phase),
            None => {
                warn!("Unknown phase number {n}");
                Feedback::Rejected
            }
        }
    }

    pub fn set_end_of_timer(&mut self, end: GameTime) {
        self.end_of_timer = Some(end);
    }

    pub fn set_freeze(&mut self, freeze: Option<i64>) {
        self.freeze = freeze;
    }

    pub fn time_left(&self, now: GameTime) -> i64 {
        if let Some(frozen) = self.freeze {
            return frozen;
        }
        match self.end_of_timer {
            Some(end) => (end - now).ceil() as i64,
            None => 0,
        }
    }

    /// Refresh the countdown; `None` outside countdown phases.
    pub fn refresh(&mut self, now: GameTime) -> Option<TimerDisplay> {
        if !self.authoritative.has_countdown() {
            return None;
        }
        let time_left = self.time_left(now);
        let text = format!("({})", format_time(time_left));

        if self.freeze.is_some() {
            self.last_shown = None;
            return Some(TimerDisplay {
                time_left,
                text,
                warning: String::new(),
                pulse: None,
            });
        }

        let due = self.last_shown.map_or(true, |last| time_left < last);
        let pulse = if due { self.start_pulse(time_left) } else { None };

        Some(TimerDisplay {
            time_left,
            text,
            warning: format_time(time_left),
            pulse,
        })
    }

    fn start_pulse(&mut self, time_left: i64) -> Option<Pulse> {
        let interval = self.pulse_interval_secs;
        let duration = if time_left <= interval {
            self.last_shown = Some(0);
            time_left as f64
        } else {
            self.last_shown = Some((time_left - 1).div_euclid(interval) * interval + 1);
            self.pulse_secs
        };
        if duration <= 0.0 {
            return None;
        }
        self.warning_visible = true;
        Some(Pulse {
            duration,
            stamp: self.pulse_generation.bump(),
        })
    }

    /// End the pulse started with `stamp`, unless a later one replaced it.
    pub fn end_pulse(&mut self, stamp: u64) -> bool {
        if !self.pulse_generation.is_current(stamp) {
            return false;
        }
        self.warning_visible = false;
        true
    }
}
