// Ban budget: remaining hero and ability bans for the local player.

use std::fmt;

/// Ban maxima (from options) and the local player's authoritative counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BanBudget {
    pub max_hero_bans: i64,
    pub max_ability_bans: i64,
    pub current_hero_bans: i64,
    pub current_ability_bans: i64,
}

impl BanBudget {
    /// Remaining hero bans; never negative.
    pub fn hero_bans_left(&self) -> i64 {
        (self.max_hero_bans - self.current_hero_bans).max(0)
    }

    pub fn ability_bans_left(&self) -> i64 {
        (self.max_ability_bans - self.current_ability_bans).max(0)
    }

    pub fn message(&self) -> BanMessage {
        match (self.hero_bans_left(), self.ability_bans_left()) {
            (0, 0) => BanMessage::NoMoreBans,
            (heroes, 0) => BanMessage::HeroesOnly(heroes),
            (0, abilities) => BanMessage::AbilitiesOnly(abilities),
            (heroes, abilities) => BanMessage::Both { heroes, abilities },
        }
    }
}

/// The ban-limit line shown during the banning phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanMessage {
    Both { heroes: i64, abilities: i64 },
    HeroesOnly(i64),
    AbilitiesOnly(i64),
    NoMoreBans,
}

fn hero_clause(n: i64) -> String {
    if n == 1 {
        "1 hero".to_string()
    } else {
        format!("{n} heroes")
    }
}

fn ability_clause(n: i64) -> String {
    if n == 1 {
        "1 ability".to_string()
    } else {
        format!("{n} abilities")
    }
}

impl fmt::Display for BanMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BanMessage::Both { heroes, abilities } => write!(
                f,
                "You can ban up to {} and {}.",
                hero_clause(*heroes),
                ability_clause(*abilities)
            ),
            BanMessage::HeroesOnly(n) => write!(f, "You can ban up to {}.", hero_clause(*n)),
            BanMessage::AbilitiesOnly(n) => {
                write!(f, "You can ban up to {}.", ability_clause(*n))
            }
            BanMessage::NoMoreBans => f.write_str("No more bans."),
        }
    }
}
