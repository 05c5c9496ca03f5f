// Who is in the match: teams, host privilege, and draft groups.

use std::collections::BTreeMap;

use lodraft_core::protocol::{PlayerId, PlayerInfo, RosterInfo, Team, DRAFT_GROUP_SIZE};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    local_player: Option<PlayerId>,
    players: BTreeMap<PlayerId, PlayerInfo>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster wholesale.
    pub fn update(&mut self, info: RosterInfo) {
        self.local_player = Some(info.local_player);
        self.players = info
            .players
            .into_iter()
            .map(|p| (p.player_id, p))
            .collect();
    }

    pub fn local_player(&self) -> Option<PlayerId> {
        self.local_player
    }

    pub fn is_local(&self, player_id: PlayerId) -> bool {
        self.local_player == Some(player_id)
    }

    pub fn team_of(&self, player_id: PlayerId) -> Option<Team> {
        self.players.get(&player_id).map(|p| p.team)
    }

    pub fn local_team(&self) -> Option<Team> {
        self.local_player.and_then(|id| self.team_of(id))
    }

    /// Host privilege of the local player; false until the roster arrives.
    pub fn is_host(&self) -> bool {
        self.local_player
            .and_then(|id| self.players.get(&id))
            .is_some_and(|p| p.host)
    }

    /// Whether `player_id` plays on the local player's team. Unknown teams
    /// never match.
    pub fn is_teammate(&self, player_id: PlayerId) -> bool {
        match (self.local_team(), self.team_of(player_id)) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }

    /// Index of the local player's draft group: the number of teammates
    /// with a lower player id, modulo the group size.
    pub fn draft_group(&self) -> Option<usize> {
        let local = self.local_player?;
        let team = self.team_of(local)?;
        let ahead = self
            .players
            .values()
            .filter(|p| p.player_id < local && p.team == team)
            .count();
        Some(ahead % DRAFT_GROUP_SIZE)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.players.values()
    }
}
