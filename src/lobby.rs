// Host session: roster, current teams, team history, match log and single-level undo.
//
// Every operation validates its input before mutating anything, so a failed call leaves the
// lobby exactly as it was.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use enum_map::EnumMap;
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::history::HistoryTracker;
use crate::partition::{Partition, PartitionError};
use crate::player::{Player, PlayerId, Team};
use crate::rating::{MatchResult, PlayerSnapshot, RatingDeltas, RatingError, apply_result};
use crate::role::{RoleCoverage, assign_roles};
use crate::rules::{BalanceConfig, BalanceMode, MixStrength, Rules};
use crate::search::{BuildError, CancelFlag, build_teams_cancellable, verify_roster};
use crate::util::{ids_to_string, mean, round_half_up};


pub const MATCH_LOG_CAPACITY: usize = 100;
// A build keeping at least this share of players on their previous sides is rebuilt once.
const NEAR_DUPLICATE_SHARE: f64 = 0.85;
const RETRY_TOLERANCE_FACTOR: f64 = 1.5;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LobbyError {
    Build(BuildError),
    Rating(RatingError),
    UnknownPlayer(PlayerId),
    DuplicatePlayer(PlayerId),
    UnevenTeams,
    NoTeams,
    PlayersOnSameTeam,
    NothingToUndo,
}

impl From<BuildError> for LobbyError {
    fn from(err: BuildError) -> Self { LobbyError::Build(err) }
}

impl From<RatingError> for LobbyError {
    fn from(err: RatingError) -> Self { LobbyError::Rating(err) }
}

impl From<PartitionError> for LobbyError {
    fn from(err: PartitionError) -> Self {
        match err {
            PartitionError::SizeMismatch => LobbyError::UnevenTeams,
            PartitionError::DuplicatePlayer(id) => LobbyError::DuplicatePlayer(id),
        }
    }
}

impl fmt::Display for LobbyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LobbyError::Build(err) => write!(f, "cannot build teams: {err}"),
            LobbyError::Rating(err) => write!(f, "cannot apply result: {err}"),
            LobbyError::UnknownPlayer(id) => write!(f, "unknown player {id}"),
            LobbyError::DuplicatePlayer(id) => write!(f, "player {id} already exists"),
            LobbyError::UnevenTeams => write!(f, "teams must be of equal size"),
            LobbyError::NoTeams => write!(f, "teams have not been built"),
            LobbyError::PlayersOnSameTeam => write!(f, "players are on the same team"),
            LobbyError::NothingToUndo => write!(f, "nothing to undo"),
        }
    }
}

impl std::error::Error for LobbyError {}


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MatchRecord {
    pub teams: Partition,
    pub result: MatchResult,
    pub deltas: RatingDeltas,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TeamSummary {
    pub num_players: usize,
    pub average_rating: f64,
    // Mean of member win rates, rounded.
    pub win_rate: u32,
    pub coverage: RoleCoverage,
}

// Everything a build needs, detached from the lobby so that it can run on another thread.
#[derive(Clone, Debug)]
pub struct BuildRequest {
    pub players: Vec<Player>,
    pub config: BalanceConfig,
    pub history: HistoryTracker,
}

impl BuildRequest {
    pub fn run(
        &self, rng: &mut impl Rng, cancel: &CancelFlag,
    ) -> Result<Partition, BuildError> {
        let partition =
            build_teams_cancellable(&self.players, &self.config, &self.history, rng, cancel)?;
        if self.config.mode == BalanceMode::PreferLine || !self.is_near_duplicate(&partition) {
            return Ok(partition);
        }
        let retry = BalanceConfig {
            tolerance: (self.config.tolerance as f64 * RETRY_TOLERANCE_FACTOR).floor() as u32,
            strength: MixStrength::Strong,
            ..self.config
        };
        info!(
            "Teams too similar to the previous ones, rebuilding with tolerance {} and {} mixing",
            retry.tolerance, retry.strength
        );
        build_teams_cancellable(&self.players, &retry, &self.history, rng, cancel)
    }

    fn is_near_duplicate(&self, partition: &Partition) -> bool {
        let last = self.history.last_partition();
        if last.is_empty() {
            return false;
        }
        let same = partition.same_side_overlap(last);
        same as f64 >= partition.num_players() as f64 * NEAR_DUPLICATE_SHARE
    }
}


#[derive(Clone, Debug, Default)]
pub struct Lobby {
    rules: Rules,
    roster: Vec<Player>,
    teams: Partition,
    history: HistoryTracker,
    undo: Option<Vec<PlayerSnapshot>>,
    match_log: VecDeque<MatchRecord>,
}

impl Lobby {
    pub fn new(rules: Rules) -> Self { Lobby { rules, ..Lobby::default() } }

    pub fn rules(&self) -> &Rules { &self.rules }
    pub fn set_rules(&mut self, rules: Rules) { self.rules = rules; }
    pub fn roster(&self) -> &[Player] { &self.roster }
    pub fn teams(&self) -> &Partition { &self.teams }
    pub fn history(&self) -> &HistoryTracker { &self.history }
    pub fn match_log(&self) -> impl Iterator<Item = &MatchRecord> { self.match_log.iter() }
    pub fn can_undo(&self) -> bool { self.undo.is_some() }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> { self.roster.iter().find(|p| &p.id == id) }

    fn position(&self, id: &PlayerId) -> Result<usize, LobbyError> {
        self.roster
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| LobbyError::UnknownPlayer(id.clone()))
    }

    fn reset_deltas(&mut self) {
        for p in self.roster.iter_mut() {
            p.last_delta = 0;
        }
    }

    pub fn add_player(&mut self, player: Player) -> Result<(), LobbyError> {
        if self.player(&player.id).is_some() {
            return Err(LobbyError::DuplicatePlayer(player.id));
        }
        info!("Player {} joined with rating {}", player.id, player.rating);
        self.roster.push(player.normalized());
        self.reset_deltas();
        Ok(())
    }

    // Removing a player who is on the current teams dissolves the teams. A pending undo is dropped
    // only if the player took part in the undoable match, since it could not be applied in full.
    pub fn remove_player(&mut self, id: &PlayerId) -> Result<Player, LobbyError> {
        let idx = self.position(id)?;
        let player = self.roster.remove(idx);
        if self.teams.team_of(id).is_some() {
            info!("Player {} left, teams dissolved", id);
            self.teams = Partition::default();
        } else {
            info!("Player {} left", id);
        }
        if self.undo.as_ref().is_some_and(|snapshot| snapshot.iter().any(|s| &s.id == id)) {
            self.undo = None;
        }
        self.reset_deltas();
        Ok(player)
    }

    // Snapshots the selected players for a build. Fails if the selection is not a valid roster.
    pub fn build_request(&self, ids: &[PlayerId]) -> Result<BuildRequest, LobbyError> {
        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(id) {
                return Err(LobbyError::DuplicatePlayer(id.clone()));
            }
            players.push(self.roster[self.position(id)?].clone());
        }
        verify_roster(&players)?;
        Ok(BuildRequest {
            players,
            config: self.rules.balance,
            history: self.history.clone(),
        })
    }

    pub fn accept_build(&mut self, partition: Partition) -> Result<(), LobbyError> {
        partition.verify()?;
        if partition.is_empty() {
            return Err(BuildError::NotEnoughPlayers.into());
        }
        for id in partition.ids() {
            self.position(id)?;
        }
        info!(
            "Teams built: [{}] vs [{}]",
            ids_to_string(&partition.team1),
            ids_to_string(&partition.team2)
        );
        self.history.record(partition.clone());
        self.teams = partition;
        self.reset_deltas();
        Ok(())
    }

    pub fn build_teams(
        &mut self, ids: &[PlayerId], rng: &mut impl Rng,
    ) -> Result<&Partition, LobbyError> {
        let request = self.build_request(ids)?;
        let partition = request.run(rng, &CancelFlag::new())?;
        self.accept_build(partition)?;
        Ok(&self.teams)
    }

    pub fn rebuild_teams(&mut self, rng: &mut impl Rng) -> Result<&Partition, LobbyError> {
        if self.teams.is_empty() {
            return Err(LobbyError::NoTeams);
        }
        let ids: Vec<PlayerId> = self.teams.ids().cloned().collect();
        self.build_teams(&ids, rng)
    }

    pub fn clear_teams(&mut self) {
        self.teams = Partition::default();
        self.history.clear();
        self.reset_deltas();
        info!("Teams and team history cleared");
    }

    pub fn swap_players(&mut self, a: &PlayerId, b: &PlayerId) -> Result<(), LobbyError> {
        if self.teams.is_empty() {
            return Err(LobbyError::NoTeams);
        }
        for id in [a, b] {
            if self.teams.team_of(id).is_none() {
                return Err(LobbyError::UnknownPlayer(id.clone()));
            }
        }
        if !self.teams.swap_across(a, b) {
            return Err(LobbyError::PlayersOnSameTeam);
        }
        info!("Swapped {} and {}", a, b);
        Ok(())
    }

    pub fn report_winner(&mut self, winner: Team) -> Result<RatingDeltas, LobbyError> {
        if self.teams.is_empty() {
            return Err(LobbyError::NoTeams);
        }
        let snapshot = self
            .teams
            .ids()
            .map(|id| Ok(PlayerSnapshot::of(&self.roster[self.position(id)?])))
            .collect::<Result<Vec<_>, LobbyError>>()?;
        let result = MatchResult::new(winner, &self.rules.scoring);
        let deltas = apply_result(
            &mut self.roster,
            &self.teams.team1,
            &self.teams.team2,
            &result,
            &self.rules.scoring,
        )?;
        for p in self.roster.iter_mut() {
            if !deltas.contains_key(&p.id) {
                p.last_delta = 0;
            }
        }
        let team_delta: EnumMap<Team, i32> = EnumMap::from_fn(|team| {
            let members = self.teams.team(team);
            round_half_up(mean(members.iter().map(|id| deltas[id] as f64))) as i32
        });
        info!(
            "{} won ({} scoring): {:+} / {:+}",
            winner,
            result.scoring_mode,
            team_delta[Team::One],
            team_delta[Team::Two]
        );
        self.match_log.push_back(MatchRecord {
            teams: self.teams.clone(),
            result,
            deltas: deltas.clone(),
        });
        if self.match_log.len() > MATCH_LOG_CAPACITY {
            self.match_log.pop_front();
        }
        self.undo = Some(snapshot);
        Ok(deltas)
    }

    pub fn undo_last_result(&mut self) -> Result<(), LobbyError> {
        let snapshot = self.undo.take().ok_or(LobbyError::NothingToUndo)?;
        for saved in &snapshot {
            if let Some(player) = self.roster.iter_mut().find(|p| p.id == saved.id) {
                saved.restore(player);
            }
        }
        self.match_log.pop_back();
        info!("Last result undone for {} players", snapshot.len());
        Ok(())
    }

    pub fn team_summary(&self, team: Team) -> Result<TeamSummary, LobbyError> {
        if self.teams.is_empty() {
            return Err(LobbyError::NoTeams);
        }
        let members = self
            .teams
            .team(team)
            .iter()
            .map(|id| self.position(id).map(|idx| &self.roster[idx]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TeamSummary {
            num_players: members.len(),
            average_rating: mean(members.iter().map(|p| p.rating as f64)),
            win_rate: round_half_up(mean(members.iter().map(|p| p.win_rate() as f64))) as u32,
            coverage: assign_roles(members.iter().copied()),
        })
    }
}
