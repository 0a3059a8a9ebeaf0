// Rating updates after a finished match: Elo or fixed bonus, amplified for placement games.

use std::collections::{HashMap, HashSet};
use std::fmt;

use enum_map::{EnumMap, enum_map};
use log::debug;
use serde::{Deserialize, Serialize};
use skillratings::elo::{self, EloRating};

use crate::player::{MAX_RATING, MIN_RATING, Player, PlayerId, Team, clamp_rating};
use crate::rules::{ScoringMode, ScoringRules};
use crate::util::round_half_up;


// A larger change would be clamped away by the rating bounds anyway.
const MAX_DELTA: i64 = (MAX_RATING - MIN_RATING) as i64;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: Team,
    pub scoring_mode: ScoringMode,
    pub elo_k: u32,
    pub fixed_bonus: u32,
}

impl MatchResult {
    pub fn new(winner: Team, scoring: &ScoringRules) -> Self {
        MatchResult {
            winner,
            scoring_mode: scoring.mode,
            elo_k: scoring.elo_k,
            fixed_bonus: scoring.fixed_bonus,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RatingError {
    EmptyTeam,
    TeamSizeMismatch,
    UnknownPlayer(PlayerId),
    PlayerOnBothTeams(PlayerId),
    DuplicatePlayer(PlayerId),
}

impl fmt::Display for RatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingError::EmptyTeam => write!(f, "both teams must have players"),
            RatingError::TeamSizeMismatch => write!(f, "teams must be of equal size"),
            RatingError::UnknownPlayer(id) => write!(f, "player {id} is not in the roster"),
            RatingError::PlayerOnBothTeams(id) => write!(f, "player {id} is on both teams"),
            RatingError::DuplicatePlayer(id) => write!(f, "player {id} is listed twice"),
        }
    }
}

impl std::error::Error for RatingError {}

pub type RatingDeltas = HashMap<PlayerId, i32>;

// Player fields touched by `apply_result`. Enough to undo a match.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub rating: i32,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub last_delta: i32,
}

impl PlayerSnapshot {
    pub fn of(player: &Player) -> Self {
        PlayerSnapshot {
            id: player.id.clone(),
            rating: player.rating,
            games_played: player.games_played,
            wins: player.wins,
            losses: player.losses,
            last_delta: player.last_delta,
        }
    }

    pub fn restore(&self, player: &mut Player) {
        debug_assert_eq!(player.id, self.id);
        player.rating = self.rating;
        player.games_played = self.games_played;
        player.wins = self.wins;
        player.losses = self.losses;
        player.last_delta = self.last_delta;
    }
}

// Resolves both teams to roster indices, rejecting anything that would leave a partial update.
fn resolve_teams(
    roster: &[Player], team1: &[PlayerId], team2: &[PlayerId],
) -> Result<EnumMap<Team, Vec<usize>>, RatingError> {
    if team1.is_empty() || team2.is_empty() {
        return Err(RatingError::EmptyTeam);
    }
    if team1.len() != team2.len() {
        return Err(RatingError::TeamSizeMismatch);
    }
    let positions: HashMap<&PlayerId, usize> =
        roster.iter().enumerate().map(|(idx, p)| (&p.id, idx)).collect();
    let mut seen: HashSet<&PlayerId> = HashSet::new();
    let mut teams: EnumMap<Team, Vec<usize>> = EnumMap::default();
    for (team, ids) in [(Team::One, team1), (Team::Two, team2)] {
        for id in ids {
            if !seen.insert(id) {
                return Err(if team1.contains(id) && team2.contains(id) {
                    RatingError::PlayerOnBothTeams(id.clone())
                } else {
                    RatingError::DuplicatePlayer(id.clone())
                });
            }
            let idx = positions.get(id).ok_or_else(|| RatingError::UnknownPlayer(id.clone()))?;
            teams[team].push(*idx);
        }
    }
    Ok(teams)
}

// Rating change for every member of a team before placement amplification.
fn base_deltas(
    roster: &[Player], teams: &EnumMap<Team, Vec<usize>>, result: &MatchResult,
) -> EnumMap<Team, f64> {
    let actual = |team: Team| if team == result.winner { 1.0 } else { 0.0 };
    match result.scoring_mode {
        ScoringMode::Elo => {
            let average = |team: Team| {
                let members = &teams[team];
                members.iter().map(|&i| roster[i].rating as f64).sum::<f64>() / members.len() as f64
            };
            let (expected1, expected2) = elo::expected_score(
                &EloRating { rating: average(Team::One) },
                &EloRating { rating: average(Team::Two) },
            );
            let k = result.elo_k as f64;
            enum_map! {
                Team::One => k * (actual(Team::One) - expected1),
                Team::Two => k * (actual(Team::Two) - expected2),
            }
        }
        ScoringMode::Fixed => {
            let bonus = result.fixed_bonus as f64;
            EnumMap::from_fn(|team| if team == result.winner { bonus } else { -bonus })
        }
    }
}

pub fn apply_result(
    roster: &mut [Player], team1: &[PlayerId], team2: &[PlayerId], result: &MatchResult,
    scoring: &ScoringRules,
) -> Result<RatingDeltas, RatingError> {
    let teams = resolve_teams(roster, team1, team2)?;
    let base = base_deltas(roster, &teams, result);
    debug!(
        "Applying {} result, {} won: base deltas {:.2} / {:.2}",
        result.scoring_mode,
        result.winner,
        base[Team::One],
        base[Team::Two]
    );
    let mut deltas = RatingDeltas::new();
    for (team, members) in &teams {
        let won = team == result.winner;
        for &idx in members {
            let player = &mut roster[idx];
            let multiplier = if player.is_placement(scoring.placement_games) {
                scoring.placement_multiplier as f64
            } else {
                1.0
            };
            let delta = round_half_up(base[team] * multiplier).clamp(-MAX_DELTA, MAX_DELTA) as i32;
            player.rating = clamp_rating(player.rating.saturating_add(delta));
            player.games_played += 1;
            if won {
                player.wins += 1;
            } else {
                player.losses += 1;
            }
            player.last_delta = delta;
            deltas.insert(player.id.clone(), delta);
        }
    }
    Ok(deltas)
}
