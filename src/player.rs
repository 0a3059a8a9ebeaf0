use std::fmt;

use enum_map::Enum;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::role::Role;


pub const MIN_RATING: i32 = -9999;
pub const MAX_RATING: i32 = 9999;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Enum, EnumIter, Serialize, Deserialize)]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }

    // One-based, the way teams are presented to users.
    pub fn number(self) -> u8 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "team {}", self.number()) }
}


#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self { PlayerId(id.to_owned()) }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}


// Everything except `id`, `name` and `rating` is optional on ingestion. Missing values fall back
// to defaults once, here, and are never re-validated by the optimizer.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rating: i32,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub primary_role: Role,
    #[serde(default)]
    pub secondary_role: Role,
    // Last rating change, for display only. Reset whenever teams or the roster change.
    #[serde(default)]
    pub last_delta: i32,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, rating: i32) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            rating: clamp_rating(rating),
            games_played: 0,
            wins: 0,
            losses: 0,
            primary_role: Role::Flex,
            secondary_role: Role::Flex,
            last_delta: 0,
        }
    }

    pub fn with_roles(self, primary_role: Role, secondary_role: Role) -> Self {
        Player { primary_role, secondary_role, ..self }
    }

    pub fn with_record(self, wins: u32, losses: u32) -> Self {
        Player { games_played: wins + losses, wins, losses, ..self }
    }

    // Applies the invariants that deserialization alone cannot express.
    pub fn normalized(self) -> Self {
        Player { rating: clamp_rating(self.rating), ..self }
    }

    // Rounded percentage of decided games won; 0 when there are none.
    pub fn win_rate(&self) -> u32 {
        let total = self.wins + self.losses;
        if total == 0 {
            0
        } else {
            (self.wins as f64 / total as f64 * 100.0).round() as u32
        }
    }

    pub fn is_placement(&self, placement_games: u32) -> bool { self.games_played < placement_games }

    pub fn plays(&self, role: Role) -> bool {
        self.primary_role == role || self.secondary_role == role
    }
}

pub fn clamp_rating(rating: i32) -> i32 { rating.clamp(MIN_RATING, MAX_RATING) }
