use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::player::{PlayerId, Team};


// Two disjoint equal-size teams. Order within a team is meaningful only for role assignment.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Partition {
    pub team1: Vec<PlayerId>,
    pub team2: Vec<PlayerId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PartitionError {
    SizeMismatch,
    DuplicatePlayer(PlayerId),
}

impl Partition {
    pub fn new(team1: Vec<PlayerId>, team2: Vec<PlayerId>) -> Self { Partition { team1, team2 } }

    pub fn is_empty(&self) -> bool { self.team1.is_empty() && self.team2.is_empty() }
    pub fn num_players(&self) -> usize { self.team1.len() + self.team2.len() }

    pub fn team(&self, team: Team) -> &[PlayerId] {
        match team {
            Team::One => &self.team1,
            Team::Two => &self.team2,
        }
    }

    pub fn team_of(&self, id: &PlayerId) -> Option<Team> {
        if self.team1.contains(id) {
            Some(Team::One)
        } else if self.team2.contains(id) {
            Some(Team::Two)
        } else {
            None
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &PlayerId> + Clone { self.team1.iter().chain(&self.team2) }

    pub fn swapped(&self) -> Self {
        Partition {
            team1: self.team2.clone(),
            team2: self.team1.clone(),
        }
    }

    // Number of players who stay on the same side as in `other`, treating a full swap of sides as
    // "the same side". Players missing from either partition are not counted.
    pub fn same_side_overlap(&self, other: &Partition) -> usize {
        same_side_overlap(other, &self.team1, &self.team2)
    }

    // Exchanges two players on opposite teams. Returns false (and changes nothing) otherwise.
    pub fn swap_across(&mut self, a: &PlayerId, b: &PlayerId) -> bool {
        let (Some(team_a), Some(team_b)) = (self.team_of(a), self.team_of(b)) else {
            return false;
        };
        if team_a == team_b {
            return false;
        }
        let (id1, id2) = if team_a == Team::One { (a, b) } else { (b, a) };
        let i = self.team1.iter().position(|id| id == id1);
        let j = self.team2.iter().position(|id| id == id2);
        match (i, j) {
            (Some(i), Some(j)) => {
                std::mem::swap(&mut self.team1[i], &mut self.team2[j]);
                true
            }
            _ => false,
        }
    }

    pub fn verify(&self) -> Result<(), PartitionError> {
        if self.team1.len() != self.team2.len() {
            return Err(PartitionError::SizeMismatch);
        }
        let mut seen = HashSet::new();
        for id in self.ids() {
            if !seen.insert(id) {
                return Err(PartitionError::DuplicatePlayer(id.clone()));
            }
        }
        Ok(())
    }
}

pub fn same_side_overlap(base: &Partition, team1: &[PlayerId], team2: &[PlayerId]) -> usize {
    let count = |ids: &[PlayerId], base_team: &[PlayerId]| {
        ids.iter().filter(|&id| base_team.contains(id)).count()
    };
    let direct = count(team1, &base.team1) + count(team2, &base.team2);
    let swapped = count(team1, &base.team2) + count(team2, &base.team1);
    direct.max(swapped)
}
