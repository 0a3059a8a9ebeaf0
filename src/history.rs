use std::collections::{HashMap, VecDeque};

use crate::partition::{Partition, same_side_overlap};
use crate::player::{Player, PlayerId, Team};


pub const HISTORY_CAPACITY: usize = 5;

// Recent partitions, used to discourage handing out the same teams again.
#[derive(Clone, Debug, Default)]
pub struct HistoryTracker {
    // Newest first.
    snapshots: VecDeque<Partition>,
    last_partition: Partition,
}

impl HistoryTracker {
    pub fn new() -> Self { Self::default() }

    pub fn record(&mut self, partition: Partition) {
        self.snapshots.push_front(partition.clone());
        self.snapshots.truncate(HISTORY_CAPACITY);
        self.last_partition = partition;
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.last_partition = Partition::default();
    }

    pub fn last_partition(&self) -> &Partition { &self.last_partition }
    pub fn snapshots(&self) -> impl Iterator<Item = &Partition> { self.snapshots.iter() }
    pub fn len(&self) -> usize { self.snapshots.len() }
    pub fn is_empty(&self) -> bool { self.snapshots.is_empty() && self.last_partition.is_empty() }

    fn effective_snapshots(&self) -> impl Iterator<Item = &Partition> {
        let fallback = self.snapshots.is_empty().then_some(&self.last_partition);
        self.snapshots.iter().chain(fallback)
    }

    // The largest number of players that keep their side (up to a full swap) relative to any
    // retained snapshot.
    pub fn max_overlap(&self, team1: &[PlayerId], team2: &[PlayerId]) -> usize {
        self.effective_snapshots()
            .map(|snapshot| same_side_overlap(snapshot, team1, team2))
            .max()
            .unwrap_or(0)
    }

    pub fn overlap_with_last(&self, team1: &[PlayerId], team2: &[PlayerId]) -> usize {
        same_side_overlap(&self.last_partition, team1, team2)
    }

    // Re-expresses history in terms of indices into `players`, so that the search can score
    // candidates without touching ids.
    pub fn index_for(&self, players: &[Player]) -> SideIndex {
        let positions: HashMap<&PlayerId, usize> =
            players.iter().enumerate().map(|(idx, p)| (&p.id, idx)).collect();
        let sides_of = |partition: &Partition| {
            let mut sides = vec![None; players.len()];
            for team in [Team::One, Team::Two] {
                for id in partition.team(team) {
                    if let Some(&idx) = positions.get(id) {
                        sides[idx] = Some(team);
                    }
                }
            }
            sides
        };
        SideIndex {
            snapshots: self.effective_snapshots().map(&sides_of).collect(),
            last: sides_of(&self.last_partition),
        }
    }
}


// Per-snapshot side of every player; `None` if the player was not part of that snapshot.
#[derive(Clone, Debug)]
pub struct SideIndex {
    snapshots: Vec<Vec<Option<Team>>>,
    last: Vec<Option<Team>>,
}

impl SideIndex {
    pub fn max_overlap(&self, team1: &[usize], team2: &[usize]) -> usize {
        self.snapshots.iter().map(|sides| overlap(sides, team1, team2)).max().unwrap_or(0)
    }

    pub fn overlap_with_last(&self, team1: &[usize], team2: &[usize]) -> usize {
        overlap(&self.last, team1, team2)
    }
}

fn overlap(sides: &[Option<Team>], team1: &[usize], team2: &[usize]) -> usize {
    let count = |team: &[usize], side: Team| team.iter().filter(|&&i| sides[i] == Some(side)).count();
    let direct = count(team1, Team::One) + count(team2, Team::Two);
    let swapped = count(team1, Team::Two) + count(team2, Team::One);
    direct.max(swapped)
}
