// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.

use std::collections::HashSet;

use team_balancer::{Partition, Player, PlayerId};


// Player past the placement window.
#[allow(dead_code)]
pub fn veteran(id: &str, rating: i32) -> Player { Player::new(id, id, rating).with_record(10, 10) }

#[allow(dead_code)]
pub fn newcomer(id: &str, rating: i32, games_played: u32) -> Player {
    Player { games_played, ..Player::new(id, id, rating) }
}

#[allow(dead_code)]
pub fn ids(names: &[&str]) -> Vec<PlayerId> { names.iter().map(|&s| PlayerId::from(s)).collect() }

#[allow(dead_code)]
pub fn roster_ids(players: &[Player]) -> Vec<PlayerId> { players.iter().map(|p| p.id.clone()).collect() }

#[allow(dead_code)]
pub fn rating_of(players: &[Player], id: &PlayerId) -> i32 {
    players.iter().find(|p| &p.id == id).unwrap().rating
}

#[allow(dead_code)]
pub fn average_gap(players: &[Player], partition: &Partition) -> f64 {
    let average = |team: &[PlayerId]| {
        team.iter().map(|id| rating_of(players, id) as f64).sum::<f64>() / team.len() as f64
    };
    (average(&partition.team1) - average(&partition.team2)).abs()
}

// Panics unless `partition` splits exactly `players` into two disjoint teams of equal size.
#[allow(dead_code)]
pub fn assert_valid_partition(players: &[Player], partition: &Partition) {
    assert_eq!(partition.team1.len(), partition.team2.len(), "{partition:?}");
    let team1: HashSet<_> = partition.team1.iter().collect();
    let team2: HashSet<_> = partition.team2.iter().collect();
    assert!(team1.is_disjoint(&team2), "{partition:?}");
    let all: HashSet<_> = team1.union(&team2).copied().collect();
    let expected: HashSet<_> = players.iter().map(|p| &p.id).collect();
    assert_eq!(all, expected);
    assert_eq!(partition.num_players(), players.len());
}
