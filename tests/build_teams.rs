mod common;

use pretty_assertions::assert_eq;
use strum::IntoEnumIterator;
use team_balancer::search::SearchParams;
use team_balancer::test_util::{deterministic_rng, random_roster, sample_roster};
use team_balancer::{
    BalanceConfig, BalanceMode, BuildError, CancelFlag, HistoryTracker, MixStrength, Partition,
    build_teams, build_teams_cancellable,
};

use common::*;


fn config(mode: BalanceMode, tolerance: u32) -> BalanceConfig {
    BalanceConfig::new(mode, tolerance, MixStrength::Normal)
}

#[test]
fn partition_covers_input() {
    let mut rng = deterministic_rng();
    for mode in BalanceMode::iter() {
        for n in [2, 4, 6, 10, 12] {
            let players = random_roster(n, 1200, 400, &mut rng);
            let partition =
                build_teams(&players, &config(mode, 100), &HistoryTracker::new(), &mut rng).unwrap();
            assert_valid_partition(&players, &partition);
        }
    }
}

#[test]
fn rejects_invalid_rosters() {
    let mut rng = deterministic_rng();
    let history = HistoryTracker::new();
    let config = BalanceConfig::default();
    assert_eq!(build_teams(&[], &config, &history, &mut rng), Err(BuildError::NotEnoughPlayers));
    assert_eq!(
        build_teams(&[veteran("a", 1000)], &config, &history, &mut rng),
        Err(BuildError::NotEnoughPlayers)
    );
    let three = [veteran("a", 1000), veteran("b", 1000), veteran("c", 1000)];
    assert_eq!(build_teams(&three, &config, &history, &mut rng), Err(BuildError::OddPlayerCount));
    let duplicate = [veteran("a", 1000), veteran("a", 1200)];
    assert_eq!(
        build_teams(&duplicate, &config, &history, &mut rng),
        Err(BuildError::DuplicatePlayer("a".into()))
    );
}

#[test]
fn equal_ratings_give_zero_gap() {
    let mut rng = deterministic_rng();
    let players: Vec<_> = (0..8).map(|i| veteran(&format!("p{i}"), 1500)).collect();
    for mode in BalanceMode::iter() {
        for tolerance in [0, 50, 500] {
            let partition =
                build_teams(&players, &config(mode, tolerance), &HistoryTracker::new(), &mut rng)
                    .unwrap();
            assert_eq!(average_gap(&players, &partition), 0.0);
        }
    }
}

#[test]
fn infeasible_gap_is_avoided() {
    let mut rng = deterministic_rng();
    let players =
        [veteran("a", 0), veteran("b", 0), veteran("c", 1000), veteran("d", 1000)];
    for mode in BalanceMode::iter() {
        for _ in 0..10 {
            let partition =
                build_teams(&players, &config(mode, 50), &HistoryTracker::new(), &mut rng).unwrap();
            assert_eq!(average_gap(&players, &partition), 0.0, "{mode}: {partition:?}");
        }
    }
}

#[test]
fn rebuild_avoids_exact_repeat() {
    let mut rng = deterministic_rng();
    let players: Vec<_> = ["a", "b", "c", "d"].iter().map(|&id| veteran(id, 1000)).collect();
    let previous = Partition::new(ids(&["a", "b"]), ids(&["c", "d"]));
    let mut history = HistoryTracker::new();
    history.record(previous.clone());
    for mode in BalanceMode::iter() {
        for _ in 0..20 {
            let partition = build_teams(&players, &config(mode, 120), &history, &mut rng).unwrap();
            assert_valid_partition(&players, &partition);
            assert_eq!(partition.same_side_overlap(&previous), 2, "{mode}: {partition:?}");
        }
    }
}

// Evaluation ratings are jittered in prefer_mmr. With a zero tolerance, every stage must still
// keep away from the recorded split.
#[test]
fn zero_tolerance_prefer_mmr_avoids_exact_repeat() {
    let mut rng = deterministic_rng();
    let players: Vec<_> = ["a", "b", "c", "d"].iter().map(|&id| veteran(id, 1000)).collect();
    let previous = Partition::new(ids(&["a", "b"]), ids(&["c", "d"]));
    let mut history = HistoryTracker::new();
    history.record(previous.clone());
    for _ in 0..60 {
        let partition =
            build_teams(&players, &config(BalanceMode::PreferMmr, 0), &history, &mut rng).unwrap();
        assert_eq!(partition.same_side_overlap(&previous), 2, "{partition:?}");
    }
}

#[test]
fn rebuild_changes_enough_players() {
    let mut rng = deterministic_rng();
    let players = random_roster(8, 1200, 50, &mut rng);
    for mode in BalanceMode::iter() {
        // Loose enough that the greedy gap pass never kicks in.
        let config = config(mode, 2000);
        let min_change = SearchParams::new(&config, players.len()).min_change;
        let mut previous = build_teams(&players, &config, &HistoryTracker::new(), &mut rng).unwrap();
        for _ in 0..10 {
            let mut history = HistoryTracker::new();
            history.record(previous.clone());
            let partition = build_teams(&players, &config, &history, &mut rng).unwrap();
            let same = history.max_overlap(&partition.team1, &partition.team2);
            assert!(
                players.len() - same >= min_change,
                "{mode}: {same} of {} kept, {partition:?}",
                players.len()
            );
            previous = partition;
        }
    }
}

#[test]
fn strong_mixing_still_balances() {
    let mut rng = deterministic_rng();
    let players = sample_roster();
    let strong = BalanceConfig::new(BalanceMode::PreferLine, 120, MixStrength::Strong);
    let partition = build_teams(&players, &strong, &HistoryTracker::new(), &mut rng).unwrap();
    assert_valid_partition(&players, &partition);
    assert!(average_gap(&players, &partition) <= 120.0);
}

#[test]
fn cancelled_build_fails() {
    let mut rng = deterministic_rng();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let result = build_teams_cancellable(
        &sample_roster(),
        &BalanceConfig::default(),
        &HistoryTracker::new(),
        &mut rng,
        &cancel,
    );
    assert_eq!(result, Err(BuildError::Cancelled));
}
