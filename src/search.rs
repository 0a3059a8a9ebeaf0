// Team building: randomized restarts, annealing swaps, diversity top-up, greedy gap reduction.
//
// The search never touches shared state. It takes a roster snapshot and a read-only view of the
// history and returns a new partition; recording it is up to the caller.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::history::HistoryTracker;
use crate::objective::SplitEvaluator;
use crate::partition::Partition;
use crate::player::{Player, PlayerId};
use crate::rules::{BalanceConfig, BalanceMode, MixStrength};


pub const MAX_ATTEMPTS: usize = 30_000;
// Subtracted per rating point of gap above tolerance. Dominates every other term.
const GAP_REJECTION_FACTOR: f64 = 1_000_000.0;
const RESTART_MIN_CHANGE_PENALTY: f64 = 20.0;
const SWAP_MIN_CHANGE_PENALTY: f64 = 15.0;
const TEMPERATURE_DECAY: f64 = 0.996;
const MIN_TEMPERATURE: f64 = 0.001;
const PREFER_MMR_RATING_JITTER: f64 = 20.0;
const PREFER_MMR_EXTRA_SWAP_PROBABILITY: f64 = 0.3;
const MAX_GAP_REDUCTION_ITERATIONS: usize = 120;
// How often (in evaluations) the cancellation flag is checked.
const CANCEL_CHECK_PERIOD: usize = 256;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BuildError {
    NotEnoughPlayers,
    OddPlayerCount,
    DuplicatePlayer(PlayerId),
    Cancelled,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::NotEnoughPlayers => write!(f, "at least two players are required"),
            BuildError::OddPlayerCount => write!(f, "an even number of players is required"),
            BuildError::DuplicatePlayer(id) => write!(f, "player {id} is listed twice"),
            BuildError::Cancelled => write!(f, "build cancelled"),
        }
    }
}

impl std::error::Error for BuildError {}


#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self { Self::default() }
    pub fn cancel(&self) { self.0.store(true, Ordering::Relaxed); }
    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }
}


#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SearchParams {
    pub attempts: usize,
    pub swap_rounds: usize,
    pub initial_temperature: f64,
    // Minimum number of players that must change sides relative to history.
    pub min_change: usize,
}

impl SearchParams {
    pub fn new(config: &BalanceConfig, num_players: usize) -> Self {
        let (attempts_base, swap_base, temperature_base, min_change_divisor) = match config.mode {
            BalanceMode::PreferLine => (900, 320, 1.5, 4),
            BalanceMode::PreferMmr | BalanceMode::IgnoreLine => (2000, 800, 3.0, 2),
        };
        let (attempts_base, swap_rounds, initial_temperature) = match config.strength {
            MixStrength::Normal => (attempts_base, swap_base, temperature_base),
            MixStrength::Strong => (
                attempts_base * 2,
                (swap_base as f64 * 1.4).round() as usize,
                temperature_base * 1.2,
            ),
        };
        SearchParams {
            attempts: (attempts_base * num_players).min(MAX_ATTEMPTS),
            swap_rounds,
            initial_temperature,
            min_change: (num_players / min_change_divisor).max(2),
        }
    }
}


// Candidate split as index lists into the roster snapshot.
#[derive(Clone, Debug)]
struct Split {
    team1: Vec<usize>,
    team2: Vec<usize>,
}

impl Split {
    fn swap(&mut self, i: usize, j: usize) { std::mem::swap(&mut self.team1[i], &mut self.team2[j]); }

    fn random_swap(&mut self, rng: &mut impl Rng) {
        let i = rng.random_range(0..self.team1.len());
        let j = rng.random_range(0..self.team2.len());
        self.swap(i, j);
    }

    fn to_partition(&self, players: &[Player]) -> Partition {
        let ids = |team: &[usize]| -> Vec<PlayerId> {
            team.iter().map(|&i| players[i].id.clone()).collect()
        };
        Partition::new(ids(&self.team1), ids(&self.team2))
    }
}

pub fn verify_roster(players: &[Player]) -> Result<(), BuildError> {
    if players.len() < 2 {
        return Err(BuildError::NotEnoughPlayers);
    }
    if players.len() % 2 != 0 {
        return Err(BuildError::OddPlayerCount);
    }
    let mut seen = HashSet::new();
    for p in players {
        if !seen.insert(&p.id) {
            return Err(BuildError::DuplicatePlayer(p.id.clone()));
        }
    }
    Ok(())
}

pub fn build_teams(
    players: &[Player], config: &BalanceConfig, history: &HistoryTracker, rng: &mut impl Rng,
) -> Result<Partition, BuildError> {
    build_teams_cancellable(players, config, history, rng, &CancelFlag::new())
}

pub fn build_teams_cancellable(
    players: &[Player], config: &BalanceConfig, history: &HistoryTracker, rng: &mut impl Rng,
    cancel: &CancelFlag,
) -> Result<Partition, BuildError> {
    verify_roster(players)?;
    let n = players.len();
    let params = SearchParams::new(config, n);
    let ratings = players
        .iter()
        .map(|p| {
            let rating = p.rating as f64;
            if config.mode == BalanceMode::PreferMmr {
                rating + (rng.random::<f64>() - 0.5) * PREFER_MMR_RATING_JITTER
            } else {
                rating
            }
        })
        .collect();
    let evaluator =
        SplitEvaluator::new(players, ratings, config.mode, config.tolerance, history.index_for(players));

    let Some(best) = random_restarts(&evaluator, &params, rng, cancel)? else {
        // Unreachable for a verified roster, but a plain split is always a valid answer.
        let half = n / 2;
        return Ok(Split {
            team1: (0..half).collect(),
            team2: (half..n).collect(),
        }
        .to_partition(players));
    };
    let mut best = anneal(&evaluator, best, &params, rng, cancel)?;
    top_up_diversity(&evaluator, &mut best, &params, config.mode, rng);
    reduce_gap(&evaluator, &mut best);

    let gap = evaluator.true_gap(&best.team1, &best.team2);
    if gap > evaluator.tolerance() {
        warn!(
            "Could not balance {} players within tolerance {}: best gap is {:.1}",
            n, config.tolerance, gap
        );
    }
    Ok(best.to_partition(players))
}

// Score with the extra restart-stage penalties: a gap above tolerance is all but rejected, and so
// is a split that changes too few players relative to the history snapshots.
fn restart_score(
    evaluator: &SplitEvaluator, split: &Split, params: &SearchParams, rng: &mut impl Rng,
) -> f64 {
    let mut score = evaluator.score(&split.team1, &split.team2, rng);
    score -= gap_rejection(evaluator, split);
    let same = evaluator.history().max_overlap(&split.team1, &split.team2);
    score -= min_change_shortfall(evaluator.num_players(), same, params) * RESTART_MIN_CHANGE_PENALTY;
    score
}

// Same as `restart_score`, but the change floor is measured against the last partition only.
fn swap_score(
    evaluator: &SplitEvaluator, split: &Split, params: &SearchParams, rng: &mut impl Rng,
) -> f64 {
    let mut score = evaluator.score(&split.team1, &split.team2, rng);
    score -= gap_rejection(evaluator, split);
    let same = evaluator.history().overlap_with_last(&split.team1, &split.team2);
    score -= min_change_shortfall(evaluator.num_players(), same, params) * SWAP_MIN_CHANGE_PENALTY;
    score
}

fn gap_rejection(evaluator: &SplitEvaluator, split: &Split) -> f64 {
    let gap = evaluator.true_gap(&split.team1, &split.team2);
    (gap - evaluator.tolerance()).max(0.0) * GAP_REJECTION_FACTOR
}

fn min_change_shortfall(num_players: usize, same: usize, params: &SearchParams) -> f64 {
    let changed = num_players - same.min(num_players);
    params.min_change.saturating_sub(changed) as f64
}

fn check_cancelled(cancel: &CancelFlag, iteration: usize) -> Result<(), BuildError> {
    if iteration % CANCEL_CHECK_PERIOD == 0 && cancel.is_cancelled() {
        Err(BuildError::Cancelled)
    } else {
        Ok(())
    }
}

fn random_restarts(
    evaluator: &SplitEvaluator, params: &SearchParams, rng: &mut impl Rng, cancel: &CancelFlag,
) -> Result<Option<Split>, BuildError> {
    let n = evaluator.num_players();
    let half = n / 2;
    let mut order: Vec<usize> = (0..n).collect();
    let mut best: Option<(f64, Split)> = None;
    for attempt in 0..params.attempts {
        check_cancelled(cancel, attempt)?;
        order.shuffle(rng);
        let (team1, team2) = order.split_at(half);
        let candidate = Split { team1: team1.to_vec(), team2: team2.to_vec() };
        let score = restart_score(evaluator, &candidate, params, rng);
        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, candidate));
        }
    }
    if let Some((score, _)) = &best {
        debug!("Best of {} random splits scored {:.2}", params.attempts, score);
    }
    Ok(best.map(|(_, split)| split))
}

// Simulated-annealing pair swaps. Worse candidates are accepted with probability
// exp(delta / temperature); the temperature decays geometrically every round.
fn anneal(
    evaluator: &SplitEvaluator, start: Split, params: &SearchParams, rng: &mut impl Rng,
    cancel: &CancelFlag,
) -> Result<Split, BuildError> {
    let mut current = start;
    let mut current_score = swap_score(evaluator, &current, params, rng);
    let mut best = current.clone();
    let mut best_score = current_score;
    let mut temperature = params.initial_temperature;
    for round in 0..params.swap_rounds {
        check_cancelled(cancel, round)?;
        let i = rng.random_range(0..current.team1.len());
        let j = rng.random_range(0..current.team2.len());
        current.swap(i, j);
        let score = swap_score(evaluator, &current, params, rng);
        let delta = score - current_score;
        let accept = delta >= 0.0
            || (delta / temperature.max(MIN_TEMPERATURE)).exp() > rng.random::<f64>();
        if accept {
            current_score = score;
            if score > best_score {
                best_score = score;
                best = current.clone();
            }
        } else {
            current.swap(i, j);
        }
        temperature *= TEMPERATURE_DECAY;
    }
    debug!("Annealing over {} rounds reached score {:.2}", params.swap_rounds, best_score);
    Ok(best)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
struct TopUp {
    forced_swaps: usize,
    extra_swaps: usize,
}

// Forces random cross swaps while the split keeps too many players on their previous sides.
fn top_up_diversity(
    evaluator: &SplitEvaluator, split: &mut Split, params: &SearchParams, mode: BalanceMode,
    rng: &mut impl Rng,
) -> TopUp {
    let n = evaluator.num_players();
    let changed = |split: &Split| n - evaluator.history().max_overlap(&split.team1, &split.team2);
    let mut top_up = TopUp::default();
    if changed(split) >= params.min_change {
        return top_up;
    }
    // Bounded: random swaps can undo each other, and two players can never meet the floor.
    let max_swaps = 4 * n;
    while changed(split) < params.min_change && top_up.forced_swaps < max_swaps {
        split.random_swap(rng);
        top_up.forced_swaps += 1;
    }
    if mode == BalanceMode::PreferMmr {
        for _ in 0..split.team1.len() {
            if rng.random_bool(PREFER_MMR_EXTRA_SWAP_PROBABILITY) {
                split.random_swap(rng);
                top_up.extra_swaps += 1;
            }
        }
    }
    debug!(
        "Forced {} swaps (plus {} extra) to meet the minimum change of {}",
        top_up.forced_swaps, top_up.extra_swaps, params.min_change
    );
    top_up
}

// Steepest-descent swaps on the true rating gap alone. Never produces an exact repeat of a
// history snapshot. Stops within tolerance, at a local optimum, or after a fixed number of
// iterations.
fn reduce_gap(evaluator: &SplitEvaluator, split: &mut Split) {
    let n = evaluator.num_players();
    for _ in 0..MAX_GAP_REDUCTION_ITERATIONS {
        let before = evaluator.true_gap(&split.team1, &split.team2);
        if before <= evaluator.tolerance() {
            break;
        }
        let mut best_gain = 0.0;
        let mut best_swap = None;
        for i in 0..split.team1.len() {
            for j in 0..split.team2.len() {
                split.swap(i, j);
                let gain = before - evaluator.true_gap(&split.team1, &split.team2);
                let repeat = evaluator.history().max_overlap(&split.team1, &split.team2) == n;
                split.swap(i, j);
                if gain > best_gain && !repeat {
                    best_gain = gain;
                    best_swap = Some((i, j));
                }
            }
        }
        match best_swap {
            Some((i, j)) => split.swap(i, j),
            None => break,
        }
    }
    debug!(
        "Rating gap after greedy reduction: {:.1}",
        evaluator.true_gap(&split.team1, &split.team2)
    );
}
