// Scoring of a candidate split. Higher is better. Evaluated tens of thousands of times per build,
// so everything here works on indices into a fixed player slice and never allocates.

use rand::Rng;

use crate::history::{HistoryTracker, SideIndex};
use crate::player::Player;
use crate::role::{RoleCoverage, assign_roles};
use crate::rules::BalanceMode;
use crate::util::{mean, sign, std_dev};


// An exact repeat of a recent split (sides may be flipped) is effectively forbidden.
pub const IDENTICAL_PENALTY: f64 = 1_000_000.0;
const HARD_PENALTY_FACTOR: f64 = 250.0;
const SPREAD_PENALTY_FACTOR: f64 = 0.18;
const LINE_FAIRNESS_WEIGHT: f64 = 0.25;
const LINE_FAIRNESS_CAP: f64 = 60.0;
const WIN_RATE_WEIGHT: f64 = 0.30;
const WIN_RATE_CAP: f64 = 80.0;
// Win rate gap (in percentage points) at which the compensation reaches its full scale.
const WIN_RATE_FULL_SCALE_GAP: f64 = 20.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ObjectiveWeights {
    pub coverage: f64,
    pub primary: f64,
    pub jitter_amplitude: f64,
    pub diversity: f64,
    pub mmr_penalty_divisor: f64,
}

impl ObjectiveWeights {
    pub fn for_mode(mode: BalanceMode) -> Self {
        match mode {
            BalanceMode::PreferLine => ObjectiveWeights {
                coverage: 12.0,
                primary: 4.0,
                jitter_amplitude: 0.8,
                diversity: 1.2,
                mmr_penalty_divisor: 120.0,
            },
            BalanceMode::PreferMmr | BalanceMode::IgnoreLine => ObjectiveWeights {
                coverage: 0.0,
                primary: 0.0,
                jitter_amplitude: 4.0,
                diversity: 4.0,
                mmr_penalty_divisor: 200.0,
            },
        }
    }
}

// Deterministic part of the score. Jitter is added on top by `SplitEvaluator::score`.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ScoreBreakdown {
    pub coverage_bonus: f64,
    pub line_fairness_bonus: f64,
    pub win_rate_bonus: f64,
    pub tolerance_penalty: f64,
    pub spread_penalty: f64,
    pub diversity_penalty: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.coverage_bonus + self.line_fairness_bonus + self.win_rate_bonus
            - self.tolerance_penalty
            - self.spread_penalty
            - self.diversity_penalty
    }
}

pub struct SplitEvaluator<'a> {
    players: &'a [Player],
    // Ratings used for evaluation. May differ from `players[i].rating` by a small jitter.
    ratings: Vec<f64>,
    win_rates: Vec<f64>,
    mode: BalanceMode,
    tolerance: f64,
    weights: ObjectiveWeights,
    history: SideIndex,
}

impl<'a> SplitEvaluator<'a> {
    pub fn new(
        players: &'a [Player], ratings: Vec<f64>, mode: BalanceMode, tolerance: u32,
        history: SideIndex,
    ) -> Self {
        debug_assert_eq!(players.len(), ratings.len());
        SplitEvaluator {
            players,
            ratings,
            win_rates: players.iter().map(|p| p.win_rate() as f64).collect(),
            mode,
            tolerance: tolerance as f64,
            weights: ObjectiveWeights::for_mode(mode),
            history,
        }
    }

    pub fn with_true_ratings(
        players: &'a [Player], mode: BalanceMode, tolerance: u32, history: &HistoryTracker,
    ) -> Self {
        let ratings = players.iter().map(|p| p.rating as f64).collect();
        Self::new(players, ratings, mode, tolerance, history.index_for(players))
    }

    pub fn num_players(&self) -> usize { self.players.len() }
    pub fn tolerance(&self) -> f64 { self.tolerance }
    pub fn history(&self) -> &SideIndex { &self.history }

    pub fn average_rating(&self, team: &[usize]) -> f64 { mean(team.iter().map(|&i| self.ratings[i])) }

    pub fn gap(&self, team1: &[usize], team2: &[usize]) -> f64 {
        (self.average_rating(team1) - self.average_rating(team2)).abs()
    }

    // Gap between averages of the players' actual ratings, ignoring any evaluation jitter.
    pub fn true_gap(&self, team1: &[usize], team2: &[usize]) -> f64 {
        let average = |team: &[usize]| mean(team.iter().map(|&i| self.players[i].rating as f64));
        (average(team1) - average(team2)).abs()
    }

    pub fn coverage(&self, team: &[usize]) -> RoleCoverage {
        assign_roles(team.iter().map(|&i| &self.players[i]))
    }

    pub fn score(&self, team1: &[usize], team2: &[usize], rng: &mut impl Rng) -> f64 {
        let jitter = (rng.random::<f64>() - 0.5) * self.weights.jitter_amplitude;
        self.breakdown(team1, team2).total() + jitter
    }

    pub fn breakdown(&self, team1: &[usize], team2: &[usize]) -> ScoreBreakdown {
        let w = &self.weights;
        let m1 = self.average_rating(team1);
        let m2 = self.average_rating(team2);
        let diff = (m1 - m2).abs();
        let s1 = std_dev(team1.iter().map(|&i| self.ratings[i]));
        let s2 = std_dev(team2.iter().map(|&i| self.ratings[i]));

        let (c1, c2) = if self.mode == BalanceMode::PreferLine {
            (self.coverage(team1), self.coverage(team2))
        } else {
            (RoleCoverage::default(), RoleCoverage::default())
        };
        let coverage_bonus = (c1.covered_roles + c2.covered_roles) as f64 * w.coverage
            + (c1.primary_assigned + c2.primary_assigned) as f64 * w.primary;

        // The team that got more players on their main role should not also be the stronger one.
        let mut line_fairness_bonus = 0.0;
        if self.mode == BalanceMode::PreferLine {
            let gap = c1.primary_assigned as f64 - c2.primary_assigned as f64;
            if gap != 0.0 {
                let raw = sign(gap) * (m2 - m1);
                line_fairness_bonus = (raw * LINE_FAIRNESS_WEIGHT * gap.abs())
                    .clamp(-LINE_FAIRNESS_CAP, LINE_FAIRNESS_CAP);
            }
        }

        // Likewise, the team with the weaker track record may compensate with a higher rating.
        let mut win_rate_bonus = 0.0;
        let wr1 = mean(team1.iter().map(|&i| self.win_rates[i]));
        let wr2 = mean(team2.iter().map(|&i| self.win_rates[i]));
        let wr_gap = wr2 - wr1;
        if wr_gap != 0.0 {
            let raw = sign(wr_gap) * (m1 - m2);
            let scale = (wr_gap.abs() / WIN_RATE_FULL_SCALE_GAP).clamp(0.0, 1.0);
            win_rate_bonus =
                (raw * WIN_RATE_WEIGHT * (1.0 + scale * 0.5)).clamp(-WIN_RATE_CAP, WIN_RATE_CAP);
        }

        let over = (diff - self.tolerance).max(0.0);
        let mut tolerance_penalty = over * over / w.mmr_penalty_divisor;
        if over > 0.0 {
            tolerance_penalty += over * over * HARD_PENALTY_FACTOR;
        }

        let spread_penalty = (s1 - s2).abs() * SPREAD_PENALTY_FACTOR;

        let same_side_max = self.history.max_overlap(team1, team2);
        let total_players = team1.len() + team2.len();
        let mut diversity_penalty = same_side_max as f64 * w.diversity;
        if total_players > 0 && same_side_max == total_players {
            diversity_penalty += IDENTICAL_PENALTY;
        }

        ScoreBreakdown {
            coverage_bonus,
            line_fairness_bonus,
            win_rate_bonus,
            tolerance_penalty,
            spread_penalty,
            diversity_penalty,
        }
    }
}

// Scores two standalone teams. Convenience wrapper for callers that hold players rather than
// indices; the search itself goes through `SplitEvaluator`.
pub fn score_split(
    team1: &[Player], team2: &[Player], mode: BalanceMode, tolerance: u32,
    history: &HistoryTracker, rng: &mut impl Rng,
) -> f64 {
    let players: Vec<Player> = team1.iter().chain(team2).cloned().collect();
    let evaluator = SplitEvaluator::with_true_ratings(&players, mode, tolerance, history);
    let indices: Vec<usize> = (0..players.len()).collect();
    let (idx1, idx2) = indices.split_at(team1.len());
    evaluator.score(idx1, idx2, rng)
}
