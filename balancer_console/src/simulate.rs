// Plays random matches in a lobby of generated players. Every player has a hidden skill; match
// outcomes are drawn from the Elo expectation of the hidden skills, so over time public ratings
// should drift towards them.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Context;
use itertools::Itertools;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skillratings::elo::{self, EloRating};
use team_balancer::role::POSITIONS;
use team_balancer::test_util::random_roster;
use team_balancer::{BuildWorker, Lobby, Player, PlayerId, Rules, Team};

use crate::meter::Meter;


const STARTING_RATING: i32 = 1000;
const SKILL_MEAN: i32 = 1000;
const SKILL_SPREAD: i32 = 300;

pub struct SimulateConfig {
    pub num_players: usize,
    pub rounds: usize,
    pub seed: Option<u64>,
    pub rules: Rules,
}

pub fn run(config: SimulateConfig) -> anyhow::Result<()> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let skills: HashMap<PlayerId, i32> =
        random_roster(config.num_players, SKILL_MEAN, SKILL_SPREAD, &mut rng)
            .into_iter()
            .map(|p| (p.id, p.rating))
            .collect();

    let mut lobby = Lobby::new(config.rules);
    for id in skills.keys().sorted() {
        let primary = POSITIONS[rng.random_range(0..POSITIONS.len())];
        let secondary = POSITIONS[rng.random_range(0..POSITIONS.len())];
        let player = Player::new(id.clone(), id.to_string(), STARTING_RATING)
            .with_roles(primary, secondary);
        lobby.add_player(player)?;
    }
    let ids = lobby.roster().iter().map(|p| p.id.clone()).collect_vec();

    let mut worker = BuildWorker::new();
    let mut build_time = Meter::new()?;
    let mut rating_gap = Meter::new()?;
    for round in 1..=config.rounds {
        let t0 = Instant::now();
        worker.request(lobby.build_request(&ids)?, &mut rng);
        let partition = worker.wait().context("Build result lost")??;
        build_time.record_duration(t0.elapsed());
        lobby.accept_build(partition)?;

        let gap = lobby.team_summary(Team::One)?.average_rating
            - lobby.team_summary(Team::Two)?.average_rating;
        rating_gap.record(gap.abs().round() as u64);

        let skill = |team: Team| {
            let members = lobby.teams().team(team);
            members.iter().map(|id| skills[id] as f64).sum::<f64>() / members.len() as f64
        };
        let (expected1, _) = elo::expected_score(
            &EloRating { rating: skill(Team::One) },
            &EloRating { rating: skill(Team::Two) },
        );
        let winner = if rng.random_bool(expected1) { Team::One } else { Team::Two };
        lobby.report_winner(winner)?;
        debug!("Round {}: gap {:.1}, P(team 1) = {:.2}, {} won", round, gap, expected1, winner);
    }

    info!("Leaderboard after {} rounds:", config.rounds);
    let leaderboard = lobby.roster().iter().sorted_by_key(|p| -p.rating);
    for (place, p) in leaderboard.enumerate() {
        info!(
            "{:>3}. {:<8} rating {:>5}  skill {:>5}  {}-{} ({}%)",
            place + 1,
            p.name,
            p.rating,
            skills[&p.id],
            p.wins,
            p.losses,
            p.win_rate()
        );
    }
    info!("Build time, ms: {}", build_time.stats());
    info!("Rating gap: {}", rating_gap.stats());
    Ok(())
}
