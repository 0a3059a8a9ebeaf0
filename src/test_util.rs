// Test utilities that cannot be moved to the "tests" folder, because unit tests and the console
// simulation use them too.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::player::Player;
use crate::role::{POSITIONS, Role};


// In theory random tests verify statistical properties that should always hold, but let's fix
// the seed to avoid sporadic failures.
pub fn deterministic_rng() -> StdRng { StdRng::from_seed([0; 32]) }

// Ten players covering every position twice, with ratings spread over a few hundred points.
pub fn sample_roster() -> Vec<Player> {
    const NAMES: [&str; 10] = [
        "Alice", "Bob", "Charlie", "Dave", "Eve", "Frank", "Grace", "Heidi", "Ivan", "Judy",
    ];
    NAMES
        .iter()
        .enumerate()
        .map(|(idx, &name)| {
            let primary = POSITIONS[idx % POSITIONS.len()];
            let secondary = POSITIONS[(idx + 2) % POSITIONS.len()];
            Player::new(name.to_lowercase().as_str(), name, 1000 + 37 * idx as i32)
                .with_roles(primary, secondary)
                .with_record(idx as u32 + 5, 10 - idx as u32)
        })
        .collect()
}

// A roster of `num_players` flex players with ratings drawn around `mean`.
pub fn random_roster(num_players: usize, mean: i32, spread: i32, rng: &mut impl Rng) -> Vec<Player> {
    (0..num_players)
        .map(|idx| {
            let rating = mean + rng.random_range(-spread..=spread);
            let id = format!("p{idx:02}");
            Player::new(id.as_str(), format!("Player {idx}"), rating).with_roles(Role::Flex, Role::Flex)
        })
        .collect()
}
