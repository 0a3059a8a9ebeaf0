use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::player::Player;


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Display, EnumIter, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Bottom,
    Support,
    // Plays anything. Only fills positions nobody prefers.
    #[default]
    Flex,
}

// Canonical order in which positions are filled. Earlier positions win ties.
pub const POSITIONS: [Role; 5] = [Role::Top, Role::Jungle, Role::Mid, Role::Bottom, Role::Support];

impl Role {
    pub fn letter(self) -> char {
        match self {
            Role::Top => 'T',
            Role::Jungle => 'J',
            Role::Mid => 'M',
            Role::Bottom => 'B',
            Role::Support => 'S',
            Role::Flex => 'A',
        }
    }

    // Accepts a single letter or a full name in any case. Anything else means "plays anything".
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "top" => Role::Top,
            "j" | "jungle" | "jug" => Role::Jungle,
            "m" | "mid" | "middle" => Role::Mid,
            "b" | "bot" | "bottom" | "adc" => Role::Bottom,
            "s" | "sup" | "support" | "supporter" => Role::Support,
            _ => Role::Flex,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self { Role::parse_lenient(&s) }
}

impl From<Role> for String {
    fn from(role: Role) -> Self { role.letter().to_string() }
}


#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RoleCoverage {
    // Positions (in `POSITIONS` order) mapped to an index into the team slice.
    pub assignment: [Option<usize>; 5],
    pub covered_roles: usize,
    pub primary_assigned: usize,
}

impl RoleCoverage {
    pub fn player_at(&self, position: Role) -> Option<usize> {
        POSITIONS.iter().position(|&p| p == position).and_then(|i| self.assignment[i])
    }
}

// Greedy three-pass assignment: primary role, then secondary role, then flexible players.
// Deterministic for a given order; an unfilled position is not an error.
pub fn assign_roles<'a>(team: impl Iterator<Item = &'a Player> + Clone) -> RoleCoverage {
    let mut coverage = RoleCoverage::default();
    for pass in 0..3 {
        for (slot, &position) in POSITIONS.iter().enumerate() {
            if coverage.assignment[slot].is_some() {
                continue;
            }
            let matches = |p: &Player| match pass {
                0 => p.primary_role == position,
                1 => p.secondary_role == position,
                _ => p.plays(Role::Flex),
            };
            let found = team
                .clone()
                .enumerate()
                .find(|&(idx, p)| !coverage.assignment.contains(&Some(idx)) && matches(p))
                .map(|(idx, _)| idx);
            if let Some(idx) = found {
                coverage.assignment[slot] = Some(idx);
                coverage.covered_roles += 1;
                if pass == 0 {
                    coverage.primary_assigned += 1;
                }
            }
        }
    }
    coverage
}


#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, primary: Role, secondary: Role) -> Player {
        Player::new(id, id, 1000).with_roles(primary, secondary)
    }

    #[test]
    fn full_primary_coverage() {
        let team = [
            player("a", Role::Support, Role::Flex),
            player("b", Role::Top, Role::Flex),
            player("c", Role::Mid, Role::Flex),
            player("d", Role::Jungle, Role::Flex),
            player("e", Role::Bottom, Role::Flex),
        ];
        let coverage = assign_roles(team.iter());
        assert_eq!(coverage.covered_roles, 5);
        assert_eq!(coverage.primary_assigned, 5);
        assert_eq!(coverage.player_at(Role::Top), Some(1));
        assert_eq!(coverage.player_at(Role::Support), Some(0));
    }

    #[test]
    fn secondary_then_flex() {
        let team = [
            player("a", Role::Mid, Role::Top),
            player("b", Role::Mid, Role::Support),
            player("c", Role::Flex, Role::Flex),
            player("d", Role::Mid, Role::Bottom),
        ];
        let coverage = assign_roles(team.iter());
        // a: Mid (primary); b: Support (secondary); d: Bottom (secondary); c: Top (flex).
        assert_eq!(coverage.primary_assigned, 1);
        assert_eq!(coverage.covered_roles, 4);
        assert_eq!(coverage.player_at(Role::Mid), Some(0));
        assert_eq!(coverage.player_at(Role::Support), Some(1));
        assert_eq!(coverage.player_at(Role::Bottom), Some(3));
        assert_eq!(coverage.player_at(Role::Top), Some(2));
        assert_eq!(coverage.player_at(Role::Jungle), None);
    }

    #[test]
    fn first_in_order_wins_ties() {
        let team = [player("a", Role::Top, Role::Mid), player("b", Role::Top, Role::Mid)];
        let coverage = assign_roles(team.iter());
        assert_eq!(coverage.player_at(Role::Top), Some(0));
        assert_eq!(coverage.player_at(Role::Mid), Some(1));
        assert_eq!(coverage.primary_assigned, 1);
        assert_eq!(coverage.covered_roles, 2);
    }

    #[test]
    fn empty_team() {
        assert_eq!(assign_roles(std::iter::empty()), RoleCoverage::default());
    }

    #[test]
    fn lenient_parsing() {
        assert_eq!(Role::parse_lenient("t"), Role::Top);
        assert_eq!(Role::parse_lenient("Jungle"), Role::Jungle);
        assert_eq!(Role::parse_lenient(" S "), Role::Support);
        assert_eq!(Role::parse_lenient("A"), Role::Flex);
        assert_eq!(Role::parse_lenient("goalkeeper"), Role::Flex);
        assert_eq!(String::from(Role::Bottom), "B");
    }
}
