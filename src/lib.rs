#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod history;
pub mod lobby;
pub mod objective;
pub mod partition;
pub mod player;
pub mod rating;
pub mod role;
pub mod rules;
pub mod search;
pub mod test_util;
pub mod util;
pub mod worker;

pub use history::HistoryTracker;
pub use lobby::{BuildRequest, Lobby, LobbyError, MatchRecord, TeamSummary};
pub use objective::score_split;
pub use partition::Partition;
pub use player::{Player, PlayerId, Team};
pub use rating::{MatchResult, RatingDeltas, RatingError, apply_result};
pub use role::{Role, RoleCoverage, assign_roles};
pub use rules::{BalanceConfig, BalanceMode, MixStrength, Rules, ScoringMode, ScoringRules};
pub use search::{BuildError, CancelFlag, build_teams, build_teams_cancellable};
pub use worker::BuildWorker;
