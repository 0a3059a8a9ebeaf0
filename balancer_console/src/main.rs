#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

mod check_config;
mod meter;
mod simulate;

use clap::{Command, arg};


fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Team balancer")
        .version(clap::crate_version!())
        .about("Headless host for the team balancer: simulations and config checks")
        .subcommand_required(true)
        .subcommand(
            Command::new("simulate")
                .about(concat!(
                    "Plays a series of matches between randomly generated players. ",
                    "Can be used for tuning rules or benchmarking team building."
                ))
                .arg(
                    arg!(-'n' --"players" <n> "Number of players in the lobby")
                        .value_parser(2..=200)
                        .default_value("10"),
                )
                .arg(
                    arg!(--"rounds" <rounds> "Number of matches to play")
                        .value_parser(1..=100_000)
                        .default_value("50"),
                )
                .arg(
                    arg!(--"seed" <seed> "Random seed; a fresh one is used if omitted")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(arg!(--"config" <config_file> "Path to a yaml-serialized Rules file")),
        )
        .subcommand(
            Command::new("check-config")
                .about("Parses and verifies a rules file.")
                .arg(arg!(<config_file> "Path to a yaml-serialized Rules file")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("simulate", sub_matches)) => {
            let rules = match sub_matches.get_one::<String>("config") {
                Some(path) => check_config::read_rules_file(path)?,
                None => Default::default(),
            };
            simulate::run(simulate::SimulateConfig {
                num_players: *sub_matches.get_one::<i64>("players").unwrap() as usize,
                rounds: *sub_matches.get_one::<i64>("rounds").unwrap() as usize,
                seed: sub_matches.get_one::<u64>("seed").copied(),
                rules,
            })
        }
        Some(("check-config", sub_matches)) => {
            check_config::run(sub_matches.get_one::<String>("config_file").unwrap())
        }
        _ => unreachable!("Exhausted list of subcommands and subcommand_required prevents `None`"),
    }
}
