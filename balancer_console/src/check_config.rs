use anyhow::Context;
use log::info;
use team_balancer::Rules;


pub fn read_rules_file(path: &str) -> anyhow::Result<Rules> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{path}'."))?;
    let rules: Rules = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse rules from '{path}'."))?;
    rules.verify().with_context(|| format!("Invalid rules in '{path}'."))?;
    Ok(rules)
}

pub fn run(path: &str) -> anyhow::Result<()> {
    let rules = read_rules_file(path)?;
    info!(
        "Rules OK: {} balancing within {} ({} mixing), {} scoring",
        rules.balance.mode, rules.balance.tolerance, rules.balance.strength, rules.scoring.mode
    );
    Ok(())
}
