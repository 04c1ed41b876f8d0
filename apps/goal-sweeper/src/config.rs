use std::time::Duration;

use anyhow::{bail, Context};
use bookshelf_core::goals::{CompletedGoalPolicy, GoalProgressConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub sweep_interval: Duration,
    pub sweep_initial_delay: Duration,
    pub unit_of_work_timeout: Option<Duration>,
    pub completed_goal_policy: CompletedGoalPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let db_path = lookup("BKS_DB_PATH").unwrap_or_else(|| "./db/app.db".into());
        let interval_secs: u64 = lookup("BKS_SWEEP_INTERVAL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);
        let initial_delay_secs: u64 = lookup("BKS_SWEEP_INITIAL_DELAY_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        let unit_of_work_timeout = lookup("BKS_UOW_TIMEOUT_MS")
            .map(|v| {
                v.parse::<u64>()
                    .with_context(|| format!("Invalid BKS_UOW_TIMEOUT_MS: {}", v))
            })
            .transpose()?
            .map(Duration::from_millis);
        let completed_goal_policy =
            parse_policy(lookup("BKS_COMPLETED_GOAL_POLICY").as_deref())?;

        if interval_secs == 0 {
            bail!("BKS_SWEEP_INTERVAL_SECS must be greater than zero");
        }

        Ok(Self {
            db_path,
            sweep_interval: Duration::from_secs(interval_secs),
            sweep_initial_delay: Duration::from_secs(initial_delay_secs),
            unit_of_work_timeout,
            completed_goal_policy,
        })
    }

    pub fn goal_progress(&self) -> GoalProgressConfig {
        GoalProgressConfig {
            unit_of_work_timeout: self.unit_of_work_timeout,
            completed_goal_policy: self.completed_goal_policy,
        }
    }
}

fn parse_policy(value: Option<&str>) -> anyhow::Result<CompletedGoalPolicy> {
    match value.map(str::trim) {
        None | Some("") => Ok(CompletedGoalPolicy::default()),
        Some(v) if v.eq_ignore_ascii_case("accrue") => Ok(CompletedGoalPolicy::Accrue),
        Some(v) if v.eq_ignore_ascii_case("skip") => Ok(CompletedGoalPolicy::Skip),
        Some(other) => bail!(
            "Invalid BKS_COMPLETED_GOAL_POLICY '{}': expected 'accrue' or 'skip'",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_path, "./db/app.db");
        assert_eq!(config.sweep_interval, Duration::from_secs(3600));
        assert_eq!(config.sweep_initial_delay, Duration::from_secs(30));
        assert_eq!(config.unit_of_work_timeout, None);
        assert_eq!(config.completed_goal_policy, CompletedGoalPolicy::Accrue);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BKS_DB_PATH", "/data/goals.db"),
            ("BKS_SWEEP_INTERVAL_SECS", "600"),
            ("BKS_SWEEP_INITIAL_DELAY_SECS", "0"),
            ("BKS_UOW_TIMEOUT_MS", "2500"),
            ("BKS_COMPLETED_GOAL_POLICY", "Skip"),
        ])
        .unwrap();

        assert_eq!(config.db_path, "/data/goals.db");
        assert_eq!(config.sweep_interval, Duration::from_secs(600));
        assert_eq!(config.sweep_initial_delay, Duration::ZERO);
        let progress = config.goal_progress();
        assert_eq!(progress.unit_of_work_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(progress.completed_goal_policy, CompletedGoalPolicy::Skip);
    }

    #[test]
    fn test_unparseable_interval_falls_back_to_default() {
        let config = config_from(&[("BKS_SWEEP_INTERVAL_SECS", "hourly")]).unwrap();
        assert_eq!(config.sweep_interval, Duration::from_secs(3600));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        assert!(config_from(&[("BKS_SWEEP_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        assert!(config_from(&[("BKS_UOW_TIMEOUT_MS", "soon")]).is_err());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = config_from(&[("BKS_COMPLETED_GOAL_POLICY", "ignore")]).unwrap_err();
        assert!(err.to_string().contains("BKS_COMPLETED_GOAL_POLICY"));
    }
}
