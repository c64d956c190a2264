use serde::{Deserialize, Serialize};

use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    /// Projects synced at once by `healthscore sync`.
    #[serde(default)]
    pub sync_concurrency: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
sync_concurrency: 8
scoring:
  weights:
    inactivity: 3
    eta_overrun: 25
  thresholds:
    inactivity_days: 10
    max_parallel: 2
  client:
    critical_days: 14
    recent_payment_window: "5d"
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.sync_concurrency, Some(8));

        let scoring = config.scoring.unwrap();
        let resolved = scoring.resolve().unwrap();
        assert_eq!(resolved.weights.inactivity, 3.0);
        assert_eq!(resolved.weights.eta_overrun, 25.0);
        assert_eq!(resolved.weights.stagnation, 15.0);
        assert_eq!(resolved.thresholds.max_parallel, 2);
        assert_eq!(resolved.client.critical_days, 14);
        assert_eq!(resolved.client.recent_payment_window, chrono::Duration::days(5));
    }

    #[test]
    fn test_empty_config_parse() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert!(config.scoring.is_none());
        assert!(config.sync_concurrency.is_none());
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        assert!(serde_saphyr::from_str::<Config>("queries: []\n").is_err());
    }
}
