use crate::config::types::Config;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Catches values that would make the pipeline misbehave silently rather
/// than fail loudly: an empty tier list, a zero-sized filter, a nonsensical
/// false-positive rate.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.worker_sets == 0 {
        return Err(validation("worker-sets must be at least 1"));
    }
    if config.crawler.fetch_tiers.is_empty() {
        return Err(validation("fetch-tiers must list at least one tier"));
    }
    if config.crawler.fetch_tiers.iter().any(|&t| t == 0) {
        return Err(validation(
            "fetch-tiers must not contain 0 (0 is the discard sentinel)",
        ));
    }
    if config.crawler.ingest_workers == 0 || config.crawler.admission_workers == 0 {
        return Err(validation("ingest-workers and admission-workers must be at least 1"));
    }

    if config.fetch.max_response_size == 0 {
        return Err(validation("max-response-size must be positive"));
    }
    if config.fetch.request_timeout_ms == 0 {
        return Err(validation("request-timeout-ms must be positive"));
    }

    if config.seen.expected_items == 0 {
        return Err(validation("expected-items must be positive"));
    }
    if !(config.seen.false_positive_rate > 0.0 && config.seen.false_positive_rate < 1.0) {
        return Err(validation("false-positive-rate must be between 0 and 1"));
    }

    if config.scoring.promote_floor == 0 {
        return Err(validation("promote-floor must be a real tier, not 0"));
    }
    if config.scoring.baseline_tier == 0 {
        return Err(validation("baseline-tier must be a real tier, not 0"));
    }

    Ok(())
}

fn validation(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn empty_tier_list_is_rejected() {
        let mut config = Config::default();
        config.crawler.fetch_tiers.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn discard_tier_is_rejected() {
        let mut config = Config::default();
        config.crawler.fetch_tiers.push(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn bad_fp_rate_is_rejected() {
        let mut config = Config::default();
        config.seen.false_positive_rate = 1.5;
        assert!(validate(&config).is_err());

        config.seen.false_positive_rate = 0.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let mut config = Config::default();
        config.fetch.max_response_size = 0;
        assert!(validate(&config).is_err());
    }
}
