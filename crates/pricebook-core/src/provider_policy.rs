use std::time::Duration;

/// Request budget for an upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub retry_backoff: BackoffPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl ProviderPolicy {
    /// Alpha Vantage free tier: five calls per minute.
    pub fn alphavantage_default() -> Self {
        Self {
            quota_window: Duration::from_secs(60),
            quota_limit: 5,
            retry_backoff: BackoffPolicy {
                initial_delay: Duration::from_secs(2),
                max_delay: Duration::from_secs(60),
                multiplier: 2.0,
                max_retries: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphavantage_policy_matches_free_tier() {
        let policy = ProviderPolicy::alphavantage_default();

        assert_eq!(policy.quota_window, Duration::from_secs(60));
        assert_eq!(policy.quota_limit, 5);
    }
}
