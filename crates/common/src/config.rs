use std::time::Duration;

use crate::ConfigError;

pub const DEFAULT_PLACE_TTL_MS: u64 = 30_000;
pub const DEFAULT_CLEAN_MS: u64 = 5_000;
pub const DEFAULT_SCRIPT_TTL_MS: u64 = 10_000;

/// Janelas de tempo dos dois stores e do sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlConfig {
    /// Tempo sem heartbeat até um place ser considerado morto.
    pub place_ttl: Duration,
    /// Intervalo entre duas varreduras do sweeper.
    pub clean_interval: Duration,
    /// Tempo de vida de um script pendente desde a última submissão.
    pub script_ttl: Duration,
}

impl TtlConfig {
    pub fn from_millis(place_ttl_ms: u64, clean_ms: u64, script_ttl_ms: u64) -> Self {
        Self {
            place_ttl: Duration::from_millis(place_ttl_ms),
            clean_interval: Duration::from_millis(clean_ms),
            script_ttl: Duration::from_millis(script_ttl_ms),
        }
    }

    /// Rejeita durações zeradas; `tokio::time::interval` entra em pânico com período zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.place_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration("PLACE_TTL_MS"));
        }
        if self.clean_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("CLEAN_MS"));
        }
        if self.script_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration("SCRIPT_TTL_MS"));
        }
        Ok(())
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self::from_millis(DEFAULT_PLACE_TTL_MS, DEFAULT_CLEAN_MS, DEFAULT_SCRIPT_TTL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = TtlConfig::default();
        assert_eq!(cfg.place_ttl, Duration::from_secs(30));
        assert_eq!(cfg.clean_interval, Duration::from_secs(5));
        assert_eq!(cfg.script_ttl, Duration::from_secs(10));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_clean_interval_rejected() {
        let cfg = TtlConfig::from_millis(1_000, 0, 1_000);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDuration("CLEAN_MS")));
    }

    #[test]
    fn zero_script_ttl_rejected() {
        let cfg = TtlConfig::from_millis(1_000, 1_000, 0);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroDuration("SCRIPT_TTL_MS"))
        );
    }
}
