use crate::error::{SimError, SimResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DB_PATH: &str = "card_fraud.db";
pub const DEFAULT_SEED: u64 = 0x5EED_CA2D_F2A0_0001;

pub const ENV_DB_PATH: &str = "CARD_FRAUD_DB";
pub const ENV_SEED: &str = "CARD_FRAUD_SEED";

/// Parameters of one generation run.
/// Field names on the wire follow the runner's command format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateParams {
    #[serde(rename = "cards")]
    pub card_count: u64,
    #[serde(rename = "pos")]
    pub pos_count: u64,
    #[serde(rename = "transactions")]
    pub tx_count: u64,
    #[serde(rename = "frauds")]
    pub fraud_count: u64,
    #[serde(rename = "reports")]
    pub report_probability: f64,
    /// Master seed override. None uses the configured seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerateParams {
    /// Reject inconsistent counts before anything touches the store.
    pub fn validate(&self) -> SimResult<()> {
        if self.fraud_count > self.pos_count {
            return Err(SimError::invalid(format!(
                "There can't be more frauds than devices ({} frauds, {} POS devices)",
                self.fraud_count, self.pos_count
            )));
        }
        validate_report_probability(self.report_probability)?;
        if self.tx_count > 0 && (self.card_count == 0 || self.pos_count == 0) {
            return Err(SimError::invalid(format!(
                "{} transactions need at least one card and one POS device (got {} cards, {} POS)",
                self.tx_count, self.card_count, self.pos_count
            )));
        }
        Ok(())
    }
}

/// Out-of-range report probabilities fail fast rather than clamp.
pub fn validate_report_probability(p: f64) -> SimResult<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(SimError::invalid(format!(
            "report probability must lie in [0, 1], got {p}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub db_path: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub defaults: GenerateParams,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl SimConfig {
    /// Load from a JSON config file, then apply environment overrides.
    /// Unreadable or malformed files surface as `SimError::Other`.
    /// In tests, use SimConfig::default_test().
    pub fn load(path: &str) -> SimResult<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
        let mut config: SimConfig =
            serde_json::from_str(&content).with_context(|| format!("Cannot parse {path}"))?;
        config.apply_env()?;
        Ok(config)
    }

    /// Built-in configuration used when no config file is given.
    pub fn from_env() -> SimResult<Self> {
        let mut config = Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            seed: DEFAULT_SEED,
            defaults: GenerateParams {
                card_count: 10_000,
                pos_count: 1_000,
                tx_count: 50_000,
                fraud_count: 10,
                report_probability: 0.1,
                seed: None,
            },
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> SimResult<()> {
        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            self.db_path = path;
        }
        if let Ok(raw) = std::env::var(ENV_SEED) {
            self.seed = raw
                .parse()
                .with_context(|| format!("{ENV_SEED}={raw} is not a u64"))?;
        }
        Ok(())
    }

    /// Small in-memory configuration for tests.
    pub fn default_test() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            seed: 42,
            defaults: GenerateParams {
                card_count: 10,
                pos_count: 5,
                tx_count: 100,
                fraud_count: 2,
                report_probability: 1.0,
                seed: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(cards: u64, pos: u64, txs: u64, frauds: u64, reports: f64) -> GenerateParams {
        GenerateParams {
            card_count: cards,
            pos_count: pos,
            tx_count: txs,
            fraud_count: frauds,
            report_probability: reports,
            seed: None,
        }
    }

    #[test]
    fn more_frauds_than_devices_is_rejected() {
        let err = params(10, 3, 10, 4, 0.5).validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { .. }));
    }

    #[test]
    fn fraud_count_equal_to_pos_count_is_allowed() {
        assert!(params(10, 3, 10, 3, 0.5).validate().is_ok());
    }

    #[test]
    fn report_probability_out_of_range_fails_fast() {
        for p in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(params(10, 3, 10, 1, p).validate().is_err(), "accepted {p}");
        }
        assert!(params(10, 3, 10, 1, 0.0).validate().is_ok());
        assert!(params(10, 3, 10, 1, 1.0).validate().is_ok());
    }

    #[test]
    fn transactions_without_cards_or_devices_are_rejected() {
        assert!(params(0, 3, 10, 1, 0.5).validate().is_err());
        assert!(params(3, 0, 10, 0, 0.5).validate().is_err());
        assert!(params(0, 0, 0, 0, 0.5).validate().is_ok());
    }

    #[test]
    fn shipped_config_parses() {
        let config: SimConfig =
            serde_json::from_str(include_str!("../../config/card_fraud.json")).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert!(config.defaults.validate().is_ok());
    }

    #[test]
    fn unreadable_config_file_is_wrapped() {
        let err = SimConfig::load("no/such/card_fraud.json").unwrap_err();
        assert!(matches!(err, SimError::Other(_)));
        assert!(err.to_string().contains("no/such/card_fraud.json"));
    }

    #[test]
    fn params_use_wire_names() {
        let p: GenerateParams = serde_json::from_str(
            r#"{"cards": 10, "pos": 5, "transactions": 100, "frauds": 2, "reports": 1.0}"#,
        )
        .unwrap();
        assert_eq!(p, params(10, 5, 100, 2, 1.0));
    }
}
