//! Run configuration: optional TOML file, then `STAKESHARE_*` environment
//! variables, then command-line overrides.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use rust_decimal::Decimal;
use serde::Deserialize;
use stakeshare_payouts::{Address, Cycle, PayoutParams};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Baker whose delegators are paid
    pub delegate: Option<String>,
    /// JSON snapshot fixture
    pub snapshots: Option<PathBuf>,
    pub cycle_start: Option<Cycle>,
    pub cycle_end: Option<Cycle>,

    pub fee_rate: Decimal,
    pub spillage: bool,
    pub roll_quantum: Decimal,
    pub parallel: bool,

    pub log_level: String,
    pub log_format: String,
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let defaults = PayoutParams::default();
        let mut builder = Config::builder()
            .set_default("fee_rate", defaults.fee_rate.to_string())?
            .set_default("spillage", defaults.spillage)?
            .set_default("roll_quantum", defaults.roll_quantum.to_string())?
            .set_default("parallel", false)?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?;

        if let Some(path) = config_path {
            if !path.exists() {
                bail!(
                    "Configuration file {} not found (specified via --config)",
                    path.display()
                );
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(Environment::with_prefix("STAKESHARE"));

        builder
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn params(&self) -> Result<PayoutParams> {
        let params = PayoutParams {
            fee_rate: self.fee_rate,
            spillage: self.spillage,
            roll_quantum: self.roll_quantum,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn delegate(&self) -> Result<Address> {
        match self.delegate.as_deref() {
            Some(d) if !d.trim().is_empty() => Ok(Address::new(d.trim())),
            _ => bail!("no delegate configured (set `delegate` or STAKESHARE_DELEGATE)"),
        }
    }

    pub fn snapshots(&self) -> Result<&Path> {
        self.snapshots
            .as_deref()
            .context("no snapshot fixture configured (set `snapshots` or --snapshots)")
    }

    /// Inclusive cycle range; the end defaults to the start.
    pub fn cycle_range(&self) -> Result<(Cycle, Cycle)> {
        let start = self
            .cycle_start
            .context("no start cycle configured (set `cycle_start` or --from)")?;
        let end = self.cycle_end.unwrap_or(start);
        if end < start {
            bail!("cycle range {start}-{end} is empty");
        }
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load(None).unwrap();
        assert!(config.spillage);
        assert_eq!(config.fee_rate, Decimal::new(10, 2));
        assert_eq!(config.log_format, "pretty");
        assert!(config.delegate().is_err());
        assert!(config.cycle_range().is_err());
    }

    #[test]
    fn test_file_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
delegate = "tz1baker"
snapshots = "fixtures/run.json"
cycle_start = 300
cycle_end = 302
fee_rate = "0.08"
spillage = false
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.delegate().unwrap(), Address::from("tz1baker"));
        assert_eq!(config.cycle_range().unwrap(), (300, 302));
        let params = config.params().unwrap();
        assert_eq!(params.fee_rate, Decimal::new(8, 2));
        assert!(!params.spillage);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/stakeshare.toml"))).is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut config = AppConfig::load(None).unwrap();
        config.cycle_start = Some(10);
        config.cycle_end = Some(9);
        assert!(config.cycle_range().is_err());
        config.cycle_end = None;
        assert_eq!(config.cycle_range().unwrap(), (10, 10));
    }
}
