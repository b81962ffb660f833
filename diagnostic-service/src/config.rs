use std::{fs, path::PathBuf};

use anyhow::{bail, Context};
use diagnostic_engine::{advisory::DEFAULT_SHED_TARGET_PCT, EngineConfig, Language};
use serde::Deserialize;

use crate::pipeline::BatchPolicy;

/// Largest fleet the simulated source will generate in one run.
pub const MAX_SIMULATED_FLEET: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Csv,
    Dat,
    Ndjson,
    Simulated,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    pub count: usize,
    pub seed: u64,
    pub include_pilot: bool,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            count: 11,
            seed: 42,
            include_pilot: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub simulated: SimulatedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub high_priority_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub policy: BatchPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub shed_target_pct: f64,
    /// Current solar irradiance. Battery advice is only given when set.
    pub irradiance_w_m2: Option<f64>,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            shed_target_pct: DEFAULT_SHED_TARGET_PCT,
            irradiance_w_m2: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub engine: EngineConfig,
    pub source: SourceConfig,
    pub export: ExportConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_operator() -> String {
    "operator".to_string()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("DIAGNOSTIC_CONFIG").unwrap_or_else(|_| "diagnostic-config.toml".to_string());
        let contents = fs::read_to_string(&path).with_context(|| format!("failed to read config {path}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine.validate()?;

        if !self.advisory.shed_target_pct.is_finite() || self.advisory.shed_target_pct < 0.0 {
            bail!("advisory.shed_target_pct must be a finite, non-negative percentage");
        }
        if let Some(irr) = self.advisory.irradiance_w_m2 {
            if !irr.is_finite() || irr < 0.0 {
                bail!("advisory.irradiance_w_m2 must be a finite, non-negative value");
            }
        }
        if self.source.simulated.count > MAX_SIMULATED_FLEET {
            bail!(
                "source.simulated.count {} exceeds the limit of {MAX_SIMULATED_FLEET}",
                self.source.simulated.count
            );
        }
        if self.source.kind != SourceKind::Simulated && self.source.path.is_none() {
            bail!("source.path is required for {:?} sources", self.source.kind);
        }

        Ok(())
    }
}
