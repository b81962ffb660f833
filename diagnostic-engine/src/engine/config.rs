use std::collections::BTreeSet;

use crate::{
    domain::{ConditionTag, Reading},
    error::ConfigError,
    locale::Labels,
};

pub const DEFAULT_FRAUD_THRESHOLD_PCT: f64 = 25.0;
pub const DEFAULT_OVERLOAD_THRESHOLD_PCT: f64 = 100.0;
pub const DEFAULT_OVERHEAT_THRESHOLD_C: f64 = 85.0;

/// Thresholds and priority policy for [`evaluate`](crate::engine::evaluate).
///
/// Every comparison is strict: a value equal to its threshold does not trigger.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EngineConfig {
    pub fraud_threshold_pct: f64,
    pub overload_threshold_pct: f64,
    pub overheat_threshold_c: f64,
    pub high_priority_conditions: BTreeSet<ConditionTag>,
    /// Evaluated after the built-in rules, in declaration order.
    pub extra_rules: Vec<CustomRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fraud_threshold_pct: DEFAULT_FRAUD_THRESHOLD_PCT,
            overload_threshold_pct: DEFAULT_OVERLOAD_THRESHOLD_PCT,
            overheat_threshold_c: DEFAULT_OVERHEAT_THRESHOLD_C,
            high_priority_conditions: [ConditionTag::FraudSuspected, ConditionTag::Overload]
                .into_iter()
                .collect(),
            extra_rules: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn is_high_priority(&self, tag: &ConditionTag) -> bool {
        self.high_priority_conditions.contains(tag)
    }

    /// Reject thresholds the rules cannot compare against.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("fraud_threshold_pct", self.fraud_threshold_pct)?;
        check_threshold("overload_threshold_pct", self.overload_threshold_pct)?;
        if !self.overheat_threshold_c.is_finite() {
            return Err(ConfigError::InvalidThreshold {
                field: "overheat_threshold_c".to_string(),
                value: self.overheat_threshold_c,
            });
        }

        for rule in &self.extra_rules {
            if !rule.threshold.is_finite() {
                return Err(ConfigError::InvalidThreshold {
                    field: format!("extra_rules.{}.threshold", rule.tag),
                    value: rule.threshold,
                });
            }
            if rule.labels.primary.trim().is_empty() || rule.labels.secondary.trim().is_empty() {
                return Err(ConfigError::MissingLabel(rule.tag.to_string()));
            }
        }

        Ok(())
    }
}

fn check_threshold(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold {
            field: field.to_string(),
            value,
        })
    }
}

/// Reading field a configured rule compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Metric {
    LoadPct,
    LossPct,
    OilTempC,
}

impl Metric {
    pub fn value_of(self, reading: &Reading) -> Option<f64> {
        match self {
            Metric::LoadPct => Some(reading.load_pct),
            Metric::LossPct => Some(reading.loss_pct),
            Metric::OilTempC => reading.oil_temp_c,
        }
    }
}

/// An additional condition: `metric > threshold` raises `tag`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomRule {
    pub tag: ConditionTag,
    pub metric: Metric,
    pub threshold: f64,
    pub labels: Labels,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_common_calibration() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.fraud_threshold_pct, 25.0);
        assert_eq!(cfg.overload_threshold_pct, 100.0);
        assert_eq!(cfg.overheat_threshold_c, 85.0);
        assert!(cfg.is_high_priority(&ConditionTag::FraudSuspected));
        assert!(cfg.is_high_priority(&ConditionTag::Overload));
        assert!(!cfg.is_high_priority(&ConditionTag::Overheating));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unusable_thresholds() {
        let cfg = EngineConfig {
            fraud_threshold_pct: -1.0,
            ..EngineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidThreshold { .. })));

        let cfg = EngineConfig {
            extra_rules: vec![CustomRule {
                tag: ConditionTag::Custom("HOT".to_string()),
                metric: Metric::OilTempC,
                threshold: f64::INFINITY,
                labels: Labels::new("Chaud", "Hot"),
            }],
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oil_metric_is_absent_without_a_temperature() {
        let r = Reading::new("TR-1", crate::Region::Sava, 50.0, 5.0);
        assert_eq!(Metric::OilTempC.value_of(&r), None);
        assert_eq!(Metric::LoadPct.value_of(&r), Some(50.0));
    }
}
