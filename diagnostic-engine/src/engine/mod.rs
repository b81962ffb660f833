pub mod config;

use std::cmp::Reverse;

pub use config::{CustomRule, EngineConfig, Metric};

use crate::{
    domain::{ConditionTag, Diagnosis, Priority, Reading},
    error::EngineError,
    locale::{builtin_label, stable_label, Language, NARRATIVE_SEPARATOR},
};

/// Check the numeric fields the rules compare against.
///
/// Rules:
/// - load_pct and loss_pct must be finite and non-negative.
/// - oil_temp_c, when present, must be finite.
pub fn validate_reading(reading: &Reading) -> Result<(), EngineError> {
    check_measure(&reading.id, "load_pct", reading.load_pct)?;
    check_measure(&reading.id, "loss_pct", reading.loss_pct)?;

    if let Some(t) = reading.oil_temp_c {
        if !t.is_finite() {
            return Err(EngineError::invalid(&reading.id, "oil_temp_c must be a finite number"));
        }
    }

    Ok(())
}

fn check_measure(id: &str, field: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() {
        return Err(EngineError::invalid(id, format!("{field} must be a finite number")));
    }
    if value < 0.0 {
        return Err(EngineError::invalid(id, format!("{field} must be non-negative, got {value}")));
    }
    Ok(())
}

/// Conditions raised so far, deduplicated, in the order they were raised.
struct Findings<'a> {
    tags: Vec<ConditionTag>,
    labels: Vec<&'a str>,
}

impl<'a> Findings<'a> {
    fn new() -> Self {
        Self {
            tags: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn raise(&mut self, tag: ConditionTag, label: &'a str) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
            self.labels.push(label);
        }
    }

    fn raise_builtin(&mut self, tag: ConditionTag, language: Language) {
        if let Some(label) = builtin_label(&tag, language) {
            self.raise(tag, label);
        }
    }
}

/// Classify one reading.
///
/// Rules run in a fixed order (fraud, overload, overheating, then
/// `extra_rules` as declared) and the narrative lists labels in that order.
pub fn evaluate(
    reading: &Reading,
    config: &EngineConfig,
    language: Language,
) -> Result<Diagnosis, EngineError> {
    validate_reading(reading)?;

    let mut findings = Findings::new();

    if reading.loss_pct > config.fraud_threshold_pct {
        findings.raise_builtin(ConditionTag::FraudSuspected, language);
    }
    if reading.load_pct > config.overload_threshold_pct {
        findings.raise_builtin(ConditionTag::Overload, language);
    }
    if let Some(t) = reading.oil_temp_c {
        if t > config.overheat_threshold_c {
            findings.raise_builtin(ConditionTag::Overheating, language);
        }
    }
    for rule in &config.extra_rules {
        if let Some(v) = rule.metric.value_of(reading) {
            if v > rule.threshold {
                findings.raise(rule.tag.clone(), rule.labels.pick(language));
            }
        }
    }

    let priority = if findings.tags.iter().any(|t| config.is_high_priority(t)) {
        Priority::High
    } else {
        Priority::Normal
    };

    let narrative = if findings.labels.is_empty() {
        stable_label(language).to_string()
    } else {
        findings.labels.join(NARRATIVE_SEPARATOR)
    };

    Ok(Diagnosis {
        reading_id: reading.id.clone(),
        triggered_conditions: findings.tags,
        priority,
        narrative,
    })
}

/// Fail-fast batch: one diagnosis per reading in input order, or the first
/// error. Nothing is returned for a batch that contains an invalid reading.
pub fn evaluate_batch(
    readings: &[Reading],
    config: &EngineConfig,
    language: Language,
) -> Result<Vec<Diagnosis>, EngineError> {
    readings
        .iter()
        .map(|r| evaluate(r, config, language))
        .collect()
}

/// Collect-all batch: one result per reading in input order.
pub fn evaluate_each(
    readings: &[Reading],
    config: &EngineConfig,
    language: Language,
) -> Vec<Result<Diagnosis, EngineError>> {
    readings
        .iter()
        .map(|r| evaluate(r, config, language))
        .collect()
}

/// Stable ranking: `High` first, input order kept within each tier.
pub fn rank_by_priority(mut diagnoses: Vec<Diagnosis>) -> Vec<Diagnosis> {
    rank_by_priority_key(&mut diagnoses, |d| d.priority);
    diagnoses
}

/// Same ordering as [`rank_by_priority`] for items that carry a diagnosis.
pub fn rank_by_priority_key<T>(items: &mut [T], priority: impl Fn(&T) -> Priority) {
    // slice::sort_by_key is stable
    items.sort_by_key(|item| Reverse(priority(item)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{locale::Labels, Region};

    fn reading(id: &str, load_pct: f64, loss_pct: f64) -> Reading {
        Reading::new(id, Region::Analamanga, load_pct, loss_pct)
    }

    fn diagnosis(id: &str, priority: Priority) -> Diagnosis {
        Diagnosis {
            reading_id: id.to_string(),
            triggered_conditions: Vec::new(),
            priority,
            narrative: String::new(),
        }
    }

    #[test]
    fn pilot_transformer_triggers_every_builtin_condition() {
        let r = reading("TR-PILOTE-01", 105.0, 35.0).with_oil_temp(90.0);
        let d = evaluate(&r, &EngineConfig::default(), Language::Primary).unwrap();

        assert_eq!(
            d.triggered_conditions,
            vec![
                ConditionTag::FraudSuspected,
                ConditionTag::Overload,
                ConditionTag::Overheating
            ]
        );
        assert_eq!(d.priority, Priority::High);
        assert!(d.has(&ConditionTag::Overheating));
        assert_eq!(
            d.narrative,
            "Fraude suspectée | Surcharge (délestage imminent) | Surchauffe huile"
        );
        assert_eq!(d.reading_id, "TR-PILOTE-01");
    }

    #[test]
    fn nominal_reading_is_stable() {
        let r = reading("TR-MDG-201", 60.0, 10.0);
        let cfg = EngineConfig::default();

        let d = evaluate(&r, &cfg, Language::Primary).unwrap();
        assert!(d.triggered_conditions.is_empty());
        assert!(d.is_stable());
        assert_eq!(d.priority, Priority::Normal);
        assert_eq!(d.narrative, "Stable");

        let d = evaluate(&r, &cfg, Language::Secondary).unwrap();
        assert_eq!(d.narrative, "Clear");
    }

    #[test]
    fn thresholds_are_strict() {
        let r = reading("TR-EDGE", 100.0, 25.0).with_oil_temp(85.0);
        let d = evaluate(&r, &EngineConfig::default(), Language::Secondary).unwrap();
        assert!(d.triggered_conditions.is_empty());
        assert_eq!(d.priority, Priority::Normal);
    }

    #[test]
    fn fraud_is_listed_first_whenever_it_triggers() {
        let cfg = EngineConfig::default();
        for (load, loss) in [(30.0, 25.1), (101.0, 40.0), (115.0, 99.9), (0.0, 60.0)] {
            let r = reading("TR-F", load, loss).with_oil_temp(95.0);
            let d = evaluate(&r, &cfg, Language::Secondary).unwrap();
            assert_eq!(d.triggered_conditions[0], ConditionTag::FraudSuspected);
            assert!(d.narrative.starts_with("Fraud suspected"));
            assert_eq!(d.priority, Priority::High);
        }
    }

    #[test]
    fn overheating_alone_is_not_high_priority_by_default() {
        let r = reading("TR-HOT", 70.0, 5.0).with_oil_temp(91.0);
        let d = evaluate(&r, &EngineConfig::default(), Language::Secondary).unwrap();
        assert_eq!(d.triggered_conditions, vec![ConditionTag::Overheating]);
        assert_eq!(d.priority, Priority::Normal);
        assert_eq!(d.narrative, "Oil overheating");
    }

    #[test]
    fn high_priority_set_is_configurable() {
        let cfg = EngineConfig {
            high_priority_conditions: [ConditionTag::Overheating].into_iter().collect(),
            ..EngineConfig::default()
        };

        let hot = evaluate(&reading("A", 70.0, 5.0).with_oil_temp(91.0), &cfg, Language::Primary).unwrap();
        assert_eq!(hot.priority, Priority::High);

        let fraud = evaluate(&reading("B", 70.0, 45.0), &cfg, Language::Primary).unwrap();
        assert_eq!(fraud.triggered_conditions, vec![ConditionTag::FraudSuspected]);
        assert_eq!(fraud.priority, Priority::Normal);
    }

    #[test]
    fn extra_rules_follow_builtins_in_declaration_order() {
        let cfg = EngineConfig {
            extra_rules: vec![
                CustomRule {
                    tag: ConditionTag::Custom("NEAR_CAPACITY".to_string()),
                    metric: Metric::LoadPct,
                    threshold: 90.0,
                    labels: Labels::new("Charge proche limite", "Near capacity"),
                },
                CustomRule {
                    tag: ConditionTag::Custom("MASSIVE_THEFT".to_string()),
                    metric: Metric::LossPct,
                    threshold: 35.0,
                    labels: Labels::new("Vol massif", "Massive theft"),
                },
                CustomRule {
                    tag: ConditionTag::Custom("OIL_WATCH".to_string()),
                    metric: Metric::OilTempC,
                    threshold: 70.0,
                    labels: Labels::new("Huile à surveiller", "Oil watch"),
                },
            ],
            ..EngineConfig::default()
        };

        let r = reading("TR-X", 105.0, 40.0);
        let d = evaluate(&r, &cfg, Language::Secondary).unwrap();
        assert_eq!(
            d.triggered_conditions,
            vec![
                ConditionTag::FraudSuspected,
                ConditionTag::Overload,
                ConditionTag::Custom("NEAR_CAPACITY".to_string()),
                ConditionTag::Custom("MASSIVE_THEFT".to_string()),
            ]
        );
        assert_eq!(
            d.narrative,
            "Fraud suspected | Overload (shedding imminent) | Near capacity | Massive theft"
        );
    }

    #[test]
    fn repeated_tag_is_raised_once() {
        let cfg = EngineConfig {
            extra_rules: vec![CustomRule {
                tag: ConditionTag::Overload,
                metric: Metric::LoadPct,
                threshold: 95.0,
                labels: Labels::new("Surcharge", "Overload"),
            }],
            ..EngineConfig::default()
        };

        let d = evaluate(&reading("TR-O", 110.0, 0.0), &cfg, Language::Secondary).unwrap();
        assert_eq!(d.triggered_conditions, vec![ConditionTag::Overload]);
        assert_eq!(d.narrative, "Overload (shedding imminent)");

        let d = evaluate(&reading("TR-O", 97.0, 0.0), &cfg, Language::Secondary).unwrap();
        assert_eq!(d.triggered_conditions, vec![ConditionTag::Overload]);
        assert_eq!(d.narrative, "Overload");
        assert_eq!(d.priority, Priority::High);
    }

    #[test]
    fn negative_loss_is_an_invalid_reading() {
        let err = evaluate(&reading("TR-BAD", 50.0, -5.0), &EngineConfig::default(), Language::Primary)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidReading { ref reading_id, .. } if reading_id == "TR-BAD"));
    }

    #[test]
    fn non_finite_fields_are_invalid() {
        let cfg = EngineConfig::default();
        assert!(evaluate(&reading("A", f64::NAN, 1.0), &cfg, Language::Primary).is_err());
        assert!(evaluate(&reading("B", 1.0, f64::INFINITY), &cfg, Language::Primary).is_err());
        assert!(evaluate(&reading("C", -0.5, 1.0), &cfg, Language::Primary).is_err());
        assert!(evaluate(
            &reading("D", 1.0, 1.0).with_oil_temp(f64::NAN),
            &cfg,
            Language::Primary
        )
        .is_err());
    }

    #[test]
    fn evaluate_is_idempotent() {
        let r = reading("TR-I", 103.0, 27.4).with_oil_temp(88.0);
        let cfg = EngineConfig::default();
        let a = evaluate(&r, &cfg, Language::Secondary).unwrap();
        let b = evaluate(&r, &cfg, Language::Secondary).unwrap();
        assert_eq!(a, b);
        assert_eq!(r, reading("TR-I", 103.0, 27.4).with_oil_temp(88.0));
    }

    #[test]
    fn empty_batch_yields_empty_output() {
        let cfg = EngineConfig::default();
        assert!(evaluate_batch(&[], &cfg, Language::Primary).unwrap().is_empty());
        assert!(evaluate_each(&[], &cfg, Language::Primary).is_empty());
    }

    #[test]
    fn batch_preserves_input_order() {
        let readings = vec![
            reading("a", 10.0, 1.0),
            reading("b", 110.0, 1.0),
            reading("c", 10.0, 30.0),
        ];
        let out = evaluate_batch(&readings, &EngineConfig::default(), Language::Primary).unwrap();
        let ids: Vec<_> = out.iter().map(|d| d.reading_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn fail_fast_batch_stops_on_the_first_invalid_reading() {
        let readings = vec![
            reading("ok", 10.0, 1.0),
            reading("bad", 10.0, -1.0),
            reading("worse", f64::NAN, 1.0),
        ];
        let err = evaluate_batch(&readings, &EngineConfig::default(), Language::Primary).unwrap_err();
        assert_eq!(err.reading_id(), "bad");
    }

    #[test]
    fn collect_all_batch_keeps_neighbours_of_a_bad_reading() {
        let readings = vec![
            reading("ok-1", 10.0, 1.0),
            reading("bad", 10.0, -1.0),
            reading("ok-2", 120.0, 1.0),
        ];
        let out = evaluate_each(&readings, &EngineConfig::default(), Language::Primary);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_ref().unwrap().reading_id, "ok-1");
        assert_eq!(out[1].as_ref().unwrap_err().reading_id(), "bad");
        assert_eq!(out[2].as_ref().unwrap().priority, Priority::High);
    }

    #[test]
    fn ranking_is_stable_within_tiers() {
        let ranked = rank_by_priority(vec![
            diagnosis("a", Priority::High),
            diagnosis("b", Priority::Normal),
            diagnosis("c", Priority::High),
            diagnosis("d", Priority::Normal),
        ]);
        let ids: Vec<_> = ranked.iter().map(|d| d.reading_id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b", "d"]);
    }

    #[test]
    fn ranking_by_key_orders_reading_pairs() {
        let mut pairs = vec![
            (1, diagnosis("n1", Priority::Normal)),
            (2, diagnosis("h1", Priority::High)),
            (3, diagnosis("n2", Priority::Normal)),
            (4, diagnosis("h2", Priority::High)),
        ];
        rank_by_priority_key(&mut pairs, |(_, d)| d.priority);
        let order: Vec<_> = pairs.iter().map(|(n, _)| *n).collect();
        assert_eq!(order, [2, 4, 1, 3]);
    }

    #[test]
    fn concurrent_evaluation_matches_sequential() {
        let readings: Vec<Reading> = (0..64)
            .map(|i| reading(&format!("TR-{i}"), 40.0 + i as f64, (i % 40) as f64))
            .collect();
        let cfg = EngineConfig::default();
        let sequential = evaluate_batch(&readings, &cfg, Language::Secondary).unwrap();

        let cfg_ref = &cfg;
        let parallel: Vec<Diagnosis> = std::thread::scope(|s| {
            let handles: Vec<_> = readings
                .chunks(16)
                .map(|chunk| s.spawn(move || evaluate_batch(chunk, cfg_ref, Language::Secondary)))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap().unwrap())
                .collect()
        });

        assert_eq!(sequential, parallel);
    }
}
