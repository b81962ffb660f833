use std::collections::BTreeMap;

use crate::domain::{ConditionTag, Diagnosis, Priority, Reading};

/// Fleet-level KPIs over evaluated readings.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FleetSummary {
    pub readings: usize,
    /// `None` for an empty fleet.
    pub mean_loss_pct: Option<f64>,
    pub high_priority: usize,
    pub condition_counts: BTreeMap<ConditionTag, usize>,
}

impl FleetSummary {
    pub fn count(&self, tag: &ConditionTag) -> usize {
        self.condition_counts.get(tag).copied().unwrap_or(0)
    }
}

pub fn summarize<'a>(pairs: impl IntoIterator<Item = (&'a Reading, &'a Diagnosis)>) -> FleetSummary {
    let mut summary = FleetSummary::default();
    let mut loss_total = 0.0;

    for (reading, diagnosis) in pairs {
        summary.readings += 1;
        loss_total += reading.loss_pct;
        if diagnosis.priority == Priority::High {
            summary.high_priority += 1;
        }
        for tag in &diagnosis.triggered_conditions {
            *summary.condition_counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    if summary.readings > 0 {
        summary.mean_loss_pct = Some(loss_total / summary.readings as f64);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluate, EngineConfig, Language, Region};

    #[test]
    fn summary_counts_conditions_and_averages_loss() {
        let cfg = EngineConfig::default();
        let readings = vec![
            Reading::new("a", Region::Sava, 105.0, 30.0),
            Reading::new("b", Region::Diana, 50.0, 10.0),
            Reading::new("c", Region::Boeny, 110.0, 5.0),
        ];
        let diagnoses: Vec<_> = readings
            .iter()
            .map(|r| evaluate(r, &cfg, Language::Primary).unwrap())
            .collect();

        let s = summarize(readings.iter().zip(diagnoses.iter()));
        assert_eq!(s.readings, 3);
        assert_eq!(s.high_priority, 2);
        assert_eq!(s.count(&ConditionTag::Overload), 2);
        assert_eq!(s.count(&ConditionTag::FraudSuspected), 1);
        assert_eq!(s.count(&ConditionTag::Overheating), 0);
        assert_eq!(s.mean_loss_pct, Some(15.0));
    }

    #[test]
    fn empty_fleet_has_no_mean() {
        let s = summarize(std::iter::empty());
        assert_eq!(s.readings, 0);
        assert_eq!(s.mean_loss_pct, None);
    }
}
