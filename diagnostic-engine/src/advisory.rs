use crate::{
    domain::{Reading, Region},
    locale::Language,
};

pub const DEFAULT_SHED_TARGET_PCT: f64 = 90.0;

/// Irradiance above which solar output exceeds what the grid absorbs.
pub const SURPLUS_IRRADIANCE_W_M2: f64 = 700.0;
/// Surplus power per W/m² above the cutoff.
pub const SURPLUS_KW_PER_W_M2: f64 = 10.0;
pub const STORAGE_WINDOW_HOURS: f64 = 24.0;

/// Load to shed (or cover from battery storage) to bring a transformer back to target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShedAdvice {
    pub reading_id: String,
    pub region: Region,
    pub shed_pct: f64,
}

impl ShedAdvice {
    pub fn message(&self, language: Language) -> String {
        match language {
            Language::Primary => format!(
                "{} ({}) : délester de {:.1}% ou injecter batterie.",
                self.reading_id, self.region, self.shed_pct
            ),
            Language::Secondary => format!(
                "{} ({}): shed {:.1}% load or inject battery.",
                self.reading_id, self.region, self.shed_pct
            ),
        }
    }
}

pub fn no_action_message(language: Language) -> &'static str {
    match language {
        Language::Primary => "Aucune action urgente requise.",
        Language::Secondary => "No urgent actions required.",
    }
}

/// Advice for every reading loaded strictly above `target_pct`, in input order.
pub fn load_shedding(readings: &[Reading], target_pct: f64) -> Vec<ShedAdvice> {
    readings
        .iter()
        .filter(|r| r.load_pct.is_finite() && r.load_pct > target_pct)
        .map(|r| ShedAdvice {
            reading_id: r.id.clone(),
            region: r.region,
            shed_pct: r.load_pct - target_pct,
        })
        .collect()
}

/// Battery storage plan for the current solar irradiance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StorageAdvice {
    /// Solar surplus goes to the backup batteries.
    Charge { surplus_kw: f64, stored_kwh: f64 },
    /// Not enough sun: draw on the batteries to avoid shedding.
    UseReserves,
}

impl StorageAdvice {
    pub fn message(&self, language: Language) -> String {
        match (self, language) {
            (StorageAdvice::Charge { surplus_kw, stored_kwh }, Language::Primary) => format!(
                "Surproduction solaire : {surplus_kw:.0} kW en cours de stockage \
                 ({stored_kwh:.0} kWh sur 24 h). Chargement des batteries de secours."
            ),
            (StorageAdvice::Charge { surplus_kw, stored_kwh }, Language::Secondary) => format!(
                "Solar surplus: {surplus_kw:.0} kW being stored \
                 ({stored_kwh:.0} kWh over 24 h). Charging backup batteries."
            ),
            (StorageAdvice::UseReserves, Language::Primary) => {
                "Faible production. Utilisation des réserves pour éviter le délestage.".to_string()
            }
            (StorageAdvice::UseReserves, Language::Secondary) => {
                "Low production. Drawing on reserves to avoid load shedding.".to_string()
            }
        }
    }
}

/// Charge the batteries when irradiance is strictly above the surplus cutoff,
/// otherwise fall back on reserves. Non-finite irradiance counts as no sun.
pub fn storage_advice(irradiance_w_m2: f64) -> StorageAdvice {
    if irradiance_w_m2.is_finite() && irradiance_w_m2 > SURPLUS_IRRADIANCE_W_M2 {
        let surplus_kw = (irradiance_w_m2 - SURPLUS_IRRADIANCE_W_M2) * SURPLUS_KW_PER_W_M2;
        StorageAdvice::Charge {
            surplus_kw,
            stored_kwh: surplus_kw * STORAGE_WINDOW_HOURS,
        }
    } else {
        StorageAdvice::UseReserves
    }
}
