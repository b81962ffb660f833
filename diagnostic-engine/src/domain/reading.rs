use std::{fmt, str::FromStr};

use crate::error::{EngineError, ParseRegionError};

/// Distribution regions a transformer can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Region {
    Analamanga,
    Atsinanana,
    Diana,
    Boeny,
    Sava,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Analamanga,
        Region::Atsinanana,
        Region::Diana,
        Region::Boeny,
        Region::Sava,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Region::Analamanga => "Analamanga",
            Region::Atsinanana => "Atsinanana",
            Region::Diana => "Diana",
            Region::Boeny => "Boeny",
            Region::Sava => "Sava",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseRegionError(trimmed.to_string()))
    }
}

impl TryFrom<String> for Region {
    type Error = ParseRegionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(r: Region) -> Self {
        r.name().to_string()
    }
}

/// One transformer's load/loss/temperature snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    pub id: String,
    pub region: Region,
    pub load_pct: f64,
    pub loss_pct: f64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub oil_temp_c: Option<f64>,
}

impl Reading {
    pub fn new(id: impl Into<String>, region: Region, load_pct: f64, loss_pct: f64) -> Self {
        Self {
            id: id.into(),
            region,
            load_pct,
            loss_pct,
            oil_temp_c: None,
        }
    }

    pub fn with_oil_temp(mut self, oil_temp_c: f64) -> Self {
        self.oil_temp_c = Some(oil_temp_c);
        self
    }

    /// Build a reading from metered output and billed energy.
    ///
    /// `loss_pct = (1 - billed / output) * 100`, rounded to one decimal place.
    /// Billing more than the transformer delivered is rejected rather than
    /// clamped.
    pub fn from_energy(
        id: impl Into<String>,
        region: Region,
        output_kwh: f64,
        billed_kwh: f64,
        load_pct: f64,
        oil_temp_c: Option<f64>,
    ) -> Result<Self, EngineError> {
        let id = id.into();

        if !output_kwh.is_finite() || output_kwh <= 0.0 {
            return Err(EngineError::invalid(id, "output_kwh must be a positive number"));
        }
        if !billed_kwh.is_finite() || billed_kwh < 0.0 {
            return Err(EngineError::invalid(id, "billed_kwh must be a non-negative number"));
        }
        if billed_kwh > output_kwh {
            return Err(EngineError::invalid(id, "billed_kwh exceeds output_kwh"));
        }

        let loss_pct = round_one_decimal((1.0 - billed_kwh / output_kwh) * 100.0);

        Ok(Self {
            id,
            region,
            load_pct,
            loss_pct,
            oil_temp_c,
        })
    }
}

pub(crate) fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
