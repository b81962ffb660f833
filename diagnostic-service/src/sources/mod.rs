pub mod readings_file;
pub mod readings_ndjson_file;
pub mod simulated;

pub use readings_file::ReadingsFileSource;
pub use readings_ndjson_file::ReadingsNdjsonFileSource;
pub use simulated::SimulatedFleetSource;

use std::path::PathBuf;

use diagnostic_engine::{EngineError, Reading, Region};

use crate::{
    config::{SourceConfig, SourceKind},
    pipeline::{EnvelopeStream, PipelineError, Source},
};

/// Fields shared by every file format, before the reading is assembled.
pub(crate) struct RawReading {
    pub id: String,
    pub region: Region,
    pub load_pct: Option<f64>,
    pub loss_pct: Option<f64>,
    pub oil_temp_c: Option<f64>,
    pub output_kwh: Option<f64>,
    pub billed_kwh: Option<f64>,
}

impl TryFrom<RawReading> for Reading {
    type Error = PipelineError;

    /// `loss_pct` wins when present; otherwise it is derived from metered
    /// output and billed energy.
    fn try_from(raw: RawReading) -> Result<Self, Self::Error> {
        let load_pct = raw
            .load_pct
            .ok_or_else(|| EngineError::invalid(&raw.id, "load_pct is missing"))?;

        match (raw.loss_pct, raw.output_kwh, raw.billed_kwh) {
            (Some(loss_pct), _, _) => Ok(Reading {
                id: raw.id,
                region: raw.region,
                load_pct,
                loss_pct,
                oil_temp_c: raw.oil_temp_c,
            }),
            (None, Some(output), Some(billed)) => Ok(Reading::from_energy(
                raw.id,
                raw.region,
                output,
                billed,
                load_pct,
                raw.oil_temp_c,
            )?),
            (None, _, _) => Err(EngineError::invalid(raw.id, "loss_pct is missing").into()),
        }
    }
}

pub(crate) fn parse_region(id: &str, raw: &str) -> Result<Region, PipelineError> {
    raw.parse()
        .map_err(|e| PipelineError::Source(format!("reading '{id}': {e}")))
}

/// Source selected by `[source]` in the config file.
pub enum ReadingSource {
    File(ReadingsFileSource),
    Ndjson(ReadingsNdjsonFileSource),
    Simulated(SimulatedFleetSource),
}

impl ReadingSource {
    pub fn from_config(cfg: &SourceConfig) -> Result<Self, PipelineError> {
        let path = || {
            cfg.path
                .clone()
                .ok_or_else(|| PipelineError::Source(format!("{:?} source needs a path", cfg.kind)))
        };

        Ok(match cfg.kind {
            SourceKind::Csv => Self::File(ReadingsFileSource::csv(path()?)),
            SourceKind::Dat => Self::File(ReadingsFileSource::dat(path()?)),
            SourceKind::Ndjson => Self::Ndjson(ReadingsNdjsonFileSource::new(path()?)),
            SourceKind::Simulated => Self::Simulated(SimulatedFleetSource::new(
                cfg.simulated.count,
                cfg.simulated.seed,
                cfg.simulated.include_pilot,
            )),
        })
    }

    /// File source picked by extension: `.dat` is pipe-delimited, `.ndjson` and
    /// `.jsonl` are line-delimited JSON, anything else is read as CSV.
    pub fn for_path<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("dat") => Self::File(ReadingsFileSource::dat(path)),
            Some("ndjson") | Some("jsonl") => Self::Ndjson(ReadingsNdjsonFileSource::new(path)),
            _ => Self::File(ReadingsFileSource::csv(path)),
        }
    }
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingSource {
    async fn stream(&self) -> EnvelopeStream<Reading> {
        match self {
            Self::File(s) => s.stream().await,
            Self::Ndjson(s) => s.stream().await,
            Self::Simulated(s) => s.stream().await,
        }
    }
}
