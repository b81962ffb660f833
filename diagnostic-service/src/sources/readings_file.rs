use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use diagnostic_engine::{EngineError, Reading};

use super::{parse_region, RawReading};
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Delimited-file source for `Reading`.
///
/// Expected header columns (by name):
/// - id
/// - region
/// - load_pct
/// - loss_pct (optional when output_kwh and billed_kwh are given)
/// - oil_temp_c (optional)
/// - output_kwh, billed_kwh (optional)
///
/// `.csv` files use `,`; `.dat` exports use `|`.
pub struct ReadingsFileSource {
    path: PathBuf,
    delimiter: u8,
}

impl ReadingsFileSource {
    pub fn csv<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn dat<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            delimiter: b'|',
        }
    }
}

fn parse_optional_f64(id: &str, name: &str, raw: Option<&str>) -> Result<Option<f64>, PipelineError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|e| {
            EngineError::invalid(id, format!("{name} '{s}' is not a number: {e}")).into()
        }),
    }
}

fn record_to_reading(record: &StringRecord, headers: &StringRecord) -> Result<Reading, PipelineError> {
    let get = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| record.get(idx))
    };

    let id = get("id")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::Source("missing column 'id' in readings record".to_string()))?
        .to_string();

    let region_str = get("region")
        .ok_or_else(|| PipelineError::Source(format!("reading '{id}': missing column 'region'")))?;
    let region = parse_region(&id, region_str)?;

    let raw = RawReading {
        load_pct: parse_optional_f64(&id, "load_pct", get("load_pct"))?,
        loss_pct: parse_optional_f64(&id, "loss_pct", get("loss_pct"))?,
        oil_temp_c: parse_optional_f64(&id, "oil_temp_c", get("oil_temp_c"))?,
        output_kwh: parse_optional_f64(&id, "output_kwh", get("output_kwh"))?,
        billed_kwh: parse_optional_f64(&id, "billed_kwh", get("billed_kwh"))?,
        id,
        region,
    };

    Reading::try_from(raw)
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingsFileSource {
    async fn stream(&self) -> EnvelopeStream<Reading> {
        // Blocking CSV reader inside a single async task; readings files are small.
        let path = self.path.clone();
        let delimiter = self.delimiter;
        let s = async_stream::stream! {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::SourceUnavailable(format!(
                        "failed to open readings file {}: {e}",
                        path.display()
                    )));
                    return;
                }
            };
            let mut rdr = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .from_reader(file);
            let headers = match rdr.headers() {
                Ok(h) => h.clone(),
                Err(e) => {
                    yield Err(PipelineError::SourceUnavailable(format!("failed to read headers: {e}")));
                    return;
                }
            };

            for result in rdr.records() {
                let item = result
                    .map_err(|e| PipelineError::Source(format!("failed to read record: {e}")))
                    .and_then(|record| record_to_reading(&record, &headers));

                if item.is_err() {
                    metrics::counter!("reading_source_parse_errors_total").increment(1);
                }

                yield item.map(Envelope::new);
            }
        };

        Box::pin(s)
    }
}
