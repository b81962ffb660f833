use std::path::PathBuf;

use async_stream::stream;
use diagnostic_engine::Reading;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};

use super::{parse_region, RawReading};
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// NDJSON source for `Reading`, one object per line.
///
/// Numeric fields are optional in the wire shape so that a missing load or
/// loss surfaces as an invalid reading naming the transformer, rather than a
/// bare parse error.
pub struct ReadingsNdjsonFileSource {
    path: PathBuf,
}

#[derive(serde::Deserialize)]
struct IncomingReading {
    id: String,
    region: String,
    load_pct: Option<f64>,
    loss_pct: Option<f64>,
    oil_temp_c: Option<f64>,
    output_kwh: Option<f64>,
    billed_kwh: Option<f64>,
}

impl TryFrom<IncomingReading> for Reading {
    type Error = PipelineError;

    fn try_from(i: IncomingReading) -> Result<Self, Self::Error> {
        let region = parse_region(&i.id, &i.region)?;
        Reading::try_from(RawReading {
            id: i.id,
            region,
            load_pct: i.load_pct,
            loss_pct: i.loss_pct,
            oil_temp_c: i.oil_temp_c,
            output_kwh: i.output_kwh,
            billed_kwh: i.billed_kwh,
        })
    }
}

impl ReadingsNdjsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_line(line: &str) -> Result<Reading, PipelineError> {
    let incoming: IncomingReading = serde_json::from_str(line)
        .map_err(|e| PipelineError::Source(format!("failed to parse reading json line: {e}")))?;
    Reading::try_from(incoming)
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingsNdjsonFileSource {
    async fn stream(&self) -> EnvelopeStream<Reading> {
        let path = self.path.clone();
        let s = stream! {
            let file = match File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::SourceUnavailable(format!("failed to open readings file: {e}")));
                    return;
                }
            };
            let mut lines = BufReader::new(file).lines();

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(PipelineError::SourceUnavailable(format!("failed to read readings line: {e}")));
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let item = parse_line(&line);
                if item.is_err() {
                    metrics::counter!("reading_source_parse_errors_total").increment(1);
                }
                yield item.map(Envelope::new);
            }
        };

        Box::pin(s)
    }
}
