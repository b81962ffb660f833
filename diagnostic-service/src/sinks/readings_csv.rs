use std::{fs::File, path::PathBuf};

use diagnostic_engine::Reading;
use futures::StreamExt;

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Writes readings back out in the format `ReadingsFileSource::csv` reads.
pub struct ReadingsCsvSink {
    path: PathBuf,
}

impl ReadingsCsvSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[derive(serde::Serialize)]
struct ReadingRow<'a> {
    id: &'a str,
    region: &'static str,
    load_pct: f64,
    loss_pct: f64,
    oil_temp_c: Option<f64>,
}

#[async_trait::async_trait]
impl Sink<Reading> for ReadingsCsvSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<Reading>, PipelineError>> + Send + Unpin + 'static,
    {
        let file = File::create(&self.path)
            .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", self.path.display())))?;
        let mut wtr = csv::Writer::from_writer(file);
        let mut written: u64 = 0;

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!(error = %e, "error in upstream pipeline for ReadingsCsvSink");
                    continue;
                }
            };

            let r = &env.payload;
            wtr.serialize(ReadingRow {
                id: &r.id,
                region: r.region.name(),
                load_pct: r.load_pct,
                loss_pct: r.loss_pct,
                oil_temp_c: r.oil_temp_c,
            })
            .map_err(|e| PipelineError::Sink(format!("failed to write reading row: {e}")))?;
            written += 1;
        }

        wtr.flush()
            .map_err(|e| PipelineError::Sink(format!("failed to flush readings: {e}")))?;
        tracing::info!(path = %self.path.display(), written, "readings written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pipeline::{collect, Source},
        sources::{ReadingsFileSource, SimulatedFleetSource},
    };

    #[tokio::test]
    async fn written_readings_read_back_unchanged() {
        let path = std::env::temp_dir().join(format!("fleet-{}.csv", std::process::id()));
        let source = SimulatedFleetSource::new(5, 3, true);
        let expected = source.generate().unwrap();

        ReadingsCsvSink::new(&path).run(source.stream().await).await.unwrap();

        let back: Vec<Reading> = collect(&ReadingsFileSource::csv(&path), &[])
            .await
            .into_iter()
            .map(|item| item.unwrap().payload)
            .collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(back, expected);
    }
}
