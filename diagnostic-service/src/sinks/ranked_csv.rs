use std::{fs::File, io, path::PathBuf};

use diagnostic_engine::{
    evaluate_batch, evaluate_each, rank_by_priority_key, summarize, Diagnosis, EngineConfig,
    FleetSummary, Language, Priority, Reading,
};
use futures::StreamExt;
use tokio::sync::{oneshot, Mutex};

use crate::pipeline::{BatchPolicy, Envelope, PipelineError, Sink};

/// Outcome of one export run, handed back to the caller once the sink finishes.
#[derive(Debug)]
pub struct DiagnosticReport {
    /// Every evaluated reading, ranked HIGH first. Not filtered.
    pub ranked: Vec<(Reading, Diagnosis)>,
    /// The same readings in the order the source produced them.
    pub in_input_order: Vec<Reading>,
    pub rejected: Vec<PipelineError>,
    pub summary: FleetSummary,
    pub exported_rows: usize,
}

/// Evaluates every reading, ranks the results and writes the mission list as CSV.
pub struct RankedCsvSink {
    path: PathBuf,
    config: EngineConfig,
    language: Language,
    policy: BatchPolicy,
    high_priority_only: bool,
    report_tx: Mutex<Option<oneshot::Sender<DiagnosticReport>>>,
}

impl RankedCsvSink {
    pub fn new<P: Into<PathBuf>>(
        path: P,
        config: EngineConfig,
        language: Language,
        policy: BatchPolicy,
        high_priority_only: bool,
    ) -> (Self, oneshot::Receiver<DiagnosticReport>) {
        let (tx, rx) = oneshot::channel();
        let sink = Self {
            path: path.into(),
            config,
            language,
            policy,
            high_priority_only,
            report_tx: Mutex::new(Some(tx)),
        };
        (sink, rx)
    }

    fn diagnose(
        &self,
        readings: Vec<Reading>,
        rejected: &mut Vec<PipelineError>,
    ) -> Result<Vec<(Reading, Diagnosis)>, PipelineError> {
        match self.policy {
            BatchPolicy::FailFast => {
                let diagnoses = evaluate_batch(&readings, &self.config, self.language)?;
                Ok(readings.into_iter().zip(diagnoses).collect())
            }
            BatchPolicy::CollectErrors => {
                let results = evaluate_each(&readings, &self.config, self.language);
                let mut pairs = Vec::with_capacity(readings.len());
                for (reading, result) in readings.into_iter().zip(results) {
                    match result {
                        Ok(d) => pairs.push((reading, d)),
                        Err(e) => {
                            tracing::warn!(reading_id = %e.reading_id(), error = %e, "reading rejected by engine");
                            metrics::counter!("diagnostic_rejected_readings_total").increment(1);
                            rejected.push(e.into());
                        }
                    }
                }
                Ok(pairs)
            }
        }
    }
}

#[derive(serde::Serialize)]
struct ExportRow<'a> {
    rank: usize,
    reading_id: &'a str,
    region: &'static str,
    load_pct: f64,
    loss_pct: f64,
    oil_temp_c: Option<f64>,
    priority: &'static str,
    conditions: String,
    narrative: &'a str,
    fingerprint: String,
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    let len = s.len() as u32;
    hasher.update(&len.to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Content digest of a diagnosis. Identical diagnoses hash identically.
pub fn diagnosis_fingerprint(d: &Diagnosis) -> String {
    let mut h = blake3::Hasher::new();
    hash_str(&mut h, &d.reading_id);
    h.update(&(d.triggered_conditions.len() as u32).to_le_bytes());
    for tag in &d.triggered_conditions {
        hash_str(&mut h, tag.as_str());
    }
    hash_str(&mut h, d.priority.as_str());
    hash_str(&mut h, &d.narrative);
    h.finalize().to_hex().to_string()
}

/// Write ranked pairs in the order given. Returns the number of rows written.
pub fn write_ranked_csv<'a, W: io::Write>(
    writer: W,
    rows: impl IntoIterator<Item = &'a (Reading, Diagnosis)>,
) -> Result<usize, PipelineError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut written = 0;

    for (reading, diagnosis) in rows {
        written += 1;
        let conditions: Vec<&str> = diagnosis.triggered_conditions.iter().map(|t| t.as_str()).collect();
        wtr.serialize(ExportRow {
            rank: written,
            reading_id: &reading.id,
            region: reading.region.name(),
            load_pct: reading.load_pct,
            loss_pct: reading.loss_pct,
            oil_temp_c: reading.oil_temp_c,
            priority: diagnosis.priority.as_str(),
            conditions: conditions.join(";"),
            narrative: &diagnosis.narrative,
            fingerprint: diagnosis_fingerprint(diagnosis),
        })
        .map_err(|e| PipelineError::Sink(format!("failed to write export row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| PipelineError::Sink(format!("failed to flush export: {e}")))?;
    Ok(written)
}

#[async_trait::async_trait]
impl Sink<Reading> for RankedCsvSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<Reading>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut readings = Vec::new();
        let mut rejected = Vec::new();

        while let Some(item) = input.next().await {
            match item {
                Ok(env) => readings.push(env.payload),
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, "source failed, nothing exported");
                    return Err(e);
                }
                Err(e) if self.policy == BatchPolicy::FailFast => {
                    tracing::error!(error = %e, "invalid input, halting batch");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping rejected reading");
                    metrics::counter!("diagnostic_rejected_readings_total").increment(1);
                    rejected.push(e);
                }
            }
        }

        let mut pairs = self.diagnose(readings, &mut rejected)?;
        let in_input_order: Vec<Reading> = pairs.iter().map(|(r, _)| r.clone()).collect();
        rank_by_priority_key(&mut pairs, |(_, d)| d.priority);
        let summary = summarize(pairs.iter().map(|(r, d)| (r, d)));

        let file = File::create(&self.path)
            .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", self.path.display())))?;
        let exported_rows = write_ranked_csv(
            file,
            pairs
                .iter()
                .filter(|(_, d)| !self.high_priority_only || d.priority == Priority::High),
        )?;
        metrics::counter!("diagnostic_export_rows_total").increment(exported_rows as u64);

        tracing::info!(
            path = %self.path.display(),
            exported_rows,
            evaluated = pairs.len(),
            rejected = rejected.len(),
            high_priority = summary.high_priority,
            "ranked diagnostics exported"
        );

        if let Some(tx) = self.report_tx.lock().await.take() {
            // Receiver may have been dropped by a caller that only wants the file.
            let _ = tx.send(DiagnosticReport {
                ranked: pairs,
                in_input_order,
                rejected,
                summary,
                exported_rows,
            });
        }

        Ok(())
    }
}
