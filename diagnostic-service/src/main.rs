use std::sync::Arc;

use anyhow::Result;
use diagnostic_engine::{advisory, ConditionTag, Reading};
use diagnostic_service::{
    audit::{AuditAction, AuditLog},
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::RankedCsvSink,
    sources::ReadingSource,
    transform,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;
    let language = cfg.language;

    let source = ReadingSource::from_config(&cfg.source)?;
    let (sink, report_rx) = RankedCsvSink::new(
        &cfg.export.path,
        cfg.engine.clone(),
        language,
        cfg.batch.policy,
        cfg.export.high_priority_only,
    );

    let pipeline: Pipeline<_, Reading, _> = Pipeline {
        source,
        transforms: vec![Arc::new(transform::ReadingValidation::default())],
        sink,
    };
    pipeline.run().await?;

    let report = report_rx.await?;
    let summary = &report.summary;
    tracing::info!(
        readings = summary.readings,
        mean_loss_pct = summary.mean_loss_pct.unwrap_or(0.0),
        high_priority = summary.high_priority,
        fraud_suspected = summary.count(&ConditionTag::FraudSuspected),
        overload = summary.count(&ConditionTag::Overload),
        overheating = summary.count(&ConditionTag::Overheating),
        rejected = report.rejected.len(),
        "fleet summary"
    );

    let advice = advisory::load_shedding(&report.in_input_order, cfg.advisory.shed_target_pct);
    if advice.is_empty() {
        tracing::info!("{}", advisory::no_action_message(language));
    }
    for a in &advice {
        tracing::info!(reading_id = %a.reading_id, shed_pct = a.shed_pct, "{}", a.message(language));
    }
    if let Some(irradiance) = cfg.advisory.irradiance_w_m2 {
        let storage = advisory::storage_advice(irradiance);
        tracing::info!(irradiance_w_m2 = irradiance, "{}", storage.message(language));
    }

    let mut audit = AuditLog::new();
    audit.record(
        &cfg.operator,
        AuditAction::Export,
        cfg.export.path.display().to_string(),
    );
    if let Some(path) = &cfg.audit.path {
        audit.append_to(path)?;
    }

    Ok(())
}
