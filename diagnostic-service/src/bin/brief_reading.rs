use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use diagnostic_engine::{evaluate, Language, Reading};
use diagnostic_service::{
    audit::{AuditAction, AuditLog},
    briefing,
    config::AppConfig,
    observability,
    pipeline::{self, Transform},
    sources::ReadingSource,
    transform::ReadingValidation,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: brief_reading <readings_file> <reading_id> [lang]");
    }
    let readings_path = &args[1];
    let reading_id = &args[2];

    // Thresholds, operator and audit file come from DIAGNOSTIC_CONFIG when it is set.
    let cfg = match env::var("DIAGNOSTIC_CONFIG") {
        Ok(_) => Some(AppConfig::load()?),
        Err(_) => None,
    };
    let engine = cfg.as_ref().map(|c| c.engine.clone()).unwrap_or_default();
    let language = args
        .get(3)
        .map(|code| Language::from_code(code))
        .or(cfg.as_ref().map(|c| c.language))
        .unwrap_or_default();

    let source = ReadingSource::for_path(readings_path);
    let transforms: Vec<Arc<dyn Transform<Reading, Reading> + Send + Sync>> =
        vec![Arc::new(ReadingValidation::default())];

    let mut found = None;
    for item in pipeline::collect(&source, &transforms).await {
        match item {
            Ok(env) if &env.payload.id == reading_id => {
                found = Some(env.payload);
                break;
            }
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => tracing::warn!(error = %e, "skipping rejected reading"),
        }
    }
    let reading =
        found.ok_or_else(|| anyhow!("reading '{reading_id}' not found in {readings_path}"))?;

    let diagnosis = evaluate(&reading, &engine, language)?;
    println!("{}", briefing::script(&reading, &diagnosis, language));

    let operator = cfg.as_ref().map_or("operator", |c| c.operator.as_str());
    let mut audit = AuditLog::new();
    audit.record(operator, AuditAction::Narration, reading.id.clone());
    if let Some(path) = cfg.as_ref().and_then(|c| c.audit.path.as_ref()) {
        audit.append_to(path)?;
    }

    Ok(())
}
