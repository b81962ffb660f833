use diagnostic_engine::{validate_reading, Reading};

use crate::pipeline::{Envelope, PipelineError, Transform};

/// Boundary check of a `Reading` before it reaches the engine.
///
/// Rules (shared with the engine itself):
/// - load_pct and loss_pct must be finite and non-negative.
/// - oil_temp_c, when present, must be finite.
pub fn validate(env: Envelope<Reading>) -> Result<Envelope<Reading>, PipelineError> {
    validate_reading(&env.payload)?;
    Ok(env)
}

#[derive(Clone, Default)]
pub struct ReadingValidation;

#[async_trait::async_trait]
impl Transform<Reading, Reading> for ReadingValidation {
    async fn apply(&self, input: Envelope<Reading>) -> Result<Envelope<Reading>, PipelineError> {
        match validate(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_reading_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
