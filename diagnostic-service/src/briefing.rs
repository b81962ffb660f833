use diagnostic_engine::{Diagnosis, Language, Reading};

/// Spoken report for one transformer. The narration layer reads it verbatim
/// using the voice for [`Language::code`].
pub fn script(reading: &Reading, diagnosis: &Diagnosis, language: Language) -> String {
    match language {
        Language::Primary => format!(
            "Transformateur {}. Région {}. Charge {} pourcent. Vol suspecté {} pourcent. Diagnostic : {}.",
            reading.id, reading.region, reading.load_pct, reading.loss_pct, diagnosis.narrative
        ),
        Language::Secondary => format!(
            "Transformer {}. Region {}. Load {} percent. Theft suspected {} percent. Diagnosis: {}.",
            reading.id, reading.region, reading.load_pct, reading.loss_pct, diagnosis.narrative
        ),
    }
}
