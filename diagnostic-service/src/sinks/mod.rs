pub mod ranked_csv;
pub mod readings_csv;

pub use ranked_csv::{DiagnosticReport, RankedCsvSink};
pub use readings_csv::ReadingsCsvSink;
