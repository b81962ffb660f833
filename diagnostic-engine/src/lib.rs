pub mod advisory;
pub mod domain;
pub mod engine;
pub mod error;
pub mod locale;
pub mod summary;

pub use domain::{ConditionTag, Diagnosis, Priority, Reading, Region};
pub use engine::{
    evaluate, evaluate_batch, evaluate_each, rank_by_priority, rank_by_priority_key,
    validate_reading, CustomRule, EngineConfig, Metric,
};
pub use error::{ConfigError, EngineError};
pub use locale::{Labels, Language};
pub use summary::{summarize, FleetSummary};
pub use advisory::{load_shedding, storage_advice, ShedAdvice, StorageAdvice};
