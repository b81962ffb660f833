pub mod diagnosis;
pub mod reading;

pub use diagnosis::{ConditionTag, Diagnosis, Priority};
pub use reading::{Reading, Region};
