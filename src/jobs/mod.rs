// Batch job exports
pub mod geocode;

pub use geocode::{GeocodeJob, JobError, JobOptions, JobReport};
