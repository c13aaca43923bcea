pub mod aggregate;
pub mod chart;
pub mod model;
pub mod render;
pub mod section;
pub mod store;

pub use model::{BenchmarkRecord, RecordSet};
pub use store::{ApiClient, LoadError};
