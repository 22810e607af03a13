pub mod grader;
pub mod odds_ingest;
pub mod standings;

pub use grader::*;
pub use odds_ingest::{refresh_week, WeekSlate};
pub use standings::*;
