pub mod config;
pub mod discovery;
pub mod error;
pub mod merger;
pub mod output;
pub mod parser;
pub mod stats;

pub use config::ExportFormat;
pub use discovery::{load_directory, load_directory_concurrent};
pub use error::RubricError;
pub use merger::compile;
pub use merger::types::{
    CompiledTable, MergedRow, MergedTable, ProblemName, ProblemTable, Report, Sid, StudentRecord,
};
