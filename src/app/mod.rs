pub mod cast;
pub mod report;
