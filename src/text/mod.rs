//! Text stages: fusion, consolidation, report generation and the
//! contamination filters they share.

pub mod consolidate;
pub mod filters;
pub mod fusion;
pub mod generator;
pub mod report;

pub use consolidate::ConsolidationEngine;
pub use fusion::FusionEngine;
pub use generator::{ChatCompletionGenerator, GenerationError, MockGenerator, TextGenerator};
pub use report::{MedicalReport, ReportGenerator, ReportSection};
