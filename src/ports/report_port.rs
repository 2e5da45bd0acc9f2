//! Report output port trait.

use crate::domain::analysis::AnalysisReport;
use crate::domain::error::BasketError;
use std::path::{Path, PathBuf};

/// Port for writing an analysis to disk.
pub trait ReportPort {
    /// Writes the report under `output_dir` and returns the files created.
    fn write(&self, report: &AnalysisReport, output_dir: &Path)
    -> Result<Vec<PathBuf>, BasketError>;
}
