//! JSON serialization of progress reports.
//!
//! # Example
//!
//! ```rust
//! use roadmap_report::{DayInput, ReportGenerator, ReportInput};
//! use roadmap_report::json::JsonGenerator;
//!
//! let input = ReportInput {
//!     days: vec![DayInput { day: 1, week: 1, ..DayInput::default() }],
//!     ..ReportInput::default()
//! };
//! let report = ReportGenerator::new(&input).generate().unwrap();
//! let generator = JsonGenerator::new(&report);
//!
//! // Compact JSON has no newlines
//! assert!(!generator.generate().unwrap().contains('\n'));
//!
//! // Write to file
//! // generator.write_to_file(Path::new("roadmap-report.json"), true).unwrap();
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::{ProgressReport, ReportError, Result};

/// JSON report generator.
pub struct JsonGenerator<'a> {
    report: &'a ProgressReport,
}

impl<'a> JsonGenerator<'a> {
    /// Creates a new JSON generator for the given report.
    #[must_use]
    pub const fn new(report: &'a ProgressReport) -> Self {
        Self { report }
    }

    /// Generates compact single-line JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.report).map_err(ReportError::from)
    }

    /// Generates pretty-printed JSON with 2-space indentation.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.report).map_err(ReportError::from)
    }

    /// Writes the JSON report to a file, creating or overwriting it.
    ///
    /// Parent directories must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    /// Returns [`ReportError::Io`] if file creation or writing fails.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}
