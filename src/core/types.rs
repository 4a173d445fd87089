//! Shared pipeline types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A source line flagged by spectrum-based fault localization.
///
/// Produced by the fault reader, sorted by descending score. Immutable once
/// built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousLocation {
    /// Repository-relative path of the flagged file.
    pub file_path: String,
    /// 1-indexed line number.
    pub line_number: u32,
    /// Enclosing function, when the SBFL tool reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Suspiciousness in [0, 1].
    pub suspiciousness_score: f64,
    /// Free-form reason from the localizer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Repository under repair, with opaque build and test commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Root of the checked-out working tree.
    pub repo_path: PathBuf,
    /// Upstream URL, informational only.
    pub repository_url: String,
    /// Branch name, informational only.
    pub branch: String,
    /// Commit hash, informational only.
    pub commit_hash: String,
    /// Source files considered for extraction and mutation.
    pub source_files: Vec<String>,
    /// Opaque shell command that builds the tree.
    pub build_script: String,
    /// Opaque shell command (or test binary) that runs the suite.
    /// A command starting with `ctest` switches the validator to CTest mode.
    pub test_script: String,
    /// Names of the originally failing tests; becomes `affected_tests` on
    /// every generated patch and drives Phase A filtering.
    pub failing_tests: Vec<String>,
}
