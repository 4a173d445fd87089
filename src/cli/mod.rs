//! CLI implementation using clap.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::core::RepositoryMetadata;

/// Mend - automated program repair for C-family codebases.
#[derive(Parser)]
#[command(name = "mend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the repository to repair
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// Path to the SBFL results JSON
    #[arg(long)]
    pub sbfl_json: PathBuf,

    /// Path to the historical mutation-frequency JSON
    #[arg(long)]
    pub freq_json: PathBuf,

    /// Build command to compile the project under test
    #[arg(long)]
    pub build: String,

    /// Test command (ctest or a gtest-style binary)
    #[arg(long)]
    pub test: String,

    /// Name of an originally failing test; repeatable
    #[arg(long = "failing-test")]
    pub failing_tests: Vec<String>,

    /// Source file to consider; repeatable. Defaults to the C-family files
    /// under <repo>/src
    #[arg(long = "source")]
    pub sources: Vec<String>,

    /// Directory to store results
    #[arg(long, default_value = "mend-results")]
    pub output_dir: PathBuf,

    /// Maximum number of candidates to validate
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Wall-clock budget for validation, in minutes
    #[arg(long)]
    pub time_budget: Option<u64>,

    /// Keep validating after the first passing candidate
    #[arg(long)]
    pub no_early_exit: bool,

    /// Repository URL, informational only
    #[arg(long, default_value = "")]
    pub repo_url: String,

    /// Branch name, informational only
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Commit hash, informational only
    #[arg(long, default_value = "")]
    pub commit: String,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build repository metadata from the parsed arguments, discovering
    /// source files when none were given explicitly.
    pub fn repository_metadata(&self) -> RepositoryMetadata {
        let source_files = if self.sources.is_empty() {
            discover_source_files(&self.repo)
        } else {
            self.sources.clone()
        };

        RepositoryMetadata {
            repo_path: self.repo.clone(),
            repository_url: self.repo_url.clone(),
            branch: self.branch.clone(),
            commit_hash: self.commit.clone(),
            source_files,
            build_script: self.build.clone(),
            test_script: self.test.clone(),
            failing_tests: self.failing_tests.clone(),
        }
    }
}

/// Collect the C-family sources under `<repo>/src`, repo-relative, sorted.
pub fn discover_source_files(repo: &Path) -> Vec<String> {
    let src = repo.join("src");
    let Ok(entries) = std::fs::read_dir(&src) else {
        return Vec::new();
    };

    let mut files: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| matches!(ext, "c" | "cc" | "cpp" | "cxx"))
        })
        .filter_map(|path| {
            path.strip_prefix(repo)
                .ok()
                .map(|rel| rel.to_string_lossy().into_owned())
        })
        .collect();
    files.sort();
    files
}
