//! Mend - automated program repair for C-family codebases.
//!
//! Given SBFL suspiciousness scores, a historical mutation-frequency table,
//! and a build+test harness, mend proposes single-line patches and validates
//! them in two phases: first against the originally failing tests, then
//! against the full suite.
//!
//! # Example
//!
//! ```no_run
//! use mend::core::RepositoryMetadata;
//! use mend::mutate::HistoricalFreqs;
//! use mend::pipeline::Pipeline;
//! use mend::validate::ValidationConfig;
//!
//! let repo = RepositoryMetadata {
//!     repo_path: "checkout".into(),
//!     source_files: vec!["src/list.cpp".to_string()],
//!     build_script: "cmake --build build".to_string(),
//!     test_script: "ctest".to_string(),
//!     failing_tests: vec!["test_remove".to_string()],
//!     ..Default::default()
//! };
//!
//! let freqs = HistoricalFreqs::load("freq.json").unwrap();
//! let pipeline = Pipeline::standard("src/", freqs, ValidationConfig::default());
//! let state = pipeline.run(&repo, "sbfl.json".as_ref()).unwrap();
//! println!("validated fixes: {}", state.validated_fix_count());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod extract;
pub mod fault;
pub mod mutate;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod prioritize;
pub mod validate;

pub use extract::Extractor;
pub use fault::SbflReader;
pub use mutate::MutationEngine;
pub use pipeline::{Pipeline, SystemState};
pub use prioritize::Prioritizer;
