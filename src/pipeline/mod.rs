//! Pipeline orchestration.
//!
//! The six stages are wired by composition behind small capability traits;
//! data flows linearly with no back-edges, and the orchestrator
//! short-circuits with the partial state whenever a stage comes back empty.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::core::{Error, RepositoryMetadata, Result, SuspiciousLocation};
use crate::extract::{Extractor, SyntaxNode};
use crate::fault::SbflReader;
use crate::mutate::{HistoricalFreqs, MutationEngine, PatchCandidate};
use crate::prioritize::Prioritizer;
use crate::validate::{ValidationConfig, ValidationResult, Validator};

/// Reads SBFL output into ranked suspicious locations.
pub trait FaultReader {
    fn localize(&self, sbfl_json: &Path) -> Result<Vec<SuspiciousLocation>>;
}

/// Extracts context-bearing syntax nodes from source files.
pub trait NodeExtractor {
    fn extract(
        &self,
        source_files: &[String],
        locations: &[SuspiciousLocation],
    ) -> Result<Vec<SyntaxNode>>;
}

/// Generates patch candidates from extracted nodes.
pub trait PatchGenerator {
    fn generate(&self, nodes: &[SyntaxNode], failing_tests: &[String]) -> Vec<PatchCandidate>;
}

/// Scores and ranks patch candidates.
pub trait PatchRanker {
    fn prioritize(&self, candidates: Vec<PatchCandidate>) -> Vec<PatchCandidate>;
}

/// Applies, builds, and tests candidates.
pub trait PatchValidator {
    fn validate(
        &self,
        candidates: &[PatchCandidate],
        repo: &RepositoryMetadata,
    ) -> Vec<ValidationResult>;
}

impl FaultReader for SbflReader {
    fn localize(&self, sbfl_json: &Path) -> Result<Vec<SuspiciousLocation>> {
        self.read(sbfl_json)
    }
}

impl NodeExtractor for Extractor {
    fn extract(
        &self,
        source_files: &[String],
        locations: &[SuspiciousLocation],
    ) -> Result<Vec<SyntaxNode>> {
        Extractor::extract(self, source_files, locations)
    }
}

impl PatchGenerator for MutationEngine {
    fn generate(&self, nodes: &[SyntaxNode], failing_tests: &[String]) -> Vec<PatchCandidate> {
        MutationEngine::generate(self, nodes, failing_tests)
    }
}

impl PatchRanker for Prioritizer {
    fn prioritize(&self, candidates: Vec<PatchCandidate>) -> Vec<PatchCandidate> {
        Prioritizer::prioritize(self, candidates)
    }
}

impl PatchValidator for Validator {
    fn validate(
        &self,
        candidates: &[PatchCandidate],
        repo: &RepositoryMetadata,
    ) -> Vec<ValidationResult> {
        Validator::validate(self, candidates, repo)
    }
}

/// Everything one run produced; also the shape of the summary output.
#[derive(Debug, Clone, Serialize)]
pub struct SystemState {
    pub repo_metadata: RepositoryMetadata,
    pub suspicious_locations: Vec<SuspiciousLocation>,
    pub ast_nodes: Vec<SyntaxNode>,
    pub patch_candidates: Vec<PatchCandidate>,
    pub prioritized_patches: Vec<PatchCandidate>,
    pub validation_results: Vec<ValidationResult>,
}

impl SystemState {
    pub fn new(repo_metadata: RepositoryMetadata) -> Self {
        Self {
            repo_metadata,
            suspicious_locations: Vec::new(),
            ast_nodes: Vec::new(),
            patch_candidates: Vec::new(),
            prioritized_patches: Vec::new(),
            validation_results: Vec::new(),
        }
    }

    /// Number of candidates that compiled and passed both phases.
    pub fn validated_fix_count(&self) -> usize {
        self.validation_results
            .iter()
            .filter(|result| result.is_plausible_fix())
            .count()
    }
}

/// Sequential driver over the five stage implementations.
#[derive(Default)]
pub struct Pipeline {
    fault_reader: Option<Box<dyn FaultReader>>,
    extractor: Option<Box<dyn NodeExtractor>>,
    generator: Option<Box<dyn PatchGenerator>>,
    ranker: Option<Box<dyn PatchRanker>>,
    validator: Option<Box<dyn PatchValidator>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire the standard component set.
    pub fn standard(
        path_marker: impl Into<String>,
        freqs: HistoricalFreqs,
        validation: ValidationConfig,
    ) -> Self {
        Self::new()
            .fault_reader(SbflReader::new(path_marker))
            .extractor(Extractor::new())
            .generator(MutationEngine::new(freqs.clone()))
            .ranker(Prioritizer::new(freqs))
            .validator(Validator::new(validation))
    }

    pub fn fault_reader(mut self, reader: impl FaultReader + 'static) -> Self {
        self.fault_reader = Some(Box::new(reader));
        self
    }

    pub fn extractor(mut self, extractor: impl NodeExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    pub fn generator(mut self, generator: impl PatchGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn ranker(mut self, ranker: impl PatchRanker + 'static) -> Self {
        self.ranker = Some(Box::new(ranker));
        self
    }

    pub fn validator(mut self, validator: impl PatchValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Run all stages in order.
    ///
    /// Fails fast with [`Error::Config`] when a component is missing; an
    /// empty stage result returns the partial state instead of erroring.
    pub fn run(&self, repo: &RepositoryMetadata, sbfl_json: &Path) -> Result<SystemState> {
        let fault_reader = self.component(&self.fault_reader, "fault reader")?;
        let extractor = self.component(&self.extractor, "extractor")?;
        let generator = self.component(&self.generator, "generator")?;
        let ranker = self.component(&self.ranker, "ranker")?;
        let validator = self.component(&self.validator, "validator")?;

        let mut state = SystemState::new(repo.clone());

        info!(target: "pipeline", "running fault localization");
        state.suspicious_locations = fault_reader.localize(sbfl_json)?;
        info!(
            target: "pipeline",
            count = state.suspicious_locations.len(),
            "fault localization completed"
        );
        if state.suspicious_locations.is_empty() {
            warn!(target: "pipeline", "no suspicious locations, stopping");
            return Ok(state);
        }

        info!(target: "pipeline", "extracting syntax nodes");
        let source_files = resolve_source_files(repo);
        state.ast_nodes = extractor.extract(&source_files, &state.suspicious_locations)?;
        info!(target: "pipeline", count = state.ast_nodes.len(), "extraction completed");
        if state.ast_nodes.is_empty() {
            warn!(target: "pipeline", "no syntax nodes, stopping");
            return Ok(state);
        }

        info!(target: "pipeline", "generating patch candidates");
        state.patch_candidates = generator.generate(&state.ast_nodes, &repo.failing_tests);
        info!(
            target: "pipeline",
            count = state.patch_candidates.len(),
            "patch generation completed"
        );
        if state.patch_candidates.is_empty() {
            warn!(target: "pipeline", "no patch candidates, stopping");
            return Ok(state);
        }

        info!(target: "pipeline", "prioritizing candidates");
        state.prioritized_patches = ranker.prioritize(state.patch_candidates.clone());
        info!(
            target: "pipeline",
            count = state.prioritized_patches.len(),
            "prioritization completed"
        );
        if state.prioritized_patches.is_empty() {
            warn!(target: "pipeline", "no candidates survived prioritization, stopping");
            return Ok(state);
        }

        info!(target: "pipeline", "validating candidates");
        state.validation_results = validator.validate(&state.prioritized_patches, repo);
        info!(
            target: "pipeline",
            count = state.validation_results.len(),
            fixes = state.validated_fix_count(),
            "validation completed"
        );

        Ok(state)
    }

    fn component<'a, T: ?Sized>(
        &self,
        slot: &'a Option<Box<T>>,
        name: &str,
    ) -> Result<&'a T> {
        slot.as_deref()
            .ok_or_else(|| Error::config(format!("{name} component not set")))
    }
}

/// Resolve repo-relative source paths against the repository root so the
/// extractor (and every later stage) can open them as given.
fn resolve_source_files(repo: &RepositoryMetadata) -> Vec<String> {
    repo.source_files
        .iter()
        .map(|file| {
            let path = Path::new(file);
            if path.is_absolute() {
                file.clone()
            } else {
                repo.repo_path.join(path).to_string_lossy().into_owned()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct EmptyFaultReader;

    impl FaultReader for EmptyFaultReader {
        fn localize(&self, _sbfl_json: &Path) -> Result<Vec<SuspiciousLocation>> {
            Ok(Vec::new())
        }
    }

    struct OneLocation;

    impl FaultReader for OneLocation {
        fn localize(&self, _sbfl_json: &Path) -> Result<Vec<SuspiciousLocation>> {
            Ok(vec![SuspiciousLocation {
                file_path: "src/list.cpp".to_string(),
                line_number: 1,
                function_name: None,
                suspiciousness_score: 0.9,
                reason: None,
            }])
        }
    }

    struct NoNodes;

    impl NodeExtractor for NoNodes {
        fn extract(
            &self,
            _source_files: &[String],
            _locations: &[SuspiciousLocation],
        ) -> Result<Vec<SyntaxNode>> {
            Ok(Vec::new())
        }
    }

    fn repo() -> RepositoryMetadata {
        RepositoryMetadata {
            repo_path: PathBuf::from("."),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_component_is_config_error() {
        let pipeline = Pipeline::new();
        let err = pipeline.run(&repo(), Path::new("sbfl.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("fault reader"));
    }

    #[test]
    fn test_short_circuit_on_empty_locations() {
        let pipeline = Pipeline::standard("src/", HistoricalFreqs::default(), ValidationConfig::default())
            .fault_reader(EmptyFaultReader);

        let state = pipeline.run(&repo(), Path::new("unused.json")).unwrap();
        assert!(state.suspicious_locations.is_empty());
        assert!(state.ast_nodes.is_empty());
        assert!(state.validation_results.is_empty());
    }

    #[test]
    fn test_short_circuit_on_empty_nodes() {
        let pipeline = Pipeline::standard("src/", HistoricalFreqs::default(), ValidationConfig::default())
            .fault_reader(OneLocation)
            .extractor(NoNodes);

        let state = pipeline.run(&repo(), Path::new("unused.json")).unwrap();
        assert_eq!(state.suspicious_locations.len(), 1);
        assert!(state.ast_nodes.is_empty());
        assert!(state.patch_candidates.is_empty());
    }

    #[test]
    fn test_resolve_source_files_joins_relative_paths() {
        let meta = RepositoryMetadata {
            repo_path: PathBuf::from("checkout"),
            source_files: vec![
                "src/list.cpp".to_string(),
                "/abs/src/main.cpp".to_string(),
            ],
            ..Default::default()
        };

        let resolved = resolve_source_files(&meta);
        assert_eq!(resolved[0], format!("checkout{}src/list.cpp", std::path::MAIN_SEPARATOR));
        assert_eq!(resolved[1], "/abs/src/main.cpp");
    }

    #[test]
    fn test_validated_fix_count() {
        let mut state = SystemState::new(repo());
        assert_eq!(state.validated_fix_count(), 0);

        state.validation_results.push(ValidationResult {
            patch_id: "patch_0".to_string(),
            compilation_success: true,
            tests_passed: true,
            build_time_ms: 10,
            test_time_ms: 5,
            build_output: String::new(),
            test_output: String::new(),
            error_message: String::new(),
            tests_passed_count: 3,
            tests_total_count: 3,
            phase_a_artifact_path: None,
            phase_b_artifact_path: None,
        });
        state.validation_results.push(ValidationResult {
            patch_id: "patch_1".to_string(),
            compilation_success: true,
            tests_passed: false,
            build_time_ms: 10,
            test_time_ms: 5,
            build_output: String::new(),
            test_output: String::new(),
            error_message: String::new(),
            tests_passed_count: 2,
            tests_total_count: 3,
            phase_a_artifact_path: None,
            phase_b_artifact_path: None,
        });

        assert_eq!(state.validated_fix_count(), 1);
    }
}
