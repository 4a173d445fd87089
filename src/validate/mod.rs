//! Two-phase patch validation.
//!
//! Phase A applies a candidate, builds, and replays only the originally
//! failing tests. Phase B re-applies, rebuilds, and runs the full suite to
//! guard against regressions. The patched file is restored on every exit
//! path, and the whole loop runs under one wall-clock budget.

pub mod artifact;
mod exec;
mod guard;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::{Error, RepositoryMetadata};
use crate::mutate::{MutationCategory, PatchCandidate};

pub use artifact::{parse_junit_xml, TestCounts};
pub use exec::{CommandRunner, ExecResult};
pub use guard::{atomic_write, SourceGuard};

/// Tuning knobs for the two-phase loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Global wall-clock budget in minutes.
    pub time_budget_minutes: u64,
    /// How many top candidates to try.
    pub max_patches_to_validate: usize,
    /// Stop after the first candidate that survives Phase B.
    pub enable_early_exit: bool,
    /// Subprocess pipe poll interval (capped at 200 ms).
    pub poll_interval_ms: u64,
    /// Grace period between TERM and KILL on timeout.
    pub term_grace_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            time_budget_minutes: 70,
            max_patches_to_validate: 10,
            enable_early_exit: true,
            poll_interval_ms: 200,
            term_grace_secs: 5,
        }
    }
}

/// Outcome of validating one patch candidate across both phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub patch_id: String,
    pub compilation_success: bool,
    pub tests_passed: bool,
    /// Build time accumulated over both phases.
    pub build_time_ms: u64,
    /// Test time accumulated over both phases.
    pub test_time_ms: u64,
    pub build_output: String,
    pub test_output: String,
    pub error_message: String,
    pub tests_passed_count: u32,
    pub tests_total_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_a_artifact_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_b_artifact_path: Option<String>,
}

impl ValidationResult {
    fn new(patch_id: impl Into<String>) -> Self {
        Self {
            patch_id: patch_id.into(),
            compilation_success: false,
            tests_passed: false,
            build_time_ms: 0,
            test_time_ms: 0,
            build_output: String::new(),
            test_output: String::new(),
            error_message: String::new(),
            tests_passed_count: 0,
            tests_total_count: 0,
            phase_a_artifact_path: None,
            phase_b_artifact_path: None,
        }
    }

    /// Whether the candidate repaired the bug without regressions.
    pub fn is_plausible_fix(&self) -> bool {
        self.compilation_success && self.tests_passed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    A,
    B,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::A => "phase-a",
            Phase::B => "phase-b",
        }
    }
}

/// Two-phase patch validator.
pub struct Validator {
    config: ValidationConfig,
    runner: CommandRunner,
    time_budget: Duration,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        let runner = CommandRunner::new(
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.term_grace_secs),
        );
        let time_budget = Duration::from_secs(config.time_budget_minutes * 60);
        Self {
            config,
            runner,
            time_budget,
        }
    }

    /// Override the wall-clock budget with sub-minute resolution.
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate the top candidates in priority order.
    pub fn validate(
        &self,
        candidates: &[PatchCandidate],
        repo: &RepositoryMetadata,
    ) -> Vec<ValidationResult> {
        let started = Instant::now();
        let top_k = candidates.len().min(self.config.max_patches_to_validate);
        let working_dir = self.resolve_working_dir(repo);
        let artifact_dir = artifact_dir(&repo.repo_path);

        info!(
            target: "validate",
            candidates = candidates.len(),
            top_k,
            working_dir = %working_dir.display(),
            "starting two-phase validation"
        );

        let mut results = Vec::with_capacity(top_k);
        for candidate in &candidates[..top_k] {
            if started.elapsed() >= self.time_budget {
                warn!(
                    target: "validate",
                    patch = %candidate.patch_id,
                    "time budget exhausted, stopping validation"
                );
                break;
            }

            let result =
                self.validate_candidate(candidate, repo, &working_dir, &artifact_dir, started);
            let plausible = result.is_plausible_fix();
            if plausible {
                info!(target: "validate", patch = %result.patch_id, "candidate passed both phases");
            } else {
                info!(
                    target: "validate",
                    patch = %result.patch_id,
                    compiled = result.compilation_success,
                    tests_passed = result.tests_passed,
                    "candidate rejected"
                );
            }
            results.push(result);

            if plausible && self.config.enable_early_exit {
                break;
            }
        }
        results
    }

    fn validate_candidate(
        &self,
        candidate: &PatchCandidate,
        repo: &RepositoryMetadata,
        working_dir: &Path,
        artifact_dir: &Path,
        started: Instant,
    ) -> ValidationResult {
        let mut result = ValidationResult::new(&candidate.patch_id);

        self.run_phase(
            Phase::A,
            candidate,
            repo,
            working_dir,
            artifact_dir,
            started,
            &mut result,
        );
        if !result.is_plausible_fix() {
            return result;
        }

        self.run_phase(
            Phase::B,
            candidate,
            repo,
            working_dir,
            artifact_dir,
            started,
            &mut result,
        );
        result
    }

    /// Apply, build, test, restore. Mutates `result` in place so timings
    /// accumulate across phases.
    #[allow(clippy::too_many_arguments)]
    fn run_phase(
        &self,
        phase: Phase,
        candidate: &PatchCandidate,
        repo: &RepositoryMetadata,
        working_dir: &Path,
        artifact_dir: &Path,
        started: Instant,
        result: &mut ValidationResult,
    ) {
        let file_path = resolve_file(&repo.repo_path, &candidate.file_path);

        let mut guard = match SourceGuard::new(&file_path, &repo.repo_path) {
            Ok(guard) => guard,
            Err(err) => {
                result.tests_passed = false;
                result.error_message = err.to_string();
                return;
            }
        };

        let patched = match apply_patch(guard.original(), candidate) {
            Ok(patched) => patched,
            Err(err) => {
                // The file was never touched; nothing to restore.
                result.tests_passed = false;
                result.error_message = err.to_string();
                return;
            }
        };
        if let Err(err) = guard.apply(&patched) {
            result.tests_passed = false;
            result.error_message = err.to_string();
            return;
        }

        // Build step, bounded by the residual budget.
        let Some(remaining) = self.remaining_budget(started) else {
            result.tests_passed = false;
            result.error_message = format!("{}: time budget exhausted before build", phase.label());
            self.finish_phase(guard, result);
            return;
        };
        let build = self.runner.run(&repo.build_script, working_dir, remaining);
        result.build_time_ms += build.duration_ms;
        result.build_output.push_str(&build.output);
        result.compilation_success = build.success();
        if !build.success() {
            result.tests_passed = false;
            result.error_message = if build.timed_out {
                let err = Error::Timeout {
                    command: repo.build_script.clone(),
                    elapsed_ms: build.duration_ms,
                };
                format!("{}: {err}", phase.label())
            } else {
                format!("{}: build failed", phase.label())
            };
            self.finish_phase(guard, result);
            return;
        }

        // Test step.
        let Some(remaining) = self.remaining_budget(started) else {
            result.tests_passed = false;
            result.error_message = format!("{}: time budget exhausted before tests", phase.label());
            self.finish_phase(guard, result);
            return;
        };

        let artifact_path = artifact_dir.join(format!("{}-{}.xml", phase.label(), candidate.patch_id));
        // Stale artifacts would mask a runner that exits zero without writing.
        let _ = std::fs::remove_file(&artifact_path);

        let filter: Option<&[String]> = match phase {
            Phase::A => Some(&candidate.affected_tests),
            Phase::B => None,
        };
        let command = build_test_command(&repo.test_script, filter, &artifact_path);
        let test = self.runner.run(&command, working_dir, remaining);
        result.test_time_ms += test.duration_ms;
        result.test_output.push_str(&test.output);

        if test.timed_out {
            result.tests_passed = false;
            let err = Error::Timeout {
                command,
                elapsed_ms: test.duration_ms,
            };
            result.error_message = format!("{}: {err}", phase.label());
            self.finish_phase(guard, result);
            return;
        }

        if !artifact_path.exists() {
            result.tests_passed = false;
            result.error_message = format!(
                "{}: test artifact missing: {}",
                phase.label(),
                artifact_path.display()
            );
            self.finish_phase(guard, result);
            return;
        }

        match parse_junit_xml(&artifact_path) {
            Ok(counts) => {
                result.tests_passed = counts.all_passed();
                result.tests_passed_count = counts.passed();
                result.tests_total_count = counts.tests;
            }
            Err(err) => {
                result.tests_passed = false;
                result.error_message = err.to_string();
            }
        }

        let artifact_str = artifact_path.to_string_lossy().into_owned();
        match phase {
            Phase::A => result.phase_a_artifact_path = Some(artifact_str),
            Phase::B => result.phase_b_artifact_path = Some(artifact_str),
        }

        self.finish_phase(guard, result);
    }

    /// Restore the source; a restore failure is surfaced so the caller can
    /// decide to halt.
    fn finish_phase(&self, mut guard: SourceGuard, result: &mut ValidationResult) {
        if let Err(err) = guard.restore() {
            error!(target: "validate", error = %err, "restore failed");
            if !result.error_message.is_empty() {
                result.error_message.push_str("; ");
            }
            result.error_message.push_str(&err.to_string());
        }
    }

    fn remaining_budget(&self, started: Instant) -> Option<Duration> {
        let remaining = self.time_budget.saturating_sub(started.elapsed());
        (remaining > Duration::ZERO).then_some(remaining)
    }

    /// CTest harnesses run from the directory holding `CTestTestfile.cmake`;
    /// everything else runs from the repository root.
    fn resolve_working_dir(&self, repo: &RepositoryMetadata) -> PathBuf {
        if repo.test_script.trim_start().starts_with("ctest") {
            if let Some(dir) = find_ctest_dir(&repo.repo_path, 3) {
                return dir;
            }
        }
        repo.repo_path.clone()
    }
}

/// Candidates carry the path the extractor opened; anything else is taken
/// relative to the repository root.
fn resolve_file(repo_path: &Path, file_path: &str) -> PathBuf {
    let path = Path::new(file_path);
    if path.is_absolute() || path.exists() {
        path.to_path_buf()
    } else {
        repo_path.join(path)
    }
}

/// Breadth-first probe for the nearest directory containing
/// `CTestTestfile.cmake`, bounded by `max_depth`.
fn find_ctest_dir(root: &Path, max_depth: usize) -> Option<PathBuf> {
    let mut frontier = vec![root.to_path_buf()];
    for _ in 0..=max_depth {
        let mut next = Vec::new();
        for dir in frontier {
            if dir.join("CTestTestfile.cmake").is_file() {
                return Some(dir);
            }
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            let mut children: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_dir() && p.file_name().is_some_and(|n| n != ".git"))
                .collect();
            children.sort();
            next.extend(children);
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    None
}

/// Absolute artifact directory `<repo>/artifacts/gtest`, created on demand.
fn artifact_dir(repo_path: &Path) -> PathBuf {
    let root = std::fs::canonicalize(repo_path).unwrap_or_else(|_| repo_path.to_path_buf());
    let dir = root.join("artifacts").join("gtest");
    if let Err(err) = std::fs::create_dir_all(&dir) {
        warn!(target: "validate", error = %err, "could not create artifact directory");
    }
    dir
}

/// Append filter and artifact flags to the opaque test command.
fn build_test_command(test_script: &str, filter: Option<&[String]>, artifact: &Path) -> String {
    let mut command = test_script.trim().to_string();
    let names = filter.filter(|names| !names.is_empty());

    if command.starts_with("ctest") {
        if let Some(names) = names {
            command.push_str(&format!(" -R \"{}\"", names.join("|")));
        }
        command.push_str(&format!(
            " --output-on-failure --output-junit {}",
            artifact.display()
        ));
    } else {
        if let Some(names) = names {
            command.push_str(&format!(" --gtest_filter={}", names.join(":")));
        }
        command.push_str(&format!(" --gtest_output=xml:{}", artifact.display()));
    }
    command
}

/// Apply a single-hunk patch to file content.
///
/// Replacement and Deletion replace the first occurrence of
/// `original_code` within the target line; Insertion adds `modified_code`
/// as a new line at `start_line`. Fails (leaving the caller's file
/// untouched) when the patch does not fit.
fn apply_patch(original: &[u8], candidate: &PatchCandidate) -> Result<Vec<u8>, Error> {
    let text = std::str::from_utf8(original)
        .map_err(|_| Error::patch_apply(&candidate.patch_id, "file is not valid UTF-8"))?;
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let index = candidate.start_line.saturating_sub(1) as usize;

    let mut patched = String::with_capacity(text.len() + candidate.modified_code.len() + 1);

    if candidate.mutation_type.category == MutationCategory::Insertion {
        if index > lines.len() {
            return Err(Error::patch_apply(
                &candidate.patch_id,
                format!("insert line {} beyond end of file", candidate.start_line),
            ));
        }
        for line in &lines[..index] {
            patched.push_str(line);
        }
        patched.push_str(&candidate.modified_code);
        patched.push('\n');
        for line in &lines[index..] {
            patched.push_str(line);
        }
    } else {
        let line = lines.get(index).ok_or_else(|| {
            Error::patch_apply(
                &candidate.patch_id,
                format!("target line {} beyond end of file", candidate.start_line),
            )
        })?;
        if !line.contains(&candidate.original_code) {
            return Err(Error::patch_apply(
                &candidate.patch_id,
                format!("original code not found at line {}", candidate.start_line),
            ));
        }
        let replaced = line.replacen(&candidate.original_code, &candidate.modified_code, 1);
        for line in &lines[..index] {
            patched.push_str(line);
        }
        patched.push_str(&replaced);
        for line in &lines[index + 1..] {
            patched.push_str(line);
        }
    }

    Ok(patched.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::MutationType;
    use std::fs;
    use tempfile::TempDir;

    fn candidate(
        category: MutationCategory,
        file: &str,
        line: u32,
        original: &str,
        modified: &str,
    ) -> PatchCandidate {
        PatchCandidate {
            patch_id: "patch_0".to_string(),
            target_node_id: "node_0".to_string(),
            file_path: file.to_string(),
            start_line: line,
            end_line: line,
            original_code: original.to_string(),
            modified_code: modified.to_string(),
            diff: String::new(),
            mutation_type: MutationType {
                category,
                target_node: "binary_expression".to_string(),
                source_node: "binary_expression".to_string(),
            },
            affected_tests: Vec::new(),
            suspiciousness_score: 0.9,
            similarity_score: 0.5,
            priority_score: 0.4,
        }
    }

    fn repo(dir: &TempDir, build: &str, test: &str) -> RepositoryMetadata {
        RepositoryMetadata {
            repo_path: dir.path().to_path_buf(),
            build_script: build.to_string(),
            test_script: test.to_string(),
            ..Default::default()
        }
    }

    /// A fake gtest binary: swallows flags, writes a green artifact.
    const GREEN_RUNNER: &str = r#"out=""
for a in "$@"; do
  case "$a" in
    --gtest_output=xml:*) out="${a#--gtest_output=xml:}" ;;
  esac
done
echo '<testsuite tests="2" failures="0" errors="0" disabled="0"/>' > "$out"
"#;

    /// Green when filtered (Phase A), one failure on the full suite.
    const REGRESSING_RUNNER: &str = r#"out=""
filtered=no
for a in "$@"; do
  case "$a" in
    --gtest_output=xml:*) out="${a#--gtest_output=xml:}" ;;
    --gtest_filter=*) filtered=yes ;;
  esac
done
if [ "$filtered" = yes ]; then
  echo '<testsuite tests="1" failures="0" errors="0" disabled="0"/>' > "$out"
else
  echo '<testsuite tests="5" failures="1" errors="0" disabled="0"/>' > "$out"
fi
"#;

    fn install_runner(dir: &TempDir, script: &str) -> String {
        let path = dir.path().join("runner.sh");
        fs::write(&path, script).unwrap();
        format!("sh {}", path.display())
    }

    // --- apply_patch ---

    #[test]
    fn test_apply_replacement() {
        let content = b"int f() {\n  if (a != b) return 1;\n  return 0;\n}\n";
        let patch = candidate(MutationCategory::Replacement, "f.cpp", 2, "a != b", "a == b");

        let patched = apply_patch(content, &patch).unwrap();
        assert_eq!(
            patched,
            b"int f() {\n  if (a == b) return 1;\n  return 0;\n}\n"
        );
    }

    #[test]
    fn test_apply_replacement_first_occurrence_only() {
        let content = b"x = x + x;\n";
        let patch = candidate(MutationCategory::Replacement, "f.cpp", 1, "x", "y");

        let patched = apply_patch(content, &patch).unwrap();
        assert_eq!(patched, b"y = x + x;\n");
    }

    #[test]
    fn test_apply_insertion_adds_a_line() {
        let content = b"for (i = 0; i < n; i++) {\n}\n";
        let patch = candidate(MutationCategory::Insertion, "f.cpp", 2, "", "++count;");

        let patched = apply_patch(content, &patch).unwrap();
        assert_eq!(patched, b"for (i = 0; i < n; i++) {\n++count;\n}\n");
    }

    #[test]
    fn test_apply_deletion_removes_text() {
        let content = b"a();\nreset();\nb();\n";
        let patch = candidate(MutationCategory::Deletion, "f.cpp", 2, "reset();", "");

        let patched = apply_patch(content, &patch).unwrap();
        assert_eq!(patched, b"a();\n\nb();\n");
    }

    #[test]
    fn test_apply_rejects_missing_original() {
        let content = b"int x = 1;\n";
        let patch = candidate(MutationCategory::Replacement, "f.cpp", 1, "a != b", "a == b");

        let err = apply_patch(content, &patch).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_apply_rejects_line_past_eof() {
        let content = b"int x = 1;\n";
        let patch = candidate(MutationCategory::Replacement, "f.cpp", 9, "x", "y");

        assert!(apply_patch(content, &patch).is_err());
    }

    #[test]
    fn test_replacement_round_trip() {
        let content = b"if (size / 2) {\n  grow();\n}\n".to_vec();
        let patch = candidate(MutationCategory::Replacement, "f.cpp", 1, "size / 2", "size * 2");
        let patched = apply_patch(&content, &patch).unwrap();

        let inverse = candidate(MutationCategory::Replacement, "f.cpp", 1, "size * 2", "size / 2");
        let restored = apply_patch(&patched, &inverse).unwrap();
        assert_eq!(restored, content);
    }

    // --- command construction ---

    #[test]
    fn test_build_test_command_gtest() {
        let names = vec!["ListTest.Remove".to_string(), "ListTest.Insert".to_string()];
        let cmd = build_test_command(
            "./build/list_tests",
            Some(names.as_slice()),
            Path::new("/tmp/phase-a-patch_0.xml"),
        );
        assert_eq!(
            cmd,
            "./build/list_tests --gtest_filter=ListTest.Remove:ListTest.Insert --gtest_output=xml:/tmp/phase-a-patch_0.xml"
        );
    }

    #[test]
    fn test_build_test_command_gtest_no_filter() {
        let cmd = build_test_command("./build/list_tests", None, Path::new("/tmp/a.xml"));
        assert_eq!(cmd, "./build/list_tests --gtest_output=xml:/tmp/a.xml");
    }

    #[test]
    fn test_build_test_command_ctest() {
        let names = vec!["test_remove".to_string(), "test_insert".to_string()];
        let cmd = build_test_command("ctest", Some(names.as_slice()), Path::new("/tmp/b.xml"));
        assert_eq!(
            cmd,
            "ctest -R \"test_remove|test_insert\" --output-on-failure --output-junit /tmp/b.xml"
        );
    }

    #[test]
    fn test_build_test_command_ctest_empty_filter_runs_suite() {
        let empty: Vec<String> = Vec::new();
        let cmd = build_test_command("ctest", Some(empty.as_slice()), Path::new("/tmp/b.xml"));
        assert_eq!(cmd, "ctest --output-on-failure --output-junit /tmp/b.xml");
    }

    #[test]
    fn test_resolve_file_falls_back_to_repo_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("calc.cpp"), "int x;\n").unwrap();

        let resolved = resolve_file(dir.path(), "calc.cpp");
        assert_eq!(resolved, dir.path().join("calc.cpp"));

        let absolute = dir.path().join("calc.cpp");
        let resolved = resolve_file(Path::new("elsewhere"), absolute.to_str().unwrap());
        assert_eq!(resolved, absolute);
    }

    // --- working directory probe ---

    #[test]
    fn test_ctest_dir_probe_finds_nested_build() {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("build").join("testing");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("CTestTestfile.cmake"), "").unwrap();

        let found = find_ctest_dir(dir.path(), 3).unwrap();
        assert_eq!(found, build);
    }

    #[test]
    fn test_ctest_dir_probe_depth_limit() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a").join("b").join("c").join("d");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("CTestTestfile.cmake"), "").unwrap();

        assert!(find_ctest_dir(dir.path(), 3).is_none());
    }

    // --- two-phase flow (real subprocesses) ---

    #[test]
    fn test_validate_passing_patch_restores_file() {
        let dir = TempDir::new().unwrap();
        let source = "int area(int a, int b) {\n  return a + b;\n}\n";
        fs::write(dir.path().join("calc.cpp"), source).unwrap();
        let runner = install_runner(&dir, GREEN_RUNNER);
        let repo = repo(&dir, "true", &runner);

        let patch = candidate(MutationCategory::Replacement, "calc.cpp", 2, "a + b", "a * b");
        let validator = Validator::new(ValidationConfig::default());
        let results = validator.validate(&[patch], &repo);

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.compilation_success);
        assert!(result.tests_passed);
        assert_eq!(result.tests_total_count, 2);
        assert_eq!(result.tests_passed_count, 2);
        assert!(result.phase_a_artifact_path.is_some());
        assert!(result.phase_b_artifact_path.is_some());

        // tree byte-identical after validation
        assert_eq!(fs::read_to_string(dir.path().join("calc.cpp")).unwrap(), source);
    }

    #[test]
    fn test_validate_build_failure() {
        let dir = TempDir::new().unwrap();
        let source = "int x = 1;\n";
        fs::write(dir.path().join("calc.cpp"), source).unwrap();
        let repo = repo(&dir, "false", "true");

        let patch = candidate(MutationCategory::Replacement, "calc.cpp", 1, "1", "2");
        let results = Validator::new(ValidationConfig::default()).validate(&[patch], &repo);

        assert!(!results[0].compilation_success);
        assert!(!results[0].tests_passed);
        assert!(results[0].error_message.contains("build failed"));
        assert_eq!(fs::read_to_string(dir.path().join("calc.cpp")).unwrap(), source);
    }

    #[test]
    fn test_validate_patch_apply_failure_leaves_tree_untouched() {
        let dir = TempDir::new().unwrap();
        let source = "int x = 1;\n";
        fs::write(dir.path().join("calc.cpp"), source).unwrap();
        let repo = repo(&dir, "true", "true");

        let patch = candidate(MutationCategory::Replacement, "calc.cpp", 1, "y = 9", "y = 8");
        let results = Validator::new(ValidationConfig::default()).validate(&[patch], &repo);

        assert!(results[0].error_message.contains("not found"));
        assert!(!results[0].compilation_success);
        assert_eq!(fs::read_to_string(dir.path().join("calc.cpp")).unwrap(), source);
    }

    #[test]
    fn test_validate_missing_artifact_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("calc.cpp"), "int x = 1;\n").unwrap();
        // Test command exits zero but never writes an artifact.
        let repo = repo(&dir, "true", "true");

        let patch = candidate(MutationCategory::Replacement, "calc.cpp", 1, "1", "2");
        let results = Validator::new(ValidationConfig::default()).validate(&[patch], &repo);

        assert!(results[0].compilation_success);
        assert!(!results[0].tests_passed);
        assert!(results[0].error_message.contains("artifact missing"));
    }

    #[test]
    fn test_validate_build_timeout() {
        let dir = TempDir::new().unwrap();
        let source = "int x = 1;\n";
        fs::write(dir.path().join("calc.cpp"), source).unwrap();
        let repo = repo(&dir, "sleep 30", "true");

        let patch = candidate(MutationCategory::Replacement, "calc.cpp", 1, "1", "2");
        let config = ValidationConfig {
            poll_interval_ms: 50,
            term_grace_secs: 1,
            ..Default::default()
        };
        let validator = Validator::new(config).time_budget(Duration::from_millis(300));
        let results = validator.validate(&[patch], &repo);

        assert!(!results[0].compilation_success);
        assert!(results[0].error_message.contains("Timed out"));
        assert_eq!(fs::read_to_string(dir.path().join("calc.cpp")).unwrap(), source);
    }

    #[test]
    fn test_validate_phase_b_catches_regression() {
        let dir = TempDir::new().unwrap();
        let source = "int half(int n) {\n  return n / 2;\n}\n";
        fs::write(dir.path().join("calc.cpp"), source).unwrap();
        let runner = install_runner(&dir, REGRESSING_RUNNER);
        let repo = repo(&dir, "true", &runner);

        let mut patch = candidate(MutationCategory::Replacement, "calc.cpp", 2, "n / 2", "n * 2");
        patch.affected_tests = vec!["SizeTest.Half".to_string()];
        let results = Validator::new(ValidationConfig::default()).validate(&[patch], &repo);

        let result = &results[0];
        // Phase A green, Phase B red
        assert!(result.compilation_success);
        assert!(!result.tests_passed);
        assert_eq!(result.tests_total_count, 5);
        assert_eq!(result.tests_passed_count, 4);
        assert_eq!(fs::read_to_string(dir.path().join("calc.cpp")).unwrap(), source);
    }

    #[test]
    fn test_validate_early_exit_stops_after_fix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("calc.cpp"), "int x = 1;\n").unwrap();
        let runner = install_runner(&dir, GREEN_RUNNER);
        let repo = repo(&dir, "true", &runner);

        let first = candidate(MutationCategory::Replacement, "calc.cpp", 1, "1", "2");
        let mut second = candidate(MutationCategory::Replacement, "calc.cpp", 1, "1", "3");
        second.patch_id = "patch_1".to_string();

        let results = Validator::new(ValidationConfig::default()).validate(&[first, second], &repo);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_validate_respects_top_k() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("calc.cpp"), "int x = 1;\n").unwrap();
        let repo = repo(&dir, "false", "true");

        let mut candidates = Vec::new();
        for i in 0..4 {
            let mut patch = candidate(MutationCategory::Replacement, "calc.cpp", 1, "1", "2");
            patch.patch_id = format!("patch_{i}");
            candidates.push(patch);
        }

        let config = ValidationConfig {
            max_patches_to_validate: 2,
            ..Default::default()
        };
        let results = Validator::new(config).validate(&candidates, &repo);
        assert_eq!(results.len(), 2);
    }
}
