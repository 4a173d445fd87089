//! Pipeline summary output.

use std::io::Write;
use std::path::Path;

use serde_json::json;

use crate::core::Result;
use crate::pipeline::SystemState;

/// Build the summary document: per-stage counts, repository metadata, the
/// ranked suspicious locations, and every validation result.
pub fn summary_json(state: &SystemState) -> serde_json::Value {
    json!({
        "pipeline_summary": {
            "suspicious_locations_count": state.suspicious_locations.len(),
            "ast_nodes_count": state.ast_nodes.len(),
            "patch_candidates_count": state.patch_candidates.len(),
            "prioritized_patches_count": state.prioritized_patches.len(),
            "validation_results_count": state.validation_results.len(),
        },
        "repository_metadata": {
            "repository_url": state.repo_metadata.repository_url,
            "branch": state.repo_metadata.branch,
            "commit_hash": state.repo_metadata.commit_hash,
            "source_files_count": state.repo_metadata.source_files.len(),
        },
        "suspicious_locations": state.suspicious_locations,
        "validation_results": state.validation_results,
    })
}

/// Write the summary as pretty JSON.
pub fn write_summary(state: &SystemState, path: impl AsRef<Path>) -> Result<()> {
    let mut file = std::fs::File::create(path.as_ref())?;
    serde_json::to_writer_pretty(&mut file, &summary_json(state))?;
    writeln!(file)?;
    Ok(())
}
