use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::GenerationError;
use crate::media::Transcoder;
use crate::pipeline::lifecycle::{ensure_output, ResourceRegistry};

/// Concat demuxer manifest listing `paths` in the given order
///
/// Relative paths are made absolute; single quotes are escaped as `'\''`.
pub fn build_concat_manifest(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| {
            let absolute = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            format!(
                "file '{}'\n",
                absolute.to_string_lossy().replace('\'', "'\\''")
            )
        })
        .collect()
}

/// Join `units` into `output` without re-encoding
pub async fn concatenate_units(
    transcoder: &dyn Transcoder,
    registry: &mut ResourceRegistry,
    units: &[PathBuf],
    output: &Path,
) -> Result<(), GenerationError> {
    let manifest = registry.allocate("concat_list", "txt");
    fs::write(manifest.path(), build_concat_manifest(units))?;
    debug!("Concatenating {} unit(s) into {}", units.len(), output.display());

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let partial = partial_path(output);
    let joined = join_into(transcoder, manifest.path(), &partial).await;
    let finished = joined.and_then(|()| fs::rename(&partial, output).map_err(GenerationError::from));

    if finished.is_err() && partial.exists() {
        if let Err(e) = fs::remove_file(&partial) {
            warn!("Failed to remove partial output {}: {}", partial.display(), e);
        }
    }
    finished
}

async fn join_into(transcoder: &dyn Transcoder, manifest: &Path, target: &Path) -> Result<(), GenerationError> {
    transcoder.concatenate(manifest, target).await?;
    ensure_output(target)
}

/// Sibling of `output` the transcoder writes to until the join succeeds
pub fn partial_path(output: &Path) -> PathBuf {
    let extension = output
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp4".to_string());
    output.with_extension(format!("partial.{}", extension))
}
